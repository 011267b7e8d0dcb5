use parstan_types::{AnalysisReport, FileFinding, GlobalError, WorkerResult};

/// Accumulates worker results into one report without dropping or reordering records.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    file_findings: Vec<FileFinding>,
    global_errors: Vec<GlobalError>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Findings that precede every worker result, such as paths that do not exist.
    pub fn with_findings(mut self, findings: Vec<FileFinding>) -> Self {
        self.file_findings.extend(findings);
        self
    }

    pub fn push(&mut self, result: WorkerResult) {
        self.file_findings.extend(result.file_findings);
        self.global_errors.extend(result.global_errors);
    }

    pub fn push_error(&mut self, error: GlobalError) {
        self.global_errors.push(error);
    }

    pub fn build(self) -> AnalysisReport {
        AnalysisReport {
            file_findings: self.file_findings,
            global_errors: self.global_errors,
        }
    }
}

impl Extend<WorkerResult> for ReportBuilder {
    fn extend<I: IntoIterator<Item = WorkerResult>>(&mut self, iter: I) {
        for result in iter {
            self.push(result);
        }
    }
}

/// Concatenate results in the order given, which callers keep equal to chunk order.
pub fn aggregate<I>(results: I) -> AnalysisReport
where
    I: IntoIterator<Item = WorkerResult>,
{
    let mut builder = ReportBuilder::new();
    builder.extend(results);
    builder.build()
}
