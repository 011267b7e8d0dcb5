use super::{ErrorFormatter, FormatContext, exit_code};
use parstan_types::AnalysisReport;
use std::io::{self, Write};

/// One `file:line:message` line per record, for editors and grep.
pub struct RawFormatter {
    context: FormatContext,
}

impl RawFormatter {
    pub fn new(context: FormatContext) -> Self {
        Self { context }
    }
}

impl ErrorFormatter for RawFormatter {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn format_errors(&self, report: &AnalysisReport, out: &mut dyn Write) -> io::Result<i32> {
        for error in &report.global_errors {
            writeln!(out, "?:?:{}", error.message)?;
        }

        for finding in &report.file_findings {
            let line = finding
                .line
                .map(|l| l.to_string())
                .unwrap_or_else(|| "?".to_string());
            writeln!(
                out,
                "{}:{}:{}",
                self.context.display_path(&finding.file),
                line,
                finding.message
            )?;
        }

        Ok(exit_code(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parstan_types::{FileFinding, GlobalError};
    use std::path::PathBuf;

    #[test]
    fn test_raw_output() {
        let formatter = RawFormatter::new(FormatContext {
            relative_to: PathBuf::from("/project"),
            color: false,
        });
        let report = AnalysisReport {
            file_findings: vec![
                FileFinding::new("/project/src/A.php", Some(12), "Undefined variable $x", true),
                FileFinding::new("/project/missing", None, "Path /project/missing does not exist", false),
            ],
            global_errors: vec![GlobalError::new("Unexpected output from worker: no output")],
        };

        let mut out = Vec::new();
        let code = formatter.format_errors(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(code, 1);
        insta::assert_snapshot!(text.trim_end(), @r"
        ?:?:Unexpected output from worker: no output
        src/A.php:12:Undefined variable $x
        missing:?:Path /project/missing does not exist
        ");
    }

    #[test]
    fn test_clean_report_prints_nothing() {
        let formatter = RawFormatter::new(FormatContext {
            relative_to: PathBuf::from("/project"),
            color: false,
        });
        let mut out = Vec::new();
        let code = formatter
            .format_errors(&AnalysisReport::default(), &mut out)
            .unwrap();
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }
}
