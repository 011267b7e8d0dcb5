use super::{ErrorFormatter, exit_code};
use parstan_types::AnalysisReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    totals: Totals,
    files: BTreeMap<String, FileEntry<'a>>,
    errors: Vec<&'a str>,
}

#[derive(Serialize)]
struct Totals {
    errors: usize,
    file_errors: usize,
}

#[derive(Serialize, Default)]
struct FileEntry<'a> {
    errors: usize,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
    line: Option<u32>,
    ignorable: bool,
}

/// Machine-readable report keyed by absolute file path.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    fn build<'a>(report: &'a AnalysisReport) -> JsonReport<'a> {
        let mut files: BTreeMap<String, FileEntry<'a>> = BTreeMap::new();
        for finding in &report.file_findings {
            let entry = files
                .entry(finding.file.display().to_string())
                .or_default();
            entry.errors += 1;
            entry.messages.push(Message {
                message: &finding.message,
                line: finding.line,
                ignorable: finding.suppressible,
            });
        }

        JsonReport {
            totals: Totals {
                errors: report.global_errors.len(),
                file_errors: report.file_findings.len(),
            },
            files,
            errors: report
                .global_errors
                .iter()
                .map(|e| e.message.as_str())
                .collect(),
        }
    }
}

impl ErrorFormatter for JsonFormatter {
    fn name(&self) -> &'static str {
        if self.pretty { "prettyJson" } else { "json" }
    }

    fn format_errors(&self, report: &AnalysisReport, out: &mut dyn Write) -> io::Result<i32> {
        let json = Self::build(report);
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &json)?;
        } else {
            serde_json::to_writer(&mut *out, &json)?;
        }
        writeln!(out)?;

        Ok(exit_code(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parstan_types::{FileFinding, GlobalError};

    fn report() -> AnalysisReport {
        AnalysisReport {
            file_findings: vec![
                FileFinding::new("/p/b.php", Some(3), "Second file", true),
                FileFinding::new("/p/a.php", Some(7), "First file", true),
                FileFinding::new("/p/a.php", None, "Whole file", false),
            ],
            global_errors: vec![GlobalError::new("Worker went away")],
        }
    }

    fn render(formatter: &JsonFormatter, report: &AnalysisReport) -> (i32, String) {
        let mut out = Vec::new();
        let code = formatter.format_errors(report, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_compact_json() {
        let (code, text) = render(&JsonFormatter::compact(), &report());
        assert_eq!(code, 1);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["totals"]["errors"], 1);
        assert_eq!(value["totals"]["file_errors"], 3);
        assert_eq!(value["files"]["/p/a.php"]["errors"], 2);
        assert_eq!(value["files"]["/p/a.php"]["messages"][1]["line"], serde_json::Value::Null);
        assert_eq!(value["files"]["/p/a.php"]["messages"][1]["ignorable"], false);
        assert_eq!(value["errors"][0], "Worker went away");
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_pretty_json() {
        let report = AnalysisReport {
            file_findings: vec![FileFinding::new("/p/a.php", Some(7), "First file", true)],
            global_errors: vec![],
        };
        let (_, text) = render(&JsonFormatter::pretty(), &report);

        insta::assert_snapshot!(text.trim_end(), @r#"
        {
          "totals": {
            "errors": 0,
            "file_errors": 1
          },
          "files": {
            "/p/a.php": {
              "errors": 1,
              "messages": [
                {
                  "message": "First file",
                  "line": 7,
                  "ignorable": true
                }
              ]
            }
          },
          "errors": []
        }
        "#);
    }

    #[test]
    fn test_clean_json_exits_zero() {
        let (code, text) = render(&JsonFormatter::compact(), &AnalysisReport::default());
        assert_eq!(code, 0);
        assert_eq!(
            text.trim_end(),
            r#"{"totals":{"errors":0,"file_errors":0},"files":{},"errors":[]}"#
        );
    }
}
