use parstan_types::{FileFinding, GlobalError, WorkerOutput, WorkerResult};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

pub const UNEXPECTED_OUTPUT_PREFIX: &str = "Unexpected output from worker: ";

const NO_OUTPUT: &str = "no output";

// Wire format of the engine's `--error-format json` report. Fields the orchestrator has no
// use for (`totals`, per-file `errors` counts) are ignored.
#[derive(Debug, Deserialize)]
struct EngineReport {
    #[serde(deserialize_with = "files_by_path")]
    files: BTreeMap<String, EngineFile>,
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EngineFile {
    #[serde(default)]
    messages: Vec<EngineMessage>,
}

#[derive(Debug, Deserialize)]
struct EngineMessage {
    message: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default = "default_ignorable")]
    ignorable: bool,
}

fn default_ignorable() -> bool {
    true
}

// A report without findings encodes `files` as `[]` rather than `{}`.
fn files_by_path<'de, D>(deserializer: D) -> Result<BTreeMap<String, EngineFile>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Files {
        ByPath(BTreeMap<String, EngineFile>),
        List(Vec<IgnoredAny>),
    }

    match Files::deserialize(deserializer)? {
        Files::ByPath(files) => Ok(files),
        Files::List(list) if list.is_empty() => Ok(BTreeMap::new()),
        Files::List(list) => Err(de::Error::invalid_length(
            list.len(),
            &"an object keyed by file path",
        )),
    }
}

/// Decode one worker's final output into a [`WorkerResult`].
///
/// The exit code is not consulted: the engine exits non-zero whenever it reports findings.
/// Output that does not decode turns into a single global error carrying the raw text.
pub fn parse_worker_output(output: &WorkerOutput) -> WorkerResult {
    match serde_json::from_slice::<EngineReport>(&output.stdout) {
        Ok(report) => into_worker_result(report),
        Err(_) => WorkerResult::failed(format!(
            "{}{}",
            UNEXPECTED_OUTPUT_PREFIX,
            raw_output_text(output)
        )),
    }
}

fn into_worker_result(report: EngineReport) -> WorkerResult {
    let file_findings = report
        .files
        .into_iter()
        .flat_map(|(file, entry)| {
            entry.messages.into_iter().map(move |m| {
                FileFinding::new(file.clone(), m.line, m.message, m.ignorable)
            })
        })
        .collect();

    let global_errors = report.errors.into_iter().map(GlobalError::new).collect();

    WorkerResult::decoded(file_findings, global_errors)
}

fn raw_output_text(output: &WorkerOutput) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }

    NO_OUTPUT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn output(stdout: &str, stderr: &str, exit_code: i32) -> WorkerOutput {
        WorkerOutput {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            exit_code: Some(exit_code),
        }
    }

    #[test]
    fn test_decodes_findings_and_global_errors() {
        let stdout = r#"{
            "totals": {"errors": 1, "file_errors": 2},
            "files": {
                "/src/b.php": {"errors": 1, "messages": [
                    {"message": "Undefined variable $x", "line": 12, "ignorable": true}
                ]},
                "/src/a.php": {"errors": 1, "messages": [
                    {"message": "Syntax error", "line": null, "ignorable": false}
                ]}
            },
            "errors": ["Ignored error pattern was not matched"]
        }"#;

        let result = parse_worker_output(&output(stdout, "", 1));

        assert!(result.success);
        assert_eq!(result.file_findings.len(), 2);
        assert_eq!(result.file_findings[0].file, PathBuf::from("/src/a.php"));
        assert_eq!(result.file_findings[0].line, None);
        assert!(!result.file_findings[0].suppressible);
        assert_eq!(result.file_findings[1].line, Some(12));
        assert_eq!(result.file_findings[1].message, "Undefined variable $x");
        assert_eq!(
            result.global_errors,
            vec![GlobalError::new("Ignored error pattern was not matched")]
        );
    }

    #[test]
    fn test_messages_keep_document_order_within_a_file() {
        let stdout = r#"{"files": {"/a.php": {"messages": [
            {"message": "second by line", "line": 9},
            {"message": "first by line", "line": 2}
        ]}}, "errors": []}"#;

        let result = parse_worker_output(&output(stdout, "", 1));
        let messages: Vec<&str> = result
            .file_findings
            .iter()
            .map(|f| f.message.as_str())
            .collect();
        assert_eq!(messages, vec!["second by line", "first by line"]);
        assert!(result.file_findings.iter().all(|f| f.suppressible));
    }

    #[test]
    fn test_empty_report_is_a_successful_result() {
        let result = parse_worker_output(&output(r#"{"files": {}, "errors": []}"#, "", 0));
        assert!(result.success);
        assert!(result.file_findings.is_empty());
        assert!(result.global_errors.is_empty());
    }

    #[test]
    fn test_empty_file_list_is_a_successful_result() {
        let stdout = r#"{"totals":{"errors":0,"file_errors":0},"files":[],"errors":[]}"#;
        let result = parse_worker_output(&output(stdout, "", 0));

        assert!(result.success);
        assert!(result.file_findings.is_empty());
        assert!(result.global_errors.is_empty());
    }

    #[test]
    fn test_non_empty_file_list_is_a_decode_failure() {
        let stdout = r#"{"files":[{"messages":[]}],"errors":[]}"#;
        let result = parse_worker_output(&output(stdout, "", 0));

        assert!(!result.success);
        assert!(
            result.global_errors[0]
                .message
                .starts_with(UNEXPECTED_OUTPUT_PREFIX)
        );
    }

    #[test]
    fn test_empty_stdout_falls_back_to_stderr() {
        let result = parse_worker_output(&output("", "PHP Fatal error: out of memory\n", 255));
        assert!(!result.success);
        assert!(result.file_findings.is_empty());
        assert_eq!(
            result.global_errors,
            vec![GlobalError::new(
                "Unexpected output from worker: PHP Fatal error: out of memory"
            )]
        );
    }

    #[test]
    fn test_malformed_stdout_is_preferred_over_stderr() {
        let result = parse_worker_output(&output("Segmentation fault", "ignored", 139));
        assert_eq!(
            result.global_errors[0].message,
            "Unexpected output from worker: Segmentation fault"
        );
    }

    #[test]
    fn test_no_output_at_all() {
        let result = parse_worker_output(&WorkerOutput::default());
        assert_eq!(
            result.global_errors,
            vec![GlobalError::new("Unexpected output from worker: no output")]
        );
    }

    #[test]
    fn test_missing_top_level_fields_is_a_decode_failure() {
        let result = parse_worker_output(&output(r#"{"files": {}}"#, "", 0));
        assert!(!result.success);
        assert_eq!(result.global_errors.len(), 1);
    }
}
