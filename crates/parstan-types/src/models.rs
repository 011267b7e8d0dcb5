use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A diagnostic attached to one analysed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFinding {
    pub file: PathBuf,
    /// 1-based line number, absent for file-level findings
    pub line: Option<u32>,
    pub message: String,
    /// Whether the finding can be silenced by the engine's ignore rules
    pub suppressible: bool,
}

impl FileFinding {
    pub fn new(
        file: impl Into<PathBuf>,
        line: Option<u32>,
        message: impl Into<String>,
        suppressible: bool,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
            suppressible,
        }
    }
}

/// A diagnostic that is not tied to any file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalError {
    pub message: String,
}

impl GlobalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A contiguous slice of the input file list, owned by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: usize,
    files: Vec<PathBuf>,
}

impl Chunk {
    pub fn new(index: usize, files: Vec<PathBuf>) -> Self {
        debug_assert!(!files.is_empty(), "chunks are never empty");
        Self { index, files }
    }

    /// Position of this chunk in submission order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }
}

/// Raw final output of one terminated worker process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal or could not be waited on
    pub exit_code: Option<i32>,
}

/// Decoded outcome of one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub file_findings: Vec<FileFinding>,
    pub global_errors: Vec<GlobalError>,
    /// True when the worker produced a structured report, even one listing analysis errors
    pub success: bool,
}

impl WorkerResult {
    pub fn decoded(file_findings: Vec<FileFinding>, global_errors: Vec<GlobalError>) -> Self {
        Self {
            file_findings,
            global_errors,
            success: true,
        }
    }

    /// Result standing in for a worker whose output could not be used.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            file_findings: Vec::new(),
            global_errors: vec![GlobalError::new(message)],
            success: false,
        }
    }
}

/// Merged outcome of a whole run, ready for formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub file_findings: Vec<FileFinding>,
    pub global_errors: Vec<GlobalError>,
}

impl AnalysisReport {
    /// True if any global error exists or any finding cannot be suppressed.
    pub fn has_errors(&self) -> bool {
        !self.global_errors.is_empty() || self.file_findings.iter().any(|f| !f.suppressible)
    }

    /// True when the report holds no records at all.
    pub fn is_clean(&self) -> bool {
        self.file_findings.is_empty() && self.global_errors.is_empty()
    }

    pub fn total_count(&self) -> usize {
        self.file_findings.len() + self.global_errors.len()
    }

    /// Distinct files with findings, in first-seen order.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for finding in &self.file_findings {
            if !files.contains(&finding.file.as_path()) {
                files.push(&finding.file);
            }
        }
        files
    }

    pub fn findings_for<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a FileFinding> {
        self.file_findings.iter().filter(move |f| f.file.as_path() == file)
    }
}
