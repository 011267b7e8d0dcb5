mod json;
mod raw;
mod table;

pub use json::JsonFormatter;
pub use raw::RawFormatter;
pub use table::TableFormatter;

use parstan_types::AnalysisReport;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_FORMAT: &str = "table";

/// Renders a merged report and decides the process exit code.
pub trait ErrorFormatter {
    fn name(&self) -> &'static str;

    fn format_errors(&self, report: &AnalysisReport, out: &mut dyn Write) -> io::Result<i32>;
}

/// Settings every formatter may consult.
#[derive(Debug, Clone)]
pub struct FormatContext {
    /// Paths under this directory are printed relative to it
    pub relative_to: PathBuf,
    pub color: bool,
}

impl FormatContext {
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.relative_to)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Zero for a report without any record, one otherwise.
pub fn exit_code(report: &AnalysisReport) -> i32 {
    if report.is_clean() { 0 } else { 1 }
}

pub struct FormatterRegistry {
    formatters: Vec<Box<dyn ErrorFormatter>>,
}

impl FormatterRegistry {
    pub fn with_defaults(context: FormatContext) -> Self {
        Self {
            formatters: vec![
                Box::new(TableFormatter::new(context.clone())),
                Box::new(RawFormatter::new(context)),
                Box::new(JsonFormatter::compact()),
                Box::new(JsonFormatter::pretty()),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ErrorFormatter> {
        self.formatters
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.formatters.iter().map(|f| f.name()).collect()
    }
}
