use super::{ErrorFormatter, FormatContext, exit_code};
use owo_colors::OwoColorize;
use parstan_types::AnalysisReport;
use std::io::{self, Write};

const LINE_HEADER: &str = "Line";
const ERROR_HEADER: &str = "Error";

/// Human-readable report: one block per file, one block for global errors, then a verdict.
pub struct TableFormatter {
    context: FormatContext,
}

impl TableFormatter {
    pub fn new(context: FormatContext) -> Self {
        Self { context }
    }

    fn write_file_block(
        &self,
        out: &mut dyn Write,
        path: &str,
        rows: &[(String, &str)],
    ) -> io::Result<()> {
        let line_width = rows
            .iter()
            .map(|(line, _)| line.len())
            .chain(std::iter::once(LINE_HEADER.len()))
            .max()
            .unwrap_or(0)
            + 2;
        let message_width = rows
            .iter()
            .map(|(_, message)| message.chars().count())
            .chain(std::iter::once(path.chars().count()))
            .max()
            .unwrap_or(0);
        let rule = format!("{} {}", "-".repeat(line_width), "-".repeat(message_width));

        let header = if self.context.color {
            path.bold().to_string()
        } else {
            path.to_string()
        };

        writeln!(out, "{}", rule)?;
        writeln!(out, "{:<width$} {}", LINE_HEADER, header, width = line_width)?;
        writeln!(out, "{}", rule)?;
        for (line, message) in rows {
            writeln!(out, "{:<width$} {}", line, message, width = line_width)?;
        }
        writeln!(out, "{}", rule)?;
        writeln!(out)
    }

    fn write_global_block(&self, out: &mut dyn Write, messages: &[&str]) -> io::Result<()> {
        let width = messages
            .iter()
            .map(|m| m.chars().count())
            .chain(std::iter::once(ERROR_HEADER.len()))
            .max()
            .unwrap_or(0);
        let rule = "-".repeat(width);

        writeln!(out, "{}", rule)?;
        writeln!(out, "{}", ERROR_HEADER)?;
        writeln!(out, "{}", rule)?;
        for message in messages {
            writeln!(out, "{}", message)?;
        }
        writeln!(out, "{}", rule)?;
        writeln!(out)
    }

    fn write_verdict(&self, out: &mut dyn Write, report: &AnalysisReport) -> io::Result<()> {
        let verdict = if report.is_clean() {
            "[OK] No errors".to_string()
        } else {
            let count = report.total_count();
            let noun = if count == 1 { "error" } else { "errors" };
            format!("[ERROR] Found {} {}", count, noun)
        };

        match (self.context.color, report.is_clean()) {
            (true, true) => writeln!(out, "{}", verdict.green()),
            (true, false) => writeln!(out, "{}", verdict.red()),
            (false, _) => writeln!(out, "{}", verdict),
        }
    }
}

impl ErrorFormatter for TableFormatter {
    fn name(&self) -> &'static str {
        "table"
    }

    fn format_errors(&self, report: &AnalysisReport, out: &mut dyn Write) -> io::Result<i32> {
        for file in report.files() {
            let rows: Vec<(String, &str)> = report
                .findings_for(file)
                .map(|f| {
                    let line = f.line.map(|l| l.to_string()).unwrap_or_default();
                    (line, f.message.as_str())
                })
                .collect();
            self.write_file_block(out, &self.context.display_path(file), &rows)?;
        }

        if !report.global_errors.is_empty() {
            let messages: Vec<&str> = report
                .global_errors
                .iter()
                .map(|e| e.message.as_str())
                .collect();
            self.write_global_block(out, &messages)?;
        }

        self.write_verdict(out, report)?;
        Ok(exit_code(report))
    }
}
