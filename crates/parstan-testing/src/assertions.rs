//! Assertions over the report printed with `--error-format json`.

use anyhow::{Context, Result};
use serde_json::Value;

/// Assert the number of file-scoped findings across all files.
pub fn assert_file_error_count(json: &Value, expected: u64) -> Result<()> {
    let actual = json["totals"]["file_errors"]
        .as_u64()
        .context("Expected 'totals.file_errors' number in JSON")?;

    if actual != expected {
        anyhow::bail!("Expected {} file errors, got {}", expected, actual);
    }

    Ok(())
}

/// Assert the number of global (not file-scoped) errors.
pub fn assert_global_error_count(json: &Value, expected: usize) -> Result<()> {
    let errors = json["errors"]
        .as_array()
        .context("Expected 'errors' array in JSON")?;

    if errors.len() != expected {
        anyhow::bail!(
            "Expected {} global errors, got {}: {:?}",
            expected,
            errors.len(),
            errors
        );
    }

    Ok(())
}

/// Messages reported for one file, in report order.
pub fn file_messages(json: &Value, file: &str) -> Result<Vec<String>> {
    let messages = json["files"][file]["messages"]
        .as_array()
        .with_context(|| format!("Expected messages for file {}", file))?;

    messages
        .iter()
        .map(|m| {
            m["message"]
                .as_str()
                .map(String::from)
                .context("Message without text")
        })
        .collect()
}
