//! Sandboxed projects for exercising the orchestrator against a fake engine.
//!
//! The fake engine is a POSIX shell script installed where the real engine would live
//! (`vendor/phpstan/phpstan/bin/phpstan`). It understands the worker command line, prints
//! `done/total` progress on stderr and a JSON report on stdout. Its behaviour per file is
//! driven by markers in the file contents:
//!
//! - `@finding`: one finding on the first line carrying the marker
//! - `@global`: one global error naming the file
//! - `@slow`: sleep one second before analysing the file
//! - `@garbage`: print non-JSON on stdout for the whole chunk
//! - `@crash`: print a fatal error on stderr and exit 255 with empty stdout
//!
//! A chunk without findings reports `"files":[]`, the way the real engine encodes an empty map.
//!
//! When `FAKE_ENGINE_ARGS_LOG` is set, every invocation appends its full argument list there.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ENGINE_RELATIVE_PATH: &str = "vendor/phpstan/phpstan/bin/phpstan";
pub const LEVEL_CONFIG_RELATIVE_DIR: &str = "vendor/phpstan/phpstan/conf";

pub const FINDING_MARKER: &str = "@finding";
pub const GLOBAL_MARKER: &str = "@global";
pub const SLOW_MARKER: &str = "@slow";
pub const GARBAGE_MARKER: &str = "@garbage";
pub const CRASH_MARKER: &str = "@crash";

/// Environment variable naming a file where the fake engine logs its arguments
pub const ARGS_LOG_VAR: &str = "FAKE_ENGINE_ARGS_LOG";

/// Message the fake engine attaches to every finding
pub const FINDING_MESSAGE: &str = "Found finding marker";

pub const FAKE_ENGINE_SCRIPT: &str = r##"#!/bin/sh
if [ -n "$FAKE_ENGINE_ARGS_LOG" ]; then
    echo "$*" >> "$FAKE_ENGINE_ARGS_LOG"
fi

while [ $# -gt 0 ]; do
    case "$1" in
        analyse|--no-progress) shift ;;
        --configuration|--autoload-file|--level|--error-format) shift 2 ;;
        *) break ;;
    esac
done

for file in "$@"; do
    if grep -q '@crash' "$file"; then
        echo "PHP Fatal error: engine crashed on $file" >&2
        exit 255
    fi
done

for file in "$@"; do
    if grep -q '@garbage' "$file"; then
        echo "Something went terribly wrong"
        exit 1
    fi
done

total=$#
done_count=0
file_errors=0
global_errors=0
files_json=""
errors_json=""

for file in "$@"; do
    if grep -q '@slow' "$file"; then
        sleep 1
    fi

    line=$(grep -n '@finding' "$file" | head -n 1 | cut -d: -f1)
    if [ -n "$line" ]; then
        entry="\"$file\":{\"errors\":1,\"messages\":[{\"message\":\"Found finding marker\",\"line\":$line,\"ignorable\":true}]}"
        if [ -n "$files_json" ]; then files_json="$files_json,$entry"; else files_json="$entry"; fi
        file_errors=$((file_errors + 1))
    fi

    if grep -q '@global' "$file"; then
        entry="\"Global failure reported for $(basename "$file")\""
        if [ -n "$errors_json" ]; then errors_json="$errors_json,$entry"; else errors_json="$entry"; fi
        global_errors=$((global_errors + 1))
    fi

    done_count=$((done_count + 1))
    echo "$done_count/$total" >&2
done

if [ -n "$files_json" ]; then files_doc="{$files_json}"; else files_doc="[]"; fi
printf '{"totals":{"errors":%d,"file_errors":%d},"files":%s,"errors":[%s]}\n' \
    "$global_errors" "$file_errors" "$files_doc" "$errors_json"

if [ "$file_errors" -gt 0 ] || [ "$global_errors" -gt 0 ]; then
    exit 1
fi
exit 0
"##;

/// A temporary project directory with the fake engine and its level presets installed.
pub struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        let project = Self {
            _temp_dir: temp_dir,
            root,
        };
        project.install_engine(FAKE_ENGINE_SCRIPT);

        let conf_dir = project.root.join(LEVEL_CONFIG_RELATIVE_DIR);
        fs::create_dir_all(&conf_dir).expect("Failed to create conf dir");
        for level in (0..=9).map(|l| l.to_string()).chain(["max".to_string()]) {
            fs::write(conf_dir.join(format!("config.level{}.neon", level)), "")
                .expect("Failed to write level config");
        }

        project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine_path(&self) -> PathBuf {
        self.root.join(ENGINE_RELATIVE_PATH)
    }

    /// Replace the engine with a custom script.
    pub fn install_engine(&self, script: &str) {
        let engine = self.engine_path();
        if let Some(parent) = engine.parent() {
            fs::create_dir_all(parent).expect("Failed to create engine dir");
        }
        fs::write(&engine, script).expect("Failed to write engine script");
        make_executable(&engine);
    }

    /// Write a file below the project root, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Write `count` marker-free sources named `src/File00.php`, `src/File01.php`, ...
    pub fn write_clean_sources(&self, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| self.write_file(&format!("src/File{:02}.php", i), "<?php\necho 1;\n"))
            .collect()
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .expect("Failed to read engine metadata")
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("Failed to mark engine executable");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
