//! Helpers shared by the CLI integration tests.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use parstan_testing::TestProject;
use parstan_testing::fixtures::ARGS_LOG_VAR;
use std::path::PathBuf;

/// `parstan` with the project root as working directory and a private scratch directory.
#[allow(deprecated)]
pub fn parstan(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("parstan").expect("Failed to find parstan binary");
    cmd.current_dir(project.root())
        .env("PARSTAN_TMP_DIR", project.root().join("tmp"))
        .env_remove("PARSTAN_ENGINE")
        .env_remove(ARGS_LOG_VAR);
    cmd
}

/// Run `analyse` with the given arguments and return (exit code, stdout, stderr).
pub fn analyse(project: &TestProject, args: &[&str]) -> (i32, String, String) {
    let output = parstan(project)
        .arg("analyse")
        .arg("--no-progress")
        .args(args)
        .output()
        .expect("Failed to run parstan");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8(output.stdout).expect("stdout is not UTF-8"),
        String::from_utf8(output.stderr).expect("stderr is not UTF-8"),
    )
}

pub fn args_log(project: &TestProject) -> PathBuf {
    project.root().join("engine-args.log")
}

/// One line per engine invocation.
pub fn logged_invocations(project: &TestProject) -> Vec<String> {
    std::fs::read_to_string(args_log(project))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}
