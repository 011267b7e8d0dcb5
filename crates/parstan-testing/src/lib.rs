//! Testing infrastructure for parstan integration tests.
//!
//! - `fixtures`: sandboxed projects with a scriptable stand-in for the analysis engine
//! - `assertions`: checks against the JSON report printed by `--error-format json`

pub mod assertions;
pub mod fixtures;

pub use fixtures::TestProject;
