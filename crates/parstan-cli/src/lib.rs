mod args;
mod commands;
pub mod formatters;
mod handlers;
mod logging;
pub mod progress;
pub mod types;

pub use args::{AnalyseArgs, Cli, Commands};
pub use commands::run;
