pub mod config;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod worker;

pub use config::{RunConfig, Settings};
pub use discovery::{Discovery, collect_files};
pub use error::{Error, Result};
pub use orchestrator::{
    CancelToken, NoProgress, Orchestrator, ProgressSink, RunOutcome, RunState, analyse,
};
pub use worker::WorkerProcess;
