// Types module - data shared by every layer of a parallel analysis run.
// Nothing here knows about processes or terminals.

pub mod models;

pub use models::{AnalysisReport, Chunk, FileFinding, GlobalError, WorkerOutput, WorkerResult};
