// Engine module - pure orchestration logic (partitioning, progress, decoding, merging)
// This layer sits between the data model (types) and process supervision (runtime)

pub mod aggregate;
pub mod parser;
pub mod partition;
pub mod progress;

pub use aggregate::{ReportBuilder, aggregate};
pub use parser::{UNEXPECTED_OUTPUT_PREFIX, parse_worker_output};
pub use partition::partition;
pub use progress::{ProgressTracker, parse_progress};
