use crate::types::LogLevel;
use tracing::level_filters::LevelFilter;

/// Route `tracing` output to stderr so stdout only ever carries the formatted report.
pub fn init(level: LogLevel) {
    // try_init: a subscriber may already be installed when the CLI is driven in-process
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
