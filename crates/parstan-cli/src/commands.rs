use super::args::{Cli, Commands};
use super::handlers;
use super::logging;
use anyhow::Result;

/// Dispatch a parsed command line and return the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    logging::init(cli.log_level);

    match cli.command {
        Commands::Analyse(args) => handlers::analyse::handle(args),
    }
}
