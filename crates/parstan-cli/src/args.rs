use crate::formatters::DEFAULT_FORMAT;
use crate::types::LogLevel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parstan")]
#[command(about = "Run a static analyser over parallel worker processes", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse files and directories, split across worker processes
    #[command(visible_alias = "analyze")]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyseArgs {
    #[arg(required = true, help = "Files or directories to analyse")]
    pub paths: Vec<PathBuf>,

    #[arg(
        short = 'p',
        long,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "The number of worker processes to run (default 5)"
    )]
    pub processes: Option<u16>,

    #[arg(
        short = 'c',
        long,
        help = "Engine configuration file (default: phpstan.neon or phpstan.neon.dist)"
    )]
    pub configuration: Option<PathBuf>,

    #[arg(short = 'l', long, help = "Rule level forwarded to every worker")]
    pub level: Option<String>,

    #[arg(long, help = "Do not show the progress bar")]
    pub no_progress: bool,

    #[arg(short = 'a', long, help = "Project's additional autoload file path")]
    pub autoload_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_FORMAT, help = "Format in which to print the result")]
    pub error_format: String,

    #[arg(long = "errorFormat", hide = true)]
    pub deprecated_error_format: Option<String>,

    #[arg(long, help = "Path to the analysis engine executable")]
    pub engine: Option<PathBuf>,

    #[arg(
        long = "extension",
        value_name = "EXT",
        help = "File extension to collect from directories (repeatable, default php)"
    )]
    pub extensions: Vec<String>,
}
