use std::fmt;
use std::path::PathBuf;

/// Result type for parstan-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// The analysis engine executable does not exist
    EngineNotFound(PathBuf),

    /// No level config file exists for the requested level
    LevelConfigNotFound(PathBuf),

    /// The scratch directory could not be created
    ScratchDir { path: PathBuf, source: std::io::Error },

    /// A worker process could not be started
    Spawn { worker: usize, source: std::io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::EngineNotFound(path) => {
                write!(f, "Analysis engine {} was not found.", path.display())
            }
            Error::LevelConfigNotFound(path) => {
                write!(f, "Level config file {} was not found.", path.display())
            }
            Error::ScratchDir { path, .. } => {
                write!(f, "Cannot create a temp directory {}", path.display())
            }
            Error::Spawn { worker, source } => {
                write!(f, "Unable to start worker {}: {}", worker, source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::ScratchDir { source, .. } | Error::Spawn { source, .. } => Some(source),
            Error::Config(_) | Error::EngineNotFound(_) | Error::LevelConfigNotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
