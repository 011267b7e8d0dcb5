use crate::{Error, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine location relative to the working directory when nothing else is configured
pub const DEFAULT_ENGINE: &str = "vendor/phpstan/phpstan/bin/phpstan";
pub const DEFAULT_PROCESSES: usize = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub const DEFAULT_EXTENSION: &str = "php";

pub const SETTINGS_FILE: &str = "parstan.toml";
pub const ENGINE_ENV: &str = "PARSTAN_ENGINE";
pub const SCRATCH_DIR_ENV: &str = "PARSTAN_TMP_DIR";

/// Engine configuration files looked up in the working directory, in priority order
pub const PROJECT_CONFIG_NAMES: [&str; 2] = ["phpstan.neon", "phpstan.neon.dist"];

/// Optional per-project defaults read from `parstan.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub processes: Option<usize>,
    #[serde(default)]
    pub engine: Option<PathBuf>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        if settings.processes == Some(0) {
            return Err(Error::Config(format!(
                "{}: processes must be at least 1",
                path.display()
            )));
        }
        Ok(settings)
    }
}

/// Everything a run needs, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub working_dir: PathBuf,
    pub engine: PathBuf,
    pub project_config: Option<PathBuf>,
    pub autoload_file: Option<PathBuf>,
    pub level: Option<String>,
    pub no_progress: bool,
    pub workers: usize,
    pub extensions: Vec<String>,
    pub scratch_dir: PathBuf,
    pub poll_interval: Duration,
}

impl RunConfig {
    /// Defaults for `working_dir`, with `settings` applied on top.
    pub fn from_settings(working_dir: PathBuf, settings: &Settings) -> Self {
        let engine = resolve_engine_path(
            None,
            std::env::var_os(ENGINE_ENV),
            settings,
            &working_dir,
        );

        Self {
            engine,
            project_config: None,
            autoload_file: None,
            level: None,
            no_progress: false,
            workers: settings.processes.unwrap_or(DEFAULT_PROCESSES),
            extensions: settings
                .extensions
                .clone()
                .unwrap_or_else(|| vec![DEFAULT_EXTENSION.to_string()]),
            scratch_dir: resolve_scratch_dir(std::env::var_os(SCRATCH_DIR_ENV)),
            poll_interval: settings
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            working_dir,
        }
    }

    /// Check everything that must hold before the first worker is spawned.
    pub fn validate(&self) -> Result<()> {
        if !self.engine.is_file() {
            return Err(Error::EngineNotFound(self.engine.clone()));
        }

        if let Some(path) = self.level_config_path()
            && !path.is_file()
        {
            return Err(Error::LevelConfigNotFound(path));
        }

        Ok(())
    }

    pub fn level_config_path(&self) -> Option<PathBuf> {
        self.level
            .as_deref()
            .map(|level| level_config_path(&self.engine, level))
    }
}

/// Resolve the engine executable based on priority:
/// 1. Explicit path
/// 2. PARSTAN_ENGINE environment variable
/// 3. `engine` from parstan.toml
/// 4. The vendored default
///
/// Relative paths are taken relative to the working directory.
pub fn resolve_engine_path(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    settings: &Settings,
    working_dir: &Path,
) -> PathBuf {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
        .or_else(|| settings.engine.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE));

    if chosen.is_absolute() {
        chosen
    } else {
        working_dir.join(chosen)
    }
}

/// Scratch directory shared by all workers: PARSTAN_TMP_DIR, else `<temp>/parstan`.
pub fn resolve_scratch_dir(env_value: Option<OsString>) -> PathBuf {
    env_value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("parstan"))
}

/// Create the scratch directory if needed. Safe to call repeatedly.
pub fn ensure_scratch_dir(path: &Path) -> Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(_) if path.is_dir() => Ok(()),
        Err(source) => Err(Error::ScratchDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// First conventional engine configuration file present in `dir`.
pub fn discover_project_config(dir: &Path) -> Option<PathBuf> {
    PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Level presets ship next to the engine: `<engine>/../../conf/config.level<level>.neon`.
pub fn level_config_path(engine: &Path, level: &str) -> PathBuf {
    engine
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""))
        .join("conf")
        .join(format!("config.level{}.neon", level))
}
