use crate::args::AnalyseArgs;
use crate::formatters::{FormatContext, FormatterRegistry};
use crate::progress::ConsoleProgress;
use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use parstan_runtime::config::{SETTINGS_FILE, discover_project_config};
use parstan_runtime::discovery::absolutize;
use parstan_runtime::{CancelToken, NoProgress, ProgressSink, RunConfig, Settings, analyse};
use std::io::{self, Write};
use std::path::Path;

pub fn handle(args: AnalyseArgs) -> Result<i32> {
    let working_dir =
        std::env::current_dir().context("Cannot determine the current working directory")?;
    let settings = Settings::load_from(&working_dir.join(SETTINGS_FILE))?;

    let format = match args.deprecated_error_format.clone() {
        Some(format) => {
            eprintln!("Note: Using the option --errorFormat is deprecated. Use --error-format instead.");
            format
        }
        None => args.error_format.clone(),
    };

    let config = build_config(&args, &working_dir, &settings);
    tracing::debug!(?config, "resolved run configuration");

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!("Cannot install the interrupt handler: {}", e);
    }

    let mut console;
    let mut quiet = NoProgress;
    let sink: &mut dyn ProgressSink = if config.no_progress {
        &mut quiet
    } else {
        console = ConsoleProgress::stderr();
        &mut console
    };

    let report = analyse(&config, &args.paths, sink, &cancel)?;

    let registry = FormatterRegistry::with_defaults(FormatContext {
        relative_to: working_dir,
        color: io::stdout().is_terminal(),
    });
    let Some(formatter) = registry.get(&format) else {
        anyhow::bail!(
            "Error formatter \"{}\" not found. Available error formatters are: {}",
            format,
            registry.names().join(", ")
        );
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = formatter.format_errors(&report, &mut out)?;
    out.flush()?;

    Ok(code)
}

fn build_config(args: &AnalyseArgs, working_dir: &Path, settings: &Settings) -> RunConfig {
    let mut config = RunConfig::from_settings(working_dir.to_path_buf(), settings);

    if let Some(engine) = &args.engine {
        config.engine = absolutize(engine, working_dir);
    }
    if let Some(processes) = args.processes {
        config.workers = usize::from(processes);
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }

    config.project_config = match &args.configuration {
        Some(path) => Some(absolutize(path, working_dir)),
        None => {
            let discovered = discover_project_config(working_dir);
            if let Some(path) = &discovered {
                eprintln!("Note: Using configuration file {}.", path.display());
            }
            discovered
        }
    };
    config.autoload_file = args
        .autoload_file
        .as_deref()
        .map(|path| absolutize(path, working_dir));
    config.level = args.level.clone();
    config.no_progress = args.no_progress;

    config
}
