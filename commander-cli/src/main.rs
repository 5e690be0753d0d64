//! # git-cmd
//!
//! Runs custom git commands from a centralized location.

use anyhow::{Context, Result};
use clap::Parser;
use commander_cli::cli::{self, error, Cli, CliContext, CliError};
use commander_core::{CommanderConfig, ConfigLoader};
use tracing::{info, warn};

fn load_config(args: &Cli) -> Result<CommanderConfig> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.config_path().display()))?;

    if let Some(path) = &args.log_file {
        config.log.file = path.clone();
    }
    if let Some(dir) = &args.plugin_dir {
        config.plugins.native_dir = dir.clone();
    }
    Ok(config)
}

fn run(args: &Cli, config: CommanderConfig) -> std::result::Result<(), CliError> {
    let mut context = CliContext::new(config);

    for failure in cli::load_sources(&mut context) {
        let source = failure.path.display().to_string();
        for line in error::format_load_errors(&source, &failure.errors) {
            error::print_warning(&line);
        }
    }

    cli::execute(&context, &args.invocation())
}

fn main() {
    let args = Cli::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            let error = CliError::new(format!("{:#}", err))
                .with_suggestion("Check the file passed with --config or GIT_CMD_CONFIG");
            error::print_error(&error);
            std::process::exit(error.exit_code);
        }
    };

    cli::init_logging(&config.log);
    info!("git-cmd {} starting", commander_core::VERSION);

    let code = match run(&args, config) {
        Ok(()) => 0,
        Err(err) => {
            warn!("git-cmd failed: {}", err);
            error::print_error(&err);
            err.exit_code
        }
    };
    std::process::exit(code);
}
