//! # Bootstrap
//!
//! Loads the commands and plugins of the working directory:
//!
//! 1. the `Workflow` file,
//! 2. every command file in `.git-commands/`,
//! 3. every plugin file in `.git-commands/plugins/`.
//!
//! Missing files and directories are skipped. A failed load is reported
//! and leaves the registry as it was.

use std::fs;
use std::path::{Path, PathBuf};

use commander_core::{FileLoader, LoaderError, PluginLoader, PluginSource};
use tracing::{debug, info, warn};

use super::context::CliContext;

/// A source whose load failed
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub errors: Vec<LoaderError>,
}

/// Load every source of the working directory into the context's registry
pub fn load_sources(context: &mut CliContext) -> Vec<LoadFailure> {
    let sources = context.config.sources.clone();
    let extension = sources.extension.trim_start_matches('.').to_string();
    let mut failures = Vec::new();

    let workflow = context.resolve(&sources.workflow_file);
    if workflow.is_file() {
        let result = context.registry.load::<FileLoader>(workflow.clone());
        record(&mut failures, workflow, result.errors);
    } else {
        debug!("No workflow file at {}", workflow.display());
    }

    for path in files_with_extension(&context.resolve(&sources.commands_dir), &extension) {
        let result = context.registry.load::<FileLoader>(path.clone());
        record(&mut failures, path, result.errors);
    }

    for path in files_with_extension(&context.resolve(&sources.plugins_dir), &extension) {
        let result = context
            .registry
            .load::<PluginLoader>(PluginSource::Path(path.clone()));
        record(&mut failures, path, result.errors);
    }

    info!(
        "Loaded {} command(s) and {} plugin(s)",
        context.registry.command_names().len(),
        context.registry.plugin_names().len()
    );
    failures
}

fn record(failures: &mut Vec<LoadFailure>, path: PathBuf, errors: Vec<LoaderError>) {
    if errors.is_empty() {
        return;
    }
    warn!("Failed to load {}: {} error(s)", path.display(), errors.len());
    failures.push(LoadFailure { path, errors });
}

/// Files in `dir` ending in `.extension`, sorted by name. A missing
/// directory has none.
fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            debug!("Skipping {}", dir.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().map_or(false, |ext| ext == extension))
        .collect();
    files.sort();
    files
}
