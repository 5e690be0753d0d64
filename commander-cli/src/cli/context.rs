//! # Command Context
//!
//! Everything a `git-cmd` invocation runs against.

use std::path::{Path, PathBuf};

use commander_core::{CommanderConfig, Output, Registry, RegistrySettings};

pub struct CliContext {
    pub config: CommanderConfig,
    pub registry: Registry,
    /// Directory `Workflow` and `.git-commands` are looked up in
    pub work_dir: PathBuf,
    /// Where the top-level help listing goes
    pub output: Output,
}

impl CliContext {
    pub fn new(config: CommanderConfig) -> Self {
        let work_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
        Self::with_work_dir(config, work_dir)
    }

    pub fn with_work_dir(config: CommanderConfig, work_dir: impl Into<PathBuf>) -> Self {
        let registry = Registry::with_settings(RegistrySettings::from(&config)).tagged("git-cmd");
        Self {
            config,
            registry,
            work_dir: work_dir.into(),
            output: Output::stdout(),
        }
    }

    /// Create a minimal context (for testing)
    pub fn minimal(work_dir: &Path) -> Self {
        let mut context = Self::with_work_dir(CommanderConfig::default(), work_dir);
        context.output = Output::memory();
        context
    }

    /// `path` relative to the working directory, unless already absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_paths() {
        let context = CliContext::minimal(Path::new("/repo"));
        assert_eq!(context.resolve(Path::new("Workflow")), PathBuf::from("/repo/Workflow"));
        assert_eq!(context.resolve(Path::new("/etc/Workflow")), PathBuf::from("/etc/Workflow"));
        assert_eq!(context.registry.tag(), "git-cmd");
    }
}
