//! # Commander Configuration
//!
//! Each layer overrides the ones below it:
//!
//! ```text
//! environment   GIT_CMD_LOG_LEVEL=debug
//! file          .git-commander.toml  ([log] level = "info")
//! defaults      impl Default for LogConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod loader;

pub use loader::ConfigLoader;

use crate::error::{CommanderError, Result};
use crate::script::DEFAULT_MAX_CALL_DEPTH;

/// Directory of the bundled plugins
pub const DEFAULT_NATIVE_PLUGIN_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/plugins");

/// Default log file of the `git-cmd` binary
pub const DEFAULT_LOG_FILE: &str = "/tmp/git-commander.log";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CommanderConfig {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub plugins: PluginConfig,

    #[serde(default)]
    pub sources: SourceConfig,

    #[serde(default)]
    pub script: ScriptConfig,
}

impl CommanderConfig {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.log.validate()?;
        self.sources.validate()?;
        self.script.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogConfig {
    pub file: PathBuf,
    /// An `EnvFilter` directive such as `info` or `commander_core=debug`
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.level.trim().is_empty() {
            return Err(CommanderError::configuration("log.level must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginConfig {
    /// Where bare plugin handles such as `system` are looked up
    pub native_dir: PathBuf,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            native_dir: PathBuf::from(DEFAULT_NATIVE_PLUGIN_DIR),
        }
    }
}

/// Where the CLI looks for command and plugin files, relative to the
/// working directory
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceConfig {
    pub workflow_file: PathBuf,
    pub commands_dir: PathBuf,
    pub plugins_dir: PathBuf,
    pub extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            workflow_file: PathBuf::from("Workflow"),
            commands_dir: PathBuf::from(".git-commands"),
            plugins_dir: PathBuf::from(".git-commands/plugins"),
            extension: "gcmd".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        let extension = self.extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(CommanderError::configuration(
                "sources.extension must not be empty",
            ));
        }
        if extension.contains('/') {
            return Err(CommanderError::configuration(format!(
                "sources.extension '{}' must not contain a path separator",
                self.extension
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptConfig {
    pub max_call_depth: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl ScriptConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_call_depth == 0 {
            return Err(CommanderError::configuration(
                "script.max_call_depth must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CommanderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sources.extension, "gcmd");
        assert_eq!(config.script.max_call_depth, 64);
        assert!(config.plugins.native_dir.ends_with("plugins"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CommanderConfig::default();
        config.sources.extension = ".".to_string();
        assert!(config.validate().is_err());

        let mut config = CommanderConfig::default();
        config.script.max_call_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_call_depth"));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: CommanderConfig = toml::from_str(
            r#"
            [log]
            file = "/var/log/gc.log"
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.sources, SourceConfig::default());
    }
}
