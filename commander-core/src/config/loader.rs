//! # Configuration Loader
//!
//! Loads and merges configuration from multiple sources:
//! 1. Default values (lowest priority)
//! 2. Configuration file (middle priority)
//! 3. Environment variables (highest priority)

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::config::CommanderConfig;
use crate::error::{CommanderError, Result};

/// Configuration loader with support for file and environment variable overrides
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Path to configuration file
    config_path: PathBuf,

    /// Environment variable prefix
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: "GIT_CMD".to_string(),
        }
    }
}

impl ConfigLoader {
    /// Create a new config loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config loader with a specific config file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            env_prefix: "GIT_CMD".to_string(),
        }
    }

    /// Use a different environment variable prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Get the default configuration file path
    fn default_config_path() -> PathBuf {
        if let Ok(config_path) = env::var("GIT_CMD_CONFIG") {
            return PathBuf::from(config_path);
        }

        let possible_paths = [
            PathBuf::from(".git-commander.toml"),
            dirs::config_dir()
                .map(|d| d.join("git-commander").join("config.toml"))
                .unwrap_or_else(|| PathBuf::from(".git-commander.toml")),
        ];

        for path in &possible_paths {
            if path.exists() {
                return path.clone();
            }
        }

        possible_paths[0].clone()
    }

    /// Load configuration with full hierarchy
    pub fn load(&self) -> Result<CommanderConfig> {
        let mut config = CommanderConfig::default();

        if self.config_path.exists() {
            debug!("Reading configuration from {}", self.config_path.display());
            let file_config = self.load_from_file()?;
            config = merge_file_config(config, file_config);
        }

        config = self.merge_env_config(config)?;

        config.validate().map_err(|e| {
            CommanderError::configuration(format!("Configuration validation failed: {}", e))
        })?;

        Ok(config)
    }

    fn load_from_file(&self) -> Result<FileConfig> {
        let content = std::fs::read_to_string(&self.config_path).map_err(|e| {
            CommanderError::configuration(format!(
                "Failed to read config file '{}': {}",
                self.config_path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            CommanderError::configuration(format!(
                "Failed to parse config file '{}': {}",
                self.config_path.display(),
                e
            ))
        })
    }

    fn merge_env_config(&self, mut config: CommanderConfig) -> Result<CommanderConfig> {
        let prefix = &self.env_prefix;

        if let Ok(val) = env::var(format!("{}_LOG_FILE", prefix)) {
            config.log.file = PathBuf::from(val);
        }
        if let Ok(val) = env::var(format!("{}_LOG_LEVEL", prefix)) {
            config.log.level = val;
        }
        if let Ok(val) = env::var(format!("{}_PLUGIN_DIR", prefix)) {
            config.plugins.native_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var(format!("{}_MAX_CALL_DEPTH", prefix)) {
            config.script.max_call_depth = parse_usize(&val, "MAX_CALL_DEPTH")?;
        }

        Ok(config)
    }
}

fn merge_file_config(mut base: CommanderConfig, file: FileConfig) -> CommanderConfig {
    if let Some(log) = file.log {
        if let Some(path) = log.file {
            base.log.file = path;
        }
        if let Some(level) = log.level {
            base.log.level = level;
        }
    }

    if let Some(plugins) = file.plugins {
        if let Some(dir) = plugins.native_dir {
            base.plugins.native_dir = dir;
        }
    }

    if let Some(sources) = file.sources {
        if let Some(path) = sources.workflow_file {
            base.sources.workflow_file = path;
        }
        if let Some(dir) = sources.commands_dir {
            base.sources.commands_dir = dir;
        }
        if let Some(dir) = sources.plugins_dir {
            base.sources.plugins_dir = dir;
        }
        if let Some(extension) = sources.extension {
            base.sources.extension = extension;
        }
    }

    if let Some(script) = file.script {
        if let Some(depth) = script.max_call_depth {
            base.script.max_call_depth = depth;
        }
    }

    base
}

/// Parse a usize from string
fn parse_usize(s: &str, name: &str) -> Result<usize> {
    s.parse::<usize>().map_err(|e| {
        CommanderError::configuration(format!(
            "Invalid {} '{}': must be a valid number. Error: {}",
            name, s, e
        ))
    })
}

/// Configuration structure for file-based config
/// Uses Option for all fields to allow partial configuration
#[derive(Debug, Clone, Deserialize)]
struct FileConfig {
    #[serde(default)]
    pub log: Option<FileLogConfig>,
    #[serde(default)]
    pub plugins: Option<FilePluginConfig>,
    #[serde(default)]
    pub sources: Option<FileSourceConfig>,
    #[serde(default)]
    pub script: Option<FileScriptConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileLogConfig {
    pub file: Option<PathBuf>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FilePluginConfig {
    pub native_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileSourceConfig {
    pub workflow_file: Option<PathBuf>,
    pub commands_dir: Option<PathBuf>,
    pub plugins_dir: Option<PathBuf>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileScriptConfig {
    pub max_call_depth: Option<usize>,
}
