//! # Command Registry
//!
//! The directory of known commands and plugins. Loaders never touch it
//! directly: their results are committed through [`Registry::load`], and
//! only when they succeeded.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use crate::command::{canonical_command_name, Command, CommandConfig, CommandOption};
use crate::config::{CommanderConfig, DEFAULT_NATIVE_PLUGIN_DIR};
use crate::loader::{Loader, LoaderResult};
use crate::plugin::{namespace, Executor, Plugin};
use crate::script::{Value, DEFAULT_MAX_CALL_DEPTH};

/// Registry lookup errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command `{name}` not found in registry `{registry}` (available: {})", .available.join(", "))]
    CommandNotFound {
        name: String,
        registry: String,
        available: Vec<String>,
    },
}

/// What loaders built from this registry need to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub native_plugin_dir: PathBuf,
    /// Extension of plugin files, without the dot
    pub extension: String,
    pub max_call_depth: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            native_plugin_dir: PathBuf::from(DEFAULT_NATIVE_PLUGIN_DIR),
            extension: "gcmd".to_string(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl From<&CommanderConfig> for RegistrySettings {
    fn from(config: &CommanderConfig) -> Self {
        Self {
            native_plugin_dir: config.plugins.native_dir.clone(),
            extension: config.sources.extension.trim_start_matches('.').to_string(),
            max_call_depth: config.script.max_call_depth,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    tag: String,
    commands: HashMap<String, Command>,
    plugins: HashMap<String, Plugin>,
    settings: RegistrySettings,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            tag: "default".to_string(),
            commands: HashMap::new(),
            plugins: HashMap::new(),
            settings,
        }
    }

    /// Rename the registry; the tag only shows up in errors and logs
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Build a command from `config` and register it
    pub fn register(&mut self, name: impl AsRef<str>, config: CommandConfig) -> &mut Self {
        self.register_command(Command::new(name, config))
    }

    /// Register a command, replacing any command with the same name
    pub fn register_command(&mut self, command: Command) -> &mut Self {
        info!("Registering command '{}' in {}", command.name(), self.tag);
        self.commands.insert(command.name().to_string(), command);
        self
    }

    /// Register a plugin and every command it contributes
    pub fn register_plugin(&mut self, plugin: Plugin) -> &mut Self {
        info!(
            "Registering plugin '{}' with {} command(s) in {}",
            plugin.name(),
            plugin.commands().len(),
            self.tag
        );
        for command in plugin.commands() {
            self.register_command(command.clone());
        }
        self.plugins.insert(plugin.name().to_string(), plugin);
        self
    }

    /// Run loader `L` over `input`. A successful result is committed,
    /// plugins first; a failed one leaves the registry untouched. The
    /// result is returned either way.
    pub fn load<L: Loader>(&mut self, input: impl Into<L::Input>) -> LoaderResult {
        let result = L::new(self).load(input.into());
        if result.is_success() {
            for plugin in &result.plugins {
                self.register_plugin(plugin.clone());
            }
            for command in &result.commands {
                self.register_command(command.clone());
            }
        } else {
            info!(
                "Not committing load into {}: {} error(s)",
                self.tag,
                result.errors.len()
            );
        }
        result
    }

    pub fn find(&self, name: &str) -> Result<&Command, RegistryError> {
        let name = canonical_command_name(name);
        self.commands.get(&name).ok_or_else(|| {
            let available = self.command_names();
            error!(
                "{} not found in registry {}. Available commands: {:?}",
                name, self.tag, available
            );
            RegistryError::CommandNotFound {
                name,
                registry: self.tag.clone(),
                available,
            }
        })
    }

    /// Find `name`, asking the owning plugin when it is a
    /// `"<plugin>:<command>"` name the registry does not know, so the error
    /// names the plugin rather than the registry
    pub fn lookup(&self, name: &str) -> crate::Result<&Command> {
        let missing = match self.find(name) {
            Ok(command) => return Ok(command),
            Err(err) => err,
        };
        let canonical = canonical_command_name(name);
        let owner = canonical.split_once(':').and_then(|(prefix, _)| {
            self.plugins
                .values()
                .find(|plugin| namespace(plugin.name()) == prefix)
        });
        match (owner, canonical.split_once(':')) {
            (Some(plugin), Some((_, command))) => Ok(plugin.find_command(command)?),
            _ => Err(missing.into()),
        }
    }

    pub fn find_plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name.trim().trim_start_matches(':'))
    }

    /// The executor of the plugin named `name`, if it has one
    pub fn executor(&self, name: &str) -> Option<&Executor> {
        self.find_plugin(name).and_then(Plugin::executor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&canonical_command_name(name))
    }

    /// Sorted command names
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted plugin names
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Find `name` and run it with `bound` options
    pub fn run(&self, name: &str, bound: &[CommandOption]) -> crate::Result<Value> {
        let command = self.lookup(name)?;
        Ok(command.run(self, bound)?)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
