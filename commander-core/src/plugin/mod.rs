//! # Plugins
//!
//! A plugin bundles an executor (the object its name resolves to inside run
//! blocks) with the commands it contributes under `"<plugin>:<command>"`.

mod executor;
mod loader;
mod native;

pub use executor::Executor;
pub use loader::{namespace, PluginLoader, PluginSource};
pub use native::{native_executor, NativeExecutor, SystemExecutor, NATIVE_EXECUTORS};

use thiserror::Error;

use crate::command::Command;

/// Plugin lookup errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("command `{command}` does not exist in plugin `{plugin}`")]
    PluginCommandNotFound { plugin: String, command: String },
}

#[derive(Debug, Clone)]
pub struct Plugin {
    name: String,
    executor: Option<Executor>,
    commands: Vec<Command>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, executor: Option<Executor>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            executor,
            commands,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executor(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Find a contributed command by full (`git-helpers:current`) or short
    /// (`current`) name
    pub fn find_command(&self, name: &str) -> Result<&Command, PluginError> {
        let name = name.trim().trim_start_matches(':');
        let qualified = format!("{}:{}", namespace(&self.name), name);
        self.commands
            .iter()
            .find(|c| c.name() == name || c.name() == qualified)
            .ok_or_else(|| PluginError::PluginCommandNotFound {
                plugin: self.name.clone(),
                command: name.to_string(),
            })
    }
}
