//! # Commander Error Types
//!
//! Centralized error handling for the commander core library.
//!
//! Component errors (`RegistryError`, `PluginError`, `LoaderError`,
//! `ScriptError`) live next to the code that raises them. `CommanderError`
//! is the crate-level error that wraps them for callers that do not care
//! which component failed.

use thiserror::Error;

use crate::loader::LoaderError;
use crate::plugin::PluginError;
use crate::registry::RegistryError;
use crate::script::ScriptError;

/// Result type alias for commander operations
pub type Result<T> = std::result::Result<T, CommanderError>;

/// Core error types for commander
#[derive(Error, Debug)]
pub enum CommanderError {
    /// Registry lookup errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Plugin errors
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Loader errors
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Script evaluation errors
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CommanderError {
    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error means a lookup came back empty
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Registry(RegistryError::CommandNotFound { .. })
                | Self::Plugin(PluginError::PluginCommandNotFound { .. })
        )
    }
}

impl From<toml::de::Error> for CommanderError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
