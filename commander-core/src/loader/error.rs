//! Errors recorded by loaders.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::script::ScriptError;

/// Message and trace of a recorded failure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorDetail {
    pub message: String,
    pub trace: Vec<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn from_script(err: &ScriptError) -> Self {
        let mut trace = Vec::with_capacity(err.trace.len() + 1);
        if let Some(position) = err.position {
            trace.push(format!("at {}", position));
        }
        trace.extend(err.trace.iter().cloned());
        Self {
            message: err.message.clone(),
            trace,
        }
    }

    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        Self {
            message: format!("{}: {}", path.display(), err),
            trace: vec![format!("reading {}", path.display())],
        }
    }

    /// Prefix the message with where the failure happened
    pub fn context(mut self, context: impl AsRef<str>) -> Self {
        self.message = format!("{}: {}", context.as_ref(), self.message);
        self
    }
}

/// A failure recorded in a `LoaderResult`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoaderError {
    /// The whole input failed to parse or evaluate
    #[error("CommandParseError: {}", .0.message)]
    CommandParse(ErrorDetail),

    /// One `command` declaration failed
    #[error("CommandConfigurationError: {}", .0.message)]
    CommandConfiguration(ErrorDetail),

    /// A command file does not exist
    #[error("FileNotFoundError: {}", .0.message)]
    FileNotFound(ErrorDetail),

    /// A command file exists but could not be read
    #[error("FileLoadError: {}", .0.message)]
    FileLoad(ErrorDetail),

    /// A plugin source is missing or unreadable
    #[error("LoadError: {}", .0.message)]
    PluginLoad(ErrorDetail),

    /// A plugin source failed to evaluate
    #[error("NotFoundError: {}", .0.message)]
    PluginNotFound(ErrorDetail),
}

impl LoaderError {
    pub fn detail(&self) -> &ErrorDetail {
        match self {
            Self::CommandParse(detail)
            | Self::CommandConfiguration(detail)
            | Self::FileNotFound(detail)
            | Self::FileLoad(detail)
            | Self::PluginLoad(detail)
            | Self::PluginNotFound(detail) => detail,
        }
    }

    pub fn message(&self) -> &str {
        &self.detail().message
    }

    pub fn trace(&self) -> &[String] {
        &self.detail().trace
    }

    /// Stable name of the error kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::CommandParse(_) => "CommandParseError",
            Self::CommandConfiguration(_) => "CommandConfigurationError",
            Self::FileNotFound(_) => "FileNotFoundError",
            Self::FileLoad(_) => "FileLoadError",
            Self::PluginLoad(_) => "LoadError",
            Self::PluginNotFound(_) => "NotFoundError",
        }
    }
}
