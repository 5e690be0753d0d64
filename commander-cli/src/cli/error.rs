//! # Error Handling
//!
//! The CLI's error type and the formatting of errors and warnings.

use std::fmt;

use colored::*;
use commander_core::{LoaderError, ScriptError};

/// Exit status for a command that failed while running
pub const EXIT_FAILURE: i32 = 1;

/// Exit status for bad command options (`EX_USAGE`)
pub const EXIT_USAGE: i32 = 64;

/// An error reported to the user
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub suggestions: Vec<String>,
    pub exit_code: i32,
    pub source: Option<anyhow::Error>,
}

impl CliError {
    /// Create a new error exiting with status 1
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            exit_code: EXIT_FAILURE,
            source: None,
        }
    }

    /// Bad command options
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message).with_exit_code(EXIT_USAGE)
    }

    /// A command's run block failed
    pub fn run_failed(command: &str, err: &ScriptError) -> Self {
        let mut error = Self::new(format!("`{}` failed: {}", command, err.message));
        if !err.trace.is_empty() {
            error = error.with_source(anyhow::anyhow!(err.trace.join("\n  ")));
        }
        error
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set exit code
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Attach source error
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Format an error for display
pub fn format_error(error: &CliError) -> String {
    let mut output = format!("{} {}\n", "Error:".red().bold(), error.message);

    if !error.suggestions.is_empty() {
        output.push_str(&format!("\n{}", "Suggestions:".cyan().bold()));
        for (i, suggestion) in error.suggestions.iter().enumerate() {
            output.push_str(&format!("\n  {}. {}", i + 1, suggestion));
        }
        output.push('\n');
    }

    if let Some(source) = &error.source {
        output.push_str(&format!("\n{}\n  {}\n", "Details:".yellow(), source));
    }

    output
}

/// Print an error to stderr
pub fn print_error(error: &CliError) {
    eprintln!("{}", format_error(error));
}

/// Format a warning message
pub fn format_warning(message: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), message)
}

/// Print a warning to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}", format_warning(message));
}

/// One warning line per loader error, with its trace indented below
pub fn format_load_errors(source: &str, errors: &[LoaderError]) -> Vec<String> {
    errors
        .iter()
        .map(|error| {
            let mut line = format!("could not load {}: {}", source, error);
            for frame in error.trace() {
                line.push_str(&format!("\n    {}", frame));
            }
            line
        })
        .collect()
}
