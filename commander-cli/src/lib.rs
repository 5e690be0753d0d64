//! # Git Commander CLI Library
//!
//! The `git-cmd` front end: argument parsing, loading the working
//! directory's commands and running them.

pub mod cli;

pub use cli::{execute, help_text, CliContext, CliError};
