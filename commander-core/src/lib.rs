//! # Commander Core Library
//!
//! Core library for git-commander, which runs custom git commands from a
//! centralized location.
//!
//! ## Architecture
//!
//! - **Script**: the small scripting language commands and plugins are written in
//! - **Command**: options, run blocks, helpers and usage text
//! - **Registry**: the directory of known commands and plugins
//! - **Loader**: raw text and file loaders reporting through a `LoaderResult`
//! - **Plugin**: executors and the commands they contribute
//! - **Config**: layered configuration (defaults, file, environment)
//!
//! ```text
//! text / file ─► Loader ─► LoaderResult ─► Registry::load ─► Registry
//!                                                             │
//! CLI ─► Registry::find ─► Command::run ─► Runner ─► helper / plugin executor
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod plugin;
pub mod registry;
pub mod script;

pub use command::{Command, CommandConfig, CommandOption, OptionKind, RunBlock};
pub use config::{CommanderConfig, ConfigLoader};
pub use error::{CommanderError, Result};
pub use loader::{FileLoader, Loader, LoaderError, LoaderResult, RawLoader};
pub use output::Output;
pub use plugin::{Executor, Plugin, PluginLoader, PluginSource};
pub use registry::{Registry, RegistryError, RegistrySettings};
pub use script::{ScriptError, ScriptErrorKind, Value};

/// Version of the commander libraries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
