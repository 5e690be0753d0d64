//! Outcome of a load.

use tracing::warn;

use super::LoaderError;
use crate::command::Command;
use crate::plugin::Plugin;

/// Commands, plugins and errors produced by one load.
///
/// A result with any error is a failure, even when it also carries
/// commands; registries only commit successful results.
#[derive(Debug, Clone, Default)]
pub struct LoaderResult {
    pub commands: Vec<Command>,
    pub plugins: Vec<Plugin>,
    pub errors: Vec<LoaderError>,
}

impl LoaderResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result holding a single error
    pub fn failed(error: LoaderError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Add a plugin unless one with the same name is already present.
    /// The first plugin loaded under a name wins.
    pub fn add_plugin(&mut self, plugin: Plugin) {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            warn!(
                "Plugin :{} already loaded, ignoring duplicate",
                plugin.name()
            );
            return;
        }
        self.plugins.push(plugin);
    }

    pub fn add_error(&mut self, error: LoaderError) {
        self.errors.push(error);
    }

    /// Union the plugins of `other` into this result and keep its errors
    pub fn merge_plugins(&mut self, other: LoaderResult) {
        for plugin in other.plugins {
            self.add_plugin(plugin);
        }
        self.errors.extend(other.errors);
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(Command::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandConfig;
    use crate::loader::ErrorDetail;

    #[test]
    fn test_success_depends_on_errors_only() {
        let mut result = LoaderResult::new();
        assert!(result.is_success());

        result.add_command(Command::new("hello", CommandConfig::new()));
        assert!(result.is_success());

        result.add_error(LoaderError::CommandConfiguration(ErrorDetail::new("boom")));
        assert!(!result.is_success());
        assert_eq!(result.command_names(), vec!["hello"]);
    }

    #[test]
    fn test_plugins_are_unioned_by_name() {
        let mut result = LoaderResult::new();
        result.add_plugin(Plugin::new("system", None, Vec::new()));

        let mut other = LoaderResult::new();
        other.add_plugin(Plugin::new("system", None, vec![Command::new("x", CommandConfig::new())]));
        other.add_plugin(Plugin::new("git", None, Vec::new()));
        other.add_error(LoaderError::PluginLoad(ErrorDetail::new("missing")));

        result.merge_plugins(other);
        assert_eq!(result.plugins.len(), 2);
        assert!(result.plugins[0].commands().is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_failed() {
        let result = LoaderResult::failed(LoaderError::FileNotFound(ErrorDetail::new("nope")));
        assert!(!result.is_success());
        assert!(result.commands.is_empty());
    }
}
