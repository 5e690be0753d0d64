//! Loads commands from script text.

use std::cell::RefCell;

use tracing::{debug, warn};

use super::{ErrorDetail, Loader, LoaderError, LoaderResult};
use crate::command::Configurator;
use crate::plugin::{PluginLoader, PluginSource};
use crate::registry::{Registry, RegistrySettings};
use crate::script::{CallArgs, Host, Interpreter, ScriptError, Value};

/// Evaluates script text exposing `command(name, block)` and
/// `plugin(name)`.
///
/// A failing `command` block is recorded as a configuration error and the
/// rest of the text still loads. Anything else that fails while evaluating
/// discards the partial result and records a single parse error.
#[derive(Debug, Clone)]
pub struct RawLoader {
    settings: RegistrySettings,
}

impl RawLoader {
    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self { settings }
    }
}

impl Loader for RawLoader {
    type Input = String;

    fn new(registry: &Registry) -> Self {
        Self::with_settings(registry.settings().clone())
    }

    fn load(self, source: String) -> LoaderResult {
        let interpreter = Interpreter::with_max_call_depth(self.settings.max_call_depth);
        let host = RawHost {
            settings: &self.settings,
            result: RefCell::new(LoaderResult::new()),
        };

        match interpreter.eval_source(&source, &host) {
            Ok(_) => host.result.into_inner(),
            Err(err) => {
                warn!("Failed to parse commands: {}", err);
                LoaderResult::failed(LoaderError::CommandParse(ErrorDetail::from_script(&err)))
            }
        }
    }
}

struct RawHost<'a> {
    settings: &'a RegistrySettings,
    result: RefCell<LoaderResult>,
}

impl RawHost<'_> {
    fn command(&self, args: &CallArgs, interpreter: &Interpreter) {
        let outcome = args.str(0, "command name").and_then(|name| {
            debug!("Loading command :{}", name);
            Configurator::new(interpreter).configure(&name, &args.get(1), self)
        });
        match outcome {
            Ok(command) => self.result.borrow_mut().add_command(command),
            Err(err) => {
                warn!("Failed to configure command: {}", err);
                self.result
                    .borrow_mut()
                    .add_error(LoaderError::CommandConfiguration(ErrorDetail::from_script(&err)));
            }
        }
    }

    fn plugin(&self, args: &CallArgs) -> Result<(), ScriptError> {
        let source = PluginSource::parse(&args.str(0, "plugin name")?);
        debug!("Loading plugin {:?}", source);
        let nested = PluginLoader::with_settings(self.settings.clone()).load(source);
        self.result.borrow_mut().merge_plugins(nested);
        Ok(())
    }
}

impl Host for RawHost<'_> {
    fn call(
        &self,
        name: &str,
        args: CallArgs,
        interpreter: &Interpreter,
    ) -> Result<Value, ScriptError> {
        match name {
            "command" => {
                self.command(&args, interpreter);
                Ok(Value::Nil)
            }
            "plugin" => {
                self.plugin(&args)?;
                Ok(Value::Nil)
            }
            _ => Err(ScriptError::undefined_call(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Output;

    fn load(source: &str) -> LoaderResult {
        let registry = Registry::new();
        RawLoader::new(&registry).load(source.to_string())
    }

    #[test]
    fn test_load_hello_command() {
        let result = load(
            r#"
            command(:hello, |cmd| {
                cmd.argument(:name, default: "world");
                cmd.on_run(|options| {
                    say("Hello, #{options[:name]}!");
                });
            });
            "#,
        );
        assert!(result.is_success());
        assert_eq!(result.command_names(), vec!["hello"]);

        let mut command = result.commands[0].clone();
        let output = Output::memory();
        command.set_output(output.clone());
        command.run(&Registry::new(), &[]).unwrap();
        assert_eq!(output.lines(), vec!["Hello, world!"]);
    }

    #[test]
    fn test_configuration_failure_is_isolated() {
        let result = load(
            r#"
            command(:bad, |cmd| { cmd.danger() });
            command(:good, |cmd| { cmd.summary("fine") });
            "#,
        );
        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], LoaderError::CommandConfiguration(_)));
        assert_eq!(result.command_names(), vec!["good"]);
    }

    #[test]
    fn test_parse_failure_discards_everything() {
        let result = load(
            r#"
            command(:first, |cmd| { });
            command(:hello d |cmd| { })
            "#,
        );
        assert!(!result.is_success());
        assert!(result.commands.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], LoaderError::CommandParse(_)));
        assert!(result.errors[0].message().starts_with("syntax error"));
        assert_eq!(result.errors[0].trace(), ["at 3:28"]);
    }

    #[test]
    fn test_long_chains_are_parse_errors() {
        for source in [
            format!("let v = 1{}", " + 1".repeat(3_000)),
            format!("let v = 1{}", ".to_string()".repeat(20_000)),
            format!("let v = {}1{}", "\"#{".repeat(500), "}\"".repeat(500)),
            format!("let v = {}1{}", "(".repeat(100), ")".repeat(100)),
        ] {
            let result = load(&source);
            assert_eq!(result.errors.len(), 1);
            assert!(matches!(result.errors[0], LoaderError::CommandParse(_)));
            assert!(result.errors[0].message().contains("nesting too deep"));
        }
    }

    #[test]
    fn test_top_level_runtime_error_is_parse_error() {
        let result = load("command(:ok, |cmd| {}); explode()");
        assert!(result.commands.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], LoaderError::CommandParse(_)));
        assert!(!result.errors[0].trace().is_empty());
    }

    #[test]
    fn test_unknown_plugin_is_recorded() {
        let result = load("plugin(:does_not_exist)");
        assert!(!result.is_success());
        assert!(matches!(result.errors[0], LoaderError::PluginLoad(_)));
        assert!(result.plugins.is_empty());
    }

    #[test]
    fn test_native_system_plugin() {
        let result = load("plugin(:system)");
        assert!(result.is_success(), "{:?}", result.errors);
        assert_eq!(result.plugins.len(), 1);
        assert_eq!(result.plugins[0].name(), "system");
        assert!(result.plugins[0].executor().is_some());
    }

    #[test]
    fn test_garbage_input_never_panics() {
        for source in ["@@@", "command(", "command(:x, |cmd| { cmd.on_run( })", "{{{{", "\"#{"] {
            let result = load(source);
            assert_eq!(result.errors.len(), 1);
        }
    }
}
