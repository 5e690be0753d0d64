//! # Command Runner
//!
//! Executes a command's run block. Calls the block cannot resolve itself
//! go through a fixed chain:
//!
//! 1. a helper declared on the command,
//! 2. the executor of a registered plugin with that name,
//! 3. otherwise an `UndefinedCall` error.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use super::{Command, CommandOption, RunBlock};
use crate::output::Output;
use crate::plugin::Executor;
use crate::registry::Registry;
use crate::script::{CallArgs, Host, Interpreter, ScriptError, Value};

/// Where a name resolved to during a run
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Helper(Value),
    /// A plugin's executor as a script object; nil when the plugin has none
    Plugin(Value),
    Unresolved,
}

pub struct Runner<'a> {
    command: &'a Command,
    registry: &'a Registry,
    interpreter: Interpreter,
    resolved: RefCell<HashMap<String, Resolution>>,
}

impl<'a> Runner<'a> {
    pub fn new(command: &'a Command, registry: &'a Registry) -> Self {
        Self {
            command,
            registry,
            interpreter: Interpreter::with_max_call_depth(registry.settings().max_call_depth),
            resolved: RefCell::new(HashMap::new()),
        }
    }

    pub fn command(&self) -> &Command {
        self.command
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Run the command's block with `options` bound
    pub fn run(&self, options: &[CommandOption]) -> Result<Value, ScriptError> {
        let arguments: BTreeMap<String, Value> =
            options.iter().map(CommandOption::to_mapping).collect();
        info!(
            "Running '{}' with arguments: {}",
            self.command.name(),
            serde_json::to_string(&arguments).unwrap_or_else(|_| format!("{:?}", arguments))
        );

        match self.command.block() {
            RunBlock::Noop => Ok(Value::Nil),
            RunBlock::Script(block) => self.interpreter.call_value(
                block,
                CallArgs::new(vec![Value::Map(arguments)]),
                self,
            ),
            RunBlock::Native(block) => block(self, &arguments),
        }
    }

    /// Resolve `name` through the helper/plugin chain, memoised per run
    pub fn resolve(&self, name: &str) -> Resolution {
        if let Some(resolution) = self.resolved.borrow().get(name) {
            return resolution.clone();
        }

        let resolution = if let Some(helper) = self.command.helper(name) {
            Resolution::Helper(helper.clone())
        } else if let Some(plugin) = self.registry.find_plugin(name) {
            Resolution::Plugin(
                plugin
                    .executor()
                    .map(Executor::to_value)
                    .unwrap_or_default(),
            )
        } else {
            Resolution::Unresolved
        };
        debug!("Resolved `{}` in '{}' to {:?}", name, self.command.name(), resolution);

        self.resolved
            .borrow_mut()
            .insert(name.to_string(), resolution.clone());
        resolution
    }

    /// Call `name` through the dispatch chain
    pub fn dispatch(&self, name: &str, args: CallArgs) -> Result<Value, ScriptError> {
        match self.resolve(name) {
            Resolution::Helper(helper) => self.interpreter.call_value(&helper, args, self),
            Resolution::Plugin(executor) => Ok(executor),
            Resolution::Unresolved => Err(ScriptError::undefined_call(name).at(args.position)),
        }
    }

    /// Write a line to the command's output
    pub fn say(&self, message: &str) {
        self.command.say(message);
    }

    /// Run another registered command with the options in `options`
    pub fn invoke(&self, name: &str, options: &BTreeMap<String, Value>) -> Result<Value, ScriptError> {
        let command = self
            .registry
            .lookup(name)
            .map_err(|e| ScriptError::runtime(e.to_string()))?;
        let bound: Vec<CommandOption> = options
            .iter()
            .map(|(key, value)| CommandOption::new(key).with_value(value.clone()))
            .collect();
        info!("'{}' invoking '{}'", self.command.name(), command.name());
        command.run(self.registry, &bound)
    }
}

impl Host for Runner<'_> {
    fn call(
        &self,
        name: &str,
        args: CallArgs,
        _interpreter: &Interpreter,
    ) -> Result<Value, ScriptError> {
        match name {
            "say" => {
                let message = args.get(0).to_string();
                self.say(&message);
                Ok(Value::Nil)
            }
            "invoke" => {
                let target = args.str(0, "command name")?;
                let options = match args.get(1) {
                    Value::Map(options) => options,
                    Value::Nil => args.named.clone(),
                    other => {
                        return Err(ScriptError::argument(format!(
                            "invoke options must be a map, got {}",
                            other.type_name()
                        )))
                    }
                };
                self.invoke(&target, &options)
            }
            _ => self.dispatch(name, args),
        }
    }

    fn output(&self) -> Output {
        self.command.output().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandConfig, Configurator};
    use crate::plugin::Plugin;
    use crate::script::{parse, NoHost, ScriptErrorKind};

    fn script(source: &str) -> Value {
        Interpreter::new()
            .eval_program(&parse(source).unwrap(), &NoHost)
            .unwrap()
    }

    fn command_from(name: &str, block: &str, output: &Output) -> Command {
        let interpreter = Interpreter::new();
        let mut command = Configurator::new(&interpreter)
            .configure(name, &script(block), &NoHost)
            .unwrap();
        command.set_output(output.clone());
        command
    }

    fn registry_with_yell_plugin() -> Registry {
        let mut registry = Registry::new();
        let executor = script(r#"#{ yell: |msg| "plugin #{msg}" }"#);
        registry.register_plugin(Plugin::new(
            "yeller",
            Some(Executor::new(executor)),
            Vec::new(),
        ));
        registry
    }

    #[test]
    fn test_run_block_receives_options() {
        let output = Output::memory();
        let command = command_from(
            "hello",
            r#"|cmd| {
                cmd.argument(:name, default: "world");
                cmd.on_run(|options| say("Hello, #{options[:name]}!"));
            }"#,
            &output,
        );
        let registry = Registry::new();

        command.run(&registry, &[]).unwrap();
        command
            .run(&registry, &[CommandOption::new("name").with_value("there")])
            .unwrap();
        assert_eq!(output.lines(), vec!["Hello, world!", "Hello, there!"]);
    }

    #[test]
    fn test_helper_shadows_plugin() {
        let output = Output::memory();
        let command = command_from(
            "shout",
            r#"|cmd| {
                cmd.helper(:yeller, || #{ yell: |msg| "helper #{msg}" });
                cmd.on_run(|options| say(yeller.yell("hi")));
            }"#,
            &output,
        );
        let registry = registry_with_yell_plugin();
        command.run(&registry, &[]).unwrap();
        assert_eq!(output.lines(), vec!["helper hi"]);
    }

    #[test]
    fn test_plugin_executor_is_reachable_by_name() {
        let output = Output::memory();
        let command = command_from(
            "shout",
            r#"|cmd| { cmd.on_run(|options| say(yeller.yell("hi"))) }"#,
            &output,
        );
        let registry = registry_with_yell_plugin();
        command.run(&registry, &[]).unwrap();
        assert_eq!(output.lines(), vec!["plugin hi"]);
    }

    #[test]
    fn test_unresolved_call_is_undefined() {
        let output = Output::memory();
        let command = command_from(
            "broken",
            r#"|cmd| { cmd.on_run(|options| nothing_here(1)) }"#,
            &output,
        );
        let err = command.run(&Registry::new(), &[]).unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::UndefinedCall);
        assert!(err.message.contains("nothing_here"));
    }

    #[test]
    fn test_resolution_is_memoised() {
        let command = Command::new("x", CommandConfig::new());
        let mut registry = Registry::new();
        let runner = Runner::new(&command, &registry);
        assert_eq!(runner.resolve("later"), Resolution::Unresolved);
        drop(runner);

        registry.register_plugin(Plugin::new("later", None, Vec::new()));
        let runner = Runner::new(&command, &registry);
        assert_eq!(runner.resolve("later"), Resolution::Plugin(Value::Nil));
        assert_eq!(runner.resolved.borrow().len(), 1);
    }

    #[test]
    fn test_second_resolve_is_served_from_cache() {
        let command = Command::new("x", CommandConfig::new());
        let registry = registry_with_yell_plugin();

        // Each fresh resolution wraps the executor in a new object, and
        // objects compare by identity.
        let runner = Runner::new(&command, &registry);
        let Resolution::Plugin(first) = runner.resolve("yeller") else {
            panic!("yeller should resolve to its plugin");
        };
        assert!(matches!(first, Value::Object(_)));
        assert_eq!(runner.resolve("yeller"), Resolution::Plugin(first.clone()));
        assert_eq!(runner.dispatch("yeller", CallArgs::default()).unwrap(), first);
        assert_eq!(runner.resolved.borrow().len(), 1);

        let other = Runner::new(&command, &registry);
        assert_ne!(other.resolve("yeller"), Resolution::Plugin(first));
    }

    #[test]
    fn test_plugin_methods_go_through_the_executor() {
        let output = Output::memory();
        let command = command_from(
            "shout",
            r#"|cmd| { cmd.on_run(|options| yeller.whisper("hi")) }"#,
            &output,
        );
        let err = command.run(&registry_with_yell_plugin(), &[]).unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::UndefinedCall);
        assert!(err.message.contains("undefined method `whisper` for map"), "{}", err.message);
    }

    #[test]
    fn test_invoke_runs_another_command() {
        let output = Output::memory();
        let mut registry = Registry::new();
        registry.register_command(command_from(
            "greet",
            r#"|cmd| {
                cmd.argument(:name, default: "world");
                cmd.on_run(|options| say("hi #{options.name}"));
            }"#,
            &output,
        ));
        let start = command_from(
            "start",
            r#"|cmd| { cmd.on_run(|options| { invoke(:greet, #{ name: "team" }); say("Woot") }) }"#,
            &output,
        );
        start.run(&registry, &[]).unwrap();
        assert_eq!(output.lines(), vec!["hi team", "Woot"]);

        let missing = command_from(
            "missing",
            r#"|cmd| { cmd.on_run(|options| invoke(:nope)) }"#,
            &output,
        );
        assert!(missing.run(&registry, &[]).is_err());
    }

    #[test]
    fn test_native_block_can_dispatch() {
        let output = Output::memory();
        let mut command = Command::new("native", CommandConfig::new().output(output.clone()));
        command.add_helper("double", script("|n| n * 2"));
        command.set_block(RunBlock::native(|runner, _options| {
            let doubled = runner.dispatch("double", CallArgs::new(vec![Value::Int(21)]))?;
            runner.say(&doubled.to_string());
            Ok(doubled)
        }));
        let value = command.run(&Registry::new(), &[]).unwrap();
        assert_eq!(value, Value::Int(42));
        assert_eq!(output.lines(), vec!["42"]);
    }
}
