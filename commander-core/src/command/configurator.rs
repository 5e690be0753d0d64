//! # Command Configurator
//!
//! Builds a [`Command`] by running a declaration block against it. The
//! block receives the command as its argument, and bare calls inside the
//! block (`summary("...")`) reach the same command.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::{is_valid_name, Command, CommandConfig, CommandOption, OptionKind, RunBlock};
use crate::output::Output;
use crate::script::{CallArgs, CallContext, Host, Interpreter, ScriptError, ScriptObject, Value};

const BUILDER_METHODS: &[&str] = &[
    "name",
    "summary",
    "description",
    "argument",
    "flag",
    "switch",
    "option",
    "helper",
    "on_run",
];

/// The `cmd` object handed to declaration blocks
#[derive(Debug)]
pub struct CommandBuilder {
    command: RefCell<Command>,
}

impl CommandBuilder {
    pub fn new(command: Command) -> Self {
        Self {
            command: RefCell::new(command),
        }
    }

    /// Snapshot of the command built so far
    pub fn command(&self) -> Command {
        self.command.borrow().clone()
    }

    fn add_option(&self, kind: OptionKind, args: &CallArgs) -> Result<Value, ScriptError> {
        let name = args.str(0, &format!("{} name", kind))?;
        let mut option = CommandOption::new(&name);
        if !is_valid_name(option.name()) {
            return Err(ScriptError::argument(format!(
                "invalid {} name `{}`: expected a letter followed by letters, digits or underscores",
                kind, name
            )));
        }

        let default = args
            .named("default")
            .cloned()
            .or_else(|| args.positional.get(1).cloned());
        if let Some(default) = default {
            option = option.with_default(default);
        }
        match args.named("description") {
            Some(Value::Str(description)) => option = option.with_description(description.clone()),
            Some(Value::Nil) | None => {}
            Some(other) => {
                return Err(ScriptError::argument(format!(
                    "description of `{}` must be a string, got {}",
                    name,
                    other.type_name()
                )))
            }
        }

        self.command.borrow_mut().add_option(kind, option);
        Ok(Value::Nil)
    }
}

fn closure_arg(args: &CallArgs, index: usize, what: &str) -> Result<Value, ScriptError> {
    let value = args.get(index);
    if value.is_callable() {
        Ok(value)
    } else {
        Err(ScriptError::argument(format!(
            "{} expects a closure, got {}",
            what,
            value.type_name()
        )))
    }
}

impl ScriptObject for CommandBuilder {
    fn type_name(&self) -> &str {
        "command"
    }

    fn responds_to(&self, method: &str) -> bool {
        BUILDER_METHODS.contains(&method)
    }

    fn invoke(
        &self,
        method: &str,
        args: CallArgs,
        _ctx: &CallContext<'_>,
    ) -> Result<Value, ScriptError> {
        let position = args.position;
        let result = match method {
            "name" => Ok(Value::str(self.command.borrow().name())),
            "summary" => {
                let summary = args.str(0, "summary")?;
                self.command.borrow_mut().set_summary(summary);
                Ok(Value::Nil)
            }
            "description" => {
                let description = args.str(0, "description")?;
                self.command.borrow_mut().set_description(description);
                Ok(Value::Nil)
            }
            "argument" => self.add_option(OptionKind::Argument, &args),
            "flag" => self.add_option(OptionKind::Flag, &args),
            "switch" => self.add_option(OptionKind::Switch, &args),
            "option" => {
                let kind: OptionKind = args
                    .str(0, "option kind")?
                    .parse()
                    .map_err(|e: crate::error::CommanderError| ScriptError::argument(e.to_string()))?;
                let rest = CallArgs {
                    positional: args.positional.iter().skip(1).cloned().collect(),
                    named: args.named.clone(),
                    position,
                };
                self.add_option(kind, &rest)
            }
            "helper" => {
                let name = args.str(0, "helper name")?;
                let block = closure_arg(&args, 1, "helper")?;
                self.command.borrow_mut().add_helper(&name, block);
                Ok(Value::Nil)
            }
            "on_run" => {
                let block = closure_arg(&args, 0, "on_run")?;
                self.command.borrow_mut().set_block(RunBlock::Script(block));
                Ok(Value::Nil)
            }
            other => Err(ScriptError::undefined_method(other, "command")),
        };
        result.map_err(|e| e.at(position))
    }
}

/// Routes bare calls in a declaration block to the builder, then outward
struct ConfiguratorHost<'a> {
    builder: &'a CommandBuilder,
    outer: &'a dyn Host,
}

impl Host for ConfiguratorHost<'_> {
    fn call(
        &self,
        name: &str,
        args: CallArgs,
        interpreter: &Interpreter,
    ) -> Result<Value, ScriptError> {
        if self.builder.responds_to(name) {
            let ctx = CallContext {
                interpreter,
                host: self,
            };
            return self.builder.invoke(name, args, &ctx);
        }
        self.outer.call(name, args, interpreter)
    }

    fn output(&self) -> Output {
        self.outer.output()
    }
}

/// Creates commands from declaration blocks
pub struct Configurator<'a> {
    interpreter: &'a Interpreter,
}

impl<'a> Configurator<'a> {
    pub fn new(interpreter: &'a Interpreter) -> Self {
        Self { interpreter }
    }

    /// Create a command named `name` and run `block` (a closure, or nil)
    /// against it. Any error raised by the block is returned unchanged;
    /// loaders decide how to report it.
    pub fn configure(
        &self,
        name: &str,
        block: &Value,
        host: &dyn Host,
    ) -> Result<Command, ScriptError> {
        debug!("Configuring command :{}", name);
        let builder = Rc::new(CommandBuilder::new(Command::new(name, CommandConfig::new())));

        match block {
            Value::Nil => {}
            Value::Closure(_) => {
                let receiver: Rc<dyn ScriptObject> = builder.clone();
                let scoped = ConfiguratorHost {
                    builder: &builder,
                    outer: host,
                };
                self.interpreter.call_value(
                    block,
                    CallArgs::new(vec![Value::Object(receiver)]),
                    &scoped,
                )?;
            }
            other => {
                return Err(ScriptError::argument(format!(
                    "command `{}` expects a closure, got {}",
                    name,
                    other.type_name()
                )))
            }
        }

        Ok(builder.command())
    }
}
