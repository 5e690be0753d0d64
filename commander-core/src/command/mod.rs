//! # Commands
//!
//! A command is a name, three option collections (arguments, flags and
//! switches), a run block and optional command-local helpers.

mod configurator;
mod help;
mod option;
mod runner;

pub use configurator::{CommandBuilder, Configurator};
pub use help::{flag_spellings, long_flag, FlagSpelling, PROGRAM_NAME};
pub use option::{canonical_name, is_valid_name, CommandOption, OptionKind};
pub use runner::{Resolution, Runner};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::output::Output;
use crate::registry::Registry;
use crate::script::{ScriptError, Value};

/// Native run block for commands registered from Rust
pub type NativeBlock =
    Rc<dyn Fn(&Runner<'_>, &BTreeMap<String, Value>) -> std::result::Result<Value, ScriptError>>;

/// What a command does when run
#[derive(Clone, Default)]
pub enum RunBlock {
    /// Does nothing
    #[default]
    Noop,
    /// A script closure, called with the bound options map
    Script(Value),
    /// A Rust closure
    Native(NativeBlock),
}

impl RunBlock {
    pub fn native<F>(block: F) -> Self
    where
        F: Fn(&Runner<'_>, &BTreeMap<String, Value>) -> std::result::Result<Value, ScriptError>
            + 'static,
    {
        Self::Native(Rc::new(block))
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

impl fmt::Debug for RunBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => write!(f, "RunBlock::Noop"),
            Self::Script(closure) => write!(f, "RunBlock::Script({:?})", closure),
            Self::Native(_) => write!(f, "RunBlock::Native"),
        }
    }
}

/// Everything a command can be built from
#[derive(Debug, Clone, Default)]
pub struct CommandConfig {
    pub description: Option<String>,
    pub summary: Option<String>,
    pub output: Option<Output>,
    pub arguments: Vec<CommandOption>,
    pub flags: Vec<CommandOption>,
    pub switches: Vec<CommandOption>,
    pub block: Option<RunBlock>,
}

impl CommandConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    /// Accepts a full option or a bare name
    pub fn argument(mut self, option: impl Into<CommandOption>) -> Self {
        self.arguments.push(option.into());
        self
    }

    pub fn flag(mut self, option: impl Into<CommandOption>) -> Self {
        self.flags.push(option.into());
        self
    }

    pub fn switch(mut self, option: impl Into<CommandOption>) -> Self {
        self.switches.push(option.into());
        self
    }

    pub fn block(mut self, block: RunBlock) -> Self {
        self.block = Some(block);
        self
    }
}

/// Strip surrounding whitespace and a leading `:` from a command name
pub fn canonical_command_name(name: &str) -> String {
    name.trim().trim_start_matches(':').to_string()
}

#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    description: Option<String>,
    summary: Option<String>,
    arguments: Vec<CommandOption>,
    flags: Vec<CommandOption>,
    switches: Vec<CommandOption>,
    block: RunBlock,
    helpers: BTreeMap<String, Value>,
    output: Output,
}

impl Command {
    pub fn new(name: impl AsRef<str>, config: CommandConfig) -> Self {
        let mut command = Self {
            name: canonical_command_name(name.as_ref()),
            description: config.description,
            summary: config.summary,
            arguments: Vec::new(),
            flags: Vec::new(),
            switches: Vec::new(),
            block: config.block.unwrap_or_default(),
            helpers: BTreeMap::new(),
            output: config.output.unwrap_or_default(),
        };
        for option in config.arguments {
            command.add_option(OptionKind::Argument, option);
        }
        for option in config.flags {
            command.add_option(OptionKind::Flag, option);
        }
        for option in config.switches {
            command.add_option(OptionKind::Switch, option);
        }
        command
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn arguments(&self) -> &[CommandOption] {
        &self.arguments
    }

    pub fn flags(&self) -> &[CommandOption] {
        &self.flags
    }

    pub fn switches(&self) -> &[CommandOption] {
        &self.switches
    }

    pub fn block(&self) -> &RunBlock {
        &self.block
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn helpers(&self) -> &BTreeMap<String, Value> {
        &self.helpers
    }

    pub fn helper(&self, name: &str) -> Option<&Value> {
        self.helpers.get(name)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }

    pub fn set_block(&mut self, block: RunBlock) {
        self.block = block;
    }

    pub fn set_output(&mut self, output: Output) {
        self.output = output;
    }

    pub fn add_helper(&mut self, name: impl AsRef<str>, helper: Value) {
        self.helpers
            .insert(canonical_command_name(name.as_ref()), helper);
    }

    fn collection_mut(&mut self, kind: OptionKind) -> &mut Vec<CommandOption> {
        match kind {
            OptionKind::Argument => &mut self.arguments,
            OptionKind::Flag => &mut self.flags,
            OptionKind::Switch => &mut self.switches,
        }
    }

    pub fn options_of(&self, kind: OptionKind) -> &[CommandOption] {
        match kind {
            OptionKind::Argument => &self.arguments,
            OptionKind::Flag => &self.flags,
            OptionKind::Switch => &self.switches,
        }
    }

    /// Append an option to the collection for `kind`. An option with the
    /// same name in that collection is replaced in place.
    pub fn add_option(&mut self, kind: OptionKind, option: CommandOption) -> &mut Self {
        debug!("Adding {} :{} to command {}", kind, option.name(), self.name);
        let collection = self.collection_mut(kind);
        match collection.iter_mut().find(|o| o.name() == option.name()) {
            Some(existing) => *existing = option,
            None => collection.push(option),
        }
        self
    }

    /// Like [`add_option`](Self::add_option) with the kind given by name
    pub fn add_option_named(&mut self, kind: &str, option: CommandOption) -> Result<&mut Self> {
        let kind: OptionKind = kind.parse()?;
        Ok(self.add_option(kind, option))
    }

    /// All options of all kinds, structurally de-duplicated, in
    /// argument, flag, switch order
    pub fn options(&self) -> Vec<CommandOption> {
        let mut options: Vec<CommandOption> = Vec::new();
        for option in self
            .arguments
            .iter()
            .chain(self.flags.iter())
            .chain(self.switches.iter())
        {
            if !options.contains(option) {
                options.push(option.clone());
            }
        }
        options
    }

    /// Bind `bound` onto a copy of this command's options and run the block.
    ///
    /// Bound options that match no declared option are ignored, and so are
    /// bound options without a value.
    pub fn run(
        &self,
        registry: &Registry,
        bound: &[CommandOption],
    ) -> std::result::Result<Value, ScriptError> {
        let mut options = self.options();
        for option in options.iter_mut() {
            let value = bound
                .iter()
                .filter(|b| b.name() == option.name())
                .find_map(|b| b.bound());
            if let Some(value) = value {
                option.bind(value.clone());
            }
        }
        Runner::new(self, registry).run(&options)
    }

    /// Write a line to this command's output
    pub fn say(&self, message: &str) {
        self.output.say(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn faq() -> Command {
        Command::new(
            ":faq",
            CommandConfig::new()
                .summary("Outputs a question and answer combination.")
                .argument("question")
                .argument(CommandOption::new("answer").with_default("Because racecar."))
                .flag(CommandOption::new("with_question").with_default(false))
                .switch(CommandOption::new("loud").with_default(false)),
        )
    }

    #[test]
    fn test_new_command() {
        let command = faq();
        assert_eq!(command.name(), "faq");
        assert_eq!(command.arguments().len(), 2);
        assert_eq!(command.flags().len(), 1);
        assert_eq!(command.switches().len(), 1);
        assert!(command.block().is_noop());
    }

    #[test]
    fn test_options_is_deduplicated_union() {
        let mut command = faq();
        assert_eq!(command.options().len(), 4);

        // Same option under a second kind collapses; a different default does not.
        command.add_option(OptionKind::Flag, CommandOption::new("question"));
        assert_eq!(command.options().len(), 4);
        command.add_option(
            OptionKind::Switch,
            CommandOption::new("question").with_default(true),
        );
        assert_eq!(command.options().len(), 5);
    }

    #[test]
    fn test_add_option_replaces_same_name_within_kind() {
        let mut command = faq();
        command.add_option(
            OptionKind::Argument,
            CommandOption::new("answer").with_default("42"),
        );
        assert_eq!(command.arguments().len(), 2);
        assert_eq!(
            command.arguments()[1].default(),
            Some(&Value::str("42"))
        );
    }

    #[test]
    fn test_add_option_named_rejects_unknown_kind() {
        let mut command = faq();
        assert!(command
            .add_option_named("flag", CommandOption::new("x"))
            .is_ok());
        assert!(command
            .add_option_named("widget", CommandOption::new("y"))
            .is_err());
        assert_eq!(command.flags().len(), 2);
    }

    #[test]
    fn test_run_binds_options() {
        let seen = Rc::new(RefCell::new(BTreeMap::new()));
        let capture = Rc::clone(&seen);
        let mut command = faq();
        command.set_block(RunBlock::native(move |_runner, options| {
            *capture.borrow_mut() = options.clone();
            Ok(Value::Nil)
        }));

        let registry = Registry::new();
        command
            .run(
                &registry,
                &[
                    CommandOption::new("question").with_value("Why?"),
                    CommandOption::new("loud").with_value(true),
                    CommandOption::new("undeclared").with_value(1i64),
                    CommandOption::new("answer"),
                ],
            )
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.get("question"), Some(&Value::str("Why?")));
        assert_eq!(seen.get("answer"), Some(&Value::str("Because racecar.")));
        assert_eq!(seen.get("loud"), Some(&Value::Bool(true)));
        assert_eq!(seen.get("with_question"), Some(&Value::Bool(false)));
        assert!(!seen.contains_key("undeclared"));
    }

    #[test]
    fn test_run_does_not_mutate_command() {
        let command = faq();
        let registry = Registry::new();
        command
            .run(&registry, &[CommandOption::new("question").with_value("x")])
            .unwrap();
        assert!(command.arguments()[0].bound().is_none());
    }

    #[test]
    fn test_noop_block_returns_nil() {
        let command = Command::new("zombie", CommandConfig::new());
        assert_eq!(command.run(&Registry::new(), &[]).unwrap(), Value::Nil);
    }
}
