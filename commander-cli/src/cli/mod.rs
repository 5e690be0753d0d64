//! # CLI Module
//!
//! `git-cmd <command> [command options] [arguments...]`: find a command in
//! the registry, parse its options and run it.

pub mod args;
pub mod bootstrap;
pub mod context;
pub mod error;
pub mod logging;

pub use args::{parse_command_args, Cli, Invocation, ParsedInvocation};
pub use bootstrap::{load_sources, LoadFailure};
pub use context::CliContext;
pub use error::CliError;
pub use logging::init_logging;

use commander_core::command::PROGRAM_NAME;
use commander_core::{Registry, VERSION};
use tracing::{info, warn};

/// The listing shown for `git-cmd help`, an unknown command or no command
pub fn help_text(registry: &Registry) -> String {
    [
        "NAME".to_string(),
        format!(
            "    {} – Git Commander allows running custom git commands from a centralized location.",
            PROGRAM_NAME
        ),
        "VERSION".to_string(),
        format!("    {}", VERSION),
        "USAGE".to_string(),
        format!("    {} command [command options] [arguments...]", PROGRAM_NAME),
        "COMMANDS".to_string(),
        format!("    {}", registry.command_names().join(", ")),
    ]
    .join("\n")
}

/// Print the help listing to the context's output
pub fn help(context: &CliContext) {
    for line in help_text(&context.registry).lines() {
        context.output.say(line);
    }
}

/// Run the command named by the first element of `args` with the rest as
/// its command-line arguments.
///
/// An empty `args` or an unknown command prints the help listing and
/// succeeds; an unknown command is reported first.
pub fn execute(context: &CliContext, args: &[String]) -> Result<(), CliError> {
    let Some((name, rest)) = args.split_first() else {
        help(context);
        return Ok(());
    };

    let command = match context.registry.lookup(name) {
        Ok(command) => command,
        Err(err) => {
            if name != "help" {
                warn!("{}", err);
                context.output.say(&err.to_string());
            }
            help(context);
            return Ok(());
        }
    };
    info!("CLI attempting to run {} with arguments: {:?}", name, rest);

    match parse_command_args(command, rest) {
        Ok(ParsedInvocation::Help) => {
            command.help();
            Ok(())
        }
        Ok(ParsedInvocation::Run(bound)) => command
            .run(&context.registry, &bound)
            .map(|_| ())
            .map_err(|err| CliError::run_failed(command.name(), &err)),
        Err(err) => {
            command.help();
            Err(err.with_suggestion(format!("Run `{} {} --help`", PROGRAM_NAME, command.name())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commander_core::{CommandConfig, CommandOption, Output, RunBlock, Value};
    use std::path::Path;

    fn context() -> CliContext {
        let mut context = CliContext::minimal(Path::new("."));
        context.registry.register(
            "hello",
            CommandConfig::new()
                .argument(CommandOption::new("name").with_default("world"))
                .output(context.output.clone())
                .block(RunBlock::native(|runner, options| {
                    runner.say(&format!("Hello, {}!", options["name"]));
                    Ok(Value::Nil)
                })),
        );
        context.registry.register("faq", CommandConfig::new());
        context
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_help_listing() {
        let context = context();
        let text = help_text(&context.registry);
        assert!(text.contains(
            "git-cmd – Git Commander allows running custom git commands from a centralized location."
        ));
        assert!(text.contains(VERSION));
        assert!(text.contains("git-cmd command [command options] [arguments...]"));
        assert!(text.contains("faq, hello"));
    }

    #[test]
    fn test_unknown_command_prints_help() {
        let context = context();
        execute(&context, &args(&["help"])).unwrap();
        execute(&context, &[]).unwrap();
        let lines = context.output.lines();
        assert_eq!(lines.iter().filter(|l| l.as_str() == "COMMANDS").count(), 2);
    }

    #[test]
    fn test_unknown_plugin_command_names_the_plugin() {
        let mut context = context();
        context.registry.register_plugin(commander_core::Plugin::new(
            "git_helpers",
            None,
            vec![commander_core::Command::new("git-helpers:current", CommandConfig::new())],
        ));
        execute(&context, &args(&["git-helpers:bogus"])).unwrap();
        execute(&context, &args(&["bogus"])).unwrap();

        let lines = context.output.lines();
        assert_eq!(lines[0], "command `bogus` does not exist in plugin `git_helpers`");
        assert!(lines.iter().any(|l| l.starts_with("command `bogus` not found in registry")));
        assert_eq!(lines.iter().filter(|l| l.as_str() == "COMMANDS").count(), 2);
    }

    #[test]
    fn test_runs_command_with_arguments() {
        let context = context();
        execute(&context, &args(&["hello"])).unwrap();
        execute(&context, &args(&["hello", "there"])).unwrap();
        assert_eq!(context.output.lines(), vec!["Hello, world!", "Hello, there!"]);
    }

    #[test]
    fn test_bad_options_are_usage_errors() {
        let context = context();
        let err = execute(&context, &args(&["hello", "--bogus"])).unwrap_err();
        assert_eq!(err.exit_code, error::EXIT_USAGE);
        assert!(context.output.contents().contains("git-cmd hello [command options] [name]"));
    }

    #[test]
    fn test_run_error_exit_code() {
        let mut context = context();
        context.registry.register(
            "boom",
            CommandConfig::new().output(Output::memory()).block(RunBlock::native(|runner, _| {
                runner.dispatch("missing", commander_core::script::CallArgs::new(Vec::new()))
            })),
        );
        let err = execute(&context, &args(&["boom"])).unwrap_err();
        assert_eq!(err.exit_code, error::EXIT_FAILURE);
        assert!(err.message.contains("missing"));
    }
}
