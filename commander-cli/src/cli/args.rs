//! # Argument Parsing
//!
//! Global `git-cmd` arguments are parsed with clap derive. Everything from
//! the command name on is captured untouched and parsed again against the
//! options the command declares.

use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Parser, Subcommand};
use commander_core::command::{flag_spellings, OptionKind};
use commander_core::{Command, CommandOption, Value};

use super::error::CliError;

/// Git Commander allows running custom git commands from a centralized location.
#[derive(Parser, Debug)]
#[command(name = "git-cmd", version, disable_help_flag = true)]
pub struct Cli {
    /// Configuration file (default: ./.git-commander.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Directory of bundled plugins
    #[arg(long, value_name = "PATH")]
    pub plugin_dir: Option<PathBuf>,

    /// Print the list of available commands
    #[arg(short, long)]
    pub help: bool,

    #[command(subcommand)]
    pub command: Option<Invocation>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// A registered command and its arguments
    #[command(external_subcommand)]
    External(Vec<String>),
}

impl Cli {
    /// The command name and its raw arguments, if a command was given
    pub fn invocation(&self) -> Vec<String> {
        match &self.command {
            Some(Invocation::External(args)) if !self.help => args.clone(),
            _ => Vec::new(),
        }
    }
}

/// What the command-line arguments of a command asked for
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInvocation {
    Help,
    Run(Vec<CommandOption>),
}

const HELP_ID: &str = "help";

fn arg_id(kind: OptionKind, name: &str) -> String {
    format!("{}:{}", kind, name)
}

fn negated_id(name: &str) -> String {
    format!("no-switch:{}", name)
}

/// Builds the parser for one command's declared options
fn build_parser(command: &Command) -> clap::Command {
    let mut parser = clap::Command::new(command.name().to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .allow_negative_numbers(true)
        .arg(
            Arg::new(HELP_ID)
                .short('h')
                .long("help")
                .action(ArgAction::SetTrue),
        );

    for (index, argument) in command.arguments().iter().enumerate() {
        parser = parser.arg(
            Arg::new(arg_id(OptionKind::Argument, argument.name()))
                .index(index + 1)
                .action(ArgAction::Set)
                .value_name(argument.name().to_string()),
        );
    }

    for spelling in flag_spellings(command) {
        let name = spelling.option.name();
        match spelling.kind {
            OptionKind::Switch => {
                let on = arg_id(OptionKind::Switch, name);
                let off = negated_id(name);
                let mut arg = Arg::new(on.clone())
                    .long(spelling.long.clone())
                    .action(ArgAction::SetTrue)
                    .overrides_with(off.clone());
                if let Some(short) = spelling.short {
                    arg = arg.short(short);
                }
                parser = parser.arg(arg).arg(
                    Arg::new(off)
                        .long(format!("no-{}", spelling.long))
                        .action(ArgAction::SetTrue)
                        .overrides_with(on),
                );
            }
            kind => {
                let mut arg = Arg::new(arg_id(kind, name))
                    .long(spelling.long.clone())
                    .action(ArgAction::Set)
                    .num_args(1)
                    .value_name(name.to_uppercase());
                if let Some(short) = spelling.short {
                    arg = arg.short(short);
                }
                parser = parser.arg(arg);
            }
        }
    }

    parser
}

fn given(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}

/// The option bound to the value given for `id`, if one was given
fn given_value(matches: &ArgMatches, id: &str, option: &CommandOption) -> Option<CommandOption> {
    if !given(matches, id) {
        return None;
    }
    let raw = matches.get_one::<String>(id)?;
    Some(CommandOption::new(option.name()).with_value(coerce(raw, option.default())))
}

/// Parse `args` against the options `command` declares.
///
/// Positional values bind to arguments in order, `--flag VALUE` to flags
/// and `--switch`/`--no-switch` to switches. Options that were not given
/// stay unbound so their defaults apply.
pub fn parse_command_args(command: &Command, args: &[String]) -> Result<ParsedInvocation, CliError> {
    let matches = build_parser(command)
        .try_get_matches_from(args)
        .map_err(|e| CliError::usage(clap_message(&e)))?;

    if matches.get_flag(HELP_ID) {
        return Ok(ParsedInvocation::Help);
    }

    let mut bound = Vec::new();
    for argument in command.arguments() {
        let id = arg_id(OptionKind::Argument, argument.name());
        if let Some(value) = given_value(&matches, &id, argument) {
            bound.push(value);
        }
    }

    for spelling in flag_spellings(command) {
        let name = spelling.option.name();
        match spelling.kind {
            OptionKind::Switch => {
                if given(&matches, &arg_id(OptionKind::Switch, name)) {
                    bound.push(CommandOption::new(name).with_value(true));
                } else if given(&matches, &negated_id(name)) {
                    bound.push(CommandOption::new(name).with_value(false));
                }
            }
            kind => {
                if let Some(value) = given_value(&matches, &arg_id(kind, name), spelling.option) {
                    bound.push(value);
                }
            }
        }
    }

    Ok(ParsedInvocation::Run(bound))
}

/// The first line of a clap error without its `error: ` prefix
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}

/// Convert a raw command-line value to the type of the option's default
/// when it parses as one; otherwise keep the string.
pub fn coerce(raw: &str, default: Option<&Value>) -> Value {
    match default {
        Some(Value::Bool(_)) => match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Value::Bool(true),
            "false" | "no" | "0" | "off" => Value::Bool(false),
            _ => Value::str(raw),
        },
        Some(Value::Int(_)) => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::str(raw)),
        Some(Value::Float(_)) => raw
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::str(raw)),
        _ => Value::str(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::error::EXIT_USAGE;
    use commander_core::CommandConfig;

    fn faq() -> Command {
        Command::new(
            "faq",
            CommandConfig::new()
                .argument("question")
                .argument(CommandOption::new("answer").with_default("Because racecar."))
                .flag(CommandOption::new("with_question").with_default(false))
                .flag(CommandOption::new("retries").with_default(3i64))
                .switch(CommandOption::new("loud").with_default(false)),
        )
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn bound(invocation: ParsedInvocation) -> Vec<(String, Value)> {
        match invocation {
            ParsedInvocation::Run(options) => options.iter().map(|o| o.to_mapping()).collect(),
            ParsedInvocation::Help => panic!("expected a run"),
        }
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["git-cmd", "--log-file", "/tmp/x.log", "faq", "Why", "--loud"]);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/x.log")));
        assert_eq!(cli.invocation(), args(&["faq", "Why", "--loud"]));

        let cli = Cli::parse_from(["git-cmd"]);
        assert!(cli.invocation().is_empty());

        let cli = Cli::parse_from(["git-cmd", "--help"]);
        assert!(cli.help);
    }

    #[test]
    fn test_positional_arguments_bind_in_order() {
        let parsed = parse_command_args(&faq(), &args(&["Why", "Because"])).unwrap();
        assert_eq!(
            bound(parsed),
            vec![
                ("question".to_string(), Value::str("Why")),
                ("answer".to_string(), Value::str("Because")),
            ]
        );
    }

    #[test]
    fn test_flags_and_switches() {
        let parsed = parse_command_args(
            &faq(),
            &args(&["Why", "--with-question", "true", "-r", "5", "-l"]),
        )
        .unwrap();
        assert_eq!(
            bound(parsed),
            vec![
                ("question".to_string(), Value::str("Why")),
                ("with_question".to_string(), Value::Bool(true)),
                ("retries".to_string(), Value::Int(5)),
                ("loud".to_string(), Value::Bool(true)),
            ]
        );

        let parsed = parse_command_args(&faq(), &args(&["--loud", "--no-loud"])).unwrap();
        assert_eq!(bound(parsed), vec![("loud".to_string(), Value::Bool(false))]);

        let parsed = parse_command_args(&faq(), &args(&["--with-question=maybe"])).unwrap();
        assert_eq!(
            bound(parsed),
            vec![("with_question".to_string(), Value::str("maybe"))]
        );
    }

    #[test]
    fn test_help_and_usage_errors() {
        assert_eq!(
            parse_command_args(&faq(), &args(&["--help"])).unwrap(),
            ParsedInvocation::Help
        );

        let err = parse_command_args(&faq(), &args(&["--bogus"])).unwrap_err();
        assert_eq!(err.exit_code, EXIT_USAGE);
        assert!(err.message.contains("--bogus"));

        assert!(parse_command_args(&faq(), &args(&["--with-question"])).is_err());
    }

    #[test]
    fn test_short_flags_do_not_collide() {
        let command = Command::new(
            "deploy",
            CommandConfig::new()
                .flag("region")
                .flag("retries")
                .switch("hurry"),
        );
        let parsed =
            parse_command_args(&command, &args(&["-r", "eu", "--retries", "2", "--hurry"])).unwrap();
        assert_eq!(
            bound(parsed),
            vec![
                ("region".to_string(), Value::str("eu")),
                ("retries".to_string(), Value::str("2")),
                ("hurry".to_string(), Value::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_unspellable_names_are_not_offered() {
        let command = Command::new(
            "x",
            CommandConfig::new()
                .flag(CommandOption::new("_private"))
                .switch(CommandOption::new("9lives"))
                .flag("visible"),
        );
        let parsed = parse_command_args(&command, &[]).unwrap();
        assert_eq!(bound(parsed), vec![]);

        let parsed = parse_command_args(&command, &args(&["--visible", "yes"])).unwrap();
        assert_eq!(bound(parsed), vec![("visible".to_string(), Value::str("yes"))]);

        let err = parse_command_args(&command, &args(&["---private", "x"])).unwrap_err();
        assert_eq!(err.exit_code, EXIT_USAGE);
    }

    #[test]
    fn test_short_letters_follow_help() {
        let command = Command::new(
            "deploy",
            CommandConfig::new().flag("host").switch("hurry").flag("retries"),
        );
        assert_eq!(
            parse_command_args(&command, &args(&["-h"])).unwrap(),
            ParsedInvocation::Help
        );
        let parsed = parse_command_args(&command, &args(&["-r", "3", "--hurry"])).unwrap();
        assert_eq!(
            bound(parsed),
            vec![
                ("retries".to_string(), Value::str("3")),
                ("hurry".to_string(), Value::Bool(true)),
            ]
        );
        assert!(command.help_text().contains("-r RETRIES, --retries=RETRIES"));
        assert!(command.help_text().contains("    --host=HOST"));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("yes", Some(&Value::Bool(false))), Value::Bool(true));
        assert_eq!(coerce("12", Some(&Value::Int(0))), Value::Int(12));
        assert_eq!(coerce("1.5", Some(&Value::Float(0.0))), Value::Float(1.5));
        assert_eq!(coerce("twelve", Some(&Value::Int(0))), Value::str("twelve"));
        assert_eq!(coerce("12", None), Value::str("12"));
    }
}
