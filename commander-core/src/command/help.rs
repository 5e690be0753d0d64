//! Usage text for a single command.

use std::collections::HashSet;

use super::{is_valid_name, Command, CommandOption, OptionKind};
use crate::script::Value;

/// Binary name shown in usage lines
pub const PROGRAM_NAME: &str = "git-cmd";

impl Command {
    /// Usage block for this command.
    ///
    /// Sections without content (description, arguments, command options)
    /// are left out.
    pub fn help_text(&self) -> String {
        let mut lines = vec!["NAME".to_string()];
        match self.summary() {
            Some(summary) => lines.push(format!("    {} – {}", self.name(), summary)),
            None => lines.push(format!("    {}", self.name())),
        }

        lines.push("USAGE".to_string());
        let mut usage = format!("    {} {} [command options]", PROGRAM_NAME, self.name());
        for argument in self.arguments() {
            usage.push_str(&format!(" [{}]", argument.name()));
        }
        lines.push(usage);

        if let Some(description) = self.description() {
            lines.push("DESCRIPTION".to_string());
            lines.push(format!("    {}", description));
        }

        if !self.arguments().is_empty() {
            lines.push("ARGUMENTS".to_string());
            for argument in self.arguments() {
                lines.push(format!(
                    "    {}{}",
                    argument.name(),
                    describe(argument, " - ")
                ));
            }
        }

        let has_options = !self.flags().is_empty() || !self.switches().is_empty();
        if has_options {
            lines.push("COMMAND OPTIONS".to_string());
            for spelling in flag_spellings(self) {
                lines.push(format!(
                    "    {}{}",
                    spelling.usage(),
                    describe(spelling.option, "  ")
                ));
            }
        }

        lines.join("\n")
    }

    /// Write [`help_text`](Self::help_text) to the command's output
    pub fn help(&self) {
        for line in self.help_text().lines() {
            self.say(line);
        }
    }
}

/// How a flag or switch is written on the command line
#[derive(Debug, Clone)]
pub struct FlagSpelling<'a> {
    pub kind: OptionKind,
    pub option: &'a CommandOption,
    pub long: String,
    pub short: Option<char>,
}

impl FlagSpelling<'_> {
    /// `-w WITH_QUESTION, --with-question=WITH_QUESTION` or `-l, --[no-]loud`
    pub fn usage(&self) -> String {
        let short = self.short.map(|c| format!("-{}", c));
        match self.kind {
            OptionKind::Switch => match short {
                Some(short) => format!("{}, --[no-]{}", short, self.long),
                None => format!("--[no-]{}", self.long),
            },
            _ => {
                let placeholder = self.option.name().to_uppercase();
                let long = format!("--{}={}", self.long, placeholder);
                match short {
                    Some(short) => format!("{} {}, {}", short, placeholder, long),
                    None => long,
                }
            }
        }
    }
}

/// Command-line spellings of a command's flags, then its switches.
///
/// Options whose name cannot be written as a long flag, or whose long form
/// is already taken, are left out. A short letter is the first character of
/// the name and goes to the first option that asks for it; `-h` stays
/// with help.
pub fn flag_spellings(command: &Command) -> Vec<FlagSpelling<'_>> {
    let mut longs: HashSet<String> = HashSet::from(["help".to_string()]);
    let mut shorts: HashSet<char> = HashSet::from(['h']);
    let mut spellings = Vec::new();

    for kind in [OptionKind::Flag, OptionKind::Switch] {
        for option in command.options_of(kind) {
            if !is_valid_name(option.name()) {
                continue;
            }
            let long = long_flag(option.name());
            let negated = format!("no-{}", long);
            let taken = match kind {
                OptionKind::Switch => longs.contains(&long) || longs.contains(&negated),
                _ => longs.contains(&long),
            };
            if taken {
                continue;
            }
            if kind == OptionKind::Switch {
                longs.insert(negated);
            }
            longs.insert(long.clone());

            let short = option
                .name()
                .chars()
                .next()
                .filter(|c| c.is_ascii_alphanumeric() && shorts.insert(*c));
            spellings.push(FlagSpelling {
                kind,
                option,
                long,
                short,
            });
        }
    }
    spellings
}

/// The `--long-form` of an option name
pub fn long_flag(name: &str) -> String {
    name.replace('_', "-")
}

fn describe(option: &CommandOption, separator: &str) -> String {
    let mut text = String::new();
    if let Some(description) = option.description() {
        text.push_str(separator);
        text.push_str(description);
    }
    match option.default() {
        Some(Value::Nil) | None => {}
        Some(default) => {
            if text.is_empty() {
                text.push_str(separator);
            } else {
                text.push(' ');
            }
            text.push_str(&format!("(default: {})", default));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandConfig;
    use crate::output::Output;

    fn faq(output: Output) -> Command {
        Command::new(
            "faq",
            CommandConfig::new()
                .summary("Outputs a question and answer combination.")
                .description("This is way too much information about a simple FAQ section.")
                .argument("question")
                .argument(CommandOption::new("answer").with_default("Because racecar."))
                .flag(CommandOption::new("with_question").with_default(false))
                .switch(
                    CommandOption::new("loud")
                        .with_default(false)
                        .with_description("Shout the answer"),
                )
                .output(output),
        )
    }

    #[test]
    fn test_help_text_sections() {
        let text = faq(Output::memory()).help_text();
        assert!(text.contains("faq – Outputs a question and answer combination."));
        assert!(text.contains("git-cmd faq [command options] [question] [answer]"));
        assert!(text.contains("DESCRIPTION"));
        assert!(text.contains("answer - (default: Because racecar.)"));
        assert!(text.contains("-w WITH_QUESTION, --with-question=WITH_QUESTION"));
        assert!(text.contains("-l, --[no-]loud  Shout the answer (default: false)"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let command = Command::new("zombie", CommandConfig::new());
        let text = command.help_text();
        assert!(!text.contains("DESCRIPTION"));
        assert!(!text.contains("ARGUMENTS"));
        assert!(!text.contains("COMMAND OPTIONS"));
        assert!(text.contains("git-cmd zombie [command options]"));
    }

    #[test]
    fn test_short_letters_match_what_the_parser_accepts() {
        let command = Command::new(
            "deploy",
            CommandConfig::new()
                .flag("region")
                .flag("retries")
                .flag("host")
                .switch("hurry")
                .switch("region")
                .flag(CommandOption::new("_private")),
        );
        let usages: Vec<String> = flag_spellings(&command).iter().map(|s| s.usage()).collect();
        assert_eq!(
            usages,
            vec![
                "-r REGION, --region=REGION",
                "--retries=RETRIES",
                "--host=HOST",
                "--[no-]hurry",
            ]
        );

        let text = command.help_text();
        assert!(text.contains("    --retries=RETRIES"));
        assert!(!text.contains("-r RETRIES"));
        assert!(!text.contains("private"));
    }

    #[test]
    fn test_help_writes_to_command_output() {
        let output = Output::memory();
        faq(output.clone()).help();
        assert_eq!(output.lines()[0], "NAME");
        assert!(output.contents().contains("-l, --[no-]loud"));
    }
}
