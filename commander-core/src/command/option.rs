//! # Command Options
//!
//! Arguments, flags and switches share one representation; the collection
//! an option sits in decides how the CLI parses it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::CommanderError;
use crate::script::Value;

/// Which collection of a command an option belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Positional value, bound in declaration order
    Argument,
    /// `--name VALUE`
    Flag,
    /// `--name` / `--no-name`
    Switch,
}

impl OptionKind {
    pub const ALL: [OptionKind; 3] = [Self::Argument, Self::Flag, Self::Switch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::Flag => "flag",
            Self::Switch => "switch",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = CommanderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(':') {
            "argument" | "arguments" => Ok(Self::Argument),
            "flag" | "flags" => Ok(Self::Flag),
            "switch" | "switches" => Ok(Self::Switch),
            other => Err(CommanderError::invalid_input(format!(
                "unknown option kind `{}` (expected argument, flag or switch)",
                other
            ))),
        }
    }
}

/// Canonical form of an option name: no leading `:`, dashes as underscores
pub fn canonical_name(name: &str) -> String {
    name.trim().trim_start_matches(':').replace('-', "_")
}

/// Whether `name` can be declared as an option: an ASCII letter followed by
/// letters, digits or underscores
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A named value slot on a command
#[derive(Debug, Clone)]
pub struct CommandOption {
    name: String,
    default: Option<Value>,
    description: Option<String>,
    value: Option<Value>,
}

impl CommandOption {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: canonical_name(name.as_ref()),
            default: None,
            description: None,
            value: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The bound value, if any
    pub fn bound(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn bind(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }

    pub fn unbind(&mut self) {
        self.value = None;
    }

    /// Bound value, else default, else nil. A bound `false` or `""` wins
    /// over the default.
    pub fn value(&self) -> Value {
        self.value
            .as_ref()
            .or(self.default.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn to_mapping(&self) -> (String, Value) {
        (self.name.clone(), self.value())
    }
}

impl PartialEq for CommandOption {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.default == other.default
            && self.description == other.description
    }
}

impl Eq for CommandOption {}

impl Hash for CommandOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl From<&str> for CommandOption {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CommandOption {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_falls_back_to_default() {
        let option = CommandOption::new("name").with_default("world");
        assert_eq!(option.value(), Value::str("world"));
    }

    #[test]
    fn test_bound_value_overrides_default() {
        let option = CommandOption::new("name")
            .with_default("world")
            .with_value("there");
        assert_eq!(option.value(), Value::str("there"));
    }

    #[test]
    fn test_bound_false_is_not_replaced_by_default() {
        let mut option = CommandOption::new("loud").with_default(true);
        option.bind(false);
        assert_eq!(option.value(), Value::Bool(false));

        option.unbind();
        assert_eq!(option.value(), Value::Bool(true));
    }

    #[test]
    fn test_unset_without_default_is_nil() {
        assert_eq!(CommandOption::new("x").value(), Value::Nil);
    }

    #[test]
    fn test_name_is_canonical() {
        assert_eq!(CommandOption::new(":with-question").name(), "with_question");
        assert_eq!(CommandOption::from("name").name(), "name");
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("with_question"));
        assert!(is_valid_name("v2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("_private"));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("two words"));
    }

    #[test]
    fn test_equality_ignores_value() {
        let a = CommandOption::new("name").with_default("world");
        let b = CommandOption::new("name").with_default("world").with_value("x");
        let c = CommandOption::new("name").with_default("moon");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<CommandOption> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_to_mapping() {
        let option = CommandOption::new("name").with_default("world");
        assert_eq!(option.to_mapping(), ("name".to_string(), Value::str("world")));
    }

    #[test]
    fn test_option_kind_from_str() {
        assert_eq!("argument".parse::<OptionKind>().unwrap(), OptionKind::Argument);
        assert_eq!(":flags".parse::<OptionKind>().unwrap(), OptionKind::Flag);
        assert_eq!("switch".parse::<OptionKind>().unwrap(), OptionKind::Switch);
        assert!("widget".parse::<OptionKind>().is_err());
    }
}
