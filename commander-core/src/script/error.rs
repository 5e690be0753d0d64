//! Script errors with source positions and a call trace.

use std::fmt;

use thiserror::Error;

/// A 1-based line/column location in script source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong while parsing or evaluating a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptErrorKind {
    /// The source could not be tokenized or parsed
    Syntax,
    /// No variable, builtin, helper or plugin answers to a name
    UndefinedCall,
    /// An operation was applied to a value of the wrong type
    Type,
    /// A call received missing or malformed arguments
    Argument,
    /// Nesting or call depth exceeded the configured limit
    Limit,
    /// Raised explicitly by a script with `fail`
    Raised,
    /// A shell command exited unsuccessfully
    RunError,
    /// Anything else that fails at run time
    Runtime,
}

/// An error raised by the script engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub message: String,
    pub position: Option<Position>,
    pub trace: Vec<String>,
}

impl ScriptError {
    pub fn new(kind: ScriptErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            trace: Vec::new(),
        }
    }

    pub fn syntax(position: Position, message: impl fmt::Display) -> Self {
        Self::new(
            ScriptErrorKind::Syntax,
            format!("syntax error at {}: {}", position, message),
        )
        .at(position)
    }

    pub fn undefined_call(name: &str) -> Self {
        Self::new(
            ScriptErrorKind::UndefinedCall,
            format!("undefined method or function `{}`", name),
        )
    }

    pub fn undefined_method(name: &str, receiver: &str) -> Self {
        Self::new(
            ScriptErrorKind::UndefinedCall,
            format!("undefined method `{}` for {}", name, receiver),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Type, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Argument, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Runtime, message)
    }

    pub fn raised(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Raised, message)
    }

    pub fn limit(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Limit, message)
    }

    /// Attach a position unless one is already recorded
    pub fn at(mut self, position: Position) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }
        self
    }

    /// Push a frame onto the trace as the error unwinds
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.trace.push(frame.into());
        self
    }

    pub fn is_undefined_call(&self) -> bool {
        self.kind == ScriptErrorKind::UndefinedCall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_message() {
        let err = ScriptError::syntax(Position::new(1, 15), "expected `,`");
        assert_eq!(err.kind, ScriptErrorKind::Syntax);
        assert!(err.message.starts_with("syntax error"));
        assert!(err.to_string().contains("1:15"));
        assert_eq!(err.position, Some(Position::new(1, 15)));
    }

    #[test]
    fn test_position_is_kept_on_first_assignment() {
        let err = ScriptError::undefined_call("danger")
            .at(Position::new(2, 3))
            .at(Position::new(9, 9));
        assert_eq!(err.position, Some(Position::new(2, 3)));
    }

    #[test]
    fn test_trace_frames_accumulate() {
        let err = ScriptError::raised("boom")
            .with_frame("`inner` at 3:5")
            .with_frame("<main>");
        assert_eq!(err.trace, vec!["`inner` at 3:5", "<main>"]);
    }
}
