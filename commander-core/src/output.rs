//! # Output Sink
//!
//! Every command writes user-visible text through an `Output` instead of a
//! global stream, so tests can capture it and the CLI can redirect it.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

/// Destination for command output
#[derive(Clone, Default)]
pub enum Output {
    /// Process standard output
    #[default]
    Stdout,
    /// In-memory buffer, shared between clones
    Memory(Rc<RefCell<String>>),
    /// Any writer
    Writer(Rc<RefCell<Box<dyn Write>>>),
}

impl Output {
    /// Output to the process stdout
    pub fn stdout() -> Self {
        Self::Stdout
    }

    /// Output captured in memory
    pub fn memory() -> Self {
        Self::Memory(Rc::new(RefCell::new(String::new())))
    }

    /// Output to an arbitrary writer
    pub fn writer(writer: impl Write + 'static) -> Self {
        Self::Writer(Rc::new(RefCell::new(Box::new(writer))))
    }

    /// Write a message followed by a newline.
    ///
    /// Write failures (closed pipe and the like) are dropped; a command's
    /// output is best effort.
    pub fn say(&self, message: &str) {
        match self {
            Self::Stdout => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                let _ = writeln!(lock, "{}", message);
            }
            Self::Memory(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(message);
                buffer.push('\n');
            }
            Self::Writer(writer) => {
                let _ = writeln!(writer.borrow_mut(), "{}", message);
            }
        }
    }

    /// Everything captured so far (empty unless in-memory)
    pub fn contents(&self) -> String {
        match self {
            Self::Memory(buffer) => buffer.borrow().clone(),
            _ => String::new(),
        }
    }

    /// Captured lines (empty unless in-memory)
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "Output::Stdout"),
            Self::Memory(buffer) => write!(f, "Output::Memory({} bytes)", buffer.borrow().len()),
            Self::Writer(_) => write!(f, "Output::Writer"),
        }
    }
}
