//! # Command Script Engine
//!
//! A small embedded language for declaring commands and plugins:
//!
//! ```text
//! command(:hello, |cmd| {
//!     cmd.argument(:name, default: "world");
//!     cmd.on_run(|options| {
//!         say("Hello, #{options[:name]}!");
//!     });
//! });
//! ```
//!
//! Scripts see only locals, the builtins in [`builtins`] and whatever their
//! [`Host`] resolves.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{Position, ScriptError, ScriptErrorKind};
pub use interpreter::{Host, Interpreter, NoHost, DEFAULT_MAX_CALL_DEPTH};
pub use parser::parse;
pub use value::{CallArgs, CallContext, Closure, ScriptObject, Value};
