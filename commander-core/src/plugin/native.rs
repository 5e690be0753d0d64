//! # Native Executors
//!
//! Executors implemented in Rust. Plugin sources reach them through
//! constructor functions such as `system()`.

use std::process::{Command as Process, Stdio};

use tracing::debug;

use crate::script::{CallArgs, CallContext, ScriptError, ScriptErrorKind, ScriptObject, Value};

/// A named constructor for a native executor
#[derive(Debug, Clone, Copy)]
pub struct NativeExecutor {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> Value,
}

/// Native executors available to plugin sources
pub const NATIVE_EXECUTORS: &[NativeExecutor] = &[NativeExecutor {
    name: "system",
    description: "Runs shell commands and returns their output",
    build: || Value::object(SystemExecutor),
}];

/// Look up a native executor constructor by name
pub fn native_executor(name: &str) -> Option<&'static NativeExecutor> {
    NATIVE_EXECUTORS.iter().find(|e| e.name == name)
}

/// Runs shell commands through `sh -c`.
///
/// `run(command, silent: false, with_system: false)`:
/// - captures stdout, echoes it to the command output unless `silent`,
///   and returns it without the trailing newline;
/// - with `with_system: true` the child inherits the terminal and the
///   result is whether it succeeded.
///
/// A non-zero exit raises a `RunError`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn run(&self, args: &CallArgs, ctx: &CallContext<'_>) -> Result<Value, ScriptError> {
        let command = args.str(0, "shell command")?;
        let silent = args.named("silent").is_some_and(Value::is_truthy);
        let with_system = args.named("with_system").is_some_and(Value::is_truthy);
        debug!(
            "[system] Running {} with options silent={} with_system={}",
            command, silent, with_system
        );

        if with_system {
            let status = Process::new("sh")
                .arg("-c")
                .arg(&command)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| run_error(&command, &e.to_string()))?;
            return Ok(Value::Bool(status.success()));
        }

        let output = Process::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| run_error(&command, &e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(run_error(&command, stderr.trim()));
        }

        let stdout = stdout.trim_end_matches(['\n', '\r']).to_string();
        if !silent && !stdout.is_empty() {
            ctx.host.output().say(&stdout);
        }
        Ok(Value::Str(stdout))
    }
}

fn run_error(command: &str, detail: &str) -> ScriptError {
    let message = if detail.is_empty() {
        format!("\"{}\" failed to run.", command)
    } else {
        format!("\"{}\" failed to run: {}", command, detail)
    };
    ScriptError::new(ScriptErrorKind::RunError, message)
}

impl ScriptObject for SystemExecutor {
    fn type_name(&self) -> &str {
        "system"
    }

    fn responds_to(&self, method: &str) -> bool {
        method == "run"
    }

    fn invoke(
        &self,
        method: &str,
        args: CallArgs,
        ctx: &CallContext<'_>,
    ) -> Result<Value, ScriptError> {
        match method {
            "run" => self.run(&args, ctx).map_err(|e| e.at(args.position)),
            other => Err(ScriptError::undefined_method(other, "system")),
        }
    }
}
