//! Proxy for the object a plugin wraps.

use crate::script::{
    builtins, CallArgs, CallContext, Host, Interpreter, ScriptError, ScriptObject, Value,
};

/// Forwards method calls to a plugin's object
#[derive(Debug, Clone, PartialEq)]
pub struct Executor {
    target: Value,
}

impl Executor {
    pub fn new(target: Value) -> Self {
        Self { target }
    }

    /// The executor as scripts see it: every method call goes through
    /// [`Executor::invoke`]
    pub fn to_value(&self) -> Value {
        Value::object(self.clone())
    }

    pub fn responds_to(&self, method: &str) -> bool {
        match &self.target {
            Value::Object(object) => object.responds_to(method),
            Value::Map(map) => map.contains_key(method) || builtins::has_method(&self.target, method),
            other => builtins::has_method(other, method),
        }
    }

    pub fn invoke(
        &self,
        method: &str,
        args: CallArgs,
        interpreter: &Interpreter,
        host: &dyn Host,
    ) -> Result<Value, ScriptError> {
        if !self.responds_to(method) {
            return Err(ScriptError::undefined_method(method, self.target.type_name()));
        }
        interpreter.call_method(&self.target, method, args, host)
    }
}

impl ScriptObject for Executor {
    fn type_name(&self) -> &str {
        self.target.type_name()
    }

    fn responds_to(&self, method: &str) -> bool {
        Executor::responds_to(self, method)
    }

    fn invoke(
        &self,
        method: &str,
        args: CallArgs,
        ctx: &CallContext<'_>,
    ) -> Result<Value, ScriptError> {
        Executor::invoke(self, method, args, ctx.interpreter, ctx.host)
    }
}
