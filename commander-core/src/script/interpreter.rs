//! Tree-walking evaluator.
//!
//! Names that are not local variables or builtins are handed to a [`Host`].
//! Hosts decide what the bare calls of a script mean: the raw loader
//! answers `command` and `plugin`, the configurator answers the command
//! setters, and the runner walks the helper and plugin chain.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::ast::{
    Arg, AssignTarget, BinaryOp, Block, Expr, InterpPart, Literal, Program, Stmt, UnaryOp,
};
use super::builtins;
use super::error::{Position, ScriptError};
use super::parser;
use super::value::{CallArgs, CallContext, Closure, Value};
use crate::output::Output;

/// Default maximum depth of nested closure calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Lexical scope
pub type Env = Rc<Scope>;

#[derive(Debug, Default)]
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

impl Scope {
    pub fn root() -> Env {
        Rc::new(Self::default())
    }

    pub fn child(parent: &Env) -> Env {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Rebind an existing variable in the nearest scope that holds it
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.vars.borrow_mut().get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }
}

/// Resolves calls the script itself cannot
pub trait Host {
    fn call(
        &self,
        name: &str,
        args: CallArgs,
        interpreter: &Interpreter,
    ) -> Result<Value, ScriptError> {
        let _ = (args, interpreter);
        Err(ScriptError::undefined_call(name))
    }

    /// Where native objects send user-visible output
    fn output(&self) -> Output {
        Output::stdout()
    }
}

/// A host that answers nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl Host for NoHost {}

enum Unwind {
    Return(Value),
    Error(ScriptError),
}

impl From<ScriptError> for Unwind {
    fn from(err: ScriptError) -> Self {
        Self::Error(err)
    }
}

type Eval<T> = Result<T, Unwind>;

#[derive(Debug)]
pub struct Interpreter {
    max_call_depth: usize,
    depth: Cell<usize>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_max_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self {
            max_call_depth: max_call_depth.max(1),
            depth: Cell::new(0),
        }
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Parse and evaluate `source` in a fresh scope, returning the value of
    /// its last statement.
    pub fn eval_source(&self, source: &str, host: &dyn Host) -> Result<Value, ScriptError> {
        let program = parser::parse(source)?;
        self.eval_program(&program, host)
    }

    pub fn eval_program(&self, program: &Program, host: &dyn Host) -> Result<Value, ScriptError> {
        let env = Scope::root();
        match self.block_in(&program.body, &env, host) {
            Ok(value) | Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(err)) => Err(err.with_frame("<main>")),
        }
    }

    /// Call a closure (or an object, as `call`) with the given arguments
    pub fn call_value(
        &self,
        callee: &Value,
        args: CallArgs,
        host: &dyn Host,
    ) -> Result<Value, ScriptError> {
        match callee {
            Value::Closure(closure) => self.call_closure(closure, args, host),
            Value::Object(object) => object.invoke("call", args, &self.context(host)),
            other => Err(ScriptError::type_error(format!(
                "{} is not callable",
                other.type_name()
            ))
            .at(args.position)),
        }
    }

    fn context<'a>(&'a self, host: &'a dyn Host) -> CallContext<'a> {
        CallContext {
            interpreter: self,
            host,
        }
    }

    fn call_closure(
        &self,
        closure: &Closure,
        args: CallArgs,
        host: &dyn Host,
    ) -> Result<Value, ScriptError> {
        let depth = self.depth.get() + 1;
        if depth > self.max_call_depth {
            return Err(ScriptError::limit(format!(
                "stack level too deep (max {} nested calls)",
                self.max_call_depth
            ))
            .at(args.position));
        }

        let env = Scope::child(&closure.env);
        let mut values = args.into_values().into_iter();
        for param in &closure.def.params {
            env.define(param.clone(), values.next().unwrap_or_default());
        }

        self.depth.set(depth);
        let result = self.block_in(&closure.def.body, &env, host);
        self.depth.set(depth - 1);

        match result {
            Ok(value) | Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(err)) => {
                Err(err.with_frame(format!("in closure at {}", closure.def.position)))
            }
        }
    }

    fn block_in(&self, block: &Block, env: &Env, host: &dyn Host) -> Eval<Value> {
        let mut last = Value::Nil;
        for stmt in &block.stmts {
            last = self.stmt(stmt, env, host)?;
        }
        Ok(last)
    }

    fn block(&self, block: &Block, env: &Env, host: &dyn Host) -> Eval<Value> {
        let scope = Scope::child(env);
        self.block_in(block, &scope, host)
    }

    fn stmt(&self, stmt: &Stmt, env: &Env, host: &dyn Host) -> Eval<Value> {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.expr(value, env, host)?;
                env.define(name.clone(), value);
                Ok(Value::Nil)
            }
            Stmt::Assign {
                target,
                value,
                position,
            } => {
                let value = self.expr(value, env, host)?;
                self.assign(target, value, env, host, *position)?;
                Ok(Value::Nil)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.expr(expr, env, host)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::For {
                var,
                iter,
                body,
                position,
            } => {
                let items = match self.expr(iter, env, host)? {
                    Value::Array(items) => items,
                    Value::Map(map) => map
                        .into_iter()
                        .map(|(k, v)| Value::Array(vec![Value::Str(k), v]))
                        .collect(),
                    other => {
                        return Err(ScriptError::type_error(format!(
                            "cannot iterate over {}",
                            other.type_name()
                        ))
                        .at(*position)
                        .into())
                    }
                };
                for item in items {
                    let scope = Scope::child(env);
                    scope.define(var.clone(), item);
                    self.block_in(body, &scope, host)?;
                }
                Ok(Value::Nil)
            }
            Stmt::While { cond, body } => {
                while self.expr(cond, env, host)?.is_truthy() {
                    self.block(body, env, host)?;
                }
                Ok(Value::Nil)
            }
            Stmt::Expr(expr) => self.expr(expr, env, host),
        }
    }

    fn assign(
        &self,
        target: &AssignTarget,
        value: Value,
        env: &Env,
        host: &dyn Host,
        position: Position,
    ) -> Eval<()> {
        match target {
            AssignTarget::Name(name) => {
                if !env.assign(name, value) {
                    return Err(ScriptError::runtime(format!(
                        "assignment to undeclared variable `{}` (use `let`)",
                        name
                    ))
                    .at(position)
                    .into());
                }
            }
            AssignTarget::Index { name, index } => {
                let index = self.expr(index, env, host)?;
                let current = env.lookup(name).ok_or_else(|| {
                    ScriptError::runtime(format!("undefined variable `{}`", name)).at(position)
                })?;
                let updated = match (current, index) {
                    (Value::Map(mut map), Value::Str(key)) => {
                        map.insert(key, value);
                        Value::Map(map)
                    }
                    (Value::Array(mut items), Value::Int(i)) => {
                        let len = items.len() as i64;
                        let slot = if i < 0 { len + i } else { i };
                        if slot < 0 || slot >= len {
                            return Err(ScriptError::runtime(format!(
                                "index {} out of bounds for array of length {}",
                                i, len
                            ))
                            .at(position)
                            .into());
                        }
                        items[slot as usize] = value;
                        Value::Array(items)
                    }
                    (current, index) => {
                        return Err(ScriptError::type_error(format!(
                            "cannot assign {} index on {}",
                            index.type_name(),
                            current.type_name()
                        ))
                        .at(position)
                        .into())
                    }
                };
                env.assign(name, updated);
            }
        }
        Ok(())
    }

    fn args(
        &self,
        args: &[Arg],
        env: &Env,
        host: &dyn Host,
        position: Position,
    ) -> Eval<CallArgs> {
        let mut call = CallArgs::default().at(position);
        for arg in args {
            let value = self.expr(&arg.value, env, host)?;
            match &arg.name {
                Some(name) => {
                    call.named.insert(name.clone(), value);
                }
                None => call.positional.push(value),
            }
        }
        Ok(call)
    }

    fn expr(&self, expr: &Expr, env: &Env, host: &dyn Host) -> Eval<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Nil => Value::Nil,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(n) => Value::Float(*n),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Interpolated(parts) => self.interpolate(parts, env, host),
            Expr::Ident { name, position } => match env.lookup(name) {
                Some(value) => Ok(value),
                None => Ok(self.call_name(name, CallArgs::default().at(*position), host)?),
            },
            Expr::Array(items) => self.array(items, env, host),
            Expr::Map(entries) => self.map(entries, env, host),
            Expr::Unary { op, expr, position } => {
                let value = self.expr(expr, env, host)?;
                match (op, value) {
                    (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                    (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                    (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
                    (UnaryOp::Neg, other) => Err(ScriptError::type_error(format!(
                        "cannot negate {}",
                        other.type_name()
                    ))
                    .at(*position)
                    .into()),
                }
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                position,
            } => {
                let lhs = self.expr(lhs, env, host)?;
                let rhs = self.expr(rhs, env, host)?;
                Ok(binary(*op, lhs, rhs).map_err(|e| e.at(*position))?)
            }
            Expr::And(lhs, rhs) => {
                let lhs = self.expr(lhs, env, host)?;
                if !lhs.is_truthy() {
                    return Ok(lhs);
                }
                self.expr(rhs, env, host)
            }
            Expr::Or(lhs, rhs) => {
                let lhs = self.expr(lhs, env, host)?;
                if lhs.is_truthy() {
                    return Ok(lhs);
                }
                self.expr(rhs, env, host)
            }
            Expr::Call {
                name,
                args,
                position,
            } => self.call_expr(name, args, *position, env, host),
            Expr::MethodCall {
                receiver,
                method,
                args,
                position,
            } => {
                let receiver = self.expr(receiver, env, host)?;
                self.method_call_expr(&receiver, method, args, *position, env, host)
            }
            Expr::Property {
                receiver,
                name,
                position,
            } => {
                let receiver = self.expr(receiver, env, host)?;
                Ok(self.property(&receiver, name, *position, host)?)
            }
            Expr::Index {
                receiver,
                index,
                position,
            } => {
                let receiver = self.expr(receiver, env, host)?;
                let index = self.expr(index, env, host)?;
                Ok(builtins::index(&receiver, &index).map_err(|e| e.at(*position))?)
            }
            Expr::Closure(def) => Ok(Value::Closure(Rc::new(Closure {
                def: Rc::clone(def),
                env: Rc::clone(env),
            }))),
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                if self.expr(cond, env, host)?.is_truthy() {
                    self.block(then, env, host)
                } else if let Some(otherwise) = otherwise {
                    self.expr(otherwise, env, host)
                } else {
                    Ok(Value::Nil)
                }
            }
            Expr::Block(block) => self.block(block, env, host),
        }
    }

    fn interpolate(&self, parts: &[InterpPart], env: &Env, host: &dyn Host) -> Eval<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                InterpPart::Lit(text) => out.push_str(text),
                InterpPart::Expr(expr) => out.push_str(&self.expr(expr, env, host)?.to_string()),
            }
        }
        Ok(Value::Str(out))
    }

    fn array(&self, items: &[Expr], env: &Env, host: &dyn Host) -> Eval<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.expr(item, env, host)?);
        }
        Ok(Value::Array(values))
    }

    fn map(&self, entries: &[(String, Expr)], env: &Env, host: &dyn Host) -> Eval<Value> {
        let mut map = BTreeMap::new();
        for (key, value) in entries {
            map.insert(key.clone(), self.expr(value, env, host)?);
        }
        Ok(Value::Map(map))
    }

    fn call_expr(
        &self,
        name: &str,
        args: &[Arg],
        position: Position,
        env: &Env,
        host: &dyn Host,
    ) -> Eval<Value> {
        let call = self.args(args, env, host, position)?;
        if let Some(callee) = env.lookup(name) {
            return Ok(self
                .call_value(&callee, call, host)
                .map_err(|e| e.with_frame(format!("`{}` at {}", name, position)))?);
        }
        Ok(self.call_name(name, call, host)?)
    }

    fn method_call_expr(
        &self,
        receiver: &Value,
        method: &str,
        args: &[Arg],
        position: Position,
        env: &Env,
        host: &dyn Host,
    ) -> Eval<Value> {
        let call = self.args(args, env, host, position)?;
        Ok(self
            .call_method(receiver, method, call, host)
            .map_err(|e| e.at(position))?)
    }

    /// `receiver.name` without parentheses: a map entry, or a zero-argument method
    fn property(
        &self,
        receiver: &Value,
        name: &str,
        position: Position,
        host: &dyn Host,
    ) -> Result<Value, ScriptError> {
        if let Value::Map(map) = receiver {
            if let Some(value) = map.get(name) {
                return Ok(value.clone());
            }
            if !builtins::has_method(receiver, name) {
                return Ok(Value::Nil);
            }
        }
        self.call_method(receiver, name, CallArgs::default().at(position), host)
            .map_err(|e| e.at(position))
    }

    /// Resolve a free function call: builtins first, then the host
    fn call_name(&self, name: &str, args: CallArgs, host: &dyn Host) -> Result<Value, ScriptError> {
        let position = args.position;
        let result = match builtins::call_function(name, &args) {
            Some(result) => result,
            None => host.call(name, args, self),
        };
        result.map_err(|e| e.at(position).with_frame(format!("`{}` at {}", name, position)))
    }

    /// Dispatch `receiver.method(args)`
    pub fn call_method(
        &self,
        receiver: &Value,
        method: &str,
        args: CallArgs,
        host: &dyn Host,
    ) -> Result<Value, ScriptError> {
        match receiver {
            Value::Object(object) => object.invoke(method, args, &self.context(host)),
            Value::Map(map) => match map.get(method) {
                Some(callee @ Value::Closure(_)) => self.call_value(callee, args, host),
                Some(value) if args.is_empty() && !builtins::has_method(receiver, method) => {
                    Ok(value.clone())
                }
                _ => builtins::call_method(self, host, receiver, method, args),
            },
            _ => builtins::call_method(self, host, receiver, method, args),
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    use Value::{Array, Bool, Float, Int, Str};

    let mismatch = |lhs: &Value, rhs: &Value| {
        ScriptError::type_error(format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))
    };

    match op {
        BinaryOp::Eq => return Ok(Bool(loose_eq(&lhs, &rhs))),
        BinaryOp::NotEq => return Ok(Bool(!loose_eq(&lhs, &rhs))),
        _ => {}
    }

    match (op, &lhs, &rhs) {
        (BinaryOp::Add, Str(a), b) => Ok(Str(format!("{}{}", a, b))),
        (BinaryOp::Add, a, Str(b)) => Ok(Str(format!("{}{}", a, b))),
        (BinaryOp::Add, Array(a), Array(b)) => {
            Ok(Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        (_, Int(a), Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Add => Ok(Int(a.wrapping_add(b))),
                BinaryOp::Sub => Ok(Int(a.wrapping_sub(b))),
                BinaryOp::Mul => Ok(Int(a.wrapping_mul(b))),
                BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                    Err(ScriptError::runtime("divided by 0"))
                }
                BinaryOp::Div => Ok(Int(a.wrapping_div(b))),
                BinaryOp::Rem => Ok(Int(a.wrapping_rem(b))),
                BinaryOp::Lt => Ok(Bool(a < b)),
                BinaryOp::Le => Ok(Bool(a <= b)),
                BinaryOp::Gt => Ok(Bool(a > b)),
                BinaryOp::Ge => Ok(Bool(a >= b)),
                BinaryOp::Eq | BinaryOp::NotEq => Err(mismatch(&lhs, &rhs)),
            }
        }
        (_, Int(_) | Float(_), Int(_) | Float(_)) => {
            let a = as_f64(&lhs);
            let b = as_f64(&rhs);
            match op {
                BinaryOp::Add => Ok(Float(a + b)),
                BinaryOp::Sub => Ok(Float(a - b)),
                BinaryOp::Mul => Ok(Float(a * b)),
                BinaryOp::Div => Ok(Float(a / b)),
                BinaryOp::Rem => Ok(Float(a % b)),
                BinaryOp::Lt => Ok(Bool(a < b)),
                BinaryOp::Le => Ok(Bool(a <= b)),
                BinaryOp::Gt => Ok(Bool(a > b)),
                BinaryOp::Ge => Ok(Bool(a >= b)),
                BinaryOp::Eq | BinaryOp::NotEq => Err(mismatch(&lhs, &rhs)),
            }
        }
        (BinaryOp::Lt, Str(a), Str(b)) => Ok(Bool(a < b)),
        (BinaryOp::Le, Str(a), Str(b)) => Ok(Bool(a <= b)),
        (BinaryOp::Gt, Str(a), Str(b)) => Ok(Bool(a > b)),
        (BinaryOp::Ge, Str(a), Str(b)) => Ok(Bool(a >= b)),
        _ => Err(mismatch(&lhs, &rhs)),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => f64::NAN,
    }
}

// `1 == 1.0` holds in scripts even though the values differ structurally.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        _ => lhs == rhs,
    }
}
