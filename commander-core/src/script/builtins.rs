//! Builtin functions and methods available to every script.

use std::collections::BTreeMap;

use super::error::ScriptError;
use super::interpreter::{Host, Interpreter};
use super::value::{CallArgs, Value};

/// Free functions that take precedence over host calls
pub const FUNCTIONS: &[&str] = &["fail", "type_of", "inspect", "range"];

const STR_METHODS: &[&str] = &[
    "len", "is_empty", "upcase", "downcase", "trim", "contains", "starts_with", "ends_with",
    "split", "replace", "lines", "to_int",
];
const ARRAY_METHODS: &[&str] = &[
    "len", "is_empty", "first", "last", "join", "contains", "map", "filter", "each",
];
const MAP_METHODS: &[&str] = &["len", "is_empty", "keys", "values", "get", "contains_key"];
const ANY_METHODS: &[&str] = &["to_string", "inspect", "is_nil"];

pub fn call_function(name: &str, args: &CallArgs) -> Option<Result<Value, ScriptError>> {
    let result = match name {
        "fail" => {
            let message = match args.get(0) {
                Value::Nil => "unhandled failure".to_string(),
                other => other.to_string(),
            };
            Err(ScriptError::raised(message))
        }
        "type_of" => Ok(Value::str(args.get(0).type_name())),
        "inspect" => Ok(Value::str(args.get(0).inspect())),
        "range" => match (args.get(0), args.get(1)) {
            (Value::Int(start), Value::Int(end)) => Ok(Value::Array((start..end).map(Value::Int).collect())),
            (Value::Int(end), Value::Nil) => Ok(Value::Array((0..end).map(Value::Int).collect())),
            _ => Err(ScriptError::argument("range expects integer bounds")),
        },
        _ => return None,
    };
    Some(result)
}

pub fn has_method(receiver: &Value, method: &str) -> bool {
    let table: &[&str] = match receiver {
        Value::Str(_) => STR_METHODS,
        Value::Array(_) => ARRAY_METHODS,
        Value::Map(_) => MAP_METHODS,
        _ => &[],
    };
    table.contains(&method) || ANY_METHODS.contains(&method)
}

pub fn call_method(
    interpreter: &Interpreter,
    host: &dyn Host,
    receiver: &Value,
    method: &str,
    args: CallArgs,
) -> Result<Value, ScriptError> {
    match method {
        "to_string" => return Ok(Value::str(receiver.to_string())),
        "inspect" => return Ok(Value::str(receiver.inspect())),
        "is_nil" => return Ok(Value::Bool(receiver.is_nil())),
        _ => {}
    }

    match receiver {
        Value::Str(s) => str_method(s, method, &args),
        Value::Array(items) => array_method(interpreter, host, items, method, args),
        Value::Map(map) => map_method(map, method, &args),
        Value::Int(n) if method == "abs" => Ok(Value::Int(n.wrapping_abs())),
        other => Err(ScriptError::undefined_method(method, other.type_name())),
    }
}

fn str_arg(args: &CallArgs, index: usize, method: &str) -> Result<String, ScriptError> {
    args.str(index, &format!("argument {} of `{}`", index + 1, method))
}

fn str_method(s: &str, method: &str, args: &CallArgs) -> Result<Value, ScriptError> {
    let value = match method {
        "len" => Value::Int(s.chars().count() as i64),
        "is_empty" => Value::Bool(s.is_empty()),
        "upcase" => Value::str(s.to_uppercase()),
        "downcase" => Value::str(s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "contains" => Value::Bool(s.contains(str_arg(args, 0, method)?.as_str())),
        "starts_with" => Value::Bool(s.starts_with(str_arg(args, 0, method)?.as_str())),
        "ends_with" => Value::Bool(s.ends_with(str_arg(args, 0, method)?.as_str())),
        "split" => {
            let parts: Vec<Value> = match args.get(0) {
                Value::Nil => s.split_whitespace().map(Value::str).collect(),
                _ => {
                    let sep = str_arg(args, 0, method)?;
                    s.split(sep.as_str()).map(Value::str).collect()
                }
            };
            Value::Array(parts)
        }
        "replace" => {
            let from = str_arg(args, 0, method)?;
            let to = str_arg(args, 1, method)?;
            Value::str(s.replace(from.as_str(), &to))
        }
        "lines" => Value::Array(s.lines().map(Value::str).collect()),
        "to_int" => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or(Value::Nil),
        _ => return Err(ScriptError::undefined_method(method, "string")),
    };
    Ok(value)
}

fn array_method(
    interpreter: &Interpreter,
    host: &dyn Host,
    items: &[Value],
    method: &str,
    args: CallArgs,
) -> Result<Value, ScriptError> {
    let value = match method {
        "len" => Value::Int(items.len() as i64),
        "is_empty" => Value::Bool(items.is_empty()),
        "first" => items.first().cloned().unwrap_or_default(),
        "last" => items.last().cloned().unwrap_or_default(),
        "contains" => Value::Bool(items.contains(&args.get(0))),
        "join" => {
            let sep = match args.get(0) {
                Value::Nil => String::new(),
                _ => str_arg(&args, 0, method)?,
            };
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Value::str(parts.join(&sep))
        }
        "map" | "filter" | "each" => {
            let callee = args.get(0);
            if !callee.is_callable() {
                return Err(ScriptError::argument(format!("`{}` expects a closure", method)));
            }
            let mut out = Vec::new();
            for item in items {
                let result = interpreter.call_value(
                    &callee,
                    CallArgs::new(vec![item.clone()]).at(args.position),
                    host,
                )?;
                match method {
                    "map" => out.push(result),
                    "filter" if result.is_truthy() => out.push(item.clone()),
                    _ => {}
                }
            }
            if method == "each" {
                Value::Array(items.to_vec())
            } else {
                Value::Array(out)
            }
        }
        _ => return Err(ScriptError::undefined_method(method, "array")),
    };
    Ok(value)
}

fn map_method(
    map: &BTreeMap<String, Value>,
    method: &str,
    args: &CallArgs,
) -> Result<Value, ScriptError> {
    let value = match method {
        "len" => Value::Int(map.len() as i64),
        "is_empty" => Value::Bool(map.is_empty()),
        "keys" => Value::Array(map.keys().cloned().map(Value::Str).collect()),
        "values" => Value::Array(map.values().cloned().collect()),
        "get" => {
            let key = str_arg(args, 0, method)?;
            map.get(&key).cloned().unwrap_or_else(|| args.get(1))
        }
        "contains_key" => Value::Bool(map.contains_key(&str_arg(args, 0, method)?)),
        _ => return Err(ScriptError::undefined_method(method, "map")),
    };
    Ok(value)
}

/// `receiver[index]`; out-of-range and missing keys yield nil
pub fn index(receiver: &Value, index: &Value) -> Result<Value, ScriptError> {
    match (receiver, index) {
        (Value::Array(items), Value::Int(i)) => {
            let len = items.len() as i64;
            let slot = if *i < 0 { len + i } else { *i };
            Ok(if (0..len).contains(&slot) {
                items[slot as usize].clone()
            } else {
                Value::Nil
            })
        }
        (Value::Map(map), Value::Str(key)) => Ok(map.get(key).cloned().unwrap_or_default()),
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let slot = if *i < 0 { len + i } else { *i };
            Ok(if (0..len).contains(&slot) {
                Value::str(chars[slot as usize].to_string())
            } else {
                Value::Nil
            })
        }
        (Value::Nil, _) => Err(ScriptError::type_error("cannot index nil")),
        (receiver, index) => Err(ScriptError::type_error(format!(
            "cannot index {} with {}",
            receiver.type_name(),
            index.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{NoHost, ScriptErrorKind};

    fn eval(source: &str) -> Value {
        Interpreter::new().eval_source(source, &NoHost).unwrap()
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(eval("\"salutations\".upcase()"), Value::str("SALUTATIONS"));
        assert_eq!(eval("\" x \".trim"), Value::str("x"));
        assert_eq!(eval("\"a,b\".split(\",\").len"), Value::Int(2));
        assert_eq!(eval("\"42\".to_int"), Value::Int(42));
        assert_eq!(eval("\"main\".starts_with(\"ma\")"), Value::Bool(true));
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(eval("[1, 2, 3].map(|n| n * 2).join(\",\")"), Value::str("2,4,6"));
        assert_eq!(eval("[1, 2, 3].filter(|n| n > 1).len"), Value::Int(2));
        assert_eq!(eval("[1, 2][-1]"), Value::Int(2));
        assert_eq!(eval("[][0]"), Value::Nil);
    }

    #[test]
    fn test_map_methods() {
        assert_eq!(eval("#{b: 1, a: 2}.keys"), eval("[\"a\", \"b\"]"));
        assert_eq!(eval("#{a: 1}.get(\"z\", 5)"), Value::Int(5));
        assert_eq!(eval("#{a: 1}[:a]"), Value::Int(1));
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("type_of(#{})"), Value::str("map"));
        assert_eq!(eval("inspect(\"x\")"), Value::str("\"x\""));
        assert_eq!(eval("range(3)").to_string(), "[0, 1, 2]");
    }

    #[test]
    fn test_fail_raises() {
        let err = Interpreter::new()
            .eval_source("fail(\"nope\")", &NoHost)
            .unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::Raised);
        assert_eq!(err.message, "nope");
    }

    #[test]
    fn test_unknown_method() {
        let err = Interpreter::new()
            .eval_source("1.danger()", &NoHost)
            .unwrap_err();
        assert!(err.is_undefined_call());
        assert!(err.message.contains("for int"));
    }
}
