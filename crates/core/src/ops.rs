//! Generic equality and stringification
//!
//! These are the host operations extensions delegate to for element-wise
//! work. Userdata take part through their metatables: `__eq` for equality
//! and `tostr` for rendering, so nested extension values recurse back into
//! the extension's own entry points.

use crate::error::{RuntimeError, RuntimeResult};
use crate::stack::State;
use crate::value::Value;
use std::rc::Rc;

/// `a == b` as the host evaluates it
pub fn generic_equals(state: &mut State, a: &Value, b: &Value) -> RuntimeResult<bool> {
    match (a, b) {
        (Value::Undef, Value::Undef) => Ok(true),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Float(x), Value::Float(y)) => Ok(x == y),
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            Ok(*x as f64 == *y)
        }
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (Value::List(x), Value::List(y)) => Ok(Rc::ptr_eq(x, y)),
        (Value::Table(x), Value::Table(y)) => Ok(Rc::ptr_eq(x, y)),
        (Value::Function(x), Value::Function(y)) => Ok(x.same_entry(y)),
        (Value::UserData(x), Value::UserData(y)) => {
            if Rc::ptr_eq(x, y) {
                return Ok(true);
            }
            if x.tag() != y.tag() {
                return Ok(false);
            }
            let eq = x.metatable().and_then(|mt| mt.get("__eq").copied());
            match eq {
                Some(eq) => {
                    let result = state.call_one(&eq, vec![a.clone(), b.clone()])?;
                    Ok(result.as_bool().unwrap_or(false))
                }
                None => Ok(false),
            }
        }
        _ => Ok(false),
    }
}

/// Render `value` as text, honouring `format` where the type supports one
pub fn generic_stringify(
    state: &mut State,
    value: &Value,
    format: Option<&str>,
) -> RuntimeResult<String> {
    stringify_at(state, value, format, 0)
}

fn stringify_at(
    state: &mut State,
    value: &Value,
    format: Option<&str>,
    depth: usize,
) -> RuntimeResult<String> {
    match value {
        Value::Undef => Ok("undef".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(n) => format_int(*n, format),
        Value::Float(f) => Ok(format_float(*f)),
        Value::Str(s) => Ok(s.to_string()),
        Value::List(list) => {
            if depth >= state.config().max_nesting_depth {
                return Ok("[...]".to_string());
            }
            let items = list.borrow().clone();
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(stringify_at(state, item, format, depth + 1)?);
            }
            Ok(format!("[{}]", parts.join(", ")))
        }
        Value::Table(table) => {
            if depth >= state.config().max_nesting_depth {
                return Ok("{...}".to_string());
            }
            let entries: Vec<_> = table
                .borrow()
                .iter()
                .map(|(k, v)| (k.to_value(), v.clone()))
                .collect();
            let mut parts = Vec::with_capacity(entries.len());
            for (k, v) in &entries {
                let k = stringify_at(state, k, format, depth + 1)?;
                let v = stringify_at(state, v, format, depth + 1)?;
                parts.push(format!("{}: {}", k, v));
            }
            parts.sort();
            Ok(format!("{{{}}}", parts.join(", ")))
        }
        Value::UserData(ud) => {
            let tostr = ud.metatable().and_then(|mt| mt.get("tostr").copied());
            match tostr {
                Some(tostr) => {
                    let mut args = vec![value.clone()];
                    if let Some(fmt) = format {
                        args.push(Value::str(fmt));
                    }
                    match state.call_one(&tostr, args)? {
                        Value::Str(s) => Ok(s.to_string()),
                        other => Err(RuntimeError::type_error(format!(
                            "tostr must return a str, got {}.",
                            other.type_name()
                        ))),
                    }
                }
                None => Ok(format!("<{}>", ud.tag())),
            }
        }
        Value::Function(f) => Ok(format!("<fn {}>", f.name)),
    }
}

fn format_int(n: i64, format: Option<&str>) -> RuntimeResult<String> {
    let sign = if n < 0 { "-" } else { "" };
    let abs = n.unsigned_abs();
    match format {
        None | Some("d") => Ok(n.to_string()),
        Some("x") => Ok(format!("{}{:x}", sign, abs)),
        Some("b") => Ok(format!("{}{:b}", sign, abs)),
        Some("o") => Ok(format!("{}{:o}", sign, abs)),
        Some(other) => Err(RuntimeError::value(format!(
            "unknown format specifier {:?} for int.",
            other
        ))),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        (if f > 0.0 { "inf" } else { "-inf" }).to_string()
    } else {
        format!("{:?}", f)
    }
}
