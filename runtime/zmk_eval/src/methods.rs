//! Built-in methods on text, lists, maps and writers.
//!
//! Reached through a `.method(args)` path segment when the receiver is not
//! a class or host object.

use crate::calc::values_equal;
use crate::errors::{argument_error, undefined_method, EvalResult};
use crate::value::Value;

fn arity(method: &str, args: &[Value], expected: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(argument_error(
            method,
            format!("expected {expected} argument(s), got {}", args.len()),
        ))
    }
}

fn length(n: usize) -> Value {
    Value::int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Dispatch a built-in method on `receiver`.
pub fn dispatch_builtin_method(receiver: &Value, method: &str, args: &[Value]) -> EvalResult {
    match receiver {
        Value::Str(s) => text_method(s, method, args),
        Value::Writer(sink) => match method {
            "text" => {
                arity(method, args, 0)?;
                Ok(Value::Str(sink.contents()))
            }
            _ => text_method(&sink.contents(), method, args),
        },
        Value::List(items) => {
            let items = items.read();
            match method {
                "length" | "size" => {
                    arity(method, args, 0)?;
                    Ok(length(items.len()))
                }
                "is_empty" => {
                    arity(method, args, 0)?;
                    Ok(Value::Bool(items.is_empty()))
                }
                "contains" => {
                    arity(method, args, 1)?;
                    Ok(Value::Bool(items.iter().any(|v| values_equal(v, &args[0]))))
                }
                "first" => {
                    arity(method, args, 0)?;
                    Ok(items.first().cloned().unwrap_or(Value::Null))
                }
                "last" => {
                    arity(method, args, 0)?;
                    Ok(items.last().cloned().unwrap_or(Value::Null))
                }
                "join" => {
                    arity(method, args, 1)?;
                    let sep = args[0].to_text();
                    let parts: Vec<String> = items.iter().map(Value::to_text).collect();
                    Ok(Value::Str(parts.join(&sep)))
                }
                _ => Err(undefined_method(method, "List")),
            }
        }
        Value::Map(entries) => {
            let entries = entries.read();
            match method {
                "length" | "size" => {
                    arity(method, args, 0)?;
                    Ok(length(entries.len()))
                }
                "keys" => {
                    arity(method, args, 0)?;
                    Ok(Value::list(entries.keys().cloned().map(Value::Str).collect()))
                }
                "values" => {
                    arity(method, args, 0)?;
                    Ok(Value::list(entries.values().cloned().collect()))
                }
                "has" | "contains_key" => {
                    arity(method, args, 1)?;
                    Ok(Value::Bool(entries.contains_key(&args[0].to_text())))
                }
                _ => Err(undefined_method(method, "Map")),
            }
        }
        other => Err(undefined_method(method, &other.type_name())),
    }
}

fn text_method(s: &str, method: &str, args: &[Value]) -> EvalResult {
    match method {
        "length" => {
            arity(method, args, 0)?;
            Ok(length(s.chars().count()))
        }
        "upper" => {
            arity(method, args, 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            arity(method, args, 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "trim" => {
            arity(method, args, 0)?;
            Ok(Value::str(s.trim()))
        }
        "contains" => {
            arity(method, args, 1)?;
            Ok(Value::Bool(s.contains(args[0].to_text().as_str())))
        }
        "starts_with" => {
            arity(method, args, 1)?;
            Ok(Value::Bool(s.starts_with(args[0].to_text().as_str())))
        }
        "ends_with" => {
            arity(method, args, 1)?;
            Ok(Value::Bool(s.ends_with(args[0].to_text().as_str())))
        }
        "replace" => {
            arity(method, args, 2)?;
            Ok(Value::Str(
                s.replace(args[0].to_text().as_str(), &args[1].to_text()),
            ))
        }
        "split" => {
            arity(method, args, 1)?;
            let sep = args[0].to_text();
            let parts = if sep.is_empty() {
                s.split_whitespace().map(Value::str).collect()
            } else {
                s.split(sep.as_str()).map(Value::str).collect()
            };
            Ok(Value::list(parts))
        }
        _ => Err(undefined_method(method, "String")),
    }
}
