//! Runtime values.
//!
//! A [`Value`] is the tagged union stored in every [`Variable`](crate::Variable).
//! Lists and maps are reference values: cloning a `Value::List` clones the
//! handle, so nested mutation through one alias is visible through every other.
//! Scalars (text, numbers, booleans) are copied.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use zmk_ir::{ClassDef, Literal, Subroutine, ValueKind};

use crate::errors::{integer_overflow, kind_mismatch, type_mismatch, EvalResult};
use crate::host::HostObject;
use crate::sink::{buffer_sink, SharedSink};

/// Shared, mutable list storage.
pub type SharedList = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable map storage. Keys keep insertion order.
pub type SharedMap = Arc<RwLock<IndexMap<String, Value>>>;

/// A numeric value. Integer arithmetic stays integral until a float is involved.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "script numbers widen to f64")]
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    /// Integer view; floats with a fractional part are rejected.
    pub fn as_int(self) -> EvalResult<i64> {
        match self {
            Number::Int(n) => Ok(n),
            #[expect(
                clippy::cast_possible_truncation,
                reason = "range and fraction are checked first"
            )]
            Number::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e18 => Ok(f as i64),
            Number::Float(_) => Err(type_mismatch("integer", "fractional number")),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.partial_cmp(b),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A dynamically-typed script value.
#[derive(Clone)]
pub enum Value {
    /// Absent value.
    Null,
    Str(String),
    Bool(bool),
    Num(Number),
    List(SharedList),
    Map(SharedMap),
    /// Append-only text sink.
    Writer(SharedSink),
    Class(Arc<ClassDef>),
    Sub(Arc<Subroutine>),
    Host(Arc<dyn HostObject>),
}

impl Value {
    #[inline]
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Num(Number::Int(n))
    }

    #[inline]
    pub fn float(f: f64) -> Self {
        Value::Num(Number::Float(f))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(RwLock::new(entries)))
    }

    pub fn empty_list() -> Self {
        Value::list(Vec::new())
    }

    pub fn empty_map() -> Self {
        Value::map(IndexMap::new())
    }

    /// A fresh string-buffer writer.
    pub fn buffer() -> Self {
        Value::Writer(buffer_sink())
    }

    pub fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::int(*n),
            Literal::Float(f) => Value::float(*f),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The runtime kind of this value. Never `Any`.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Str(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::Num(_) => ValueKind::Num,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Writer(_) => ValueKind::Writer,
            Value::Class(_) => ValueKind::Class,
            Value::Sub(_) => ValueKind::Sub,
            Value::Host(_) => ValueKind::Host,
        }
    }

    /// Name used in diagnostics; host objects report their own type name.
    pub fn type_name(&self) -> String {
        match self {
            Value::Host(host) => host.type_name().to_string(),
            other => other.kind().name().to_string(),
        }
    }

    /// Text form used for output, concatenation and textual coercion.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => n.to_string(),
            Value::List(items) => {
                let items = items.read();
                let parts: Vec<String> = items.iter().map(Value::to_text).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(entries) => {
                let entries = entries.read();
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.to_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Writer(sink) => sink.contents(),
            Value::Class(class) => class.name.clone(),
            Value::Sub(sub) => sub.name.clone(),
            Value::Host(host) => host.to_text(),
        }
    }

    /// Truth value for conditions.
    pub fn to_bool(&self) -> EvalResult<bool> {
        match self {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Num(n) => Ok(!n.is_zero()),
            Value::Str(s) => match s.trim() {
                "" | "false" => Ok(false),
                "true" => Ok(true),
                other => parse_number(other)
                    .map(|n| !n.is_zero())
                    .ok_or_else(|| type_mismatch(ValueKind::Bool, format!("text \"{s}\""))),
            },
            Value::List(items) => Ok(!items.read().is_empty()),
            Value::Map(entries) => Ok(!entries.read().is_empty()),
            other => Err(kind_mismatch(ValueKind::Bool, other.kind())),
        }
    }

    /// Numeric coercion: text is parsed, booleans become `1`/`0`.
    pub fn to_number(&self) -> EvalResult<Number> {
        match self {
            Value::Num(n) => Ok(*n),
            Value::Bool(b) => Ok(Number::Int(i64::from(*b))),
            Value::Str(s) => parse_number(s.trim())
                .ok_or_else(|| type_mismatch(ValueKind::Num, format!("text \"{s}\""))),
            Value::Writer(sink) => {
                let text = sink.contents();
                parse_number(text.trim())
                    .ok_or_else(|| type_mismatch(ValueKind::Num, format!("text \"{text}\"")))
            }
            other => Err(kind_mismatch(ValueKind::Num, other.kind())),
        }
    }

    pub fn as_int(&self) -> EvalResult<i64> {
        self.to_number()?.as_int()
    }

    /// Integer view narrowed to `i32`, used for exit and command levels.
    pub fn as_level(&self) -> EvalResult<i32> {
        let n = self.as_int()?;
        i32::try_from(n).map_err(|_| integer_overflow("level conversion"))
    }

    /// Coerce to the declared kind of an assignment target.
    ///
    /// Textual kinds stringify, `Bool`/`Num` go through numeric coercion,
    /// reference kinds require an exact match. `Null` is accepted by every
    /// kind and `Any` accepts everything unchanged.
    pub fn coerce_to(self, kind: ValueKind) -> EvalResult {
        if self.is_null() || kind == ValueKind::Any {
            return Ok(self);
        }
        match kind {
            ValueKind::String => match self {
                Value::Str(_) => Ok(self),
                other => Ok(Value::Str(other.to_text())),
            },
            ValueKind::Writer => match self {
                Value::Writer(_) => Ok(self),
                other => Ok(Value::Str(other.to_text())),
            },
            ValueKind::Num => self.to_number().map(Value::Num),
            ValueKind::Bool => self.to_bool().map(Value::Bool),
            ValueKind::Null => Err(kind_mismatch(kind, self.kind())),
            _ if self.kind() == kind => Ok(self),
            _ => Err(kind_mismatch(kind, self.kind())),
        }
    }

    /// `true` when both values are the same shared object or both are scalars.
    fn same_handle(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Writer(a), Value::Writer(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Sub(a), Value::Sub(b)) => Arc::ptr_eq(a, b),
            (Value::Host(a), Value::Host(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Parse script number text: integers first, then floats.
pub fn parse_number(text: &str) -> Option<Number> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Number::Int(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.same_handle(other) {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.read() == *b.read(),
            (Value::Map(a), Value::Map(b)) => *a.read() == *b.read(),
            (Value::Class(a), Value::Class(b)) => a.name == b.name,
            (Value::Sub(a), Value::Sub(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Num(n) => write!(f, "Num({n})"),
            Value::List(items) => f.debug_tuple("List").field(&*items.read()).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(&*entries.read()).finish(),
            Value::Writer(_) => f.write_str("Writer(..)"),
            Value::Class(class) => write!(f, "Class({})", class.name),
            Value::Sub(sub) => write!(f, "Sub({})", sub.name),
            Value::Host(host) => write!(f, "Host({})", host.type_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

#[cfg(test)]
mod tests;
