//! Variables: named, typed, mutable cells.
//!
//! A scope holds [`VarRef`]s, not values. Two scopes holding the same
//! `VarRef` see each other's writes; [`Variable::duplicate`] allocates a
//! new cell with the current value and never aliases the old one.
//!
//! Each cell is guarded by its own lock, which makes a single read or
//! write atomic. Nothing coordinates sequences of accesses across threads.

use std::sync::Arc;

use parking_lot::RwLock;
use zmk_ir::ValueKind;

use crate::errors::{immutable_binding, kind_mismatch, EvalResult};
use crate::value::Value;

/// Shared handle to a variable cell.
pub type VarRef = Arc<Variable>;

#[derive(Debug)]
pub struct Variable {
    name: String,
    kind: ValueKind,
    is_const: bool,
    value: RwLock<Value>,
}

impl Variable {
    /// Create a cell, coercing `value` to `kind`.
    pub fn new(
        name: impl Into<String>,
        kind: ValueKind,
        value: Value,
        is_const: bool,
    ) -> EvalResult<VarRef> {
        let value = value.coerce_to(kind)?;
        Ok(Arc::new(Variable {
            name: name.into(),
            kind,
            is_const,
            value: RwLock::new(value),
        }))
    }

    /// Create a cell holding `value` as is. The caller guarantees the
    /// value already fits `kind`.
    pub(crate) fn raw(
        name: impl Into<String>,
        kind: ValueKind,
        value: Value,
        is_const: bool,
    ) -> VarRef {
        Arc::new(Variable {
            name: name.into(),
            kind,
            is_const,
            value: RwLock::new(value),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn get(&self) -> Value {
        self.value.read().clone()
    }

    /// Store `value` with the kind's coercion rule.
    ///
    /// A variable currently holding a writer keeps its sink: the sink is
    /// cleared and the new value's text appended.
    pub fn assign(&self, value: Value) -> EvalResult<()> {
        if self.is_const {
            return Err(immutable_binding(&self.name));
        }
        let current = self.get();
        if let (Value::Writer(sink), false) = (&current, matches!(value, Value::Writer(_))) {
            sink.clear()?;
            return sink.write(&value.to_text());
        }
        let value = value.coerce_to(self.kind)?;
        *self.value.write() = value;
        Ok(())
    }

    /// `+=`: concatenate text, push onto a list, add numbers.
    ///
    /// Writers and lists are mutated in place, which is allowed on const
    /// variables; everything else rebinds the cell.
    pub fn append(&self, value: Value) -> EvalResult<()> {
        let current = self.get();
        match current {
            Value::Writer(sink) => sink.write(&value.to_text()),
            Value::List(items) => {
                let extra = flatten(value);
                items.write().extend(extra);
                Ok(())
            }
            _ if self.is_const => Err(immutable_binding(&self.name)),
            Value::Null if self.kind == ValueKind::List => self.assign(Value::list(flatten(value))),
            Value::Null => self.assign(value),
            Value::Num(a) if matches!(value, Value::Num(_)) || self.kind == ValueKind::Num => {
                let sum = crate::calc::add_numbers(a, value.to_number()?)?;
                self.assign(Value::Num(sum))
            }
            scalar @ (Value::Str(_) | Value::Num(_) | Value::Bool(_)) => {
                let mut text = scalar.to_text();
                text.push_str(&value.to_text());
                self.assign(Value::Str(text))
            }
            other => Err(kind_mismatch(ValueKind::List, other.kind())),
        }
    }

    /// Overwrite the value without the const check. Used by the handler
    /// machinery for the per-thread `error` variable.
    pub(crate) fn replace(&self, value: Value) -> Value {
        std::mem::replace(&mut *self.value.write(), value)
    }

    /// A new cell with the same name, kind, flag and current value.
    pub fn duplicate(&self) -> VarRef {
        Variable::raw(self.name.clone(), self.kind, self.get(), self.is_const)
    }
}

/// Elements to append: a list contributes its elements, anything else itself.
pub(crate) fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::List(other) => other.read().clone(),
        other => vec![other],
    }
}
