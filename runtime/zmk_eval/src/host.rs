//! Opaque objects supplied by the embedding host.

use std::fmt;

use crate::errors::{undefined_field, undefined_method, EvalResult, RuntimeError};
use crate::value::Value;

/// A host-language object reachable from scripts through data-access paths.
///
/// Fields starting with `_` are private; the data-access layer checks this
/// before calling [`field`](HostObject::field), so implementations don't
/// have to.
pub trait HostObject: Send + Sync + fmt::Debug {
    fn type_name(&self) -> &str;

    /// Read a field. `Ok(None)` means the field doesn't exist.
    fn field(&self, name: &str) -> EvalResult<Option<Value>>;

    fn set_field(&self, name: &str, _value: Value) -> EvalResult<()> {
        Err(undefined_field(name, self.type_name()))
    }

    /// Invoke a method with already-evaluated arguments.
    fn call_method(&self, name: &str, _args: Vec<Value>) -> EvalResult {
        Err(undefined_method(name, self.type_name()))
    }

    fn to_text(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

/// Field lookup that turns a miss into `NotFound`.
pub(crate) fn read_field(host: &dyn HostObject, name: &str) -> EvalResult {
    host.field(name)?
        .ok_or_else(|| undefined_field(name, host.type_name()))
}

#[cold]
pub(crate) fn readonly_field(host: &dyn HostObject, name: &str) -> RuntimeError {
    RuntimeError::new(format!(
        "field '{name}' of {} is read-only",
        host.type_name()
    ))
}
