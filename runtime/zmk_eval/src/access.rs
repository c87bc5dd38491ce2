//! Data-access primitives.
//!
//! Path resolution walks a [`DataPath`](zmk_ir::DataPath) one segment at a
//! time. The interpreter drives the walk (roots, class members and method
//! calls need it); this module holds the per-segment steps over plain
//! containers and host objects, plus the flags that shape a resolution.

use bitflags::bitflags;

use crate::errors::{
    index_out_of_bounds, private_member, type_mismatch, undefined_field, EvalResult,
};
use crate::host::{read_field, HostObject};
use crate::value::Value;
use crate::variable::VarRef;

bitflags! {
    /// Options for a path resolution.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ResolveFlags: u8 {
        /// Permit `_`-prefixed members.
        const ALLOW_PRIVATE = 1;
        /// Stop before the last segment and return its container.
        const WANT_CONTAINER = 1 << 1;
        /// For a bare variable path, return the cell itself.
        const WANT_VARIABLE = 1 << 2;
    }
}

/// Outcome of a resolution.
#[derive(Clone, Debug)]
pub enum Resolved {
    Value(Value),
    Variable(VarRef),
}

impl Resolved {
    pub fn into_value(self) -> Value {
        match self {
            Resolved::Value(v) => v,
            Resolved::Variable(var) => var.get(),
        }
    }
}

#[inline]
pub fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

pub(crate) fn check_private(name: &str, flags: ResolveFlags) -> EvalResult<()> {
    if is_private(name) && !flags.contains(ResolveFlags::ALLOW_PRIVATE) {
        Err(private_member(name))
    } else {
        Ok(())
    }
}

fn list_slot(index: &Value, len: usize) -> EvalResult<usize> {
    let i = index.as_int()?;
    usize::try_from(i)
        .ok()
        .filter(|&slot| slot < len)
        .ok_or_else(|| index_out_of_bounds(i, len))
}

/// `container.name` for maps and host objects.
pub(crate) fn field(container: &Value, name: &str, flags: ResolveFlags) -> EvalResult {
    match container {
        Value::Map(entries) => entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| undefined_field(name, "Map")),
        Value::Host(host) => {
            check_private(name, flags)?;
            read_field(host.as_ref(), name)
        }
        other => Err(undefined_field(name, &other.type_name())),
    }
}

/// `container[index]`.
pub(crate) fn index(container: &Value, index: &Value) -> EvalResult {
    match container {
        Value::List(items) => {
            let items = items.read();
            let slot = list_slot(index, items.len())?;
            Ok(items[slot].clone())
        }
        Value::Map(entries) => {
            let key = index.to_text();
            entries
                .read()
                .get(&key)
                .cloned()
                .ok_or_else(|| undefined_field(&key, "Map"))
        }
        other => Err(type_mismatch("List or Map", other.kind())),
    }
}

/// `container.name = value`.
pub(crate) fn store_field(
    container: &Value,
    name: &str,
    value: Value,
    flags: ResolveFlags,
) -> EvalResult<()> {
    match container {
        Value::Map(entries) => {
            entries.write().insert(name.to_string(), value);
            Ok(())
        }
        Value::Host(host) => {
            check_private(name, flags)?;
            host.set_field(name, value)
        }
        other => Err(type_mismatch("Map or Host", other.kind())),
    }
}

/// `container[index] = value`. Storing one past the end of a list appends.
pub(crate) fn store_index(container: &Value, index: &Value, value: Value) -> EvalResult<()> {
    match container {
        Value::List(items) => {
            let mut items = items.write();
            let len = items.len();
            if index.as_int()? == i64::try_from(len).unwrap_or(i64::MAX) {
                items.push(value);
                return Ok(());
            }
            let slot = list_slot(index, len)?;
            items[slot] = value;
            Ok(())
        }
        Value::Map(entries) => {
            entries.write().insert(index.to_text(), value);
            Ok(())
        }
        other => Err(type_mismatch("List or Map", other.kind())),
    }
}

/// Host method call helper used by the interpreter's segment walk.
pub(crate) fn call_host(host: &dyn HostObject, method: &str, args: Vec<Value>, flags: ResolveFlags) -> EvalResult {
    check_private(method, flags)?;
    host.call_method(method, args)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::ErrorTag;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Probe;

    impl HostObject for Probe {
        fn type_name(&self) -> &str {
            "Probe"
        }

        fn field(&self, name: &str) -> EvalResult<Option<Value>> {
            Ok(match name {
                "name" | "_secret" => Some(Value::str(name)),
                _ => None,
            })
        }
    }

    #[test]
    fn map_fields_and_keys() {
        let mut entries = IndexMap::new();
        entries.insert("a".to_string(), Value::int(1));
        let map = Value::map(entries);
        assert_eq!(field(&map, "a", ResolveFlags::empty()).unwrap(), Value::int(1));
        assert_eq!(index(&map, &Value::str("a")).unwrap(), Value::int(1));
        assert_eq!(
            field(&map, "b", ResolveFlags::empty()).unwrap_err().tag(),
            ErrorTag::NotFound
        );
    }

    #[test]
    fn list_indexing_is_bounds_checked() {
        let list = Value::list(vec![Value::int(10)]);
        assert_eq!(index(&list, &Value::int(0)).unwrap(), Value::int(10));
        assert_eq!(
            index(&list, &Value::int(1)).unwrap_err().tag(),
            ErrorTag::NotFound
        );
        assert_eq!(
            index(&list, &Value::int(-1)).unwrap_err().tag(),
            ErrorTag::NotFound
        );
    }

    #[test]
    fn store_one_past_the_end_appends() {
        let list = Value::list(vec![Value::int(1)]);
        store_index(&list, &Value::int(1), Value::int(2)).unwrap();
        store_index(&list, &Value::int(0), Value::int(0)).unwrap();
        assert_eq!(list.to_text(), "[0, 2]");
        assert!(store_index(&list, &Value::int(5), Value::Null).is_err());
    }

    #[test]
    fn private_host_fields_need_permission() {
        let host = Value::Host(std::sync::Arc::new(Probe));
        assert_eq!(
            field(&host, "_secret", ResolveFlags::empty()).unwrap_err().tag(),
            ErrorTag::NotFound
        );
        assert_eq!(
            field(&host, "_secret", ResolveFlags::ALLOW_PRIVATE).unwrap(),
            Value::str("_secret")
        );
        assert_eq!(
            field(&host, "missing", ResolveFlags::empty()).unwrap_err().tag(),
            ErrorTag::NotFound
        );
    }
}
