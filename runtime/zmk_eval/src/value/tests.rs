#![allow(clippy::unwrap_used)]

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn text_forms() {
    assert_eq!(Value::Null.to_text(), "");
    assert_eq!(Value::int(3).to_text(), "3");
    assert_eq!(Value::float(2.5).to_text(), "2.5");
    assert_eq!(Value::Bool(true).to_text(), "true");
    assert_eq!(
        Value::list(vec![Value::int(1), Value::str("a")]).to_text(),
        "[1, a]"
    );
    let mut entries = IndexMap::new();
    entries.insert("k".to_string(), Value::int(1));
    assert_eq!(Value::map(entries).to_text(), "{k: 1}");
}

#[test]
fn textual_kinds_stringify() {
    let v = Value::int(42).coerce_to(ValueKind::String).unwrap();
    assert_eq!(v, Value::str("42"));
}

#[test]
fn numeric_kinds_parse_text() {
    assert_eq!(
        Value::str(" 7 ").coerce_to(ValueKind::Num).unwrap(),
        Value::int(7)
    );
    assert_eq!(
        Value::str("1.5").coerce_to(ValueKind::Num).unwrap(),
        Value::float(1.5)
    );
    assert_eq!(
        Value::Bool(true).coerce_to(ValueKind::Num).unwrap(),
        Value::int(1)
    );
    assert!(Value::str("seven").coerce_to(ValueKind::Num).is_err());
}

#[test]
fn bool_coercion() {
    assert_eq!(
        Value::str("false").coerce_to(ValueKind::Bool).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        Value::int(2).coerce_to(ValueKind::Bool).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn reference_kinds_require_exact_match() {
    assert!(Value::int(1).coerce_to(ValueKind::List).is_err());
    assert!(Value::empty_list().coerce_to(ValueKind::List).is_ok());
    assert!(Value::empty_map().coerce_to(ValueKind::List).is_err());
}

#[test]
fn null_and_any_pass_through() {
    assert!(Value::Null.coerce_to(ValueKind::Map).unwrap().is_null());
    let list = Value::empty_list();
    let same = list.clone().coerce_to(ValueKind::Any).unwrap();
    assert_eq!(same, list);
}

#[test]
fn numbers_compare_across_representations() {
    assert_eq!(Value::int(2), Value::float(2.0));
    assert_ne!(Value::int(2), Value::str("2"));
}

#[test]
fn cloned_lists_alias_storage() {
    let a = Value::list(vec![Value::int(1)]);
    let b = a.clone();
    if let Value::List(items) = &b {
        items.write().push(Value::int(2));
    }
    assert_eq!(a.to_text(), "[1, 2]");
}

#[test]
fn fractional_numbers_are_not_integers() {
    assert_eq!(Value::float(4.0).as_int().unwrap(), 4);
    assert!(Value::float(4.5).as_int().is_err());
}
