//! Thread blocks: shared state, handles, waiting and failures.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use zmk_ir::build::*;
use zmk_ir::ValueKind;

use super::support::{value_of, Harness};
use crate::{Completion, Signal, Value};

#[test]
fn threads_share_lists_with_the_spawner() {
    let mut h = Harness::new();
    let (signal, scope) = h.exec(vec![
        declare("items", ValueKind::List),
        thread(vec![append(path("items"), int(1))], None),
        thread(vec![append(path("items"), int(2))], None),
    ]);
    assert_eq!(signal, Signal::Continue);
    h.interp.wait_for_threads();

    let Value::List(items) = value_of(&scope, "items") else {
        panic!("items is not a list");
    };
    let mut numbers: Vec<i64> = items.read().iter().map(|v| v.as_int().unwrap()).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn scalar_assignments_stay_in_the_thread() {
    let mut h = Harness::new();
    let (_, scope) = h.exec(vec![
        define("n", ValueKind::Num, int(0)),
        thread(vec![assign(path("n"), int(5))], None),
    ]);
    h.interp.wait_for_threads();
    assert_eq!(value_of(&scope, "n"), Value::int(0));
}

#[test]
fn handles_expose_name_and_liveness() {
    let mut h = Harness::new();
    h.exec(vec![
        thread(vec![text("x")], Some("t")),
        access(path("t").method("join", vec![])),
        text(" "),
        emit(path("t").field("name")),
        text(" "),
        emit(path("t").field("alive")),
    ]);
    assert_eq!(h.output(), "x thread-1 false");
}

#[test]
fn scripts_wait_for_their_threads() {
    let mut h = Harness::new();
    let outcome = h.run(vec![thread(vec![text("from thread")], None)]).unwrap();
    assert_eq!(outcome, Completion::Finished);
    assert_eq!(h.interp.threads().live_count(), 0);
    assert_eq!(h.output(), "from thread");
}

#[test]
fn uncaught_failures_are_recorded() {
    let mut h = Harness::new();
    let outcome = h
        .run(vec![thread(vec![throw(string("boom"))], None), text("main")])
        .unwrap();
    assert_eq!(outcome, Completion::Finished);
    assert_eq!(h.output(), "main");

    let failures = h.interp.threads().failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].thread, "thread-1");
    assert_eq!(failures[0].error.message, "boom");
}

#[test]
fn exit_ends_only_the_thread() {
    let mut h = Harness::new();
    let outcome = h
        .run(vec![
            thread(vec![exit(int(2)), text("never")], None),
            text("main"),
        ])
        .unwrap();
    assert_eq!(outcome, Completion::Finished);
    assert_eq!(h.output(), "main");
    assert!(h.interp.threads().failures().is_empty());
}

#[test]
fn handlers_inside_threads_use_the_thread_error() {
    let mut h = Harness::new();
    h.exec(vec![thread(
        vec![
            throw(string("inside")),
            on_any_error(vec![emit(path("error"))]),
        ],
        Some("t"),
    )]);
    h.interp.wait_for_threads();
    assert_eq!(h.output(), "inside");

    let (_, scope) = h.exec(vec![]);
    assert!(value_of(&scope, "error").is_null());
}
