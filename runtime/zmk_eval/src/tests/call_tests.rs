//! Subroutine call protocol: binding, defaults, results, call modes.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use pretty_assertions::assert_eq;
use zmk_ir::build::*;
use zmk_ir::{BinaryOp, Param, Script, StatementList, Subroutine, ValueKind};

use super::support::{value_of, Harness};
use crate::{ErrorKind, ErrorTag, Signal, Value};

/// `sub f(Num a, Num b = 5) { return a + b; }`
fn add_sub() -> Subroutine {
    Subroutine::new(
        "f",
        vec![
            Param::new("a", ValueKind::Num),
            Param::new("b", ValueKind::Num).with_default(int(5)),
        ],
        block(vec![return_(Some(binary(BinaryOp::Add, var("a"), var("b"))))]),
    )
}

fn with_subs(subs: Vec<Subroutine>) -> Harness {
    let mut h = Harness::new();
    let script = subs
        .into_iter()
        .fold(Script::new("subs.zm", StatementList::default()), Script::with_sub);
    h.load(script);
    h
}

#[test]
fn defaults_fill_missing_arguments() {
    let mut h = with_subs(vec![add_sub()]);
    let (signal, scope) = h.exec(vec![
        declare("r", ValueKind::Num),
        call_into(path("r"), "f", vec![arg("a", int(3))]),
    ]);
    assert_eq!(signal, Signal::Continue);
    assert_eq!(value_of(&scope, "r"), Value::int(8));
}

#[test]
fn calls_work_as_expressions() {
    let mut h = with_subs(vec![add_sub()]);
    let (_, scope) = h.exec(vec![define(
        "r",
        ValueKind::Num,
        call_expr("f", vec![arg("a", int(1)), arg("b", int(2))]),
    )]);
    assert_eq!(value_of(&scope, "r"), Value::int(3));
}

#[test]
fn results_are_coerced_to_the_destination() {
    let mut h = with_subs(vec![add_sub()]);
    let (_, scope) = h.exec(vec![
        declare("r", ValueKind::String),
        call_into(path("r"), "f", vec![arg("a", int(3))]),
    ]);
    assert_eq!(value_of(&scope, "r"), Value::str("8"));
}

#[test]
fn unknown_argument_fails_before_the_body_runs() {
    let body = block(vec![text("ran")]);
    let sub = Subroutine::new("h", vec![Param::new("a", ValueKind::Num)], body);
    let mut h = with_subs(vec![sub]);
    let (signal, _) = h.exec(vec![call("h", vec![arg("zzz", int(1))])]);
    assert_eq!(signal, Signal::Exception);
    let err = h.interp.take_error().unwrap();
    assert_eq!(err.tag(), ErrorTag::Internal);
    assert!(matches!(err.kind, ErrorKind::ArgumentError { .. }));
    assert_eq!(h.output(), "");
}

#[test]
fn defaults_cannot_see_caller_locals() {
    let sub = Subroutine::new(
        "g",
        vec![Param::new("a", ValueKind::Num).with_default(var("secret"))],
        StatementList::default(),
    );
    let mut h = with_subs(vec![sub]);
    let (signal, _) = h.exec(vec![define("secret", ValueKind::Num, int(1)), call("g", vec![])]);
    assert_eq!(signal, Signal::Exception);
    assert_eq!(h.interp.take_error().unwrap().tag(), ErrorTag::NotFound);
}

#[test]
fn callee_scope_does_not_see_caller_locals() {
    let sub = Subroutine::new("peek", vec![], block(vec![emit(path("local"))]));
    let mut h = with_subs(vec![sub]);
    let (signal, _) = h.exec(vec![define("local", ValueKind::Num, int(1)), call("peek", vec![])]);
    assert_eq!(signal, Signal::Exception);
    let err = h.interp.take_error().unwrap();
    assert_eq!(err.tag(), ErrorTag::NotFound);
    assert!(err.notes.iter().any(|n| n.starts_with("in peek called at")));
}

#[test]
fn defaults_cannot_see_script_level_locals() {
    let sub = Subroutine::new(
        "g",
        vec![Param::new("a", ValueKind::Num).with_default(var("secret"))],
        block(vec![emit(path("a"))]),
    );
    let mut h = Harness::new();
    let script = Script::new(
        "main.zm",
        StatementList::new(vec![define("secret", ValueKind::Num, int(41)), call("g", vec![])]),
    )
    .with_sub(sub);
    let err = h.run_script(script).unwrap_err();
    assert_eq!(err.tag(), ErrorTag::NotFound);
    assert_eq!(h.output(), "");
}

#[test]
fn callees_cannot_see_script_level_locals() {
    let sub = Subroutine::new("peek", vec![], block(vec![emit(path("local"))]));
    let mut h = Harness::new();
    let script = Script::new(
        "main.zm",
        StatementList::new(vec![define("local", ValueKind::Num, int(7)), call("peek", vec![])]),
    )
    .with_sub(sub);
    let err = h.run_script(script).unwrap_err();
    assert_eq!(err.tag(), ErrorTag::NotFound);
    assert_eq!(h.output(), "");
}

#[test]
fn script_level_globals_stay_visible_to_callees() {
    let sub = Subroutine::new("show", vec![], block(vec![emit(path("target"))]));
    let mut h = Harness::with(|b| b.global("target", Value::str("all")));
    let script = Script::new("main.zm", StatementList::new(vec![call("show", vec![])])).with_sub(sub);
    h.run_script(script).unwrap();
    assert_eq!(h.output(), "all");
}

#[test]
fn mismatched_argument_kind_is_an_argument_error() {
    let sub = Subroutine::new("k", vec![Param::new("a", ValueKind::Num)], StatementList::default());
    let mut h = with_subs(vec![sub]);
    let (signal, _) = h.exec(vec![call("k", vec![arg("a", string("abc"))])]);
    assert_eq!(signal, Signal::Exception);
    let err = h.interp.take_error().unwrap();
    assert!(matches!(err.kind, ErrorKind::ArgumentError { .. }), "{err}");
}

#[test]
fn inline_subs_run_in_the_caller_scope() {
    let sub = Subroutine::inline("bump", block(vec![assign(path("n"), int(9))]));
    let mut h = with_subs(vec![sub]);
    let (_, scope) = h.exec(vec![define("n", ValueKind::Num, int(0)), call("bump", vec![])]);
    assert_eq!(value_of(&scope, "n"), Value::int(9));
}

#[test]
fn return_stops_the_body_but_not_the_caller() {
    let sub = Subroutine::new(
        "find",
        vec![Param::new("items", ValueKind::List)],
        block(vec![
            for_each(
                "v",
                var("items"),
                vec![if_then(
                    binary(BinaryOp::Eq, var("v"), int(2)),
                    vec![return_(Some(var("v")))],
                )],
            ),
            text("not reached"),
        ]),
    );
    let mut h = with_subs(vec![sub]);
    let (signal, scope) = h.exec(vec![
        declare("hit", ValueKind::Num),
        call_into(
            path("hit"),
            "find",
            vec![arg("items", list_of(vec![int(1), int(2), int(3)]))],
        ),
        text("after"),
    ]);
    assert_eq!(signal, Signal::Continue);
    assert_eq!(value_of(&scope, "hit"), Value::int(2));
    assert_eq!(h.output(), "after");
}

#[test]
fn recursion_limit_is_internal() {
    let sub = Subroutine::new("rec", vec![], block(vec![call("rec", vec![])]));
    let mut h = Harness::with(|b| b.max_call_depth(16));
    h.load(Script::new("rec.zm", StatementList::default()).with_sub(sub));
    let (signal, _) = h.exec(vec![call("rec", vec![])]);
    assert_eq!(signal, Signal::Exception);
    let err = h.interp.take_error().unwrap();
    assert!(matches!(err.kind, ErrorKind::StackOverflow { depth: 16 }), "{err}");
    assert_eq!(err.tag(), ErrorTag::Internal);
}

#[test]
fn subroutine_references_are_callable() {
    let mut h = with_subs(vec![add_sub()]);
    let (_, scope) = h.exec(vec![
        define("op", ValueKind::Sub, var("f")),
        define("r", ValueKind::Num, call_expr("op", vec![arg("a", int(10))])),
    ]);
    assert_eq!(value_of(&scope, "r"), Value::int(15));
}

#[test]
fn host_calls_return_the_result() {
    let mut h = Harness::new();
    let out = h.out.clone();
    let result = h
        .interp
        .execute_subroutine(&add_sub(), vec![("a".into(), Value::int(4))], &out, Path::new("."))
        .unwrap();
    assert_eq!(result, Some(Value::int(9)));

    let nothing = Subroutine::new("nothing", vec![], StatementList::default());
    let result = h
        .interp
        .execute_subroutine(&nothing, vec![], &out, Path::new("."))
        .unwrap();
    assert_eq!(result, None);
}

#[test]
fn host_call_failures_are_script_errors() {
    let mut h = Harness::new();
    let out = h.out.clone();
    let err = h
        .interp
        .execute_subroutine(&add_sub(), vec![("zzz".into(), Value::int(4))], &out, Path::new("."))
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::Internal);
}

mod target_calls {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder() -> Subroutine {
        Subroutine::new(
            "build",
            vec![Param::new("target", ValueKind::Any)],
            block(vec![emit(path("target"))]),
        )
    }

    #[test]
    fn target_is_resolved_against_the_current_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::with(|b| b.cwd(dir.path()));
        h.load(Script::new("b.zm", StatementList::default()).with_sub(builder()));
        let (signal, _) = h.exec(vec![target_call("build", vec![], string("out/app"))]);
        assert_eq!(signal, Signal::Continue);
        assert_eq!(h.output(), dir.path().join("out/app").display().to_string());
    }

    #[test]
    fn wildcard_targets_become_lists() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.c", "b.c", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let counter = Subroutine::new(
            "count",
            vec![Param::new("target", ValueKind::Any)],
            block(vec![emit(path("target").method("length", vec![]))]),
        );
        let mut h = Harness::with(|b| b.cwd(dir.path()));
        h.load(Script::new("b.zm", StatementList::default()).with_sub(counter));
        h.exec(vec![target_call("count", vec![], string("*.c"))]);
        assert_eq!(h.output(), "2");
    }
}
