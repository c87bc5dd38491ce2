//! Text output, redirection and writer variables.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use zmk_ir::build::*;
use zmk_ir::{StatementList, ValueKind};

use super::support::{value_of, Harness};
use crate::{ErrorTag, Signal, Value};

#[test]
fn text_is_reproduced_on_every_execution() {
    let mut h = Harness::new();
    let page = StatementList::new(vec![text("<h1>"), text("title"), text("</h1>\n")]);
    let scope = h.interp.root_scope(&h.out);
    for _ in 0..3 {
        assert_eq!(h.interp.execute(&page, &h.out, &scope), Signal::Continue);
    }
    assert_eq!(h.output(), "<h1>title</h1>\n".repeat(3));
}

#[test]
fn emit_writes_the_text_form() {
    let mut h = Harness::new();
    h.exec(vec![
        define("n", ValueKind::Num, int(42)),
        define("l", ValueKind::List, list_of(vec![int(1), string("a")])),
        emit(path("n")),
        text(" "),
        emit(path("l")),
    ]);
    assert_eq!(h.output(), "42 [1, a]");
}

#[test]
fn access_reads_without_writing() {
    let mut h = Harness::new();
    let (signal, _) = h.exec(vec![define("n", ValueKind::Num, int(1)), access(path("n"))]);
    assert_eq!(signal, Signal::Continue);
    assert_eq!(h.output(), "");
}

#[test]
fn debug_markers_are_invisible() {
    let mut h = Harness::new();
    let (signal, _) = h.exec(vec![text("a"), debug("checkpoint"), text("b")]);
    assert_eq!(signal, Signal::Continue);
    assert_eq!(h.output(), "ab");
}

mod redirect {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_writer_variables_get_a_buffer() {
        let mut h = Harness::new();
        let (_, scope) = h.exec(vec![
            define("w", ValueKind::Writer, null()),
            redirect("w", vec![text("captured")]),
            text("root"),
        ]);
        assert_eq!(h.output(), "root");
        assert!(matches!(value_of(&scope, "w"), Value::Writer(_)));
        assert_eq!(value_of(&scope, "w").to_text(), "captured");
    }

    #[test]
    fn string_variables_receive_the_text() {
        let mut h = Harness::new();
        let (_, scope) = h.exec(vec![
            declare("s", ValueKind::String),
            redirect("s", vec![text("one")]),
            redirect("s", vec![text(" two")]),
        ]);
        assert_eq!(value_of(&scope, "s"), Value::str("one two"));
        assert_eq!(h.output(), "");
    }

    #[test]
    fn redirects_nest() {
        let mut h = Harness::new();
        let (_, scope) = h.exec(vec![
            declare("outer", ValueKind::String),
            declare("inner", ValueKind::String),
            redirect(
                "outer",
                vec![text("a"), redirect("inner", vec![text("b")]), text("c")],
            ),
        ]);
        assert_eq!(value_of(&scope, "outer"), Value::str("ac"));
        assert_eq!(value_of(&scope, "inner"), Value::str("b"));
    }

    #[test]
    fn redirect_to_text_writes_the_root_sink() {
        let mut h = Harness::new();
        h.exec(vec![redirect("text", vec![text("direct")])]);
        assert_eq!(h.output(), "direct");
    }

    #[test]
    fn redirect_to_an_undefined_variable_is_not_found() {
        let mut h = Harness::new();
        let (signal, _) = h.exec(vec![redirect("nowhere", vec![text("x")])]);
        assert_eq!(signal, Signal::Exception);
        assert_eq!(h.interp.take_error().unwrap().tag(), ErrorTag::NotFound);
    }

    #[test]
    fn appending_to_a_writer_writes_through() {
        let mut h = Harness::new();
        let (_, scope) = h.exec(vec![
            declare("w", ValueKind::Writer),
            append(path("w"), string("x")),
            append(path("w"), int(1)),
        ]);
        assert_eq!(value_of(&scope, "w").to_text(), "x1");
    }
}

mod writer_files {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writer_initialized_with_a_path_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::with(|b| b.cwd(dir.path()));
        let (signal, _) = h.exec(vec![
            define("out", ValueKind::Writer, string("gen.h")),
            redirect("out", vec![text("#define X 1\n")]),
        ]);
        assert_eq!(signal, Signal::Continue);
        let written = std::fs::read_to_string(dir.path().join("gen.h")).unwrap();
        assert_eq!(written, "#define X 1\n");
    }

    #[test]
    fn unopenable_writer_files_are_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::with(|b| b.cwd(dir.path()));
        let (signal, _) = h.exec(vec![define(
            "out",
            ValueKind::Writer,
            string("missing/dir/gen.h"),
        )]);
        assert_eq!(signal, Signal::Exception);
        assert_eq!(h.interp.take_error().unwrap().tag(), ErrorTag::FileError);
    }
}

#[test]
fn host_output_sink_is_used_for_subroutine_calls() {
    let mut h = Harness::new();
    let sink = crate::buffer_sink();
    let sub = zmk_ir::Subroutine::new("hello", vec![], StatementList::new(vec![text("hi")]));
    h.interp
        .execute_subroutine(&sub, vec![], &Arc::clone(&sink), std::path::Path::new("."))
        .unwrap();
    assert_eq!(sink.contents(), "hi");
    assert_eq!(h.output(), "");
}
