//! Constructor helpers for assembling script trees by hand.
//!
//! Used by embedders that generate scripts programmatically and by the
//! evaluator's tests:
//!
//! ```
//! use zmk_ir::build::*;
//! use zmk_ir::ValueKind;
//!
//! let body = block(vec![
//!     define("x", ValueKind::Num, int(2)),
//!     text("x is "),
//!     emit(path("x")),
//! ]);
//! assert!(body.declares_variables);
//! ```

use std::sync::Arc;

use crate::expr::{ActualArg, BinaryOp, DataPath, Expr, Literal, SubCall, UnaryOp};
use crate::kind::{ErrorTag, HandlerKind, ValueKind};
use crate::pos::SourcePos;
use crate::stmt::{
    Branch, CommandSpec, ForLoop, ForSource, Handler, Initializer, Statement, StatementList,
    StmtKind,
};

// Expressions

pub fn null() -> Expr {
    Expr::Literal(Literal::Null)
}

pub fn boolean(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn float(n: f64) -> Expr {
    Expr::Literal(Literal::Float(n))
}

pub fn string(s: impl Into<String>) -> Expr {
    Expr::Literal(Literal::Str(s.into()))
}

/// A data-path read of a bare variable.
pub fn var(name: impl Into<String>) -> Expr {
    Expr::Path(DataPath::var(name))
}

/// A bare variable path, for destinations and `Access` statements.
pub fn path(name: impl Into<String>) -> DataPath {
    DataPath::var(name)
}

pub fn read(path: DataPath) -> Expr {
    Expr::Path(path)
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

pub fn list_of(items: Vec<Expr>) -> Expr {
    Expr::List(items)
}

pub fn map_of(entries: Vec<(&str, Expr)>) -> Expr {
    Expr::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

pub fn arg(name: impl Into<String>, value: Expr) -> ActualArg {
    ActualArg {
        name: name.into(),
        value,
    }
}

pub fn sub_call(target: impl Into<String>, args: Vec<ActualArg>) -> SubCall {
    SubCall {
        target: target.into(),
        args,
    }
}

pub fn call_expr(target: impl Into<String>, args: Vec<ActualArg>) -> Expr {
    Expr::Call(sub_call(target, args))
}

// Statement lists

/// A block whose scope flag is derived from its children.
pub fn block(stmts: Vec<Statement>) -> StatementList {
    StatementList::new(stmts)
}

// Statements

pub fn text(s: impl Into<String>) -> Statement {
    StmtKind::Text(s.into()).into()
}

pub fn define(name: impl Into<String>, kind: ValueKind, init: Expr) -> Statement {
    StmtKind::Define {
        name: name.into(),
        kind,
        init: Initializer::Expr(init),
        is_const: false,
    }
    .into()
}

pub fn define_const(name: impl Into<String>, kind: ValueKind, init: Expr) -> Statement {
    StmtKind::Define {
        name: name.into(),
        kind,
        init: Initializer::Expr(init),
        is_const: true,
    }
    .into()
}

/// Definition with the kind's default value.
pub fn declare(name: impl Into<String>, kind: ValueKind) -> Statement {
    StmtKind::Define {
        name: name.into(),
        kind,
        init: Initializer::None,
        is_const: false,
    }
    .into()
}

/// Data-aggregate definition: `body`'s definitions become map entries.
pub fn define_aggregate(name: impl Into<String>, body: Vec<Statement>) -> Statement {
    StmtKind::Define {
        name: name.into(),
        kind: ValueKind::Map,
        init: Initializer::Aggregate(StatementList::new(body).declaring(false)),
        is_const: false,
    }
    .into()
}

pub fn assign(dest: DataPath, value: Expr) -> Statement {
    StmtKind::Assign {
        dests: vec![dest],
        value,
        append: false,
    }
    .into()
}

/// `a = b = ... = value`.
pub fn assign_chain(dests: Vec<DataPath>, value: Expr) -> Statement {
    StmtKind::Assign {
        dests,
        value,
        append: false,
    }
    .into()
}

pub fn append(dest: DataPath, value: Expr) -> Statement {
    StmtKind::Assign {
        dests: vec![dest],
        value,
        append: true,
    }
    .into()
}

/// Data-access read whose value is written to the output.
pub fn emit(path: DataPath) -> Statement {
    StmtKind::Access { path, emit: true }.into()
}

/// Data-access read for its side effects only.
pub fn access(path: DataPath) -> Statement {
    StmtKind::Access { path, emit: false }.into()
}

pub fn call(target: impl Into<String>, args: Vec<ActualArg>) -> Statement {
    StmtKind::Call {
        call: sub_call(target, args),
        dest: None,
    }
    .into()
}

pub fn call_into(dest: DataPath, target: impl Into<String>, args: Vec<ActualArg>) -> Statement {
    StmtKind::Call {
        call: sub_call(target, args),
        dest: Some(dest),
    }
    .into()
}

pub fn target_call(
    target: impl Into<String>,
    args: Vec<ActualArg>,
    target_path: Expr,
) -> Statement {
    StmtKind::TargetCall {
        call: sub_call(target, args),
        target_path,
        dest: None,
    }
    .into()
}

/// A waited command with no failure threshold and no capture.
pub fn command(argv: Vec<Expr>) -> Statement {
    StmtKind::Command(CommandSpec {
        argv,
        wait: true,
        fail_level: None,
        stdout_var: None,
        stderr_var: None,
    })
    .into()
}

/// A waited command raising `CommandError` at `fail_level`.
pub fn command_failing_at(argv: Vec<Expr>, fail_level: i32) -> Statement {
    StmtKind::Command(CommandSpec {
        argv,
        wait: true,
        fail_level: Some(fail_level),
        stdout_var: None,
        stderr_var: None,
    })
    .into()
}

pub fn command_spec(spec: CommandSpec) -> Statement {
    StmtKind::Command(spec).into()
}

pub fn change_dir(dir: Expr) -> Statement {
    StmtKind::ChangeDir(dir).into()
}

pub fn make_dir(dir: Expr) -> Statement {
    StmtKind::MakeDir(dir).into()
}

pub fn if_then(cond: Expr, body: Vec<Statement>) -> Statement {
    if_chain(vec![(cond, body)], None)
}

pub fn if_else(cond: Expr, then: Vec<Statement>, otherwise: Vec<Statement>) -> Statement {
    if_chain(vec![(cond, then)], Some(otherwise))
}

/// `if / elseif ... / else`.
pub fn if_chain(arms: Vec<(Expr, Vec<Statement>)>, otherwise: Option<Vec<Statement>>) -> Statement {
    StmtKind::If {
        branches: arms
            .into_iter()
            .map(|(cond, body)| Branch {
                cond,
                body: block(body),
            })
            .collect(),
        else_body: otherwise.map(block),
    }
    .into()
}

pub fn while_loop(cond: Expr, body: Vec<Statement>) -> Statement {
    StmtKind::While {
        cond,
        body: block(body),
    }
    .into()
}

pub fn do_while(body: Vec<Statement>, cond: Expr) -> Statement {
    StmtKind::DoWhile {
        body: block(body),
        cond,
    }
    .into()
}

pub fn for_each(var: impl Into<String>, source: Expr, body: Vec<Statement>) -> Statement {
    StmtKind::For(ForLoop {
        var: var.into(),
        source: ForSource::Each(source),
        condition: None,
        body: block(body),
    })
    .into()
}

/// `for (var : source && condition)`.
pub fn for_each_while(
    var: impl Into<String>,
    source: Expr,
    condition: Expr,
    body: Vec<Statement>,
) -> Statement {
    StmtKind::For(ForLoop {
        var: var.into(),
        source: ForSource::Each(source),
        condition: Some(condition),
        body: block(body),
    })
    .into()
}

pub fn for_range(var: impl Into<String>, count: Expr, body: Vec<Statement>) -> Statement {
    StmtKind::For(ForLoop {
        var: var.into(),
        source: ForSource::Range(count),
        condition: None,
        body: block(body),
    })
    .into()
}

pub fn has_next(body: Vec<Statement>) -> Statement {
    StmtKind::HasNext(block(body)).into()
}

pub fn break_() -> Statement {
    StmtKind::Break.into()
}

pub fn return_(value: Option<Expr>) -> Statement {
    StmtKind::Return(value).into()
}

pub fn exit(code: Expr) -> Statement {
    StmtKind::Exit(code).into()
}

pub fn throw(message: Expr) -> Statement {
    StmtKind::Throw(message).into()
}

pub fn throw_on_command_error(min_level: i32) -> Statement {
    StmtKind::ThrowOnCommandError { min_level }.into()
}

pub fn thread(body: Vec<Statement>, handle_var: Option<&str>) -> Statement {
    StmtKind::Thread {
        body: Arc::new(block(body)),
        handle_var: handle_var.map(str::to_string),
    }
    .into()
}

pub fn on_error(tag: ErrorTag, body: Vec<Statement>) -> Statement {
    on_error_at_level(HandlerKind::Only(tag), 0, body)
}

pub fn on_any_error(body: Vec<Statement>) -> Statement {
    on_error_at_level(HandlerKind::AnyButExit, 0, body)
}

pub fn on_error_at_level(kind: HandlerKind, min_level: i32, body: Vec<Statement>) -> Statement {
    StmtKind::OnError(Handler {
        kind,
        min_level,
        body: block(body),
    })
    .into()
}

pub fn on_command_error(min_level: i32, body: Vec<Statement>) -> Statement {
    StmtKind::OnCommandError {
        min_level,
        body: block(body),
    }
    .into()
}

pub fn redirect(var: impl Into<String>, body: Vec<Statement>) -> Statement {
    StmtKind::Redirect {
        var: var.into(),
        body: block(body),
    }
    .into()
}

pub fn debug(label: impl Into<String>) -> Statement {
    StmtKind::Debug(label.into()).into()
}

/// Position helper for hand-built trees.
pub fn pos(file: &str, line: u32, column: u32) -> SourcePos {
    SourcePos::new(file, line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_chain_builds_branches_in_order() {
        let stmt = if_chain(
            vec![(boolean(false), vec![text("a")]), (boolean(true), vec![text("b")])],
            Some(vec![text("c")]),
        );
        let StmtKind::If {
            branches,
            else_body,
        } = stmt.kind
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[1].body.stmts[0].kind, StmtKind::Text("b".into()));
        assert!(else_body.is_some());
    }

    #[test]
    fn aggregate_bodies_never_allocate_a_scope() {
        let stmt = define_aggregate("cfg", vec![define("a", ValueKind::Num, int(1))]);
        let StmtKind::Define {
            init: Initializer::Aggregate(body),
            ..
        } = stmt.kind
        else {
            panic!("expected aggregate");
        };
        assert!(!body.declares_variables);
    }

    #[test]
    fn positions_attach() {
        let stmt = text("x").at(pos("a.zm", 3, 1));
        assert_eq!(stmt.pos.to_string(), "a.zm:3:1");
    }
}
