//! Statements and statement lists.
//!
//! [`StmtKind`] is the closed set of statement variants the engine
//! dispatches on. Nested blocks are [`StatementList`]s; the
//! `declares_variables` flag computed by the compiler decides whether
//! executing a block allocates a fresh scope.

use std::sync::Arc;

use crate::expr::{DataPath, Expr, SubCall};
use crate::kind::{HandlerKind, ValueKind};
use crate::pos::SourcePos;

/// An ordered block of statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementList {
    pub stmts: Vec<Statement>,
    /// `true` when the block itself declares variables; only then does
    /// entering it create a new scope.
    pub declares_variables: bool,
    /// Position of the construct that owns this block.
    pub pos: SourcePos,
}

impl StatementList {
    /// Build a list, deriving `declares_variables` from its direct children.
    pub fn new(stmts: Vec<Statement>) -> Self {
        let declares_variables = stmts
            .iter()
            .any(|s| matches!(s.kind, StmtKind::Define { .. }));
        StatementList {
            stmts,
            declares_variables,
            pos: SourcePos::unknown(),
        }
    }

    /// Override the scope flag.
    #[must_use]
    pub fn declaring(mut self, declares: bool) -> Self {
        self.declares_variables = declares;
        self
    }

    /// Attach the owning construct's position.
    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = pos;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

/// One statement with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StmtKind,
    pub pos: SourcePos,
}

impl Statement {
    pub fn new(kind: StmtKind) -> Self {
        Statement {
            kind,
            pos: SourcePos::unknown(),
        }
    }

    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = pos;
        self
    }
}

impl From<StmtKind> for Statement {
    fn from(kind: StmtKind) -> Self {
        Statement::new(kind)
    }
}

/// How a variable definition obtains its value.
#[derive(Clone, Debug, PartialEq)]
pub enum Initializer {
    /// Kind default (empty list/map, fresh buffer for writers, null otherwise).
    None,
    Expr(Expr),
    /// Data-aggregate literal: the nested definitions are collected into a map.
    Aggregate(StatementList),
}

/// One `if`/`elseif` arm.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub cond: Expr,
    pub body: StatementList,
}

/// What a `for` loop iterates.
#[derive(Clone, Debug, PartialEq)]
pub enum ForSource {
    /// Elements of a list, values of a map, or a single scalar.
    Each(Expr),
    /// `0..N-1` for an integer `N`.
    Range(Expr),
}

/// `for (var : source [&& condition]) { body }`.
#[derive(Clone, Debug, PartialEq)]
pub struct ForLoop {
    pub var: String,
    pub source: ForSource,
    /// Trailing condition; the loop stops (keeping the variable) when false.
    pub condition: Option<Expr>,
    pub body: StatementList,
}

/// An external command invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandSpec {
    /// Program and arguments; list-valued elements expand to several arguments.
    pub argv: Vec<Expr>,
    /// `false` starts the process without waiting for it.
    pub wait: bool,
    /// Raise `CommandError` when the exit level reaches this threshold.
    pub fail_level: Option<i32>,
    pub stdout_var: Option<DataPath>,
    pub stderr_var: Option<DataPath>,
}

/// A positional `onerror` handler.
#[derive(Clone, Debug, PartialEq)]
pub struct Handler {
    pub kind: HandlerKind,
    /// Minimum level for `CommandError`/`Exit` failures.
    pub min_level: i32,
    pub body: StatementList,
}

/// Statement variants.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// Constant text, emitted verbatim.
    Text(String),
    /// Run `body` with its output going to the appendable held by `var`.
    Redirect { var: String, body: StatementList },
    Define {
        name: String,
        kind: ValueKind,
        init: Initializer,
        is_const: bool,
    },
    /// `a = b = value` or `a += value`.
    Assign {
        dests: Vec<DataPath>,
        value: Expr,
        append: bool,
    },
    /// Data-access read; `emit` writes the stringified value to the output.
    Access { path: DataPath, emit: bool },
    Call {
        call: SubCall,
        dest: Option<DataPath>,
    },
    /// Build-style call: `target_path` is resolved and passed as `target`.
    TargetCall {
        call: SubCall,
        target_path: Expr,
        dest: Option<DataPath>,
    },
    Command(CommandSpec),
    ChangeDir(Expr),
    MakeDir(Expr),
    If {
        branches: Vec<Branch>,
        else_body: Option<StatementList>,
    },
    While { cond: Expr, body: StatementList },
    DoWhile { body: StatementList, cond: Expr },
    For(ForLoop),
    /// Runs only while the enclosing `for` has another element after the current one.
    HasNext(StatementList),
    Break,
    Return(Option<Expr>),
    Exit(Expr),
    Throw(Expr),
    ThrowOnCommandError { min_level: i32 },
    /// Spawn `body` on a new thread; `handle_var` receives the thread handle.
    Thread {
        body: Arc<StatementList>,
        handle_var: Option<String>,
    },
    OnError(Handler),
    /// Runs when the last command in this scope ended at or above `min_level`.
    OnCommandError { min_level: i32, body: StatementList },
    Debug(String),
}

impl StmtKind {
    /// `onerror` statements are skipped in normal flow.
    #[inline]
    pub fn is_error_handler(&self) -> bool {
        matches!(self, StmtKind::OnError(_))
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Text(_) => "text",
            StmtKind::Redirect { .. } => "redirect",
            StmtKind::Define { .. } => "define",
            StmtKind::Assign { .. } => "assign",
            StmtKind::Access { .. } => "access",
            StmtKind::Call { .. } => "call",
            StmtKind::TargetCall { .. } => "target-call",
            StmtKind::Command(_) => "command",
            StmtKind::ChangeDir(_) => "cd",
            StmtKind::MakeDir(_) => "mkdir",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::DoWhile { .. } => "do-while",
            StmtKind::For(_) => "for",
            StmtKind::HasNext(_) => "has-next",
            StmtKind::Break => "break",
            StmtKind::Return(_) => "return",
            StmtKind::Exit(_) => "exit",
            StmtKind::Throw(_) => "throw",
            StmtKind::ThrowOnCommandError { .. } => "throw-on-command-error",
            StmtKind::Thread { .. } => "thread",
            StmtKind::OnError(_) => "onerror",
            StmtKind::OnCommandError { .. } => "on-command-error",
            StmtKind::Debug(_) => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, Literal};

    #[test]
    fn list_declares_when_a_child_defines() {
        let define = Statement::new(StmtKind::Define {
            name: "x".into(),
            kind: ValueKind::Num,
            init: Initializer::Expr(Expr::Literal(Literal::Int(1))),
            is_const: false,
        });
        let text = Statement::new(StmtKind::Text("hi".into()));

        assert!(StatementList::new(vec![text.clone(), define]).declares_variables);
        assert!(!StatementList::new(vec![text]).declares_variables);
    }

    #[test]
    fn declaring_overrides_flag() {
        let list = StatementList::new(vec![]).declaring(true);
        assert!(list.declares_variables);
        assert!(list.is_empty());
    }

    #[test]
    fn only_onerror_is_a_handler() {
        let handler = StmtKind::OnError(Handler {
            kind: HandlerKind::AnyButExit,
            min_level: 0,
            body: StatementList::default(),
        });
        assert!(handler.is_error_handler());
        let cmd_handler = StmtKind::OnCommandError {
            min_level: 1,
            body: StatementList::default(),
        };
        assert!(!cmd_handler.is_error_handler());
        assert_eq!(cmd_handler.name(), "on-command-error");
    }
}
