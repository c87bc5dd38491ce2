//! Zmk IR - the immutable script tree executed by `zmk_eval`.
//!
//! A script compiler produces a [`Script`]: a top-level [`StatementList`]
//! plus qualified-name tables for subroutines and classes. The engine only
//! ever reads this tree; every mutable piece of runtime state lives in the
//! evaluator's scopes.
//!
//! # Layout
//!
//! - [`pos`] - source positions for diagnostics
//! - [`kind`] - value-kind and error-kind tags
//! - [`expr`] - expressions and data-access paths
//! - [`stmt`] - statements and statement lists
//! - [`script`] - subroutines, classes and the script table
//! - [`build`] - constructor helpers for assembling trees without a parser

pub mod build;
pub mod expr;
pub mod kind;
pub mod pos;
pub mod script;
pub mod stmt;

pub use expr::{ActualArg, BinaryOp, DataPath, Expr, Literal, Segment, SubCall, UnaryOp};
pub use kind::{ErrorTag, HandlerKind, ValueKind};
pub use pos::SourcePos;
pub use script::{CallMode, ClassDef, Param, Script, Subroutine};
pub use stmt::{
    Branch, CommandSpec, ForLoop, ForSource, Handler, Initializer, Statement, StatementList,
    StmtKind,
};
