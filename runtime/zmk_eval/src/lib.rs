#![deny(clippy::arithmetic_side_effects)]
//! Zmk Eval - statement execution engine for the zmk build and templating language.
//!
//! This crate runs an immutable [`zmk_ir::Script`] tree.
//!
//! # Architecture
//!
//! The engine uses:
//! - `Scope`: chained variable tables of shared [`Variable`] cells, copied on block entry
//! - `Interpreter`: the statement dispatcher, control flow, call protocol,
//!   positional `onerror` handling and thread blocks
//! - `evaluate_binary` / `evaluate_unary`: the expression calculator
//! - `dispatch_builtin_method`: methods on text, lists and maps
//! - `PathResolver`, `ProcessRunner`, `HostObject`: pluggable collaborators
//! - `OutputSink`: stdout, buffer, file and silent text sinks
//!
//! Runtime failures are [`RuntimeError`]s with an [`ErrorKind`]; a failure
//! that escapes a script is reported as a [`ScriptError`].

pub mod access;
pub mod calc;
pub mod diagnostics;
pub mod errors;
mod host;
pub mod interpreter;
mod methods;
mod options;
pub mod paths;
pub mod process;
mod scope;
pub mod sink;
mod stack;
pub mod threads;
mod tracing_setup;
mod value;
mod variable;

#[cfg(test)]
mod tests;

pub use zmk_ir::{ErrorTag, HandlerKind, SourcePos, ValueKind};

pub use access::{ResolveFlags, Resolved};
pub use calc::{evaluate_binary, evaluate_unary, values_equal};
pub use diagnostics::{CallFrame, CallStack};
pub use errors::{ErrorKind, EvalResult, RuntimeError, ScriptError};
pub use host::HostObject;
pub use interpreter::{handler_matches, Completion, Interpreter, InterpreterBuilder, Signal};
pub use methods::dispatch_builtin_method;
pub use options::{ExecOptions, DEFAULT_THREAD_POLL};
pub use paths::{DefaultPathResolver, PathResolver};
pub use process::{ProcessRequest, ProcessRunner, StdProcessRunner};
pub use scope::{Scope, ScopeRef};
pub use sink::{
    buffer_sink, buffer_sink_with, file_sink, silent_sink, stdout_sink, FileSink, OutputSink,
    SharedSink,
};
pub use stack::ensure_sufficient_stack;
pub use threads::{ThreadFailure, ThreadHandle, ThreadRegistry, ThreadState};
pub use tracing_setup::init_tracing;
pub use value::{parse_number, Number, SharedList, SharedMap, Value};
pub use variable::{VarRef, Variable};
