//! Statement execution engine.
//!
//! # Architecture
//!
//! [`Interpreter::execute`] runs a [`StatementList`] in a [`Scope`] and
//! returns a [`Signal`]. Nested blocks, loops and calls recurse back into
//! it with the scope chosen by [`Scope::enter_block`]. The work is split
//! by concern:
//!
//! - `dispatch` - the per-statement dispatcher, definitions, assignment,
//!   text and redirects
//! - `onerror` - failure classification and the positional handler scan
//! - `control` - `if`, loops, `hasNext`
//! - `call` - the subroutine call protocol
//! - `command` - external commands, `cd`, `mkdir`, command-error handlers
//! - `spawn` - thread blocks
//! - `eval` - expressions and data-access paths
//!
//! # Failures
//!
//! A statement that fails produces an `Err(RuntimeError)`. The list that
//! owns the statement scans forward for a matching `onerror` sibling. When
//! none matches, the error is parked in the thread's [`ThreadContext`] and
//! the list returns [`Signal::Exception`]; the enclosing list picks the
//! error up again and repeats the scan over its own remaining statements.
//!
//! # Threads
//!
//! One `Interpreter` runs on one thread. A thread block forks a child
//! interpreter with a fresh context and call stack that shares the
//! runner, resolver, output sink and thread registry of its parent.

mod builder;
mod call;
mod command;
mod control;
mod dispatch;
mod eval;
mod onerror;
mod spawn;

pub use builder::InterpreterBuilder;
pub use onerror::handler_matches;

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use zmk_ir::{Script, StatementList, Subroutine, ValueKind};

use crate::diagnostics::CallStack;
use crate::errors::{ErrorKind, RuntimeError, ScriptError};
use crate::options::ExecOptions;
use crate::paths::PathResolver;
use crate::process::ProcessRunner;
use crate::scope::{normalize, Scope, ScopeRef};
use crate::sink::SharedSink;
use crate::threads::ThreadRegistry;
use crate::value::{SharedMap, Value};
use crate::variable::{VarRef, Variable};

/// Control-flow outcome of executing a statement list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Break,
    Return,
    /// An unhandled failure is pending in the thread context.
    Exception,
}

/// How a script run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Finished,
    /// `exit(code)` reached the top level.
    Exited(i32),
}

/// Per-thread failure state.
#[derive(Debug)]
pub(crate) struct ThreadContext {
    name: String,
    pending: Option<RuntimeError>,
    /// The thread's `error` variable, written only by handler dispatch.
    error_var: VarRef,
}

impl ThreadContext {
    fn new(name: impl Into<String>) -> Self {
        ThreadContext {
            name: name.into(),
            pending: None,
            error_var: Variable::raw("error", ValueKind::String, Value::Null, true),
        }
    }

    fn park(&mut self, err: RuntimeError) {
        self.pending = Some(err);
    }

    fn take_pending(&mut self) -> RuntimeError {
        self.pending
            .take()
            .unwrap_or_else(|| RuntimeError::new("exception signalled without a pending error"))
    }
}

/// State shared by an interpreter and every thread it spawns.
pub(crate) struct Shared {
    pub(crate) options: ExecOptions,
    pub(crate) runner: Arc<dyn ProcessRunner>,
    pub(crate) resolver: Arc<dyn PathResolver>,
    pub(crate) threads: Arc<ThreadRegistry>,
    /// Evaluated member maps of classes, by class name.
    pub(crate) class_members: DashMap<String, SharedMap>,
    pub(crate) out: SharedSink,
}

/// The statement interpreter.
pub struct Interpreter {
    shared: Arc<Shared>,
    script: Arc<Script>,
    ctx: ThreadContext,
    call_stack: CallStack,
    /// `hasNext` flags of the enclosing `for` loops of the current call.
    loops: Vec<bool>,
    /// Scope subroutine defaults are evaluated in.
    home: ScopeRef,
    /// Classes whose members are being evaluated on this thread.
    initializing: Vec<String>,
}

impl Interpreter {
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// A root scope: `text` bound to `out`, this thread's `error`, and the globals.
    pub fn root_scope(&self, out: &SharedSink) -> ScopeRef {
        let options = &self.shared.options;
        let root = Scope::root(options.cwd.clone());
        root.bind(Variable::raw(
            "text",
            ValueKind::Writer,
            Value::Writer(Arc::clone(out)),
            true,
        ));
        root.bind(Arc::clone(&self.ctx.error_var));
        for (name, value) in &options.globals {
            root.bind(Variable::raw(name.clone(), ValueKind::Any, value.clone(), true));
        }
        root
    }

    /// Run a whole script in a fresh root scope.
    ///
    /// `exit(code)` reaching the top level is a normal completion. Any other
    /// unhandled failure is returned as a [`ScriptError`]. With
    /// `wait_for_threads` set, spawned threads are awaited first either way.
    pub fn execute_script(&mut self, script: &Arc<Script>) -> Result<Completion, ScriptError> {
        self.set_script(Arc::clone(script));
        let out = Arc::clone(&self.shared.out);
        let root = self.root_scope(&out);
        self.home = Arc::clone(&root);
        let main = root.enter_block(true);

        tracing::debug!(script = %script.name, "executing script");
        let signal = self.execute(&script.body, &out, &main);
        let outcome = self.completion(signal);

        if self.shared.options.wait_for_threads {
            self.wait_for_threads();
        }
        out.flush()?;
        outcome
    }

    /// Call one subroutine from the host with pre-evaluated arguments.
    ///
    /// Returns the subroutine's return value, `None` when it returned nothing.
    pub fn execute_subroutine(
        &mut self,
        sub: &Subroutine,
        args: Vec<(String, Value)>,
        out: &SharedSink,
        cwd: &Path,
    ) -> Result<Option<Value>, ScriptError> {
        let root = self.root_scope(out);
        root.set_current_dir(normalize(&self.shared.options.cwd.join(cwd)));
        self.home = Arc::clone(&root);

        let value = self
            .call_sub(sub, None, args, &root, &sub.pos, out)
            .map_err(|e| e.located(&sub.pos, &sub.body.pos))?;
        out.flush()?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Execute `list` in `scope`, writing text to `out`.
    ///
    /// On [`Signal::Exception`] the failure is available from [`take_error`](Self::take_error).
    pub fn execute(&mut self, list: &StatementList, out: &SharedSink, scope: &ScopeRef) -> Signal {
        self.exec_list(list, out, scope)
    }

    /// The failure behind the last [`Signal::Exception`].
    pub fn take_error(&mut self) -> Option<RuntimeError> {
        self.ctx.pending.take()
    }

    fn completion(&mut self, signal: Signal) -> Result<Completion, ScriptError> {
        if signal != Signal::Exception {
            return Ok(Completion::Finished);
        }
        let err = self.ctx.take_pending();
        match err.kind {
            ErrorKind::Exit { level } => Ok(Completion::Exited(level)),
            _ => Err(err.into()),
        }
    }

    /// Block until every spawned thread has finished.
    pub fn wait_for_threads(&self) {
        self.shared
            .threads
            .wait_all(self.shared.options.thread_poll_interval);
    }

    pub fn threads(&self) -> &ThreadRegistry {
        &self.shared.threads
    }

    /// Ask the process runner to terminate every running command.
    pub fn abort_commands(&self) {
        tracing::debug!("aborting running commands");
        self.shared.runner.abort_all();
    }

    /// The root output sink.
    pub fn output(&self) -> &SharedSink {
        &self.shared.out
    }

    pub fn options(&self) -> &ExecOptions {
        &self.shared.options
    }

    pub fn script(&self) -> &Arc<Script> {
        &self.script
    }

    /// Make `script`'s subroutines and classes visible to [`execute`](Self::execute).
    pub fn set_script(&mut self, script: Arc<Script>) {
        self.script = script;
        self.shared.class_members.clear();
    }

    /// Interpreter for a new script thread.
    fn fork(&self, name: &str) -> Interpreter {
        Interpreter {
            shared: Arc::clone(&self.shared),
            script: Arc::clone(&self.script),
            ctx: ThreadContext::new(name),
            call_stack: CallStack::new(self.call_stack.max_depth()),
            loops: Vec::new(),
            home: Arc::clone(&self.home),
            initializing: Vec::new(),
        }
    }
}
