//! Statement dispatch: lists, blocks, definitions, assignment, text and redirects.

use std::sync::Arc;

use indexmap::IndexMap;
use zmk_ir::{DataPath, Expr, Initializer, Statement, StatementList, StmtKind, ValueKind};

use super::{Interpreter, Signal};
use crate::errors::{exit_requested, thrown, EvalResult, RuntimeError};
use crate::scope::ScopeRef;
use crate::sink::{buffer_sink, buffer_sink_with, file_sink, SharedSink};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Initial value of a definition without an initializer.
fn default_value(kind: ValueKind) -> Value {
    match kind {
        ValueKind::List => Value::empty_list(),
        ValueKind::Map => Value::empty_map(),
        ValueKind::Writer => Value::buffer(),
        _ => Value::Null,
    }
}

impl Interpreter {
    /// Execute every statement of `list` in order.
    ///
    /// Iterates by index so a failure can hand the rest of the list to the
    /// handler scan.
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "statement index is bounded by the list length"
    )]
    pub(super) fn exec_list(
        &mut self,
        list: &StatementList,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> Signal {
        let mut i = 0;
        while i < list.stmts.len() {
            let stmt = &list.stmts[i];
            if stmt.kind.is_error_handler() {
                i += 1;
                continue;
            }
            tracing::trace!(stmt = stmt.kind.name(), pos = %stmt.pos, "dispatch");

            let outcome = match ensure_sufficient_stack(|| self.exec_stmt(stmt, out, scope)) {
                Ok(Signal::Exception) => Err(self.ctx.take_pending()),
                other => other,
            };
            match outcome {
                Ok(Signal::Continue) => {}
                Ok(signal) => return signal,
                Err(err) => {
                    let err = err.located(&stmt.pos, &list.pos);
                    if let Some(signal) = self.recover(list, i, err, out, scope) {
                        return signal;
                    }
                }
            }
            i += 1;
        }
        Signal::Continue
    }

    /// Execute a nested block, allocating a scope only if it declares variables.
    pub(super) fn exec_block(
        &mut self,
        list: &StatementList,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> Signal {
        let inner = scope.enter_block(list.declares_variables);
        self.exec_list(list, out, &inner)
    }

    fn exec_stmt(&mut self, stmt: &Statement, out: &SharedSink, scope: &ScopeRef) -> EvalResult<Signal> {
        match &stmt.kind {
            StmtKind::Text(text) => {
                out.write(text)?;
                Ok(Signal::Continue)
            }
            StmtKind::Redirect { var, body } => self.redirect(var, body, scope),
            StmtKind::Define {
                name,
                kind,
                init,
                is_const,
            } => {
                let value = self.initial_value(*kind, init, out, scope)?;
                scope.define(name, *kind, value, *is_const)?;
                Ok(Signal::Continue)
            }
            StmtKind::Assign {
                dests,
                value,
                append,
            } => {
                self.assign(dests, value, *append, out, scope)?;
                Ok(Signal::Continue)
            }
            StmtKind::Access { path, emit } => {
                let value = self.read_path(path, out, scope)?;
                if *emit {
                    out.write(&value.to_text())?;
                }
                Ok(Signal::Continue)
            }
            StmtKind::Call { call, dest } => {
                let value = self.call_named(call, Vec::new(), out, scope, &stmt.pos)?;
                self.store_result(dest.as_ref(), value, out, scope)?;
                Ok(Signal::Continue)
            }
            StmtKind::TargetCall {
                call,
                target_path,
                dest,
            } => {
                let target = self.resolve_target(target_path, out, scope)?;
                let extra = vec![("target".to_string(), target)];
                let value = self.call_named(call, extra, out, scope, &stmt.pos)?;
                self.store_result(dest.as_ref(), value, out, scope)?;
                Ok(Signal::Continue)
            }
            StmtKind::Command(spec) => self.run_command(spec, out, scope),
            StmtKind::ChangeDir(dir) => self.change_dir(dir, out, scope),
            StmtKind::MakeDir(dir) => self.make_dir(dir, out, scope),
            StmtKind::If {
                branches,
                else_body,
            } => self.exec_if(branches, else_body.as_ref(), out, scope),
            StmtKind::While { cond, body } => self.exec_while(cond, body, out, scope),
            StmtKind::DoWhile { body, cond } => self.exec_do_while(body, cond, out, scope),
            StmtKind::For(for_loop) => self.exec_for(for_loop, out, scope),
            StmtKind::HasNext(body) => self.exec_has_next(body, out, scope),
            StmtKind::Break => Ok(Signal::Break),
            StmtKind::Return(value) => self.exec_return(value.as_ref(), out, scope),
            StmtKind::Exit(code) => {
                let level = self.eval(code, out, scope)?.as_level()?;
                Err(exit_requested(level))
            }
            StmtKind::Throw(message) => {
                let message = self.eval(message, out, scope)?;
                Err(thrown(message.to_text()))
            }
            StmtKind::ThrowOnCommandError { min_level } => {
                self.throw_on_command_error(*min_level, scope)?;
                Ok(Signal::Continue)
            }
            StmtKind::OnCommandError { min_level, body } => {
                Ok(self.on_command_error(*min_level, body, out, scope))
            }
            StmtKind::Thread { body, handle_var } => {
                self.spawn_thread(Arc::clone(body), handle_var.as_deref(), out, scope)?;
                Ok(Signal::Continue)
            }
            StmtKind::OnError(_) => Ok(Signal::Continue),
            StmtKind::Debug(label) => {
                tracing::debug!(
                    target: "zmk::debug",
                    label = %label,
                    pos = %stmt.pos,
                    thread = %self.ctx.name,
                    variables = ?scope.variable_names(),
                    "debug marker"
                );
                Ok(Signal::Continue)
            }
        }
    }

    /// Value bound by a definition statement.
    fn initial_value(
        &mut self,
        kind: ValueKind,
        init: &Initializer,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult {
        match init {
            Initializer::None => Ok(default_value(kind)),
            Initializer::Aggregate(body) => self.aggregate(body, out, scope).map(Value::map),
            Initializer::Expr(expr) => {
                let value = self.eval(expr, out, scope)?;
                match (kind, value) {
                    (ValueKind::Writer, Value::Str(path)) => self.open_writer(&path, scope),
                    (_, value) => Ok(value),
                }
            }
        }
    }

    /// A `Writer` initialized with text writes to that file.
    fn open_writer(&self, pattern: &str, scope: &ScopeRef) -> EvalResult {
        let path = self.resolve_single(pattern, scope)?;
        tracing::debug!(path = %path.display(), "opening writer file");
        Ok(Value::Writer(file_sink(&path)?))
    }

    /// Collect a data-aggregate literal into a map.
    ///
    /// Members are defined in a private scope, so later members can read
    /// earlier ones.
    pub(super) fn aggregate(
        &mut self,
        body: &StatementList,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<IndexMap<String, Value>> {
        let members = scope.enter_block(true);
        let mut entries = IndexMap::new();
        for stmt in &body.stmts {
            match &stmt.kind {
                StmtKind::Define {
                    name,
                    kind,
                    init,
                    is_const,
                } => {
                    let var = self
                        .initial_value(*kind, init, out, &members)
                        .and_then(|value| members.define(name, *kind, value, *is_const))
                        .map_err(|e| e.located(&stmt.pos, &body.pos))?;
                    entries.insert(name.clone(), var.get());
                }
                StmtKind::Debug(_) => {
                    self.exec_stmt(stmt, out, &members)?;
                }
                other => {
                    return Err(RuntimeError::new(format!(
                        "`{}` is not allowed in a data aggregate",
                        other.name()
                    ))
                    .located(&stmt.pos, &body.pos));
                }
            }
        }
        Ok(entries)
    }

    /// `a = b = value` and `a += value`. The value is evaluated once.
    fn assign(
        &mut self,
        dests: &[DataPath],
        value: &Expr,
        append: bool,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<()> {
        let value = self.eval(value, out, scope)?;
        for dest in dests {
            self.store(dest, value.clone(), append, out, scope)?;
        }
        Ok(())
    }

    /// Assign a call result to its optional destination.
    fn store_result(
        &mut self,
        dest: Option<&DataPath>,
        value: Value,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<()> {
        match dest {
            Some(dest) => self.store(dest, value, false, out, scope),
            None => Ok(()),
        }
    }

    /// Run `body` with its text going to the writer held by `var`.
    ///
    /// An empty variable receives a fresh buffer. A variable holding
    /// plain text collects the body's output after its current text.
    fn redirect(&mut self, var: &str, body: &StatementList, scope: &ScopeRef) -> EvalResult<Signal> {
        let cell = scope.lookup(var)?;
        let (sink, store_back) = match cell.get() {
            Value::Writer(sink) => (sink, false),
            Value::Null if cell.kind() == ValueKind::Writer => {
                let sink = buffer_sink();
                cell.assign(Value::Writer(Arc::clone(&sink)))?;
                (sink, false)
            }
            Value::Null => (buffer_sink(), true),
            other => (buffer_sink_with(&other.to_text()), true),
        };

        let signal = self.exec_block(body, &sink, scope);
        sink.flush()?;
        if store_back {
            cell.assign(Value::str(sink.contents()))?;
        }
        Ok(signal)
    }
}
