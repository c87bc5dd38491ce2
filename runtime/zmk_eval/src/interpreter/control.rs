//! Conditionals and loops.

use zmk_ir::{Branch, Expr, ForLoop, ForSource, StatementList, ValueKind};

use super::{Interpreter, Signal};
use crate::errors::{immutable_binding, EvalResult};
use crate::scope::ScopeRef;
use crate::sink::SharedSink;
use crate::value::Value;

/// Loop-level outcome of a body signal: `Break` ends the loop quietly.
#[inline]
fn after_body(signal: Signal) -> Option<Signal> {
    match signal {
        Signal::Continue => None,
        Signal::Break => Some(Signal::Continue),
        other => Some(other),
    }
}

impl Interpreter {
    pub(super) fn exec_if(
        &mut self,
        branches: &[Branch],
        else_body: Option<&StatementList>,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        for branch in branches {
            if self.condition(&branch.cond, out, scope)? {
                return Ok(self.exec_block(&branch.body, out, scope));
            }
        }
        Ok(match else_body {
            Some(body) => self.exec_block(body, out, scope),
            None => Signal::Continue,
        })
    }

    pub(super) fn exec_while(
        &mut self,
        cond: &Expr,
        body: &StatementList,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        while self.condition(cond, out, scope)? {
            if let Some(signal) = after_body(self.exec_block(body, out, scope)) {
                return Ok(signal);
            }
        }
        Ok(Signal::Continue)
    }

    pub(super) fn exec_do_while(
        &mut self,
        body: &StatementList,
        cond: &Expr,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        loop {
            if let Some(signal) = after_body(self.exec_block(body, out, scope)) {
                return Ok(signal);
            }
            if !self.condition(cond, out, scope)? {
                return Ok(Signal::Continue);
            }
        }
    }

    /// `for (var : source [&& condition])`.
    ///
    /// The loop variable is set to null when the source is exhausted, and
    /// keeps its last element after `break` or a failing condition.
    pub(super) fn exec_for(
        &mut self,
        for_loop: &ForLoop,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        let items = self.loop_items(&for_loop.source, out, scope)?;
        let var = match scope.get(&for_loop.var) {
            Some(var) => var,
            None => scope.define(&for_loop.var, ValueKind::Any, Value::Null, false)?,
        };
        if var.is_const() {
            return Err(immutable_binding(&for_loop.var));
        }

        let count = items.len();
        for (i, item) in items.into_iter().enumerate() {
            var.assign(item)?;
            if let Some(cond) = &for_loop.condition {
                if !self.condition(cond, out, scope)? {
                    return Ok(Signal::Continue);
                }
            }

            self.loops.push(i.saturating_add(1) < count);
            let signal = self.exec_block(&for_loop.body, out, scope);
            self.loops.pop();
            if let Some(signal) = after_body(signal) {
                return Ok(signal);
            }
        }
        var.assign(Value::Null)?;
        Ok(Signal::Continue)
    }

    /// Elements a `for` loop visits, snapshotted before the first iteration.
    fn loop_items(&mut self, source: &ForSource, out: &SharedSink, scope: &ScopeRef) -> EvalResult<Vec<Value>> {
        match source {
            ForSource::Range(count) => {
                let n = self.eval(count, out, scope)?.as_int()?;
                Ok((0..n.max(0)).map(Value::int).collect())
            }
            ForSource::Each(container) => Ok(match self.eval(container, out, scope)? {
                Value::Null => Vec::new(),
                Value::List(items) => items.read().clone(),
                Value::Map(entries) => entries.read().values().cloned().collect(),
                scalar => vec![scalar],
            }),
        }
    }

    /// Body runs only while the innermost `for` has another element.
    pub(super) fn exec_has_next(
        &mut self,
        body: &StatementList,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        if self.loops.last().copied().unwrap_or(false) {
            Ok(self.exec_block(body, out, scope))
        } else {
            Ok(Signal::Continue)
        }
    }

    pub(super) fn exec_return(
        &mut self,
        value: Option<&Expr>,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        if let Some(expr) = value {
            let value = self.eval(expr, out, scope)?;
            if !self.call_stack.set_return(value) {
                tracing::trace!("return value outside a call discarded");
            }
        }
        Ok(Signal::Return)
    }

    fn condition(&mut self, cond: &Expr, out: &SharedSink, scope: &ScopeRef) -> EvalResult<bool> {
        self.eval(cond, out, scope)?.to_bool()
    }
}
