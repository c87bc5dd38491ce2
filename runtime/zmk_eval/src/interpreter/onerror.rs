//! Positional `onerror` handling.
//!
//! A failure at index `i` of a list is offered to the `onerror` siblings
//! after `i`, in order. Statements in between are abandoned. The first
//! handler that admits the failure runs; without one the failure leaves
//! the list as [`Signal::Exception`] and the enclosing list repeats the
//! scan from its own failing statement.

use zmk_ir::{ErrorTag, Handler, StatementList, StmtKind};

use super::{Interpreter, Signal};
use crate::errors::RuntimeError;
use crate::scope::ScopeRef;
use crate::sink::SharedSink;
use crate::value::Value;

/// Does `handler` accept `err`?
///
/// The kind must be admitted (the wildcard admits everything but `Exit`),
/// and leveled failures must reach the handler's minimum level.
pub fn handler_matches(handler: &Handler, err: &RuntimeError) -> bool {
    let tag = err.tag();
    if !handler.kind.admits(tag) {
        return false;
    }
    !tag.is_leveled() || err.level().unwrap_or(0) >= handler.min_level
}

impl Interpreter {
    /// Deal with `err` raised by `list.stmts[failed]`.
    ///
    /// `None` resumes the list at the next statement (tolerant mode);
    /// otherwise the list returns the signal.
    pub(super) fn recover(
        &mut self,
        list: &StatementList,
        failed: usize,
        err: RuntimeError,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> Option<Signal> {
        let handler = list.stmts[failed..].iter().skip(1).find_map(|stmt| match &stmt.kind {
            StmtKind::OnError(handler) if handler_matches(handler, &err) => Some(handler),
            _ => None,
        });

        if let Some(handler) = handler {
            tracing::debug!(error = %err, kind = %err.tag(), "onerror handler matched");
            return Some(self.run_handler(handler, &err, out, scope));
        }

        if self.shared.options.tolerant && err.tag() != ErrorTag::Exit {
            let at = err.pos.clone().unwrap_or_default();
            tracing::warn!(error = %err, "continuing after error");
            if let Err(sink_err) = out.write(&format!("[ERROR: {} at {at}]", err.message)) {
                tracing::warn!(error = %sink_err, "error marker not written");
            }
            return None;
        }

        self.ctx.park(err);
        Some(Signal::Exception)
    }

    /// Run a matched handler with the thread's `error` variable holding the message.
    fn run_handler(
        &mut self,
        handler: &Handler,
        err: &RuntimeError,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> Signal {
        let previous = self.ctx.error_var.replace(Value::str(err.message.clone()));
        let signal = self.exec_block(&handler.body, out, scope);
        self.ctx.error_var.replace(previous);
        signal
    }
}
