//! Thread blocks.
//!
//! A thread block runs on its own OS thread with a forked interpreter. Its
//! scope is derived from the spawning scope by the usual block rule: const
//! cells are shared, other cells are copied, and list or map values inside
//! them stay shared between the threads. The runtime adds no locking on
//! top of the per-cell locks.

use std::sync::Arc;

use zmk_ir::{ErrorTag, StatementList, ValueKind};

use super::{Interpreter, Signal};
use crate::errors::{EvalResult, RuntimeError};
use crate::scope::ScopeRef;
use crate::sink::SharedSink;
use crate::threads::{ThreadHandle, ThreadRegistry, ThreadState};
use crate::value::Value;

/// Deregisters a thread when dropped, even if the thread body panics.
struct FinishGuard {
    threads: Arc<ThreadRegistry>,
    state: Arc<ThreadState>,
    failure: Option<RuntimeError>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.threads.finish(&self.state, self.failure.take());
    }
}

impl Interpreter {
    /// Start `body` on a new thread. The spawning statement does not wait.
    pub(super) fn spawn_thread(
        &mut self,
        body: Arc<StatementList>,
        handle_var: Option<&str>,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<()> {
        let threads = Arc::clone(&self.shared.threads);
        let state = threads.register("thread");
        let mut guard = FinishGuard {
            threads,
            state: Arc::clone(&state),
            failure: None,
        };

        if let Some(name) = handle_var {
            let handle = Value::Host(Arc::new(ThreadHandle::new(Arc::clone(&state))));
            match scope.get(name) {
                Some(var) => var.assign(handle)?,
                None => {
                    scope.define(name, ValueKind::Host, handle, false)?;
                }
            }
        }

        let mut child = self.fork(state.name());
        let thread_scope = scope.enter_block(true);
        thread_scope.bind(Arc::clone(&child.ctx.error_var));
        let out = Arc::clone(out);

        let spawned = std::thread::Builder::new()
            .name(state.name().to_string())
            .spawn(move || {
                tracing::debug!(thread = %guard.state.name(), "thread started");
                let signal = child.exec_list(&body, &out, &thread_scope);
                if signal == Signal::Exception {
                    let err = child.ctx.take_pending();
                    if err.tag() == ErrorTag::Exit {
                        tracing::debug!(thread = %guard.state.name(), level = ?err.level(), "thread exited");
                    } else {
                        guard.failure = Some(err);
                    }
                }
                if let Err(err) = out.flush() {
                    tracing::warn!(thread = %guard.state.name(), error = %err, "thread output not flushed");
                }
                tracing::debug!(thread = %guard.state.name(), "thread finished");
            });

        match spawned {
            Ok(_) => Ok(()),
            Err(e) => Err(RuntimeError::new(format!("cannot start thread {}: {e}", state.name()))),
        }
    }
}
