//! Script-thread bookkeeping.
//!
//! The registry counts live threads with a mutex-guarded counter and a
//! condition variable. Waiting means "until the count reaches zero";
//! completion order is not tracked.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::errors::{undefined_method, EvalResult, RuntimeError, ScriptError};
use crate::host::{readonly_field, HostObject};
use crate::value::Value;

/// An uncaught failure of a spawned thread.
#[derive(Clone, Debug)]
pub struct ThreadFailure {
    pub thread: String,
    pub error: ScriptError,
}

/// Completion state of one spawned thread.
#[derive(Debug)]
pub struct ThreadState {
    id: u64,
    name: String,
    done: Mutex<bool>,
    finished: Condvar,
}

impl ThreadState {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        !*self.done.lock()
    }

    /// Block until the thread has finished.
    pub fn join(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.finished.wait(&mut done);
        }
    }
}

/// Registry of live script threads for one runtime.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    live: DashMap<u64, Arc<ThreadState>>,
    count: Mutex<usize>,
    idle: Condvar,
    next_id: AtomicU64,
    failures: Mutex<Vec<ThreadFailure>>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a thread about to start.
    pub fn register(&self, prefix: &str) -> Arc<ThreadState> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        let state = Arc::new(ThreadState {
            id,
            name: format!("{prefix}-{id}"),
            done: Mutex::new(false),
            finished: Condvar::new(),
        });
        self.live.insert(id, Arc::clone(&state));
        let mut count = self.count.lock();
        *count = count.saturating_add(1);
        state
    }

    /// Deregister a finished thread, recording its failure if any.
    pub fn finish(&self, state: &ThreadState, failure: Option<RuntimeError>) {
        if let Some(err) = failure {
            let error = ScriptError::from(err);
            tracing::error!(thread = %state.name, error = %error, "script thread failed");
            self.failures.lock().push(ThreadFailure {
                thread: state.name.clone(),
                error,
            });
        }
        self.live.remove(&state.id);
        {
            let mut done = state.done.lock();
            *done = true;
            state.finished.notify_all();
        }
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    pub fn live_count(&self) -> usize {
        *self.count.lock()
    }

    /// Wait up to `timeout` for the count to reach zero. Returns `true` if it did.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            self.idle.wait_for(&mut count, timeout);
        }
        *count == 0
    }

    /// Wait until every registered thread has finished, waking every `interval`.
    pub fn wait_all(&self, interval: Duration) {
        while !self.wait_for(interval) {
            tracing::trace!(live = self.live_count(), "waiting for script threads");
        }
    }

    /// Names of the threads still running.
    pub fn live_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.live.iter().map(|e| e.value().name.clone()).collect();
        names.sort();
        names
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> Vec<ThreadFailure> {
        self.failures.lock().clone()
    }
}

/// Script-visible handle bound by `thread name { ... }`.
#[derive(Debug)]
pub struct ThreadHandle {
    state: Arc<ThreadState>,
}

impl ThreadHandle {
    pub fn new(state: Arc<ThreadState>) -> Self {
        ThreadHandle { state }
    }
}

impl HostObject for ThreadHandle {
    fn type_name(&self) -> &str {
        "Thread"
    }

    fn field(&self, name: &str) -> EvalResult<Option<Value>> {
        Ok(match name {
            "alive" => Some(Value::Bool(self.state.is_alive())),
            "name" => Some(Value::str(self.state.name())),
            _ => None,
        })
    }

    fn set_field(&self, name: &str, _value: Value) -> EvalResult<()> {
        Err(readonly_field(self, name))
    }

    fn call_method(&self, name: &str, args: Vec<Value>) -> EvalResult {
        match name {
            "join" if args.is_empty() => {
                self.state.join();
                Ok(Value::Null)
            }
            _ => Err(undefined_method(name, self.type_name())),
        }
    }

    fn to_text(&self) -> String {
        self.state.name.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::errors::thrown;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_reach_zero_after_finish() {
        let registry = Arc::new(ThreadRegistry::new());
        let states: Vec<_> = (0..4).map(|_| registry.register("t")).collect();
        assert_eq!(registry.live_count(), 4);

        let workers: Vec<_> = states
            .into_iter()
            .map(|state| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(5));
                    registry.finish(&state, None);
                })
            })
            .collect();

        registry.wait_all(Duration::from_millis(1));
        assert_eq!(registry.live_count(), 0);
        assert!(registry.live_names().is_empty());
        for w in workers {
            w.join().unwrap();
        }
    }

    #[test]
    fn failures_are_recorded() {
        let registry = ThreadRegistry::new();
        let state = registry.register("worker");
        registry.finish(&state, Some(thrown("boom")));
        let failures = registry.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].thread, "worker-1");
        assert_eq!(failures[0].error.message, "boom");
    }

    #[test]
    fn handle_reports_liveness_and_joins() {
        let registry = Arc::new(ThreadRegistry::new());
        let state = registry.register("h");
        let handle = ThreadHandle::new(Arc::clone(&state));
        assert_eq!(handle.field("alive").unwrap(), Some(Value::Bool(true)));

        let r = Arc::clone(&registry);
        let worker = std::thread::spawn(move || r.finish(&state, None));
        handle.call_method("join", Vec::new()).unwrap();
        assert_eq!(handle.field("alive").unwrap(), Some(Value::Bool(false)));
        assert_eq!(handle.field("name").unwrap(), Some(Value::str("h-1")));
        worker.join().unwrap();
    }

    #[test]
    fn wait_for_times_out_while_threads_live() {
        let registry = ThreadRegistry::new();
        let _state = registry.register("slow");
        assert!(!registry.wait_for(Duration::from_millis(1)));
    }
}
