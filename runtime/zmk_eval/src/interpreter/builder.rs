//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use zmk_ir::Script;

use super::{Interpreter, Shared, ThreadContext};
use crate::diagnostics::CallStack;
use crate::options::ExecOptions;
use crate::paths::{DefaultPathResolver, PathResolver};
use crate::process::{ProcessRunner, StdProcessRunner};
use crate::scope::Scope;
use crate::sink::{stdout_sink, SharedSink};
use crate::threads::ThreadRegistry;
use crate::value::Value;

/// Builder for creating Interpreter instances.
///
/// Defaults: stdout output, real OS processes, the default path
/// resolver, a private thread registry and [`ExecOptions::default`].
#[derive(Default)]
pub struct InterpreterBuilder {
    options: ExecOptions,
    runner: Option<Arc<dyn ProcessRunner>>,
    resolver: Option<Arc<dyn PathResolver>>,
    threads: Option<Arc<ThreadRegistry>>,
    out: Option<SharedSink>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Write `[ERROR: ...]` markers and continue instead of aborting.
    #[must_use]
    pub fn tolerant(mut self, tolerant: bool) -> Self {
        self.options.tolerant = tolerant;
        self
    }

    #[must_use]
    pub fn wait_for_threads(mut self, wait: bool) -> Self {
        self.options.wait_for_threads = wait;
        self
    }

    #[must_use]
    pub fn thread_poll_interval(mut self, interval: Duration) -> Self {
        self.options.thread_poll_interval = interval;
        self
    }

    /// Limit subroutine nesting. Exceeding the limit is an `Internal` failure.
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.options.max_call_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = cwd.into();
        self
    }

    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.env_prefix = prefix.into();
        self
    }

    /// Inject a const variable into every root scope.
    #[must_use]
    pub fn global(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.globals.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn process_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    #[must_use]
    pub fn path_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Share a thread registry with other interpreters.
    #[must_use]
    pub fn thread_registry(mut self, threads: Arc<ThreadRegistry>) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Root output sink. Default is stdout.
    #[must_use]
    pub fn output(mut self, out: SharedSink) -> Self {
        self.out = Some(out);
        self
    }

    /// Build the interpreter.
    pub fn build(self) -> Interpreter {
        let max_depth = self.options.max_call_depth;
        let placeholder = Scope::root(self.options.cwd.clone());
        let shared = Shared {
            runner: self
                .runner
                .unwrap_or_else(|| Arc::new(StdProcessRunner::new())),
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(DefaultPathResolver)),
            threads: self
                .threads
                .unwrap_or_else(|| Arc::new(ThreadRegistry::new())),
            class_members: DashMap::new(),
            out: self.out.unwrap_or_else(stdout_sink),
            options: self.options,
        };

        let out = Arc::clone(&shared.out);
        let mut interpreter = Interpreter {
            shared: Arc::new(shared),
            script: Arc::new(Script::default()),
            ctx: ThreadContext::new("main"),
            call_stack: CallStack::new(max_depth),
            loops: Vec::new(),
            home: placeholder,
            initializing: Vec::new(),
        };
        interpreter.home = interpreter.root_scope(&out);
        interpreter
    }

    /// Build the interpreter with `script` loaded, so [`Interpreter::execute`]
    /// can resolve its subroutines and classes.
    pub fn build_for(self, script: Arc<Script>) -> Interpreter {
        let mut interpreter = self.build();
        interpreter.set_script(script);
        interpreter
    }
}
