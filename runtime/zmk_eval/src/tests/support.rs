//! Shared fixtures: a recording process runner and an interpreter harness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use zmk_ir::{Script, Statement, StatementList};

use crate::errors::EvalResult;
use crate::process::{ProcessRequest, ProcessRunner};
use crate::scope::ScopeRef;
use crate::sink::{buffer_sink, SharedSink};
use crate::value::Value;
use crate::{Completion, Interpreter, InterpreterBuilder, ScriptError, Signal};

/// Scripted behaviour of one program.
#[derive(Clone, Debug, Default)]
struct Program {
    level: i32,
    stdout: String,
}

/// A `ProcessRunner` that records every request instead of spawning.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    programs: Mutex<FxHashMap<String, Program>>,
    requests: Mutex<Vec<ProcessRequest>>,
    aborts: AtomicUsize,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `program` exit with `level`.
    pub fn exits(&self, program: &str, level: i32) {
        self.programs.lock().entry(program.to_string()).or_default().level = level;
    }

    /// Make `program` print `text` on stdout.
    pub fn prints(&self, program: &str, text: &str) {
        self.programs.lock().entry(program.to_string()).or_default().stdout = text.to_string();
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests.lock().clone()
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.requests.lock().iter().map(|r| r.argv.clone()).collect()
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::Relaxed)
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, request: ProcessRequest) -> EvalResult<i32> {
        let program = self
            .programs
            .lock()
            .get(request.program())
            .cloned()
            .unwrap_or_default();
        if let Some(sink) = &request.stdout {
            sink.write(&program.stdout)?;
        }
        self.requests.lock().push(request);
        Ok(program.level)
    }

    fn abort_all(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }
}

/// An interpreter writing into a buffer, with commands recorded.
pub struct Harness {
    pub interp: Interpreter,
    pub out: SharedSink,
    pub runner: Arc<RecordingRunner>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|b| b)
    }

    /// Harness with extra builder configuration.
    pub fn with(configure: impl FnOnce(InterpreterBuilder) -> InterpreterBuilder) -> Self {
        let out = buffer_sink();
        let runner = RecordingRunner::new();
        let builder = Interpreter::builder()
            .output(Arc::clone(&out))
            .process_runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>);
        Harness {
            interp: configure(builder).build(),
            out,
            runner,
        }
    }

    /// Run `stmts` as a whole script.
    pub fn run(&mut self, stmts: Vec<Statement>) -> Result<Completion, ScriptError> {
        self.run_script(Script::new("test.zm", StatementList::new(stmts)))
    }

    pub fn run_script(&mut self, script: Script) -> Result<Completion, ScriptError> {
        self.interp.execute_script(&Arc::new(script))
    }

    /// Load `script` so `exec` can call its subroutines and classes.
    pub fn load(&mut self, script: Script) {
        self.interp.set_script(Arc::new(script));
    }

    /// Execute `stmts` in a fresh root scope and hand the scope back.
    pub fn exec(&mut self, stmts: Vec<Statement>) -> (Signal, ScopeRef) {
        let scope = self.interp.root_scope(&self.out);
        let signal = self.interp.execute(&StatementList::new(stmts), &self.out, &scope);
        (signal, scope)
    }

    pub fn output(&self) -> String {
        self.out.contents()
    }
}

/// Current value of `name` in `scope`; null when undefined.
pub fn value_of(scope: &ScopeRef, name: &str) -> Value {
    scope.get(name).map_or(Value::Null, |var| var.get())
}
