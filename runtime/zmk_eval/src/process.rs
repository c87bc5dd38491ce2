//! External process invocation.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::errors::{file_error, EvalResult, RuntimeError};
use crate::sink::SharedSink;

/// Exit level reported for a process terminated by a signal.
pub const SIGNALLED_LEVEL: i32 = 255;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One command invocation.
#[derive(Clone)]
pub struct ProcessRequest {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
    pub wait: bool,
    /// Captured standard output; inherited when `None`.
    pub stdout: Option<SharedSink>,
    pub stderr: Option<SharedSink>,
}

impl ProcessRequest {
    /// Program name for diagnostics.
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }
}

impl fmt::Debug for ProcessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRequest")
            .field("argv", &self.argv)
            .field("cwd", &self.cwd)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

pub trait ProcessRunner: Send + Sync + fmt::Debug {
    /// Run the request, returning its exit level. An unwaited process
    /// reports level `0`.
    fn run(&self, request: ProcessRequest) -> EvalResult<i32>;

    /// Request termination of every process still running. Best effort.
    fn abort_all(&self);
}

/// Runner backed by `std::process`.
#[derive(Debug, Default)]
pub struct StdProcessRunner {
    children: DashMap<u64, Arc<Mutex<Child>>>,
    next_id: AtomicU64,
}

impl StdProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered children that have not been reaped yet.
    pub fn active(&self) -> usize {
        self.prune();
        self.children.len()
    }

    fn prune(&self) {
        self.children
            .retain(|_, child| !matches!(child.lock().try_wait(), Ok(Some(_))));
    }
}

fn capture<R: Read + Send + 'static>(
    stream: Option<R>,
    sink: Option<SharedSink>,
) -> Option<JoinHandle<()>> {
    let (mut stream, sink) = (stream?, sink?);
    Some(std::thread::spawn(move || {
        let mut bytes = Vec::new();
        if stream.read_to_end(&mut bytes).is_ok() {
            // Capture sinks are buffers; their writes don't fail.
            let _ = sink.write(&String::from_utf8_lossy(&bytes));
        }
    }))
}

fn pipe_or_inherit(sink: Option<&SharedSink>) -> Stdio {
    if sink.is_some() {
        Stdio::piped()
    } else {
        Stdio::inherit()
    }
}

impl ProcessRunner for StdProcessRunner {
    fn run(&self, request: ProcessRequest) -> EvalResult<i32> {
        let Some((program, args)) = request.argv.split_first() else {
            return Err(RuntimeError::new("empty command"));
        };
        self.prune();

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&request.cwd)
            .envs(request.env.iter().map(|(k, v)| (k, v)))
            .stdout(pipe_or_inherit(request.stdout.as_ref()))
            .stderr(pipe_or_inherit(request.stderr.as_ref()))
            .spawn()
            .map_err(|e| file_error(program, e))?;
        tracing::debug!(program = %program, pid = child.id(), "process started");

        let readers = [
            capture(child.stdout.take(), request.stdout.clone()),
            capture(child.stderr.take(), request.stderr.clone()),
        ];

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let child = Arc::new(Mutex::new(child));
        self.children.insert(id, Arc::clone(&child));

        if !request.wait {
            return Ok(0);
        }

        let status = loop {
            match child.lock().try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    self.children.remove(&id);
                    return Err(file_error(program, e));
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        };
        self.children.remove(&id);
        for reader in readers.into_iter().flatten() {
            let _ = reader.join();
        }

        let level = status.code().unwrap_or(SIGNALLED_LEVEL);
        tracing::debug!(program = %program, level, "process exited");
        Ok(level)
    }

    fn abort_all(&self) {
        for entry in &self.children {
            let mut child = entry.value().lock();
            if matches!(child.try_wait(), Ok(None)) {
                tracing::debug!(pid = child.id(), "aborting process");
                let _ = child.kill();
            }
        }
    }
}
