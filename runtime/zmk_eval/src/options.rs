//! Execution options.

use std::path::PathBuf;
use std::time::Duration;

use crate::value::Value;

/// Default wake interval of the top-level thread wait.
pub const DEFAULT_THREAD_POLL: Duration = Duration::from_millis(50);

/// Knobs for one interpreter. Set through [`InterpreterBuilder`](crate::InterpreterBuilder).
#[derive(Clone, Debug)]
pub struct ExecOptions {
    /// Write `[ERROR: ...]` into the output and continue instead of aborting.
    pub tolerant: bool,
    /// Wait for spawned threads before `execute_script` returns.
    pub wait_for_threads: bool,
    pub thread_poll_interval: Duration,
    /// Subroutine nesting limit; `None` is unlimited.
    pub max_call_depth: Option<usize>,
    /// Current directory of root scopes.
    pub cwd: PathBuf,
    /// Variables whose names start with this are exported to commands.
    pub env_prefix: String,
    /// Host-injected const variables of every root scope.
    pub globals: Vec<(String, Value)>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        ExecOptions {
            tolerant: false,
            wait_for_threads: true,
            thread_poll_interval: DEFAULT_THREAD_POLL,
            max_call_depth: None,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "$".to_string(),
            globals: Vec::new(),
        }
    }
}
