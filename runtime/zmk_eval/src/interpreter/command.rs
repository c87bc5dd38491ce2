//! External commands, directory statements and command-error handlers.

use std::path::PathBuf;

use zmk_ir::{CommandSpec, Expr, StatementList};

use super::{Interpreter, Signal};
use crate::errors::{command_failed, file_error, EvalResult};
use crate::process::ProcessRequest;
use crate::scope::ScopeRef;
use crate::sink::{buffer_sink, SharedSink};
use crate::value::Value;

/// A command level counts as failed once it is non-zero and reaches `min_level`.
#[inline]
fn level_reached(level: i32, min_level: i32) -> bool {
    level != 0 && level >= min_level
}

impl Interpreter {
    pub(super) fn run_command(
        &mut self,
        spec: &CommandSpec,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<Signal> {
        let mut argv = Vec::with_capacity(spec.argv.len());
        for arg in &spec.argv {
            match self.eval(arg, out, scope)? {
                Value::Null => {}
                Value::List(items) => argv.extend(
                    items
                        .read()
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(Value::to_text),
                ),
                other => argv.push(other.to_text()),
            }
        }

        let stdout = spec.stdout_var.as_ref().map(|_| buffer_sink());
        let stderr = spec.stderr_var.as_ref().map(|_| buffer_sink());
        let request = ProcessRequest {
            argv,
            env: self.exported_env(scope),
            cwd: scope.current_dir(),
            wait: spec.wait,
            stdout: stdout.clone(),
            stderr: stderr.clone(),
        };
        let program = request.program().to_string();
        tracing::debug!(program = %program, cwd = %request.cwd.display(), wait = spec.wait, "starting command");

        let level = self.shared.runner.run(request)?;
        tracing::debug!(program = %program, level, "command finished");
        scope.set_last_command_level(level);

        for (dest, sink) in [(&spec.stdout_var, stdout), (&spec.stderr_var, stderr)] {
            if let (Some(dest), Some(sink)) = (dest, sink) {
                self.store(dest, Value::str(sink.contents()), false, out, scope)?;
            }
        }

        match spec.fail_level {
            Some(min_level) if level_reached(level, min_level) => Err(command_failed(&program, level)),
            _ => Ok(Signal::Continue),
        }
    }

    /// Environment exported to commands: every visible variable carrying
    /// the prefix, with the prefix removed.
    fn exported_env(&self, scope: &ScopeRef) -> Vec<(String, String)> {
        let prefix = self.shared.options.env_prefix.as_str();
        if prefix.is_empty() {
            return Vec::new();
        }
        scope
            .variables()
            .into_iter()
            .filter_map(|var| {
                let name = var.name().strip_prefix(prefix)?;
                Some((name.to_string(), var.get().to_text()))
            })
            .collect()
    }

    pub(super) fn throw_on_command_error(&self, min_level: i32, scope: &ScopeRef) -> EvalResult<()> {
        let level = scope.last_command_level();
        if level_reached(level, min_level) {
            return Err(command_failed("last command", level));
        }
        Ok(())
    }

    pub(super) fn on_command_error(
        &mut self,
        min_level: i32,
        body: &StatementList,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> Signal {
        if level_reached(scope.last_command_level(), min_level) {
            self.exec_block(body, out, scope)
        } else {
            Signal::Continue
        }
    }

    pub(super) fn change_dir(&mut self, dir: &Expr, out: &SharedSink, scope: &ScopeRef) -> EvalResult<Signal> {
        let pattern = self.eval(dir, out, scope)?.to_text();
        let path = self.resolve_single(&pattern, scope)?;
        scope.change_directory(&path)?;
        tracing::trace!(cwd = %scope.current_dir().display(), "changed directory");
        Ok(Signal::Continue)
    }

    pub(super) fn make_dir(&mut self, dir: &Expr, out: &SharedSink, scope: &ScopeRef) -> EvalResult<Signal> {
        let pattern = self.eval(dir, out, scope)?.to_text();
        let path = self.resolve_single(&pattern, scope)?;
        std::fs::create_dir_all(&path).map_err(|e| file_error(path.display(), e))?;
        Ok(Signal::Continue)
    }

    /// Resolve a pattern that must name exactly one path.
    pub(super) fn resolve_single(&self, pattern: &str, scope: &ScopeRef) -> EvalResult<PathBuf> {
        let paths = self.shared.resolver.resolve(pattern, scope)?;
        match paths.as_slice() {
            [one] => Ok(one.clone()),
            [] => Err(file_error(pattern, "no matching path")),
            many => Err(file_error(pattern, format!("matches {} paths", many.len()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::level_reached;

    #[test]
    fn zero_never_fails() {
        assert!(!level_reached(0, 0));
        assert!(level_reached(1, 0));
        assert!(level_reached(2, 2));
        assert!(!level_reached(1, 2));
    }
}
