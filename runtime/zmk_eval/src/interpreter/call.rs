//! Subroutine call protocol.
//!
//! Every actual argument names the formal it fills. Actuals are evaluated
//! in the caller's scope; formals left unfilled take their default,
//! evaluated in the interpreter's home scope so defaults never see the
//! caller's locals. A `NewScope` callee runs in a scope derived from home
//! that inherits the caller's current directory; a `UseCallerScope` callee
//! runs directly in the caller's scope and takes no arguments.

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use zmk_ir::{CallMode, Expr, SourcePos, SubCall, Subroutine};

use super::{Interpreter, Signal};
use crate::diagnostics::CallFrame;
use crate::errors::{argument_error, undefined_subroutine, EvalResult};
use crate::scope::ScopeRef;
use crate::sink::SharedSink;
use crate::value::Value;
use crate::variable::Variable;

/// Reject arguments that name no formal, name one twice, or target an inline sub.
fn check_arguments(sub: &Subroutine, args: &[(String, Value)]) -> EvalResult<()> {
    let mut seen = FxHashSet::default();
    for (name, _) in args {
        if sub.mode == CallMode::UseCallerScope {
            return Err(argument_error(
                &sub.name,
                format!("runs in the caller's scope and takes no arguments, got `{name}`"),
            ));
        }
        if sub.param(name).is_none() {
            return Err(argument_error(&sub.name, format!("no parameter named `{name}`")));
        }
        if !seen.insert(name.as_str()) {
            return Err(argument_error(&sub.name, format!("`{name}` given more than once")));
        }
    }
    Ok(())
}

fn path_value(path: PathBuf) -> Value {
    Value::str(path.to_string_lossy().into_owned())
}

impl Interpreter {
    /// Call the subroutine named by `call` from a statement or expression.
    pub(super) fn call_named(
        &mut self,
        call: &SubCall,
        extra: Vec<(String, Value)>,
        out: &SharedSink,
        scope: &ScopeRef,
        pos: &SourcePos,
    ) -> EvalResult {
        let (sub, class) = self.lookup_sub(&call.target, scope)?;
        let mut args = Vec::with_capacity(call.args.len().saturating_add(extra.len()));
        for actual in &call.args {
            let value = self.eval(&actual.value, out, scope)?;
            args.push((actual.name.clone(), value));
        }
        args.extend(extra);
        self.call_sub(&sub, class.as_deref(), args, scope, pos, out)
    }

    /// Find a call target: a script subroutine (qualified or, inside a
    /// class, a sibling member), then a variable holding a subroutine.
    fn lookup_sub(
        &self,
        target: &str,
        scope: &ScopeRef,
    ) -> EvalResult<(Arc<Subroutine>, Option<String>)> {
        if let Some(class) = self.call_stack.current_class() {
            if let Some(sub) = self.script.class(class).and_then(|c| c.subs.get(target)) {
                return Ok((Arc::clone(sub), Some(class.to_string())));
            }
        }
        if let Some(sub) = self.script.sub(target) {
            let class = target
                .rsplit_once('.')
                .filter(|(class, _)| self.script.class(class).is_some())
                .map(|(class, _)| class.to_string());
            return Ok((Arc::clone(sub), class));
        }
        match scope.get(target).map(|var| var.get()) {
            Some(Value::Sub(sub)) => Ok((sub, None)),
            _ => Err(undefined_subroutine(target)),
        }
    }

    /// Invoke `sub` with evaluated arguments and return its result.
    ///
    /// The result is the value of the last `return expr;`, or null.
    #[tracing::instrument(level = "debug", skip_all, fields(sub = %sub.name))]
    pub(super) fn call_sub(
        &mut self,
        sub: &Subroutine,
        class: Option<&str>,
        args: Vec<(String, Value)>,
        caller: &ScopeRef,
        call_pos: &SourcePos,
        out: &SharedSink,
    ) -> EvalResult {
        check_arguments(sub, &args)?;

        let callee = match sub.mode {
            CallMode::UseCallerScope => Arc::clone(caller),
            CallMode::NewScope => self.bind_parameters(sub, args, caller, out)?,
        };

        let frame = CallFrame::new(sub.name.clone(), call_pos.clone()).in_class(class.map(str::to_string));
        self.call_stack.push(frame)?;
        let loops = std::mem::take(&mut self.loops);
        let signal = self.exec_list(&sub.body, out, &callee);
        self.loops = loops;
        let frame = self.call_stack.pop();

        if signal == Signal::Exception {
            let err = self.ctx.take_pending();
            return Err(err.with_note(format!("in {} called at {call_pos}", sub.name)));
        }
        Ok(frame.and_then(|f| f.ret).unwrap_or(Value::Null))
    }

    /// Fresh callee scope with every formal bound.
    fn bind_parameters(
        &mut self,
        sub: &Subroutine,
        mut args: Vec<(String, Value)>,
        caller: &ScopeRef,
        out: &SharedSink,
    ) -> EvalResult<ScopeRef> {
        let home = Arc::clone(&self.home);
        let callee = home.enter_block(true);
        callee.set_current_dir(caller.current_dir());
        callee.bind(Arc::clone(&self.ctx.error_var));

        for param in &sub.params {
            let value = match args.iter().position(|(name, _)| *name == param.name) {
                Some(at) => args.swap_remove(at).1,
                None => match &param.default {
                    Some(default) => self.eval(default, out, &home)?,
                    None => Value::Null,
                },
            };
            let var = Variable::new(param.name.clone(), param.kind, value, false).map_err(|e| {
                argument_error(&sub.name, format!("parameter `{}`: {}", param.name, e.message))
            })?;
            callee.bind(var);
        }
        Ok(callee)
    }

    /// Resolve a build-style call's target pattern into the `target` argument.
    pub(super) fn resolve_target(
        &mut self,
        target_path: &Expr,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult {
        let pattern = self.eval(target_path, out, scope)?.to_text();
        let mut paths = self.shared.resolver.resolve(&pattern, scope)?;
        Ok(if paths.len() == 1 {
            path_value(paths.remove(0))
        } else {
            Value::list(paths.into_iter().map(path_value).collect())
        })
    }
}
