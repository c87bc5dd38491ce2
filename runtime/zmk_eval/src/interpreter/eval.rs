//! Expression evaluation and data-path resolution.
//!
//! Path roots resolve to a visible variable, then a script subroutine,
//! then a class. Each segment is one step of [`access`]; class members
//! and methods are handled here because they need the script and the
//! call stack.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use zmk_ir::{BinaryOp, ClassDef, DataPath, ErrorTag, Expr, Segment, SourcePos, Subroutine, ValueKind};

use super::Interpreter;
use crate::access::{self, is_private, ResolveFlags, Resolved};
use crate::calc::{evaluate_binary, evaluate_unary};
use crate::errors::{
    argument_error, immutable_binding, private_member, undefined_field, undefined_method,
    undefined_variable, EvalResult, RuntimeError,
};
use crate::methods::dispatch_builtin_method;
use crate::scope::ScopeRef;
use crate::sink::SharedSink;
use crate::stack::ensure_sufficient_stack;
use crate::value::{SharedMap, Value};
use crate::variable::Variable;

/// Map positional method arguments onto a subroutine's formals, in order.
fn positional(sub: &Subroutine, args: Vec<Value>) -> EvalResult<Vec<(String, Value)>> {
    if args.len() > sub.params.len() {
        return Err(argument_error(
            &sub.name,
            format!("takes {} arguments, got {}", sub.params.len(), args.len()),
        ));
    }
    Ok(sub
        .params
        .iter()
        .zip(args)
        .map(|(param, value)| (param.name.clone(), value))
        .collect())
}

/// `current += value` for a container slot.
fn appended(slot: &str, current: Value, value: Value) -> EvalResult {
    let kind = if current.is_null() {
        ValueKind::Any
    } else {
        current.kind()
    };
    let cell = Variable::raw(slot, kind, current, false);
    cell.append(value)?;
    Ok(cell.get())
}

/// A missing slot reads as null when appending to it.
fn or_null(slot: EvalResult) -> EvalResult {
    match slot {
        Err(err) if err.tag() == ErrorTag::NotFound => Ok(Value::Null),
        other => other,
    }
}

impl Interpreter {
    pub(super) fn eval(&mut self, expr: &Expr, out: &SharedSink, scope: &ScopeRef) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr(expr, out, scope))
    }

    fn eval_expr(&mut self, expr: &Expr, out: &SharedSink, scope: &ScopeRef) -> EvalResult {
        match expr {
            Expr::Literal(lit) => Ok(Value::from_literal(lit)),
            Expr::Path(path) => self.read_path(path, out, scope),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, out, scope)?;
                evaluate_unary(*op, &operand)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, out, scope)?;
                match op {
                    BinaryOp::And if !left.to_bool()? => Ok(Value::Bool(false)),
                    BinaryOp::Or if left.to_bool()? => Ok(Value::Bool(true)),
                    BinaryOp::And | BinaryOp::Or => {
                        Ok(Value::Bool(self.eval(right, out, scope)?.to_bool()?))
                    }
                    _ => {
                        let right = self.eval(right, out, scope)?;
                        evaluate_binary(*op, &left, &right)
                    }
                }
            }
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, out, scope)?);
                }
                Ok(Value::list(values))
            }
            Expr::Map(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval(value, out, scope)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::map(map))
            }
            Expr::Call(call) => self.call_named(call, Vec::new(), out, scope, &SourcePos::unknown()),
        }
    }

    pub(super) fn read_path(&mut self, path: &DataPath, out: &SharedSink, scope: &ScopeRef) -> EvalResult {
        self.resolve(path, out, scope, ResolveFlags::empty())
            .map(Resolved::into_value)
    }

    /// Resolve `path` for reading.
    ///
    /// With `WANT_CONTAINER` the last segment is not applied. With
    /// `WANT_VARIABLE` a bare variable path yields the cell itself.
    pub(super) fn resolve(
        &mut self,
        path: &DataPath,
        out: &SharedSink,
        scope: &ScopeRef,
        flags: ResolveFlags,
    ) -> EvalResult<Resolved> {
        if path.is_simple() && flags.contains(ResolveFlags::WANT_VARIABLE) {
            if let Some(var) = scope.get(&path.root) {
                return Ok(Resolved::Variable(var));
            }
        }

        let segments = if flags.contains(ResolveFlags::WANT_CONTAINER) {
            &path.segments[..path.segments.len().saturating_sub(1)]
        } else {
            &path.segments[..]
        };
        let mut current = self.root_value(&path.root, scope)?;
        for segment in segments {
            current = self.step(&current, segment, flags, out, scope)?;
        }
        Ok(Resolved::Value(current))
    }

    fn root_value(&self, name: &str, scope: &ScopeRef) -> EvalResult {
        if let Some(var) = scope.get(name) {
            return Ok(var.get());
        }
        if let Some(sub) = self.script.sub(name) {
            return Ok(Value::Sub(Arc::clone(sub)));
        }
        if let Some(class) = self.script.class(name) {
            return Ok(Value::Class(Arc::clone(class)));
        }
        Err(undefined_variable(name))
    }

    fn step(
        &mut self,
        container: &Value,
        segment: &Segment,
        flags: ResolveFlags,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult {
        match segment {
            Segment::Field(name) => match container {
                Value::Class(class) => self.class_field(class, name),
                _ => access::field(container, name, flags),
            },
            Segment::Index(index) => {
                let index = self.eval(index, out, scope)?;
                access::index(container, &index)
            }
            Segment::Method { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, out, scope)?);
                }
                self.call_method(container, name, values, flags, out, scope)
            }
        }
    }

    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        flags: ResolveFlags,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult {
        match receiver {
            Value::Class(class) => {
                self.check_class_private(class, name)?;
                let sub = class
                    .subs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| undefined_method(name, &class.name))?;
                let args = positional(&sub, args)?;
                self.call_sub(&sub, Some(&class.name), args, scope, &SourcePos::unknown(), out)
            }
            Value::Host(host) => access::call_host(host.as_ref(), name, args, flags),
            other => dispatch_builtin_method(other, name, &args),
        }
    }

    /// Private class members are visible only to the class's own subroutines.
    fn check_class_private(&self, class: &ClassDef, name: &str) -> EvalResult<()> {
        if is_private(name) && self.call_stack.current_class() != Some(class.name.as_str()) {
            return Err(private_member(name));
        }
        Ok(())
    }

    fn class_field(&mut self, class: &Arc<ClassDef>, name: &str) -> EvalResult {
        self.check_class_private(class, name)?;
        let members = self.class_members(class)?;
        let member = members.read().get(name).cloned();
        match member {
            Some(value) => Ok(value),
            None => match class.subs.get(name) {
                Some(sub) => Ok(Value::Sub(Arc::clone(sub))),
                None => Err(undefined_field(name, &class.name)),
            },
        }
    }

    /// The evaluated member map of `class`, computed on first use.
    fn class_members(&mut self, class: &Arc<ClassDef>) -> EvalResult<SharedMap> {
        if let Some(members) = self.shared.class_members.get(&class.name) {
            return Ok(Arc::clone(members.value()));
        }
        if self.initializing.contains(&class.name) {
            return Err(RuntimeError::new(format!(
                "members of class {} refer to the class while it initializes",
                class.name
            )));
        }

        tracing::debug!(class = %class.name, "evaluating class members");
        self.initializing.push(class.name.clone());
        let home = Arc::clone(&self.home);
        let out = Arc::clone(&self.shared.out);
        let entries = self.aggregate(&class.members, &out, &home);
        self.initializing.pop();

        let members: SharedMap = Arc::new(RwLock::new(entries?));
        let entry = self
            .shared
            .class_members
            .entry(class.name.clone())
            .or_insert(members);
        Ok(Arc::clone(entry.value()))
    }

    /// Store `value` at `dest`, appending with `+=` semantics when `append` is set.
    pub(super) fn store(
        &mut self,
        dest: &DataPath,
        value: Value,
        append: bool,
        out: &SharedSink,
        scope: &ScopeRef,
    ) -> EvalResult<()> {
        if dest.is_simple() {
            return match self.resolve(dest, out, scope, ResolveFlags::WANT_VARIABLE)? {
                Resolved::Variable(var) if append => var.append(value),
                Resolved::Variable(var) => var.assign(value),
                Resolved::Value(_) => Err(immutable_binding(&dest.root)),
            };
        }

        let container = self
            .resolve(dest, out, scope, ResolveFlags::WANT_CONTAINER)?
            .into_value();
        let flags = ResolveFlags::empty();
        match dest.segments.last() {
            Some(Segment::Field(name)) => {
                if let Value::Class(class) = &container {
                    return Err(immutable_binding(&format!("{}.{name}", class.name)));
                }
                let value = if append {
                    let current = or_null(access::field(&container, name, flags))?;
                    appended(name, current, value)?
                } else {
                    value
                };
                access::store_field(&container, name, value, flags)
            }
            Some(Segment::Index(index)) => {
                let index = self.eval(index, out, scope)?;
                let value = if append {
                    let current = or_null(access::index(&container, &index))?;
                    appended(&dest.root, current, value)?
                } else {
                    value
                };
                access::store_index(&container, &index, value)
            }
            _ => Err(RuntimeError::new(format!("cannot assign to `{dest}`"))),
        }
    }
}
