//! Scopes (execution levels).
//!
//! A [`Scope`] is an ordered table of variable cells plus per-block
//! execution state: the current directory and the exit level of the last
//! command run in it.
//!
//! # Construction rule
//!
//! [`Scope::enter_block`] decides whether a nested block gets a scope of
//! its own. A block that declares nothing runs in its enclosing scope, so
//! every assignment inside is the caller's assignment. A block that does
//! declare gets a new scope in which
//! - const variables are the *same* cells as the parent's,
//! - non-const variables are fresh cells holding the parent's values.
//!
//! Writes to inherited variables therefore stay local, while mutation of
//! a shared list or map value is visible both ways.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use zmk_ir::ValueKind;

use crate::errors::{file_error, immutable_binding, undefined_variable, EvalResult};
use crate::value::Value;
use crate::variable::{VarRef, Variable};

/// Shared scope handle.
pub type ScopeRef = Arc<Scope>;

#[derive(Debug)]
pub struct Scope {
    vars: RwLock<IndexMap<String, VarRef>>,
    /// Enclosing scope, kept for diagnostics. Never consulted by lookup.
    parent: Option<Weak<Scope>>,
    cwd: RwLock<PathBuf>,
    last_level: AtomicI32,
    depth: usize,
}

impl Scope {
    /// A root scope with no variables.
    pub fn root(cwd: impl Into<PathBuf>) -> ScopeRef {
        Arc::new(Scope {
            vars: RwLock::new(IndexMap::new()),
            parent: None,
            cwd: RwLock::new(normalize(&cwd.into())),
            last_level: AtomicI32::new(0),
            depth: 0,
        })
    }

    /// Look a variable up in this scope's table.
    pub fn get(&self, name: &str) -> Option<VarRef> {
        self.vars.read().get(name).cloned()
    }

    /// Like [`get`](Self::get), with a miss reported as `NotFound`.
    pub fn lookup(&self, name: &str) -> EvalResult<VarRef> {
        self.get(name).ok_or_else(|| undefined_variable(name))
    }

    /// Define `name` in this scope. Fails if `name` is bound to a const.
    pub fn define(
        &self,
        name: &str,
        kind: ValueKind,
        value: Value,
        is_const: bool,
    ) -> EvalResult<VarRef> {
        let var = Variable::new(name, kind, value, is_const)?;
        let mut vars = self.vars.write();
        if vars.get(name).is_some_and(|v| v.is_const()) {
            return Err(immutable_binding(name));
        }
        vars.insert(name.to_string(), Arc::clone(&var));
        Ok(var)
    }

    /// Bind an existing cell, replacing whatever held the name.
    pub(crate) fn bind(&self, var: VarRef) {
        self.vars.write().insert(var.name().to_string(), var);
    }

    /// Scope for a nested block; see the module docs.
    pub fn enter_block(self: &Arc<Self>, declares_variables: bool) -> ScopeRef {
        if !declares_variables {
            return Arc::clone(self);
        }
        let vars = self
            .vars
            .read()
            .iter()
            .map(|(name, var)| {
                let cell = if var.is_const() {
                    Arc::clone(var)
                } else {
                    var.duplicate()
                };
                (name.clone(), cell)
            })
            .collect();
        Arc::new(Scope {
            vars: RwLock::new(vars),
            parent: Some(Arc::downgrade(self)),
            cwd: RwLock::new(self.current_dir()),
            last_level: AtomicI32::new(self.last_command_level()),
            depth: self.depth.saturating_add(1),
        })
    }

    /// Resolve `path` against the current directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        normalize(&self.cwd.read().join(path))
    }

    /// Change the current directory. The target must be an existing directory.
    pub fn change_directory(&self, path: &Path) -> EvalResult<()> {
        let target = self.resolve_path(path);
        if !target.is_dir() {
            return Err(file_error(target.display(), "not a directory"));
        }
        *self.cwd.write() = target;
        Ok(())
    }

    pub(crate) fn set_current_dir(&self, dir: PathBuf) {
        *self.cwd.write() = dir;
    }

    pub fn current_dir(&self) -> PathBuf {
        self.cwd.read().clone()
    }

    /// Exit level of the last command run in this scope.
    pub fn last_command_level(&self) -> i32 {
        self.last_level.load(Ordering::Relaxed)
    }

    pub fn set_last_command_level(&self, level: i32) {
        self.last_level.store(level, Ordering::Relaxed);
    }

    /// Nesting depth below the root scope.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Names in definition order.
    pub fn variable_names(&self) -> Vec<String> {
        self.vars.read().keys().cloned().collect()
    }

    /// Snapshot of the cells.
    pub fn variables(&self) -> Vec<VarRef> {
        self.vars.read().values().cloned().collect()
    }
}

/// Lexically normalize `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
