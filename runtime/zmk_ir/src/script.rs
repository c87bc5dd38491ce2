//! Subroutines, classes and the compiled script table.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::expr::Expr;
use crate::kind::ValueKind;
use crate::pos::SourcePos;
use crate::stmt::StatementList;

/// Whether a call allocates a fresh scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallMode {
    #[default]
    NewScope,
    /// Execute inline in the caller's scope. Such subroutines take no parameters.
    UseCallerScope,
}

/// A formal parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ValueKind,
    /// Evaluated in the subroutine's home scope when no actual is given.
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Param {
            name: name.into(),
            kind,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

/// A compiled subroutine.
#[derive(Clone, Debug, PartialEq)]
pub struct Subroutine {
    pub name: String,
    pub params: Vec<Param>,
    pub body: StatementList,
    pub mode: CallMode,
    pub pos: SourcePos,
}

impl Subroutine {
    pub fn new(name: impl Into<String>, params: Vec<Param>, body: StatementList) -> Self {
        Subroutine {
            name: name.into(),
            params,
            body,
            mode: CallMode::NewScope,
            pos: SourcePos::unknown(),
        }
    }

    /// A parameterless subroutine that runs in its caller's scope.
    pub fn inline(name: impl Into<String>, body: StatementList) -> Self {
        Subroutine {
            mode: CallMode::UseCallerScope,
            ..Subroutine::new(name, Vec::new(), body)
        }
    }

    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = pos;
        self
    }

    /// Look up a formal parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A class: a namespace of member definitions and subroutines.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Member definitions, evaluated once into the class's member map.
    pub members: StatementList,
    pub subs: FxHashMap<String, Arc<Subroutine>>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, members: StatementList) -> Self {
        ClassDef {
            name: name.into(),
            members,
            subs: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_sub(mut self, sub: Subroutine) -> Self {
        self.subs.insert(sub.name.clone(), Arc::new(sub));
        self
    }
}

/// A compiled script: top-level body plus qualified-name tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    pub name: String,
    pub body: StatementList,
    subs: FxHashMap<String, Arc<Subroutine>>,
    classes: FxHashMap<String, Arc<ClassDef>>,
}

impl Script {
    pub fn new(name: impl Into<String>, body: StatementList) -> Self {
        Script {
            name: name.into(),
            body,
            subs: FxHashMap::default(),
            classes: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_sub(mut self, sub: Subroutine) -> Self {
        self.add_sub(sub);
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.add_class(class);
        self
    }

    pub fn add_sub(&mut self, sub: Subroutine) {
        self.subs.insert(sub.name.clone(), Arc::new(sub));
    }

    pub fn add_class(&mut self, class: ClassDef) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    /// Resolve `name` or `Class.name`.
    pub fn sub(&self, qualified: &str) -> Option<&Arc<Subroutine>> {
        if let Some(sub) = self.subs.get(qualified) {
            return Some(sub);
        }
        let (class, name) = qualified.rsplit_once('.')?;
        self.classes.get(class)?.subs.get(name)
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassDef>> {
        self.classes.get(name)
    }

    pub fn subs(&self) -> impl Iterator<Item = &Arc<Subroutine>> {
        self.subs.values()
    }
}
