//! Runtime error types and their constructors.
//!
//! # Structured Error Categories
//!
//! [`ErrorKind`] carries typed data for every failure the engine raises.
//! Each kind classifies into exactly one [`ErrorTag`] of the handler
//! taxonomy (`NotFound`, `FileError`, `CommandError`, `Exit`, `Internal`),
//! which is what `onerror` statements match against.
//!
//! Factory functions (e.g. [`undefined_variable`]) are the public way to
//! build errors; they populate both `kind` and `message`.

use std::fmt;

use zmk_ir::{ErrorTag, SourcePos, ValueKind};

use crate::value::Value;

/// Result of evaluating anything in the engine.
pub type EvalResult<T = Value> = Result<T, RuntimeError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    // NotFound
    UndefinedVariable { name: String },
    UndefinedSubroutine { name: String },
    UndefinedField { field: String, type_name: String },
    UndefinedMethod { method: String, type_name: String },
    PrivateMember { name: String },
    IndexOutOfBounds { index: i64, len: usize },

    // FileError
    FileError { path: String, reason: String },

    // CommandError
    CommandFailed { command: String, level: i32 },

    // Exit
    Exit { level: i32 },

    // Internal
    ArgumentError { sub: String, reason: String },
    TypeMismatch { expected: String, got: String },
    ImmutableBinding { name: String },
    DivisionByZero,
    IntegerOverflow { operation: String },
    InvalidOperator { op: &'static str, left: String, right: String },
    StackOverflow { depth: usize },
    Thrown { message: String },
    Custom { message: String },
}

impl ErrorKind {
    /// Handler-matching category.
    pub fn tag(&self) -> ErrorTag {
        match self {
            Self::UndefinedVariable { .. }
            | Self::UndefinedSubroutine { .. }
            | Self::UndefinedField { .. }
            | Self::UndefinedMethod { .. }
            | Self::PrivateMember { .. }
            | Self::IndexOutOfBounds { .. } => ErrorTag::NotFound,
            Self::FileError { .. } => ErrorTag::FileError,
            Self::CommandFailed { .. } => ErrorTag::CommandError,
            Self::Exit { .. } => ErrorTag::Exit,
            Self::ArgumentError { .. }
            | Self::TypeMismatch { .. }
            | Self::ImmutableBinding { .. }
            | Self::DivisionByZero
            | Self::IntegerOverflow { .. }
            | Self::InvalidOperator { .. }
            | Self::StackOverflow { .. }
            | Self::Thrown { .. }
            | Self::Custom { .. } => ErrorTag::Internal,
        }
    }

    /// Level carried by `CommandError` and `Exit` failures.
    pub fn level(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { level, .. } | Self::Exit { level } => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable { name } => write!(f, "undefined variable: {name}"),
            Self::UndefinedSubroutine { name } => write!(f, "undefined subroutine: {name}"),
            Self::UndefinedField { field, type_name } => {
                write!(f, "no field '{field}' on {type_name}")
            }
            Self::UndefinedMethod { method, type_name } => {
                write!(f, "no method '{method}' on {type_name}")
            }
            Self::PrivateMember { name } => write!(f, "member '{name}' is private"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::FileError { path, reason } => write!(f, "{path}: {reason}"),
            Self::CommandFailed { command, level } => {
                write!(f, "command '{command}' failed with level {level}")
            }
            Self::Exit { level } => write!(f, "exit({level})"),
            Self::ArgumentError { sub, reason } => write!(f, "{sub}: {reason}"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::ImmutableBinding { name } => {
                write!(f, "cannot assign to const variable: {name}")
            }
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::IntegerOverflow { operation } => write!(f, "integer overflow in {operation}"),
            Self::InvalidOperator { op, left, right } => {
                write!(f, "operator `{op}` cannot be applied to {left} and {right}")
            }
            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
            Self::Thrown { message } | Self::Custom { message } => f.write_str(message),
        }
    }
}

/// A runtime failure travelling through the statement engine.
#[derive(Clone, Debug)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Position of the statement that failed.
    pub pos: Option<SourcePos>,
    /// Position of the innermost construct enclosing the failing statement.
    pub within: Option<SourcePos>,
    /// Secondary context, innermost first.
    pub notes: Vec<String>,
}

impl RuntimeError {
    /// An `Internal` error with a free-form message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(ErrorKind::Custom { message })
    }

    fn from_kind(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        RuntimeError {
            kind,
            message,
            pos: None,
            within: None,
            notes: Vec::new(),
        }
    }

    #[inline]
    pub fn tag(&self) -> ErrorTag {
        self.kind.tag()
    }

    #[inline]
    pub fn level(&self) -> Option<i32> {
        self.kind.level()
    }

    /// Record where the failure happened; the first location wins.
    #[must_use]
    pub fn located(mut self, pos: &SourcePos, within: &SourcePos) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos.clone());
            self.within = Some(within.clone());
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{pos}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Fatal script outcome reported to the embedder.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{at}: {message}{}", within_suffix(.within.as_ref()))]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    /// Failing statement.
    pub at: SourcePos,
    /// Innermost enclosing construct.
    pub within: Option<SourcePos>,
    pub notes: Vec<String>,
}

fn within_suffix(within: Option<&SourcePos>) -> String {
    match within {
        Some(pos) if pos.is_known() => format!(" (in construct at {pos})"),
        _ => String::new(),
    }
}

impl ScriptError {
    #[inline]
    pub fn tag(&self) -> ErrorTag {
        self.kind.tag()
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(err: RuntimeError) -> Self {
        ScriptError {
            at: err.pos.unwrap_or_default(),
            within: err.within,
            kind: err.kind,
            message: err.message,
            notes: err.notes,
        }
    }
}

// NotFound

#[cold]
pub fn undefined_variable(name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_subroutine(name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::UndefinedSubroutine {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_field(field: &str, type_name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::UndefinedField {
        field: field.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn undefined_method(method: &str, type_name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::UndefinedMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn private_member(name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::PrivateMember {
        name: name.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::IndexOutOfBounds { index, len })
}

// FileError

#[cold]
pub fn file_error(path: impl fmt::Display, reason: impl fmt::Display) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::FileError {
        path: path.to_string(),
        reason: reason.to_string(),
    })
}

// CommandError

#[cold]
pub fn command_failed(command: &str, level: i32) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::CommandFailed {
        command: command.to_string(),
        level,
    })
}

// Exit

#[cold]
pub fn exit_requested(level: i32) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Exit { level })
}

// Internal

#[cold]
pub fn argument_error(sub: &str, reason: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::ArgumentError {
        sub: sub.to_string(),
        reason: reason.into(),
    })
}

#[cold]
pub fn type_mismatch(expected: impl fmt::Display, got: impl fmt::Display) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn kind_mismatch(expected: ValueKind, got: ValueKind) -> RuntimeError {
    type_mismatch(expected, got)
}

#[cold]
pub fn immutable_binding(name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::ImmutableBinding {
        name: name.to_string(),
    })
}

#[cold]
pub fn division_by_zero() -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn invalid_operator(op: &'static str, left: ValueKind, right: ValueKind) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::InvalidOperator {
        op,
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn call_depth_exceeded(depth: usize) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::StackOverflow { depth })
}

#[cold]
pub fn thrown(message: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Thrown {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests;
