//! Closed tag sets: value kinds for variables and error kinds for `onerror`.

use std::fmt;

/// The declared kind of a variable or formal parameter.
///
/// `Any` is declaration-only: it marks an untyped variable that accepts
/// every value unchanged. All other tags name exactly one runtime value kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Any,
    String,
    Bool,
    Num,
    List,
    Map,
    /// Append-only text sink (string buffer, file, stdout).
    Writer,
    Class,
    Sub,
    /// Opaque object supplied by the embedding host.
    Host,
    Null,
}

impl ValueKind {
    /// Script-facing name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Any => "Any",
            ValueKind::String => "String",
            ValueKind::Bool => "Bool",
            ValueKind::Num => "Num",
            ValueKind::List => "List",
            ValueKind::Map => "Map",
            ValueKind::Writer => "Writer",
            ValueKind::Class => "Class",
            ValueKind::Sub => "Sub",
            ValueKind::Host => "Host",
            ValueKind::Null => "Null",
        }
    }

    /// Kinds whose assignment stringifies the source value.
    #[inline]
    pub fn is_textual(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Writer)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error category used for handler matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorTag {
    /// Unresolvable name, field or method.
    NotFound,
    /// I/O failure.
    FileError,
    /// External process reached a failing level.
    CommandError,
    /// Explicit script termination request.
    Exit,
    /// Everything else, including argument-binding failures.
    Internal,
}

impl ErrorTag {
    /// Kinds whose handlers compare a minimum level.
    #[inline]
    pub fn is_leveled(self) -> bool {
        matches!(self, ErrorTag::CommandError | ErrorTag::Exit)
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorTag::NotFound => "NotFound",
            ErrorTag::FileError => "FileError",
            ErrorTag::CommandError => "CommandError",
            ErrorTag::Exit => "Exit",
            ErrorTag::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// What an `onerror` handler declares it catches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Exactly one error kind.
    Only(ErrorTag),
    /// Every kind except `Exit`.
    AnyButExit,
}

impl HandlerKind {
    /// Whether the declared kind admits `tag`, ignoring levels.
    #[inline]
    pub fn admits(self, tag: ErrorTag) -> bool {
        match self {
            HandlerKind::Only(expected) => expected == tag,
            HandlerKind::AnyButExit => tag != ErrorTag::Exit,
        }
    }
}
