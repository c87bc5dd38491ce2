//! Source positions.
//!
//! Every statement and statement list carries the file/line/column it was
//! compiled from, so fatal errors can name both the failing statement and
//! its innermost enclosing construct.

use std::fmt;
use std::sync::Arc;

/// A file/line/column triple. Lines and columns are 1-based; `0` means unknown.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    /// Create a position in `file`.
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        SourcePos {
            file: file.into(),
            line,
            column,
        }
    }

    /// Position for generated or host-injected code.
    pub fn unknown() -> Self {
        SourcePos::new("<unknown>", 0, 0)
    }

    /// Returns `true` if the position points into real source.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl Default for SourcePos {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_file_line_column() {
        let pos = SourcePos::new("build.zm", 12, 4);
        assert_eq!(pos.to_string(), "build.zm:12:4");
    }

    #[test]
    fn default_is_unknown() {
        let pos = SourcePos::default();
        assert!(!pos.is_known());
        assert_eq!(pos.to_string(), "<unknown>:0:0");
    }
}
