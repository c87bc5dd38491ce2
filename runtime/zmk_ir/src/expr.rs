//! Expressions and data-access paths.
//!
//! The calculator evaluates [`Expr`] trees; any operand that reads a
//! variable, a map entry, a host field or calls a method is a [`DataPath`],
//! which the data-access layer resolves before the arithmetic runs.

use std::fmt;

/// Literal constants.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    /// Source symbol of the operator.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// `&&` and `||` evaluate their right operand lazily.
    #[inline]
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// An expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Path(DataPath),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `(a, b, c)` list literal.
    List(Vec<Expr>),
    /// `{k: v, ...}` map literal; keys keep source order.
    Map(Vec<(String, Expr)>),
    /// Subroutine call used as a value.
    Call(SubCall),
}

/// A subroutine invocation: qualified target name plus named arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct SubCall {
    /// `name`, `Class.name`, or a variable holding a subroutine reference.
    pub target: String,
    pub args: Vec<ActualArg>,
}

/// One actual argument. Every actual names the formal parameter it fills.
#[derive(Clone, Debug, PartialEq)]
pub struct ActualArg {
    pub name: String,
    pub value: Expr,
}

/// A dotted access path: `root.field[index].method(args)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPath {
    pub root: String,
    pub segments: Vec<Segment>,
}

/// One step of a [`DataPath`].
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Field(String),
    Index(Expr),
    Method { name: String, args: Vec<Expr> },
}

impl DataPath {
    /// A bare variable reference.
    pub fn var(root: impl Into<String>) -> Self {
        DataPath {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Field(name.into()));
        self
    }

    #[must_use]
    pub fn index(mut self, index: Expr) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    #[must_use]
    pub fn method(mut self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        self.segments.push(Segment::Method {
            name: name.into(),
            args,
        });
        self
    }

    /// Returns `true` for a path that names a variable and nothing more.
    #[inline]
    pub fn is_simple(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(_) => f.write_str("[..]")?,
                Segment::Method { name, .. } => write!(f, ".{name}(..)")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_elides_arguments() {
        let path = DataPath::var("cfg")
            .field("targets")
            .index(Expr::Literal(Literal::Int(0)))
            .method("name", vec![]);
        assert_eq!(path.to_string(), "cfg.targets[..].name(..)");
        assert!(!path.is_simple());
        assert!(DataPath::var("x").is_simple());
    }

    #[test]
    fn short_circuit_operators() {
        assert!(BinaryOp::And.is_short_circuit());
        assert!(BinaryOp::Or.is_short_circuit());
        assert!(!BinaryOp::Add.is_short_circuit());
        assert_eq!(BinaryOp::GtEq.as_symbol(), ">=");
    }
}
