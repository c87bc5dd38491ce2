//! Operator implementations for the expression calculator.
//!
//! Direct enum dispatch over [`BinaryOp`]/[`UnaryOp`]. Operands arrive
//! already evaluated; `&&` and `||` are short-circuited by the caller and
//! only reach [`evaluate_binary`] when both sides are known.

use std::cmp::Ordering;

use zmk_ir::{BinaryOp, UnaryOp};

use crate::errors::{division_by_zero, integer_overflow, invalid_operator, EvalResult};
use crate::value::{parse_number, Number, Value};

#[inline]
fn checked(result: Option<i64>, op_name: &'static str) -> EvalResult<Number> {
    result.map(Number::Int).ok_or_else(|| integer_overflow(op_name))
}

pub(crate) fn add_numbers(a: Number, b: Number) -> EvalResult<Number> {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => checked(a.checked_add(b), "addition"),
        _ => Ok(Number::Float(a.as_f64() + b.as_f64())),
    }
}

fn arith(op: BinaryOp, a: Number, b: Number) -> EvalResult<Number> {
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b.is_zero() {
        return Err(division_by_zero());
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => match op {
            BinaryOp::Add => checked(x.checked_add(y), "addition"),
            BinaryOp::Sub => checked(x.checked_sub(y), "subtraction"),
            BinaryOp::Mul => checked(x.checked_mul(y), "multiplication"),
            BinaryOp::Div => checked(x.checked_div(y), "division"),
            _ => checked(x.checked_rem(y), "remainder"),
        },
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Ok(Number::Float(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                BinaryOp::Div => x / y,
                _ => x % y,
            }))
        }
    }
}

/// Numeric view for arithmetic and ordering: numbers and numeric text.
fn numeric(value: &Value) -> Option<Number> {
    match value {
        Value::Num(n) => Some(*n),
        Value::Str(s) => parse_number(s.trim()),
        _ => None,
    }
}

#[inline]
fn is_textual(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::Writer(_))
}

/// Script equality: numbers compare by value, numeric text equals the
/// number it spells, everything else compares structurally.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Num(n), Value::Str(s)) | (Value::Str(s), Value::Num(n)) => {
            parse_number(s.trim()).is_some_and(|m| m == *n)
        }
        (Value::Writer(_), _) | (_, Value::Writer(_)) => left.to_text() == right.to_text(),
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => match (parse_number(a.trim()), parse_number(b.trim())) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.cmp(b)),
        },
        _ => match (numeric(left), numeric(right)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => return Err(invalid_operator(op.as_symbol(), left.kind(), right.kind())),
        },
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }))
}

/// Evaluate a binary operator over two values.
pub fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match (op, left, right) {
        (BinaryOp::Add, l, r) if is_textual(l) || is_textual(r) => {
            let mut text = l.to_text();
            text.push_str(&r.to_text());
            Ok(Value::Str(text))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.read().clone();
            items.extend(b.read().iter().cloned());
            Ok(Value::list(items))
        }
        (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod, l, r) => {
            match (numeric(l), numeric(r)) {
                (Some(a), Some(b)) => arith(op, a, b).map(Value::Num),
                _ => Err(invalid_operator(op.as_symbol(), l.kind(), r.kind())),
            }
        }
        (BinaryOp::Eq, l, r) => Ok(Value::Bool(values_equal(l, r))),
        (BinaryOp::NotEq, l, r) => Ok(Value::Bool(!values_equal(l, r))),
        (BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq, l, r) => compare(op, l, r),
        (BinaryOp::And, l, r) => Ok(Value::Bool(l.to_bool()? && r.to_bool()?)),
        (BinaryOp::Or, l, r) => Ok(Value::Bool(l.to_bool()? || r.to_bool()?)),
    }
}

/// Evaluate a unary operator.
pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> EvalResult {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.to_bool()?)),
        UnaryOp::Neg => match numeric(operand) {
            Some(Number::Int(n)) => n
                .checked_neg()
                .map(Value::int)
                .ok_or_else(|| integer_overflow("negation")),
            Some(Number::Float(f)) => Ok(Value::float(-f)),
            None => Err(invalid_operator("-", operand.kind(), operand.kind())),
        },
    }
}
