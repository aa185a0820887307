//! Typed field values and comparison operators.
//!
//! Cells are stored as text. Their declared type decides how they compare:
//! int and float cells compare numerically, everything else compares as
//! strings. Text that does not parse as a number counts as zero.

use std::cmp::Ordering;
use std::fmt;

use linedb_common::types::FieldType;

use crate::schema::FieldDescriptor;

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=` or `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `like`: case-sensitive substring containment.
    Like,
}

impl Operator {
    /// Operator tokens in match priority (longest first).
    pub const TOKENS: [(&'static str, Operator); 8] = [
        (" like ", Operator::Like),
        ("<>", Operator::Ne),
        ("!=", Operator::Ne),
        (">=", Operator::Ge),
        ("<=", Operator::Le),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
    ];

    /// Parses an operator token. Surrounding whitespace and the case of
    /// `like` are ignored.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("like") {
            return Some(Self::Like);
        }
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
    }

    /// Canonical token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Like => "like",
        }
    }

    /// Applies the operator to an ordering of `value` against a literal.
    fn holds(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Self::Eq, Some(o)) => o == Ordering::Equal,
            (Self::Ne, o) => o != Some(Ordering::Equal),
            (Self::Gt, Some(o)) => o == Ordering::Greater,
            (Self::Ge, Some(o)) => o != Ordering::Less,
            (Self::Lt, Some(o)) => o == Ordering::Less,
            (Self::Le, Some(o)) => o != Ordering::Greater,
            _ => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded cell together with its field descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FieldValue<'a> {
    descriptor: &'a FieldDescriptor,
    raw: &'a str,
}

impl<'a> FieldValue<'a> {
    /// Pairs a raw cell with its descriptor.
    pub fn new(descriptor: &'a FieldDescriptor, raw: &'a str) -> Self {
        Self { descriptor, raw }
    }

    /// The field descriptor.
    pub fn descriptor(&self) -> &'a FieldDescriptor {
        self.descriptor
    }

    /// The raw cell text.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Evaluates `self <op> literal` under the declared type.
    pub fn matches(&self, op: Operator, literal: &str) -> bool {
        if op == Operator::Like {
            return self.raw.contains(literal);
        }
        op.holds(compare_typed(self.descriptor.field_type, self.raw, literal))
    }

    /// Orders two values of the same field for sorting.
    pub fn cmp_value(&self, other: &FieldValue<'_>) -> Ordering {
        match self.descriptor.field_type {
            FieldType::Float => to_float(self.raw).total_cmp(&to_float(other.raw)),
            ty => compare_typed(ty, self.raw, other.raw).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.descriptor.name, self.raw)
    }
}

/// Compares a possibly absent value against a literal.
///
/// An absent field or an unknown operator never matches.
pub fn compare(op: &str, value: Option<FieldValue<'_>>, literal: &str) -> bool {
    match (Operator::parse(op), value) {
        (Some(op), Some(value)) => value.matches(op, literal),
        _ => false,
    }
}

fn compare_typed(ty: FieldType, left: &str, right: &str) -> Option<Ordering> {
    match ty {
        FieldType::Int => Some(to_int(left).cmp(&to_int(right))),
        FieldType::Float => to_float(left).partial_cmp(&to_float(right)),
        FieldType::Bool | FieldType::String => Some(left.cmp(right)),
    }
}

/// Integer value of a cell; fractional text truncates, anything else is 0.
fn to_int(text: &str) -> i64 {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        })
        .unwrap_or(0)
}

/// Float value of a cell; anything unparsable is 0.
fn to_float(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(0.0)
}
