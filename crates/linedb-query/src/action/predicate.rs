//! Filter expression compiler.
//!
//! Grammar:
//!
//! ```text
//! expr    := clause ( " and " clause )*
//! clause  := field op literal
//! op      := " like " | "<>" | "!=" | ">=" | "<=" | ">" | "<" | "="
//! literal := "?" | 'text' | "text" | text
//! ```
//!
//! The operator of a clause is the one occurring earliest; when two start at
//! the same position the longer wins, so `a>=1` never splits as `a > "=1"`.
//! Each `?` takes the next argument.

use std::fmt;

use linedb_common::error::{LineDbError, LineDbResult};
use tracing::warn;

use crate::record::{Operator, Record};

/// One compiled clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Field the clause tests.
    pub field: String,
    /// Comparison operator.
    pub op: Operator,
    /// Literal compared against.
    pub literal: String,
}

impl Predicate {
    /// Creates a predicate.
    pub fn new(field: impl Into<String>, op: Operator, literal: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Evaluates the clause. An absent field does not match.
    pub fn matches(&self, record: &Record) -> bool {
        record
            .value(&self.field)
            .is_some_and(|v| v.matches(self.op, &self.literal))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.literal)
    }
}

/// Compiles a filter expression, filling `?` placeholders from `args`.
///
/// Too few arguments is a build error; surplus arguments are ignored.
pub fn compile(expr: &str, args: &[String]) -> LineDbResult<Vec<Predicate>> {
    let mut args = args.iter();
    let mut predicates = Vec::new();

    for clause in split_clauses(expr) {
        let (at, token, op) = find_operator(clause)
            .ok_or_else(|| LineDbError::build(clause.trim(), "no comparison operator"))?;

        let field = clause[..at].trim();
        if field.is_empty() {
            return Err(LineDbError::build(clause.trim(), "missing field name"));
        }

        let literal = clause[at + token.len()..].trim();
        let literal = if literal == "?" {
            args.next()
                .ok_or_else(|| LineDbError::build(clause.trim(), "missing argument for '?'"))?
                .clone()
        } else {
            unquote(literal).to_string()
        };

        predicates.push(Predicate::new(field, op, literal));
    }

    let surplus = args.len();
    if surplus > 0 {
        warn!(expr, surplus, "filter has more arguments than placeholders");
    }
    Ok(predicates)
}

/// Splits on the `and` keyword, case-insensitively.
fn split_clauses(expr: &str) -> Vec<&str> {
    const AND: &str = " and ";
    let lowered = expr.to_ascii_lowercase();
    let mut clauses = Vec::new();
    let mut start = 0;
    while let Some(found) = lowered[start..].find(AND) {
        clauses.push(&expr[start..start + found]);
        start += found + AND.len();
    }
    clauses.push(&expr[start..]);
    clauses
}

/// Finds the earliest operator, preferring the longer token on ties.
fn find_operator(clause: &str) -> Option<(usize, &'static str, Operator)> {
    let lowered = clause.to_ascii_lowercase();
    let mut best: Option<(usize, &'static str, Operator)> = None;
    for (token, op) in Operator::TOKENS {
        if let Some(at) = lowered.find(token) {
            // TOKENS is longest first, so an equal position keeps the earlier token.
            if best.map_or(true, |(b, _, _)| at < b) {
                best = Some((at, token, op));
            }
        }
    }
    best
}

/// Strips one pair of matching quotes.
fn unquote(literal: &str) -> &str {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &literal[1..literal.len() - 1]
    } else {
        literal
    }
}
