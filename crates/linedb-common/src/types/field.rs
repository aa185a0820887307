//! Declared field types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a table field, as written in header record 4.
///
/// The type drives comparison semantics only; cells are always stored as
/// text.
///
/// # Example
///
/// ```rust
/// use linedb_common::types::FieldType;
///
/// assert_eq!(FieldType::parse("int"), FieldType::Int);
/// assert_eq!(FieldType::parse("uuid"), FieldType::String);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean.
    Bool,
    /// Free text. Unknown type tokens decode to this.
    #[default]
    String,
}

impl FieldType {
    /// Returns the header token for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }

    /// Parses a header token. Unknown tokens map to [`FieldType::String`].
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            _ => Self::String,
        }
    }

    /// Returns true for types compared numerically.
    #[inline]
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tokens() {
        for ty in [FieldType::Int, FieldType::Float, FieldType::Bool, FieldType::String] {
            assert_eq!(FieldType::parse(ty.as_str()), ty);
        }
    }

    #[test]
    fn test_unknown_token_defaults_to_string() {
        assert_eq!(FieldType::parse(""), FieldType::String);
        assert_eq!(FieldType::parse("INT"), FieldType::String);
        assert_eq!(FieldType::parse("decimal"), FieldType::String);
    }

    #[test]
    fn test_numeric() {
        assert!(FieldType::Int.is_numeric());
        assert!(FieldType::Float.is_numeric());
        assert!(!FieldType::Bool.is_numeric());
        assert!(!FieldType::String.is_numeric());
    }
}
