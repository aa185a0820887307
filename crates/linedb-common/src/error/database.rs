//! Database error types.
//!
//! Provides the error type shared by every linedb component.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Invalid argument or value provided.
    InvalidArgument = 0x0003,
    /// Invalid configuration.
    InvalidConfig = 0x0006,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,
    /// Backing table file is absent.
    TableNotFound = 0x0101,

    // Format errors (0x0200 - 0x02FF)
    /// Table header violates the fixed header contract.
    Format = 0x0200,
    /// Value conversion through the marshalling layer failed.
    Marshal = 0x0201,

    // Query errors (0x0600 - 0x06FF)
    /// Malformed filter expression or argument mismatch.
    Build = 0x0600,
    /// Unguarded mutation (no predicate and no limit).
    Guard = 0x0601,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Format",
            0x06 => "Query",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for linedb.
///
/// # Example
///
/// ```rust
/// use linedb_common::error::{LineDbError, LineDbResult};
///
/// fn open(table: &str) -> LineDbResult<()> {
///     Err(LineDbError::TableNotFound {
///         table: table.to_string(),
///         path: format!("./data/{table}.ldb").into(),
///     })
/// }
///
/// assert!(open("person").unwrap_err().is_table_not_found());
/// ```
#[derive(Debug, Error)]
pub enum LineDbError {
    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The backing file of a table does not exist.
    #[error("table '{table}' not found at {}", path.display())]
    TableNotFound {
        /// The missing table.
        table: String,
        /// Path that was probed.
        path: PathBuf,
    },

    // ==========================================================================
    // Format Errors
    // ==========================================================================
    /// The table header does not follow the 12-line start/end contract.
    #[error("invalid table file {}: {reason}", path.display())]
    Format {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The marshalling layer could not convert a value.
    #[error("marshal error: {message}")]
    Marshal {
        /// Error message.
        message: String,
    },

    /// A cell value cannot be stored as-is.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue {
        /// Field that received the value.
        field: String,
        /// Reason for rejection.
        reason: String,
    },

    // ==========================================================================
    // Query Errors
    // ==========================================================================
    /// A filter expression could not be compiled.
    #[error("invalid filter '{expr}': {reason}")]
    Build {
        /// The clause or expression that failed.
        expr: String,
        /// Reason for failure.
        reason: String,
    },

    /// A mutation was issued without any predicate or limit.
    #[error("{operation} requires a filter or a limit")]
    Guard {
        /// The refused operation.
        operation: &'static str,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl LineDbError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::Io,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::Format { .. } => ErrorCode::Format,
            Self::Marshal { .. } => ErrorCode::Marshal,
            Self::InvalidValue { .. } => ErrorCode::InvalidArgument,
            Self::Build { .. } => ErrorCode::Build,
            Self::Guard { .. } => ErrorCode::Guard,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
        }
    }

    /// Returns true if the backing table file is absent.
    #[must_use]
    pub const fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound { .. })
    }

    /// Returns true if this is a header format violation.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns true if a mutation was refused for lack of a filter.
    #[must_use]
    pub const fn is_guard(&self) -> bool {
        matches!(self, Self::Guard { .. })
    }

    /// Creates a format error.
    #[must_use]
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a filter build error.
    #[must_use]
    pub fn build(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Build {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    /// Creates a marshal error.
    #[must_use]
    pub fn marshal(message: impl fmt::Display) -> Self {
        Self::Marshal {
            message: message.to_string(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
