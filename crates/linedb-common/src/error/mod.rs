//! Error handling for linedb.
//!
//! This module provides a unified error type and result alias used
//! across all linedb components.

mod database;

pub use database::{ErrorCode, LineDbError};

/// Result type alias for linedb operations.
pub type LineDbResult<T> = std::result::Result<T, LineDbError>;
