//! # linedb-common
//!
//! Common types, errors, and configuration for linedb.
//!
//! This crate provides the foundational pieces used across all linedb
//! components:
//!
//! - **Types**: declared field types and the primary-key generator
//! - **Errors**: unified error handling with `LineDbError`
//! - **Config**: database configuration (TOML-loadable)
//! - **Constants**: the table file layout
//!
//! ## Example
//!
//! ```rust
//! use linedb_common::config::DatabaseConfig;
//! use linedb_common::error::LineDbResult;
//!
//! fn example() -> LineDbResult<()> {
//!     let config = DatabaseConfig::builder().data_dir("/tmp/linedb").build()?;
//!     assert_eq!(config.primary_key, "time");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::DatabaseConfig;
pub use constants::*;
pub use error::{ErrorCode, LineDbError, LineDbResult};
pub use types::{FieldType, IdGenerator};
