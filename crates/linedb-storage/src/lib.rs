//! # linedb-storage
//!
//! Table file storage for linedb.
//!
//! A table is a single file of newline-terminated records. This crate
//! knows nothing about field names or types; it streams raw records and
//! guarantees that every mutation replaces the file atomically:
//! - Bounded-memory scans over arbitrarily large files
//! - Appends issued as a single write per batch
//! - Line breaks inside records escaped and restored transparently
//! - Rewrites through a temp file renamed over the original
//! - Exclusive per-file locking

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Table file access and locking
pub mod file;

pub use file::{LineStore, LockRegistry, Rewrite, RewriteStats, StoreOptions};
