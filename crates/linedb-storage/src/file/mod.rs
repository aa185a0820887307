//! Table file I/O for linedb.
//!
//! This module provides line-framed access to table files:
//!
//! - **Scanning**: streaming record reads with bounded memory
//! - **Appending**: one write per batch to the end of a table
//! - **Escaping**: line breaks inside records survive the line framing
//! - **Rewriting**: temp-file-and-rename passes that never leave a table
//!   half written
//! - **Locking**: one exclusive lock per table file, shared through a
//!   [`LockRegistry`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               LineStore                 │
//! │  (scan, append, rewrite, create, ...)   │
//! └─────────────────────────────────────────┘
//!        │              │             │
//!        ▼              ▼             ▼
//! ┌─────────────┐ ┌────────────┐ ┌────────────┐
//! │RecordScanner│ │RecordWriter│ │LockRegistry│
//! └─────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use linedb_storage::file::{LineStore, LockRegistry, Rewrite, StoreOptions};
//!
//! fn example() -> linedb_common::LineDbResult<()> {
//!     let registry = LockRegistry::new();
//!     let store = LineStore::open(&registry, "users", "data/users.ldb", StoreOptions::new());
//!
//!     // Drop every empty record.
//!     let stats = store.update(
//!         |_header| Ok(()),
//!         |_, _, record| Ok(if record.is_empty() { Rewrite::Drop } else { Rewrite::Keep }),
//!     )?;
//!     println!("removed {}", stats.changed);
//!     Ok(())
//! }
//! ```

mod escape;
mod lock;
mod options;
mod scanner;
mod store;

pub use lock::{LockRegistry, TableLock};
pub use options::StoreOptions;
pub use scanner::RecordScanner;
pub use store::{HeaderLines, LineStore, Rewrite, RewriteStats};
