//! # linedb-query
//!
//! Schema codec, record codec, and the query layer for linedb.
//!
//! This crate turns the raw records of a
//! [`LineStore`](linedb_storage::file::LineStore) into typed rows:
//! - **Schema**: the 12-record header codec and schema migration planning
//! - **Record**: cell codec and typed field comparison
//! - **Action**: the filter compiler and the fluent query builder
//! - **Table**: a store bound to its delimiter and key generator
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use linedb_common::types::{FieldType, IdGenerator};
//! use linedb_common::LineDbResult;
//! use linedb_query::record::FieldMap;
//! use linedb_query::schema::FieldDef;
//! use linedb_query::TableHandle;
//! use linedb_storage::file::{LineStore, LockRegistry, StoreOptions};
//!
//! fn example() -> LineDbResult<()> {
//!     let registry = LockRegistry::new();
//!     let store = LineStore::open(&registry, "person", "data/person.ldb", StoreOptions::new());
//!     let table = TableHandle::new(store, &b" \xff "[..], Arc::new(IdGenerator::new()));
//!
//!     table.sync("time", &[
//!         FieldDef::new("name", FieldType::String),
//!         FieldDef::new("age", FieldType::Int),
//!     ])?;
//!
//!     let row = FieldMap::from([
//!         ("name".to_string(), "Ann".to_string()),
//!         ("age".to_string(), "30".to_string()),
//!     ]);
//!     table.query().insert(&[row])?;
//!
//!     let adults = table.query().filter("age >= ?", &[&18])?.count()?;
//!     assert_eq!(adults, 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod record;
pub mod schema;
pub mod table;

pub use action::{Predicate, Query};
pub use record::{FieldMap, FieldValue, Operator, Record};
pub use schema::{FieldDef, FieldDescriptor, Schema, SyncOutcome};
pub use table::TableHandle;
