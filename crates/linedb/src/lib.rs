//! # linedb
//!
//! An embeddable record store that keeps each table in one flat text file.
//!
//! A table file starts with a 12-line header holding the schema, followed
//! by one line per record with cells joined by a configurable delimiter.
//! Every mutation rewrites the file through a temp file and an atomic
//! rename, so readers never observe a half-written table.
//!
//! ## Example
//!
//! ```rust,no_run
//! use linedb::{Database, DatabaseConfig, Table, TypedQuery};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Person {
//!     time: i64,
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Table for Person {
//!     fn table_name() -> &'static str {
//!         "person"
//!     }
//! }
//!
//! fn main() -> linedb::LineDbResult<()> {
//!     let db = Database::open(DatabaseConfig::with_data_dir("./data"))?;
//!     db.sync::<Person>()?;
//!
//!     let mut ann = Person { name: "Ann".into(), age: 30, ..Default::default() };
//!     db.query_for::<Person>()?.insert_one(&mut ann)?;
//!
//!     let adults: Vec<Person> = db
//!         .query_for::<Person>()?
//!         .filter("age >= ?", &[&18])?
//!         .asc("name")
//!         .find_as()?;
//!     println!("{adults:?}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod marshal;
pub mod typed;

pub use database::Database;
pub use marshal::Table;
pub use typed::TypedQuery;

pub use linedb_common::config::DatabaseConfig;
pub use linedb_common::error::{ErrorCode, LineDbError, LineDbResult};
pub use linedb_common::types::FieldType;
pub use linedb_query::record::{FieldMap, Record};
pub use linedb_query::schema::{FieldDef, Schema, SyncOutcome};
pub use linedb_query::{Query, TableHandle};
