//! Configuration for linedb.

mod database;

pub use database::{DatabaseConfig, DatabaseConfigBuilder};
