//! Database handle.
//!
//! The `Database` struct is the top-level entry point for linedb. It owns
//! the configuration, the per-table lock registry and the primary-key
//! generator; every table handle it hands out shares all three.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use linedb_common::config::DatabaseConfig;
use linedb_common::error::{LineDbError, LineDbResult};
use linedb_common::types::IdGenerator;
use linedb_query::schema::{FieldDef, Schema, SyncOutcome};
use linedb_query::{Query, TableHandle};
use linedb_storage::file::{LineStore, LockRegistry, StoreOptions};
use serde::Serialize;
use tracing::info;

use crate::marshal::{infer_fields, Table};

/// An open database: one directory holding one file per table.
///
/// Cloning is cheap and clones share locks and key issuance.
#[derive(Debug, Clone)]
pub struct Database {
    /// Configuration.
    config: Arc<DatabaseConfig>,
    /// One exclusive lock per table file.
    locks: Arc<LockRegistry>,
    /// Primary-key generator.
    ids: Arc<IdGenerator>,
    /// Options handed to every line store.
    options: StoreOptions,
}

impl Database {
    /// Opens a database, creating its data directory if needed.
    pub fn open(config: DatabaseConfig) -> LineDbResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        info!(data_dir = %config.data_dir.display(), "opened database");

        Ok(Self {
            options: StoreOptions::from_config(&config),
            config: Arc::new(config),
            locks: Arc::new(LockRegistry::new()),
            ids: Arc::new(IdGenerator::new()),
        })
    }

    /// Opens a database at `path` with default settings.
    pub fn open_path(path: impl AsRef<Path>) -> LineDbResult<Self> {
        Self::open(DatabaseConfig::with_data_dir(path.as_ref()))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the primary-key generator.
    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Returns the path of the file backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.config.table_path(table)
    }

    /// Returns a handle on `table`. The file need not exist yet.
    pub fn table(&self, table: &str) -> LineDbResult<TableHandle> {
        validate_table_name(table)?;
        let store = LineStore::open(
            &self.locks,
            table,
            self.table_path(table),
            self.options.clone(),
        );
        Ok(TableHandle::new(
            store,
            self.config.delimiter.clone(),
            Arc::clone(&self.ids),
        ))
    }

    /// Starts a query on `table`.
    pub fn query(&self, table: &str) -> LineDbResult<Query> {
        Ok(self.table(table)?.query())
    }

    /// Starts a query on the table of `T`.
    pub fn query_for<T: Table>(&self) -> LineDbResult<Query> {
        self.query(T::table_name())
    }

    /// Returns true if the file backing `table` exists.
    pub fn table_exists(&self, table: &str) -> bool {
        self.table(table).is_ok_and(|t| t.exists())
    }

    /// Reads the stored schema of `table`.
    pub fn schema(&self, table: &str) -> LineDbResult<Schema> {
        self.table(table)?.schema()
    }

    /// Deletes `table`. Returns false if it did not exist.
    pub fn drop_table(&self, table: &str) -> LineDbResult<bool> {
        self.table(table)?.drop_table()
    }

    // =========================================================================
    // Schema Sync
    // =========================================================================

    /// Creates `table` with `fields`, or migrates it to them.
    ///
    /// The primary key is the configured key column and always ordinal 0.
    pub fn sync_fields(&self, table: &str, fields: &[FieldDef]) -> LineDbResult<SyncOutcome> {
        self.table(table)?.sync(&self.config.primary_key, fields)
    }

    /// Creates or migrates the table of `T`, deriving its fields from the
    /// serialized form of `T::default()` in declaration order.
    pub fn sync<T>(&self) -> LineDbResult<SyncOutcome>
    where
        T: Table + Serialize + Default,
    {
        let fields = infer_fields::<T>(&self.config.primary_key)?;
        self.sync_fields(T::table_name(), &fields)
    }
}

/// Table names become file names; reject anything that could leave the
/// data directory.
fn validate_table_name(table: &str) -> LineDbResult<()> {
    let invalid = table.is_empty()
        || table.starts_with('.')
        || table.contains(['/', '\\', '\0']);
    if invalid {
        return Err(LineDbError::invalid_value(
            "table",
            format!("invalid table name '{table}'"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linedb_common::types::FieldType;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_data_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("db");
        let db = Database::open(DatabaseConfig::for_testing(&dir)).unwrap();
        assert!(dir.is_dir());
        assert_eq!(db.table_path("person"), dir.join("person.ldb"));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = DatabaseConfig::for_testing(tmp.path());
        config.delimiter.clear();
        assert!(Database::open(config).is_err());
    }

    #[test]
    fn test_table_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap();
        assert!(!db.table_exists("person"));

        let fields = [FieldDef::new("name", FieldType::String)];
        assert_eq!(db.sync_fields("person", &fields).unwrap(), SyncOutcome::Created);
        assert!(db.table_exists("person"));
        assert_eq!(db.schema("person").unwrap().len(), 2);

        assert!(db.drop_table("person").unwrap());
        assert!(!db.table_exists("person"));
        assert!(db.schema("person").unwrap_err().is_table_not_found());
    }

    #[test]
    fn test_invalid_table_names() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap();
        for name in ["", "../etc", "a/b", ".hidden"] {
            assert!(db.table(name).is_err(), "{name}");
        }
        assert!(!db.table_exists("../etc"));
    }

    #[test]
    fn test_custom_primary_key_and_extension() {
        let tmp = TempDir::new().unwrap();
        let config = DatabaseConfig::builder()
            .data_dir(tmp.path())
            .primary_key("id")
            .extension("tbl")
            .delimiter(b"|".to_vec())
            .build()
            .unwrap();
        let db = Database::open(config).unwrap();
        db.sync_fields("item", &[FieldDef::new("sku", FieldType::String)])
            .unwrap();

        assert!(tmp.path().join("item.tbl").is_file());
        let schema = db.schema("item").unwrap();
        assert_eq!(schema.primary_key().unwrap().name, "id");

        let raw = std::fs::read_to_string(tmp.path().join("item.tbl")).unwrap();
        assert!(raw.lines().any(|l| l == "id|sku"));
    }
}
