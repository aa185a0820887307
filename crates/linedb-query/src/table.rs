//! Table handles.
//!
//! A [`TableHandle`] binds a [`LineStore`] to the cell delimiter and the key
//! generator of its database. Queries and schema sync run through it.

use std::sync::Arc;

use bytes::Bytes;
use linedb_common::error::LineDbResult;
use linedb_common::types::IdGenerator;
use linedb_storage::file::{LineStore, Rewrite};
use tracing::{debug, info};

use crate::action::Query;
use crate::schema::{decode_header, encode_header, plan_migration, FieldDef, Schema, SyncOutcome};

/// One table of a database.
#[derive(Debug, Clone)]
pub struct TableHandle {
    store: LineStore,
    delimiter: Bytes,
    ids: Arc<IdGenerator>,
}

impl TableHandle {
    /// Creates a handle.
    pub fn new(store: LineStore, delimiter: impl Into<Bytes>, ids: Arc<IdGenerator>) -> Self {
        Self {
            store,
            delimiter: delimiter.into(),
            ids,
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        self.store.table()
    }

    /// Underlying line store.
    pub fn store(&self) -> &LineStore {
        &self.store
    }

    /// Cell delimiter.
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// Key generator.
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Returns true if the table file exists.
    pub fn exists(&self) -> bool {
        self.store.exists()
    }

    /// Starts a query over this table.
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    /// Reads the stored schema.
    pub fn schema(&self) -> LineDbResult<Schema> {
        let header = self.store.read_header()?;
        self.decode_schema(&header)
    }

    pub(crate) fn decode_schema(&self, header: &[Vec<u8>]) -> LineDbResult<Schema> {
        decode_header(self.store.path(), header, &self.delimiter)
    }

    /// Brings the table in line with `fields`.
    ///
    /// Creates the file if it is absent. Otherwise plans a migration against
    /// the stored header and, unless it is a no-op, rewrites the table:
    /// declared columns the table lacks are appended blank, undeclared
    /// columns are dropped, and the key column is always kept.
    pub fn sync(&self, primary_key: &str, fields: &[FieldDef]) -> LineDbResult<SyncOutcome> {
        if !self.store.exists() {
            let schema = Schema::create(primary_key, fields);
            if self.store.create(&encode_header(&schema, &self.delimiter))? {
                info!(table = self.name(), schema = %schema, "created table");
                return Ok(SyncOutcome::Created);
            }
        }

        if plan_migration(&self.schema()?, fields).is_noop() {
            debug!(table = self.name(), "schema unchanged");
            return Ok(SyncOutcome::Unchanged);
        }

        // Plan again under the table lock; the header may have changed.
        let mut outcome = SyncOutcome::Unchanged;
        let delimiter = self.delimiter.clone();
        self.store.rewrite(
            |header| {
                let migration = plan_migration(&self.decode_schema(&header)?, fields);
                outcome = migration.outcome();
                let header = encode_header(&migration.schema, &delimiter);
                Ok((migration, header))
            },
            |migration, _, raw| {
                Ok(if migration.moves_cells() {
                    Rewrite::Replace(migration.remap(raw, &delimiter))
                } else {
                    Rewrite::Keep
                })
            },
        )?;

        if let SyncOutcome::Migrated { added, dropped } = &outcome {
            info!(table = self.name(), ?added, ?dropped, "migrated table schema");
        }
        Ok(outcome)
    }

    /// Deletes the table file. Returns false if it did not exist.
    pub fn drop_table(&self) -> LineDbResult<bool> {
        let removed = self.store.remove()?;
        if removed {
            info!(table = self.name(), "dropped table");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linedb_common::constants::DEFAULT_DELIMITER;
    use linedb_common::types::FieldType;
    use linedb_storage::file::{LockRegistry, StoreOptions};
    use tempfile::TempDir;

    fn handle(tmp: &TempDir) -> TableHandle {
        let registry = LockRegistry::new();
        let store = LineStore::open(
            &registry,
            "person",
            tmp.path().join("person.ldb"),
            StoreOptions::new(),
        );
        TableHandle::new(store, DEFAULT_DELIMITER.to_vec(), Arc::new(IdGenerator::new()))
    }

    fn person() -> Vec<FieldDef> {
        vec![
            FieldDef::new("name", FieldType::String),
            FieldDef::new("age", FieldType::Int),
        ]
    }

    #[test]
    fn test_sync_creates_then_unchanged() {
        let tmp = TempDir::new().unwrap();
        let table = handle(&tmp);
        assert!(!table.exists());

        assert_eq!(table.sync("time", &person()).unwrap(), SyncOutcome::Created);
        assert_eq!(table.sync("time", &person()).unwrap(), SyncOutcome::Unchanged);

        let schema = table.schema().unwrap();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["time", "name", "age"]);
    }

    #[test]
    fn test_sync_migrates_records() {
        let tmp = TempDir::new().unwrap();
        let table = handle(&tmp);
        table.sync("time", &person()).unwrap();

        let mut row = crate::record::FieldMap::new();
        row.insert("name".into(), "Ann".into());
        row.insert("age".into(), "30".into());
        let keys = table.query().insert(&[row]).unwrap();

        let outcome = table
            .sync(
                "time",
                &[
                    FieldDef::new("name", FieldType::String),
                    FieldDef::new("city", FieldType::String),
                ],
            )
            .unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Migrated {
                added: vec!["city".to_string()],
                dropped: vec!["age".to_string()],
            }
        );

        let rows = table.query().find().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key(), Some(keys[0]));
        assert_eq!(rows[0].get("name"), Some("Ann"));
        assert_eq!(rows[0].get("city"), Some(""));
        assert_eq!(rows[0].get("age"), None);
    }

    #[test]
    fn test_drop_table() {
        let tmp = TempDir::new().unwrap();
        let table = handle(&tmp);
        table.sync("time", &person()).unwrap();
        assert!(table.drop_table().unwrap());
        assert!(!table.drop_table().unwrap());
        assert!(table.schema().unwrap_err().is_table_not_found());
    }
}
