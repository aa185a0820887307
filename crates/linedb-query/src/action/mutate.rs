//! Write path: insert, update and delete.
//!
//! Inserts append one batch under the table lock. Updates and deletes stream
//! a full rewrite; records that do not match pass through byte-identical.

use std::sync::Arc;

use linedb_common::error::{LineDbError, LineDbResult};
use linedb_storage::file::Rewrite;
use tracing::debug;

use super::query::Query;
use crate::record::{FieldMap, Record};

impl Query {
    /// Appends `rows`, assigning each a fresh primary key.
    ///
    /// Any key value present in a row is replaced. Names the schema lacks
    /// are ignored. Returns the keys in row order; nothing is written if
    /// any row fails to encode.
    pub fn insert(&self, rows: &[FieldMap]) -> LineDbResult<Vec<i64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let delimiter = self.table.delimiter();
        let mut keys = Vec::with_capacity(rows.len());

        self.table.store().append(
            |header| Ok(Arc::new(self.table.decode_schema(header)?)),
            |schema| {
                rows.iter()
                    .map(|row| {
                        let mut record = Record::from_map(Arc::clone(schema), row);
                        let key = self.table.ids().next_id();
                        record.set_key(key);
                        keys.push(key);
                        record.encode(delimiter)
                    })
                    .collect()
            },
        )?;

        debug!(table = self.table.name(), inserted = keys.len(), "inserted records");
        Ok(keys)
    }

    /// Merges `patch` into every matching record inside the page window.
    ///
    /// The primary key is never overwritten, even if `patch` names it.
    /// Returns the number of records changed. Without a predicate or a page
    /// window this is a guard error and the table is left untouched.
    pub fn update(&self, patch: &FieldMap) -> LineDbResult<usize> {
        self.guard("update")?;
        let delimiter = self.table.delimiter();
        let mut taken = 0usize;
        let mut affected = 0usize;

        let stats = self.table.store().update(
            |header| Ok(Arc::new(self.table.decode_schema(header)?)),
            |schema, index, raw| {
                let mut record = Record::decode(Arc::clone(schema), raw, delimiter);
                if !self.matches(&record) || !self.take(index, &mut taken) {
                    return Ok(Rewrite::Keep);
                }
                let key = schema.primary_key().map(|f| f.name.as_str());
                for (name, value) in patch {
                    if Some(name.as_str()) != key {
                        record.set(name, value.clone());
                    }
                }
                affected += 1;
                Ok(Rewrite::Replace(record.encode(delimiter)?))
            },
        )?;

        debug!(
            table = self.table.name(),
            read = stats.read,
            affected,
            "updated records"
        );
        Ok(affected)
    }

    /// Deletes every matching record inside the page window.
    ///
    /// Returns the number of records removed. Without a predicate or a page
    /// window this is a guard error and the table is left untouched.
    pub fn delete(&self) -> LineDbResult<usize> {
        self.guard("delete")?;
        let delimiter = self.table.delimiter();
        let mut taken = 0usize;

        let stats = self.table.store().update(
            |header| Ok(Arc::new(self.table.decode_schema(header)?)),
            |schema, index, raw| {
                let record = Record::decode(Arc::clone(schema), raw, delimiter);
                Ok(if self.matches(&record) && self.take(index, &mut taken) {
                    Rewrite::Drop
                } else {
                    Rewrite::Keep
                })
            },
        )?;

        debug!(
            table = self.table.name(),
            read = stats.read,
            deleted = stats.changed,
            "deleted records"
        );
        Ok(stats.changed)
    }

    fn guard(&self, operation: &'static str) -> LineDbResult<()> {
        if self.predicates.is_empty() && self.pagination.is_none() {
            return Err(LineDbError::Guard { operation });
        }
        Ok(())
    }

    /// Takes the match at stream position `index` if the window has room.
    fn take(&self, index: usize, taken: &mut usize) -> bool {
        let Some(window) = self.pagination else {
            return true;
        };
        if window.skips(index) || window.is_full(*taken) {
            return false;
        }
        *taken += 1;
        true
    }
}
