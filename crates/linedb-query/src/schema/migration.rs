//! Schema migration planning.
//!
//! Reconciles the schema stored in a table header with the fields a caller
//! declares. Columns missing from the header are appended, columns no longer
//! declared are dropped, and the primary key always survives at ordinal 0.

use std::collections::HashMap;

use super::{FieldDef, FieldDescriptor, Schema};
use crate::record::{join_cells, split_cells};

/// Result of a schema sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The table file did not exist and was created.
    Created,
    /// The stored schema already matched.
    Unchanged,
    /// The table was rewritten to the declared schema.
    Migrated {
        /// Columns appended with blank cells.
        added: Vec<String>,
        /// Columns removed from the header and every record.
        dropped: Vec<String>,
    },
}

/// A planned change from one schema to another.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Schema after the migration.
    pub schema: Schema,
    /// For each new ordinal, the old ordinal whose cell moves there.
    mapping: Vec<Option<usize>>,
    /// Names of appended columns.
    pub added: Vec<String>,
    /// Names of removed columns.
    pub dropped: Vec<String>,
    /// Whether a retained column changed its type or remark.
    retyped: bool,
}

impl Migration {
    /// Returns true if the stored schema already matches.
    pub fn is_noop(&self) -> bool {
        !self.retyped && !self.moves_cells()
    }

    /// Returns true if records must be remapped, not just the header.
    pub fn moves_cells(&self) -> bool {
        !self.added.is_empty() || !self.dropped.is_empty()
    }

    /// Rearranges the cells of an old record into the new layout.
    ///
    /// New columns get blank cells; cells of dropped columns disappear.
    pub fn remap(&self, record: &[u8], delimiter: &[u8]) -> Vec<u8> {
        let cells = split_cells(record, delimiter);
        join_cells(
            self.mapping
                .iter()
                .map(|slot| slot.and_then(|old| cells.get(old).copied()).unwrap_or(&[])),
            delimiter,
        )
    }

    /// Outcome reported to the caller once this migration is applied.
    pub fn outcome(&self) -> SyncOutcome {
        if self.is_noop() {
            SyncOutcome::Unchanged
        } else {
            SyncOutcome::Migrated {
                added: self.added.clone(),
                dropped: self.dropped.clone(),
            }
        }
    }
}

/// Plans the migration of `existing` to the declared fields.
///
/// Retained columns keep their relative order and take the declared type
/// and remark; declared columns the table lacks are appended in declaration
/// order. The key column (ordinal 0 of `existing`) is kept whether or not
/// it is declared; a declaration named like it is ignored.
pub fn plan_migration(existing: &Schema, desired: &[FieldDef]) -> Migration {
    let declared: HashMap<&str, &FieldDef> =
        desired.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut fields = Vec::with_capacity(existing.len() + desired.len());
    let mut mapping = Vec::with_capacity(fields.capacity());
    let mut dropped = Vec::new();
    let mut retyped = false;

    let mut existing_fields = existing.fields().iter();
    if let Some(key) = existing_fields.next() {
        fields.push(key.clone());
        mapping.push(Some(key.ordinal));
    }

    for field in existing_fields {
        match declared.get(field.name.as_str()) {
            Some(def) => {
                retyped |= def.field_type != field.field_type || def.remark != field.remark;
                fields.push(FieldDescriptor {
                    field_type: def.field_type,
                    remark: def.remark.clone(),
                    ..field.clone()
                });
                mapping.push(Some(field.ordinal));
            }
            None => dropped.push(field.name.clone()),
        }
    }

    let mut added = Vec::new();
    for def in desired {
        if existing.contains(&def.name) || added.contains(&def.name) {
            continue;
        }
        fields.push(FieldDescriptor {
            ordinal: 0,
            name: def.name.clone(),
            field_type: def.field_type,
            remark: def.remark.clone(),
            sort: None,
        });
        mapping.push(None);
        added.push(def.name.clone());
    }

    Migration {
        schema: Schema::new(fields),
        mapping,
        added,
        dropped,
        retyped,
    }
}
