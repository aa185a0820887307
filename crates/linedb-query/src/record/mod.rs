//! Records and the cell codec.
//!
//! A record line is its cells joined by the cell delimiter. Cell `i` belongs
//! to the field with ordinal `i`; cells past the end of the schema are
//! ignored and schema fields without a cell are absent.

mod value;

use std::collections::BTreeMap;
use std::sync::Arc;

use linedb_common::error::{LineDbError, LineDbResult};

use crate::schema::Schema;

pub use value::{compare, FieldValue, Operator};

/// Textual field map exchanged with the marshalling layer.
pub type FieldMap = BTreeMap<String, String>;

/// Splits a line into its cells.
///
/// An empty line is one empty cell.
pub fn split_cells<'a>(line: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut cells = Vec::new();
    let mut rest = line;
    if !delimiter.is_empty() {
        while let Some(at) = rest
            .windows(delimiter.len())
            .position(|w| w == delimiter)
        {
            cells.push(&rest[..at]);
            rest = &rest[at + delimiter.len()..];
        }
    }
    cells.push(rest);
    cells
}

/// Joins cells with the delimiter.
pub fn join_cells<'a>(cells: impl IntoIterator<Item = &'a [u8]>, delimiter: &[u8]) -> Vec<u8> {
    let mut line = Vec::new();
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            line.extend_from_slice(delimiter);
        }
        line.extend_from_slice(cell);
    }
    line
}

/// One decoded row, laid out by its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    /// One slot per schema field; `None` when the line had no such cell or
    /// the field was projected away.
    cells: Vec<Option<String>>,
}

impl Record {
    /// Creates a record with every field absent.
    pub fn empty(schema: Arc<Schema>) -> Self {
        let cells = vec![None; schema.len()];
        Self { schema, cells }
    }

    /// Decodes a raw line.
    pub fn decode(schema: Arc<Schema>, raw: &[u8], delimiter: &[u8]) -> Self {
        let mut cells: Vec<Option<String>> = split_cells(raw, delimiter)
            .into_iter()
            .take(schema.len())
            .map(|cell| Some(String::from_utf8_lossy(cell).into_owned()))
            .collect();
        cells.resize(schema.len(), None);
        Self { schema, cells }
    }

    /// Builds a record from a field map. Names the schema lacks are ignored.
    pub fn from_map(schema: Arc<Schema>, map: &FieldMap) -> Self {
        let mut record = Self::empty(schema);
        for (name, value) in map {
            record.set(name, value.clone());
        }
        record
    }

    /// Encodes the record into a line; absent fields render empty.
    ///
    /// Fails if the line would not split back into the same cells, which
    /// happens when a value contains the delimiter or a delimiter prefix
    /// lines up with the delimiter that follows it.
    pub fn encode(&self, delimiter: &[u8]) -> LineDbResult<Vec<u8>> {
        let cells = || self.cells.iter().map(|c| c.as_deref().unwrap_or_default().as_bytes());
        let line = join_cells(cells(), delimiter);

        let split = split_cells(&line, delimiter);
        let misplaced = self
            .schema
            .fields()
            .iter()
            .zip(cells())
            .enumerate()
            .find(|(i, (_, cell))| split.get(*i) != Some(cell));
        if let Some((_, (field, _))) = misplaced {
            return Err(LineDbError::invalid_value(
                &field.name,
                "value does not survive the cell delimiter",
            ));
        }
        Ok(line)
    }

    /// The schema this record is laid out by.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Raw text of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        let ordinal = self.schema.ordinal_of(name)?;
        self.cells[ordinal].as_deref()
    }

    /// Typed view of `name`, if present.
    pub fn value(&self, name: &str) -> Option<FieldValue<'_>> {
        let ordinal = self.schema.ordinal_of(name)?;
        let raw = self.cells[ordinal].as_deref()?;
        Some(FieldValue::new(&self.schema.fields()[ordinal], raw))
    }

    /// Sets `name`. Returns false if the schema has no such field.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.schema.ordinal_of(name) {
            Some(ordinal) => {
                self.cells[ordinal] = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// The primary key, if the key cell holds an integer.
    pub fn key(&self) -> Option<i64> {
        self.cells.first()?.as_deref()?.trim().parse().ok()
    }

    /// Sets the primary key.
    pub fn set_key(&mut self, key: i64) {
        if let Some(slot) = self.cells.first_mut() {
            *slot = Some(key.to_string());
        }
    }

    /// Keeps only the named fields; the rest become absent.
    pub fn project(&mut self, names: &[String]) {
        for (field, cell) in self.schema.fields().iter().zip(self.cells.iter_mut()) {
            if !names.iter().any(|n| *n == field.name) {
                *cell = None;
            }
        }
    }

    /// Present fields as a field map.
    pub fn to_field_map(&self) -> FieldMap {
        self.schema
            .fields()
            .iter()
            .zip(&self.cells)
            .filter_map(|(f, c)| c.as_ref().map(|c| (f.name.clone(), c.clone())))
            .collect()
    }
}
