//! Table schemas.
//!
//! A schema is the ordered field list stored in the table header. The
//! position of a field is its ordinal: cell `i` of every record belongs to
//! the field with ordinal `i`, and ordinal 0 is always the primary key.

mod header;
mod migration;

use std::collections::HashMap;
use std::fmt;

use linedb_common::constants::PRIMARY_KEY_REMARK;
use linedb_common::types::FieldType;
use serde::{Deserialize, Serialize};

pub use header::{decode_header, encode_header};
pub use migration::{plan_migration, Migration, SyncOutcome};

/// A field as stored in a table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Position of the field in every record.
    pub ordinal: usize,
    /// Field name, unique within the table.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Free-form remark.
    pub remark: String,
    /// Optional sort ordinal from header record 5.
    pub sort: Option<i64>,
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}: {}", self.name, self.ordinal, self.field_type)
    }
}

/// A desired field, as handed to schema sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Free-form remark.
    #[serde(default)]
    pub remark: String,
}

impl FieldDef {
    /// Creates a field definition without a remark.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            remark: String::new(),
        }
    }

    /// Sets the remark.
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }
}

/// Ordered field list of a table.
///
/// # Example
///
/// ```rust
/// use linedb_common::types::FieldType;
/// use linedb_query::schema::{FieldDef, Schema};
///
/// let schema = Schema::create("time", &[
///     FieldDef::new("name", FieldType::String),
///     FieldDef::new("age", FieldType::Int),
/// ]);
/// assert_eq!(schema.primary_key().map(|f| f.name.as_str()), Some("time"));
/// assert_eq!(schema.ordinal_of("age"), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Fields ordered by ordinal.
    fields: Vec<FieldDescriptor>,
    /// Name to ordinal.
    index: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema from descriptors, renumbering ordinals by position.
    ///
    /// If a name repeats, lookups resolve to its first occurrence.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        let mut fields = fields;
        let mut index = HashMap::with_capacity(fields.len());
        for (ordinal, field) in fields.iter_mut().enumerate() {
            field.ordinal = ordinal;
            index.entry(field.name.clone()).or_insert(ordinal);
        }
        Self { fields, index }
    }

    /// Builds the schema of a new table.
    ///
    /// The primary key takes ordinal 0 as an int column; the remaining
    /// definitions follow in order, skipping repeats and the key itself.
    pub fn create(primary_key: &str, defs: &[FieldDef]) -> Self {
        let mut fields = Vec::with_capacity(defs.len() + 1);
        fields.push(FieldDescriptor {
            ordinal: 0,
            name: primary_key.to_string(),
            field_type: FieldType::Int,
            remark: PRIMARY_KEY_REMARK.to_string(),
            sort: None,
        });
        for def in defs {
            if fields.iter().any(|f| f.name == def.name) {
                continue;
            }
            fields.push(FieldDescriptor {
                ordinal: fields.len(),
                name: def.name.clone(),
                field_type: def.field_type,
                remark: def.remark.clone(),
                sort: None,
            });
        }
        Self::new(fields)
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields ordered by ordinal.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Looks a field up by ordinal.
    pub fn get(&self, ordinal: usize) -> Option<&FieldDescriptor> {
        self.fields.get(ordinal)
    }

    /// Returns the ordinal of `name`.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns true if the schema has a field called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The primary-key field (ordinal 0).
    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.fields.first()
    }

    /// Field names in ordinal order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.field_type)?;
        }
        write!(f, ")")
    }
}
