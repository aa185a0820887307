//! Serde marshalling between user types and field maps.
//!
//! Values go through `serde_json::Value`: a struct serializes to an object
//! whose members become cells. On the way back the table schema types each
//! cell, so a blank int or float cell reads as 0 and a blank bool as false.
//! Field names follow the serde attributes of the type.

use linedb_common::error::{LineDbError, LineDbResult};
use linedb_common::types::FieldType;
use linedb_query::record::{FieldMap, Record};
use linedb_query::schema::FieldDef;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// A type stored in its own table.
///
/// # Example
///
/// ```rust
/// use linedb::Table;
///
/// #[derive(serde::Serialize, serde::Deserialize, Default)]
/// struct Person {
///     time: i64,
///     name: String,
///     age: i64,
/// }
///
/// impl Table for Person {
///     fn table_name() -> &'static str {
///         "person"
///     }
/// }
/// ```
pub trait Table {
    /// Name of the backing table.
    fn table_name() -> &'static str;
}

/// Serializes `value` into a field map.
///
/// `null` members are left out; nested arrays and objects are stored as
/// JSON text.
pub fn to_field_map<T: Serialize + ?Sized>(value: &T) -> LineDbResult<FieldMap> {
    let Value::Object(members) = serde_json::to_value(value).map_err(LineDbError::marshal)? else {
        return Err(LineDbError::marshal("value must serialize to a struct or map"));
    };

    Ok(members
        .into_iter()
        .filter_map(|(name, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((name, text))
        })
        .collect())
}

/// Deserializes a record, typing each present cell by its declared type.
pub fn from_record<T: DeserializeOwned>(record: &Record) -> LineDbResult<T> {
    let mut members = Map::new();
    for field in record.schema().fields() {
        let Some(raw) = record.get(&field.name) else {
            continue;
        };
        members.insert(field.name.clone(), typed_value(field.field_type, raw));
    }
    serde_json::from_value(Value::Object(members)).map_err(LineDbError::marshal)
}

/// Derives table fields from the serialized form of `T::default()`.
///
/// Integers map to int, floats to float, booleans to bool and everything
/// else to string. The member named `primary_key` is skipped; the table
/// always provides it.
pub fn infer_fields<T: Serialize + Default>(primary_key: &str) -> LineDbResult<Vec<FieldDef>> {
    let Value::Object(members) = serde_json::to_value(T::default()).map_err(LineDbError::marshal)?
    else {
        return Err(LineDbError::marshal("table type must serialize to a struct"));
    };

    Ok(members
        .iter()
        .filter(|(name, _)| name.as_str() != primary_key)
        .map(|(name, value)| {
            let field_type = match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Int,
                Value::Number(_) => FieldType::Float,
                Value::Bool(_) => FieldType::Bool,
                _ => FieldType::String,
            };
            FieldDef::new(name.clone(), field_type)
        })
        .collect())
}

/// Writes `key` into the `primary_key` member of `value`.
pub(crate) fn set_key<T>(value: &mut T, primary_key: &str, key: i64) -> LineDbResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut json = serde_json::to_value(&*value).map_err(LineDbError::marshal)?;
    let Value::Object(members) = &mut json else {
        return Err(LineDbError::marshal("value must serialize to a struct or map"));
    };
    if !members.contains_key(primary_key) {
        return Ok(());
    }
    members.insert(primary_key.to_string(), Value::from(key));
    *value = serde_json::from_value(json).map_err(LineDbError::marshal)?;
    Ok(())
}

fn typed_value(field_type: FieldType, raw: &str) -> Value {
    let text = raw.trim();
    match field_type {
        FieldType::Int => match text.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => text
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map_or(Value::from(0), |f| Value::from(f as i64)),
        },
        FieldType::Float => Number::from_f64(text.parse::<f64>().unwrap_or(0.0))
            .map_or(Value::from(0.0), Value::Number),
        FieldType::Bool => Value::Bool(matches!(text, "true" | "1")),
        FieldType::String => Value::String(raw.to_string()),
    }
}
