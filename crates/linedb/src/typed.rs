//! Typed query operations.
//!
//! [`TypedQuery`] runs a [`Query`] with serde types on both ends: inputs
//! are marshalled into field maps, result records are unmarshalled using
//! the table schema.

use linedb_common::error::{LineDbError, LineDbResult};
use linedb_query::Query;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::marshal::{from_record, set_key, to_field_map};

/// Serde-typed variants of the query operations.
pub trait TypedQuery {
    /// Finds matching records as `T`.
    fn find_as<T: DeserializeOwned>(&self) -> LineDbResult<Vec<T>>;

    /// Returns the first matching record as `T`.
    fn get_as<T: DeserializeOwned>(&self) -> LineDbResult<Option<T>>;

    /// Returns a page of `T` and the total match count from one pass.
    fn find_and_count_as<T: DeserializeOwned>(&self) -> LineDbResult<(Vec<T>, usize)>;

    /// Inserts every value, returning the assigned keys.
    fn insert_values<T: Serialize>(&self, values: &[T]) -> LineDbResult<Vec<i64>>;

    /// Inserts one value and writes the assigned key back into it.
    fn insert_one<T: Serialize + DeserializeOwned>(&self, value: &mut T) -> LineDbResult<i64>;

    /// Updates matching records with the non-null members of `patch`.
    fn update_with<T: Serialize + ?Sized>(&self, patch: &T) -> LineDbResult<usize>;
}

impl TypedQuery for Query {
    fn find_as<T: DeserializeOwned>(&self) -> LineDbResult<Vec<T>> {
        self.find()?.iter().map(from_record).collect()
    }

    fn get_as<T: DeserializeOwned>(&self) -> LineDbResult<Option<T>> {
        self.get()?.as_ref().map(from_record).transpose()
    }

    fn find_and_count_as<T: DeserializeOwned>(&self) -> LineDbResult<(Vec<T>, usize)> {
        let (records, total) = self.find_and_count()?;
        let values = records.iter().map(from_record).collect::<LineDbResult<_>>()?;
        Ok((values, total))
    }

    fn insert_values<T: Serialize>(&self, values: &[T]) -> LineDbResult<Vec<i64>> {
        let rows = values
            .iter()
            .map(to_field_map)
            .collect::<LineDbResult<Vec<_>>>()?;
        self.insert(&rows)
    }

    fn insert_one<T: Serialize + DeserializeOwned>(&self, value: &mut T) -> LineDbResult<i64> {
        let row = to_field_map(&*value)?;
        let key = self
            .insert(std::slice::from_ref(&row))?
            .into_iter()
            .next()
            .ok_or_else(|| LineDbError::marshal("insert returned no key"))?;

        let schema = self.table().schema()?;
        if let Some(primary_key) = schema.primary_key() {
            set_key(value, &primary_key.name, key)?;
        }
        Ok(key)
    }

    fn update_with<T: Serialize + ?Sized>(&self, patch: &T) -> LineDbResult<usize> {
        self.update(&to_field_map(patch)?)
    }
}
