//! Query builder and read path.
//!
//! A [`Query`] collects predicates, a projection, an optional page window
//! and sort keys, then runs as one pass over the table. Without sort keys
//! the pass stops as soon as the window is full; with sort keys every match
//! inside the window's offset is buffered, sorted, then truncated.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use linedb_common::error::LineDbResult;
use tracing::debug;

use super::predicate::{compile, Predicate};
use crate::record::Record;
use crate::table::TableHandle;

/// Page window over the table stream.
///
/// Records at stream position below `offset` are skipped whether or not
/// they match; the first `size` matches after that form the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Maximum number of records returned; 0 returns nothing.
    pub size: usize,
    /// Stream position of the first record considered.
    pub offset: usize,
}

impl Pagination {
    /// Returns true if the record at stream position `index` lies before
    /// the window.
    #[inline]
    pub fn skips(&self, index: usize) -> bool {
        index < self.offset
    }

    /// Returns true if `taken` matches already fill the page.
    #[inline]
    pub fn is_full(&self, taken: usize) -> bool {
        taken >= self.size
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field sorted on.
    pub field: String,
    /// Direction.
    pub direction: Direction,
}

/// Fluent query over one table.
///
/// # Example
///
/// ```rust,no_run
/// # fn example(table: linedb_query::TableHandle) -> linedb_common::LineDbResult<()> {
/// let adults = table
///     .query()
///     .filter("age >= ? and name like ?", &[&18, &"A"])?
///     .cols("name,age")
///     .desc("age")
///     .limit_offset(10, 20)
///     .find()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    pub(super) table: TableHandle,
    pub(super) predicates: Vec<Predicate>,
    /// Projected field names; empty keeps every field.
    pub(super) projection: Vec<String>,
    pub(super) pagination: Option<Pagination>,
    pub(super) order: Vec<OrderBy>,
}

impl Query {
    /// Creates an unfiltered query over `table`.
    pub fn new(table: TableHandle) -> Self {
        Self {
            table,
            predicates: Vec::new(),
            projection: Vec::new(),
            pagination: None,
            order: Vec::new(),
        }
    }

    // =========================================================================
    // Builder
    // =========================================================================

    /// Adds the clauses of a filter expression, filling `?` placeholders
    /// from `args` in order.
    ///
    /// Clauses are AND-ed with every predicate already present.
    pub fn filter(mut self, expr: &str, args: &[&dyn fmt::Display]) -> LineDbResult<Self> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.predicates.extend(compile(expr, &args)?);
        Ok(self)
    }

    /// Alias of [`Query::filter`].
    pub fn and(self, expr: &str, args: &[&dyn fmt::Display]) -> LineDbResult<Self> {
        self.filter(expr, args)
    }

    /// Adds an already compiled predicate.
    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restricts output to the comma-separated field names.
    ///
    /// Calls accumulate. A call naming no field changes nothing.
    #[must_use]
    pub fn cols(mut self, names: &str) -> Self {
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !self.projection.iter().any(|p| p == name) {
                self.projection.push(name.to_string());
            }
        }
        self
    }

    /// Returns at most `size` matches.
    #[must_use]
    pub fn limit(self, size: usize) -> Self {
        self.limit_offset(size, 0)
    }

    /// Skips the first `offset` records of the table, then returns at most
    /// `size` matches.
    #[must_use]
    pub fn limit_offset(mut self, size: usize, offset: usize) -> Self {
        self.pagination = Some(Pagination { size, offset });
        self
    }

    /// Sorts ascending on `field`, after any earlier sort keys.
    #[must_use]
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Asc)
    }

    /// Sorts descending on `field`, after any earlier sort keys.
    #[must_use]
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Desc)
    }

    fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// The table queried.
    pub fn table(&self) -> &TableHandle {
        &self.table
    }

    /// Compiled predicates.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Page window, if any.
    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Returns true if `record` satisfies every predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Returns the matching records inside the page window.
    pub fn find(&self) -> LineDbResult<Vec<Record>> {
        let (rows, _) = self.select(self.pagination, false)?;
        Ok(rows)
    }

    /// Returns the first record inside the page window.
    pub fn get(&self) -> LineDbResult<Option<Record>> {
        let window = Pagination {
            size: 1,
            offset: self.pagination.map_or(0, |p| p.offset),
        };
        let (rows, _) = self.select(Some(window), false)?;
        Ok(rows.into_iter().next())
    }

    /// Counts every matching record, ignoring the page window.
    pub fn count(&self) -> LineDbResult<usize> {
        let delimiter = self.table.delimiter();
        let mut matched = 0usize;
        self.table.store().scan(
            |header| Ok(Arc::new(self.table.decode_schema(header)?)),
            |schema, _, raw| {
                if self.matches(&Record::decode(Arc::clone(schema), raw, delimiter)) {
                    matched += 1;
                }
                Ok(true)
            },
        )?;
        debug!(table = self.table.name(), matched, "counted records");
        Ok(matched)
    }

    /// Returns the page of matches together with the total match count,
    /// from one pass.
    pub fn find_and_count(&self) -> LineDbResult<(Vec<Record>, usize)> {
        self.select(self.pagination, true)
    }

    /// Runs the read pass. With `count_all` the scan never stops early, so
    /// the returned count covers the whole table.
    fn select(
        &self,
        window: Option<Pagination>,
        count_all: bool,
    ) -> LineDbResult<(Vec<Record>, usize)> {
        let delimiter = self.table.delimiter();
        let buffer_all = !self.order.is_empty();
        let mut rows = Vec::new();
        let mut matched = 0usize;

        self.table.store().scan(
            |header| Ok(Arc::new(self.table.decode_schema(header)?)),
            |schema, index, raw| {
                let record = Record::decode(Arc::clone(schema), raw, delimiter);
                if !self.matches(&record) {
                    return Ok(true);
                }
                matched += 1;

                match window {
                    Some(window) if window.skips(index) => {}
                    Some(window) if !buffer_all => {
                        if !window.is_full(rows.len()) {
                            rows.push(record);
                        }
                        if !count_all && window.is_full(rows.len()) {
                            return Ok(false);
                        }
                    }
                    _ => rows.push(record),
                }
                Ok(true)
            },
        )?;

        if buffer_all {
            rows.sort_by(|a, b| self.compare_records(a, b));
            if let Some(window) = window {
                rows.truncate(window.size);
            }
        }
        if !self.projection.is_empty() {
            for row in &mut rows {
                row.project(&self.projection);
            }
        }

        debug!(
            table = self.table.name(),
            matched,
            returned = rows.len(),
            "selected records"
        );
        Ok((rows, matched))
    }

    /// Multi-key comparison; absent values sort first.
    fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.order {
            let ordering = match (a.value(&key.field), b.value(&key.field)) {
                (Some(x), Some(y)) => x.cmp_value(&y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = match key.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldMap;
    use crate::schema::FieldDef;
    use linedb_common::constants::DEFAULT_DELIMITER;
    use linedb_common::types::{FieldType, IdGenerator};
    use linedb_storage::file::{LineStore, LockRegistry, StoreOptions};
    use tempfile::TempDir;

    fn people(tmp: &TempDir, rows: &[(&str, i64)]) -> TableHandle {
        let registry = LockRegistry::new();
        let store = LineStore::open(
            &registry,
            "person",
            tmp.path().join("person.ldb"),
            StoreOptions::new(),
        );
        let table = TableHandle::new(store, DEFAULT_DELIMITER.to_vec(), Arc::new(IdGenerator::new()));
        table
            .sync(
                "time",
                &[
                    FieldDef::new("name", FieldType::String),
                    FieldDef::new("age", FieldType::Int),
                ],
            )
            .unwrap();
        let maps: Vec<FieldMap> = rows
            .iter()
            .map(|(name, age)| {
                FieldMap::from([
                    ("name".to_string(), name.to_string()),
                    ("age".to_string(), age.to_string()),
                ])
            })
            .collect();
        table.query().insert(&maps).unwrap();
        table
    }

    fn names(rows: &[Record]) -> Vec<String> {
        rows.iter()
            .map(|r| r.get("name").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_find_in_stream_order() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 18), ("B", 20), ("C", 9)]);
        let rows = table.query().find().unwrap();
        assert_eq!(names(&rows), vec!["A", "B", "C"]);
        assert!(rows.iter().all(|r| r.key().is_some()));
    }

    #[test]
    fn test_filter_and_count() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 18), ("B", 20), ("C", 9)]);

        let q = table.query().filter("age >= ?", &[&10]).unwrap();
        assert_eq!(q.count().unwrap(), 2);
        assert_eq!(q.count().unwrap(), 2);

        let q = table.query().filter("age>=10 and name=B", &[]).unwrap();
        assert_eq!(names(&q.find().unwrap()), vec!["B"]);

        let q = table.query().filter("missing = 1", &[]).unwrap();
        assert_eq!(q.count().unwrap(), 0);
    }

    #[test]
    fn test_limit_offset_window() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 1), ("B", 2), ("C", 3), ("D", 4)]);

        let rows = table.query().limit_offset(2, 1).find().unwrap();
        assert_eq!(names(&rows), vec!["B", "C"]);

        assert!(table.query().limit(0).find().unwrap().is_empty());
        assert!(table.query().limit_offset(2, 10).find().unwrap().is_empty());

        let (rows, total) = table.query().limit(1).find_and_count().unwrap();
        assert_eq!(names(&rows), vec!["A"]);
        assert_eq!(total, 4);
    }

    #[test]
    fn test_get() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 1), ("B", 2)]);
        let row = table.query().filter("age > 1", &[]).unwrap().get().unwrap();
        assert_eq!(row.unwrap().get("name"), Some("B"));
        let none = table.query().filter("age > 5", &[]).unwrap().get().unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_projection() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 1)]);

        let rows = table.query().cols("name").cols(" ,age").find().unwrap();
        let map = rows[0].to_field_map();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("name") && map.contains_key("age"));

        // A projection naming nothing keeps every field.
        let rows = table.query().cols(" , ").find().unwrap();
        assert_eq!(rows[0].to_field_map().len(), 3);
    }

    #[test]
    fn test_ordering_before_pagination() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 30), ("B", 9), ("C", 30), ("D", 100)]);

        let rows = table.query().asc("age").find().unwrap();
        assert_eq!(names(&rows), vec!["B", "A", "C", "D"]);

        let rows = table.query().desc("age").asc("name").limit(3).find().unwrap();
        assert_eq!(names(&rows), vec!["D", "A", "C"]);

        // The offset skips stream position 0 (A) before sorting.
        let rows = table.query().desc("name").limit_offset(1, 1).find().unwrap();
        assert_eq!(names(&rows), vec!["D"]);
        let rows = table.query().asc("age").limit_offset(2, 1).find().unwrap();
        assert_eq!(names(&rows), vec!["B", "C"]);
    }

    #[test]
    fn test_offset_counts_stream_position() {
        let tmp = TempDir::new().unwrap();
        let table = people(&tmp, &[("A", 5), ("B", 20), ("C", 30), ("D", 40)]);

        // A does not match but still occupies position 0.
        let q = table.query().filter("age > 10", &[]).unwrap();
        let rows = q.clone().limit_offset(2, 1).find().unwrap();
        assert_eq!(names(&rows), vec!["B", "C"]);

        let rows = q.clone().limit_offset(2, 2).find().unwrap();
        assert_eq!(names(&rows), vec!["C", "D"]);

        let row = q.clone().limit_offset(1, 3).get().unwrap();
        assert_eq!(row.unwrap().get("name"), Some("D"));

        let (rows, total) = q.limit_offset(1, 2).find_and_count().unwrap();
        assert_eq!(names(&rows), vec!["C"]);
        assert_eq!(total, 3);
    }

    #[test]
    fn test_missing_table() {
        let tmp = TempDir::new().unwrap();
        let registry = LockRegistry::new();
        let store = LineStore::open(&registry, "nope", tmp.path().join("nope.ldb"), StoreOptions::new());
        let table = TableHandle::new(store, DEFAULT_DELIMITER.to_vec(), Arc::new(IdGenerator::new()));
        assert!(table.query().find().unwrap_err().is_table_not_found());
        assert!(table.query().count().unwrap_err().is_table_not_found());
    }
}
