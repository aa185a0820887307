//! End-to-end tests for linedb.
//!
//! These tests drive the public facade against real table files in a
//! temporary directory: typed inserts and reads, pagination, mutation
//! guards, schema migration and concurrent writers.

use std::collections::HashSet;
use std::fs;
use std::thread;

use linedb::{Database, DatabaseConfig, FieldMap, LineDbError, SyncOutcome, Table, TypedQuery};
use linedb_storage::file::Rewrite;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    time: i64,
    name: String,
    age: i64,
}

impl Table for Person {
    fn table_name() -> &'static str {
        "person"
    }
}

/// Same table, later revision: `age` removed, `email` added.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct PersonV2 {
    time: i64,
    name: String,
    email: String,
}

impl Table for PersonV2 {
    fn table_name() -> &'static str {
        "person"
    }
}

fn person(name: &str, age: i64) -> Person {
    Person {
        name: name.to_string(),
        age,
        ..Default::default()
    }
}

/// Opens a database in `tmp` with the person table synced.
fn open_db(tmp: &TempDir) -> Database {
    let db = Database::open(DatabaseConfig::for_testing(tmp.path())).expect("open database");
    assert_eq!(db.sync::<Person>().unwrap(), SyncOutcome::Created);
    db
}

fn table_bytes(db: &Database) -> Vec<u8> {
    fs::read(db.table_path(Person::table_name())).unwrap()
}

#[test]
fn test_insert_then_find() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);

    let mut x = person("X", 18);
    let key = db.query_for::<Person>().unwrap().insert_one(&mut x).unwrap();
    assert_ne!(key, 0);
    assert_eq!(x.time, key);

    let found: Vec<Person> = db.query_for::<Person>().unwrap().find_as().unwrap();
    assert_eq!(found, vec![x]);
    assert_eq!(found[0].name, "X");
    assert_eq!(found[0].age, 18);
}

#[test]
fn test_count_with_placeholders() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 18), person("B", 19)])
        .unwrap();

    let adults = |min: i64| {
        db.query_for::<Person>()
            .unwrap()
            .filter("age>=?", &[&min])
            .unwrap()
            .count()
            .unwrap()
    };
    assert_eq!(adults(18), 2);
    assert_eq!(adults(19), 1);
    assert_eq!(adults(20), 0);
}

#[test]
fn test_update_keeps_key() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);

    let mut a = person("A", 30);
    let key = db.query_for::<Person>().unwrap().insert_one(&mut a).unwrap();

    let changed = db
        .query_for::<Person>()
        .unwrap()
        .filter("name = ?", &[&"A"])
        .unwrap()
        .update(&FieldMap::from([("name".to_string(), "B".to_string())]))
        .unwrap();
    assert_eq!(changed, 1);

    let b: Person = db
        .query_for::<Person>()
        .unwrap()
        .filter("name = B", &[])
        .unwrap()
        .get_as()
        .unwrap()
        .expect("renamed record");
    assert_eq!(b.time, key);
    assert_eq!(b.age, 30);
}

#[test]
fn test_limit_offset_window() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 1), person("B", 2), person("C", 3), person("D", 4)])
        .unwrap();

    let page: Vec<Person> = db
        .query_for::<Person>()
        .unwrap()
        .limit_offset(2, 1)
        .find_as()
        .unwrap();
    let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);

    let (page, total) = db
        .query_for::<Person>()
        .unwrap()
        .filter("age > ?", &[&1])
        .unwrap()
        .limit(1)
        .find_and_count_as::<Person>()
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "B");
}

#[test]
fn test_offset_skips_stream_positions() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 5), person("B", 20), person("C", 30), person("D", 40)])
        .unwrap();

    let page: Vec<Person> = db
        .query_for::<Person>()
        .unwrap()
        .filter("age > ?", &[&10])
        .unwrap()
        .limit_offset(2, 1)
        .find_as()
        .unwrap();
    let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
}

#[test]
fn test_multiline_text_round_trips() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);

    let mut note = person("line1\nline2", 7);
    db.query_for::<Person>().unwrap().insert_one(&mut note).unwrap();
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person(r"C:\new", 8)])
        .unwrap();

    let found: Vec<Person> = db.query_for::<Person>().unwrap().find_as().unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0], note);
    assert_eq!(found[1].name, r"C:\new");
}

#[test]
fn test_value_ending_in_delimiter_prefix_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = DatabaseConfig {
        delimiter: b"||".to_vec(),
        ..DatabaseConfig::for_testing(tmp.path())
    };
    let db = Database::open(config).unwrap();
    db.sync::<Person>().unwrap();
    let before = table_bytes(&db);

    let err = db
        .query_for::<Person>()
        .unwrap()
        .insert_values(&[person("a|", 1)])
        .unwrap_err();
    assert!(matches!(err, LineDbError::InvalidValue { .. }));
    assert_eq!(table_bytes(&db), before);

    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("a|b", 2)])
        .unwrap();
    let found: Vec<Person> = db.query_for::<Person>().unwrap().find_as().unwrap();
    assert_eq!(found[0].name, "a|b");
    assert_eq!(found[0].age, 2);
}

#[test]
fn test_sorted_pagination() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("C", 40), person("A", 20), person("B", 30)])
        .unwrap();

    let oldest: Vec<Person> = db
        .query_for::<Person>()
        .unwrap()
        .desc("age")
        .limit(2)
        .find_as()
        .unwrap();
    let names: Vec<_> = oldest.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["C", "B"]);
}

#[test]
fn test_unguarded_mutations_leave_file_unchanged() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 1), person("B", 2)])
        .unwrap();
    let before = table_bytes(&db);

    let err = db
        .query_for::<Person>()
        .unwrap()
        .update_with(&FieldMap::from([("age".to_string(), "0".to_string())]))
        .unwrap_err();
    assert!(err.is_guard());
    let err = db.query_for::<Person>().unwrap().delete().unwrap_err();
    assert!(err.is_guard());

    assert_eq!(table_bytes(&db), before);
}

#[test]
fn test_delete_requires_every_clause() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 1), person("A", 2), person("B", 1)])
        .unwrap();

    let deleted = db
        .query_for::<Person>()
        .unwrap()
        .filter("name = ? AND age = ?", &[&"A", &1])
        .unwrap()
        .delete()
        .unwrap();
    assert_eq!(deleted, 1);

    let left: Vec<Person> = db
        .query_for::<Person>()
        .unwrap()
        .asc("name")
        .asc("age")
        .find_as()
        .unwrap();
    let left: Vec<_> = left.iter().map(|p| (p.name.as_str(), p.age)).collect();
    assert_eq!(left, vec![("A", 2), ("B", 1)]);
}

#[test]
fn test_update_preserves_keys_and_cardinality() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    let keys = db
        .query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 1), person("B", 2), person("C", 3)])
        .unwrap();

    // The patch names the key; it must be ignored.
    let patch = FieldMap::from([
        ("time".to_string(), "1".to_string()),
        ("age".to_string(), "99".to_string()),
    ]);
    let changed = db
        .query_for::<Person>()
        .unwrap()
        .filter("age < ?", &[&3])
        .unwrap()
        .update(&patch)
        .unwrap();
    assert_eq!(changed, 2);

    let all: Vec<Person> = db.query_for::<Person>().unwrap().find_as().unwrap();
    assert_eq!(all.len(), 3);
    let stored: Vec<_> = all.iter().map(|p| p.time).collect();
    assert_eq!(stored, keys);
    let ages: Vec<_> = all.iter().map(|p| p.age).collect();
    assert_eq!(ages, vec![99, 99, 3]);
}

#[test]
fn test_count_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 1), person("B", 2)])
        .unwrap();
    let before = table_bytes(&db);

    let query = db.query_for::<Person>().unwrap().filter("age > 0", &[]).unwrap();
    let first = query.count().unwrap();
    let second = query.count().unwrap();
    assert_eq!(first, 2);
    assert_eq!(first, second);
    assert_eq!(table_bytes(&db), before);
}

#[test]
fn test_failed_rewrite_leaves_table_intact() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    db.query_for::<Person>()
        .unwrap()
        .insert_values(&[person("A", 1), person("B", 2), person("C", 3)])
        .unwrap();
    let before = table_bytes(&db);

    let table = db.table(Person::table_name()).unwrap();
    let result = table.store().update(
        |_| Ok(()),
        |_, index, _| {
            if index == 1 {
                Err(LineDbError::invalid_value("age", "simulated failure"))
            } else {
                Ok(Rewrite::Drop)
            }
        },
    );
    assert!(result.is_err());

    assert_eq!(table_bytes(&db), before);
    assert_eq!(db.query_for::<Person>().unwrap().count().unwrap(), 3);
}

#[test]
fn test_sync_migrates_changed_type() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);
    let mut ann = person("Ann", 30);
    let key = db.query_for::<Person>().unwrap().insert_one(&mut ann).unwrap();

    assert_eq!(db.sync::<Person>().unwrap(), SyncOutcome::Unchanged);

    let outcome = db.sync::<PersonV2>().unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Migrated {
            added: vec!["email".to_string()],
            dropped: vec!["age".to_string()],
        }
    );

    let schema = db.schema(PersonV2::table_name()).unwrap();
    assert_eq!(schema.names().collect::<Vec<_>>(), vec!["time", "name", "email"]);

    let migrated: Vec<PersonV2> = db.query_for::<PersonV2>().unwrap().find_as().unwrap();
    assert_eq!(
        migrated,
        vec![PersonV2 {
            time: key,
            name: "Ann".to_string(),
            email: String::new(),
        }]
    );
    assert_eq!(db.sync::<PersonV2>().unwrap(), SyncOutcome::Unchanged);
}

#[test]
fn test_concurrent_inserts() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = db.clone();
            thread::spawn(move || {
                let mut keys = Vec::with_capacity(PER_THREAD);
                for i in 0..PER_THREAD {
                    let mut p = person(&format!("t{t}-{i}"), i as i64);
                    keys.push(db.query_for::<Person>().unwrap().insert_one(&mut p).unwrap());
                }
                keys
            })
        })
        .collect();

    let mut keys = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(keys.insert(key), "duplicate key {key}");
        }
    }

    assert_eq!(keys.len(), THREADS * PER_THREAD);
    assert_eq!(
        db.query_for::<Person>().unwrap().count().unwrap(),
        THREADS * PER_THREAD
    );
}

#[test]
fn test_missing_table_is_reported() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap();

    let err = db.query("ghost").unwrap().count().unwrap_err();
    assert!(err.is_table_not_found());
}
