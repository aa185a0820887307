//! Per-table exclusive locks.
//!
//! Every pass over a table file (scan, append, rewrite) holds the lock for
//! that file's identity for its whole duration. Readers and writers exclude
//! each other; there is no shared mode.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Lock handle for one table file.
pub type TableLock = Arc<Mutex<()>>;

/// Registry mapping table-file identities to their exclusive lock.
///
/// Owned by a database handle and shared with every store it opens, so two
/// stores for the same path serialize against each other.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, TableLock>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `path`, creating it on first use.
    pub fn lock_for(&self, path: &Path) -> TableLock {
        let key = Self::identity(path);
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key).or_default())
    }

    /// Number of table identities seen so far.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no lock has been handed out.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }

    /// Normalizes a path so that `./a/t.ldb` and `a/t.ldb` share a lock.
    fn identity(path: &Path) -> PathBuf {
        if let Ok(canonical) = path.canonicalize() {
            return canonical;
        }
        // The file may not exist yet: canonicalize the parent instead.
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => match parent.canonicalize() {
                Ok(dir) => dir.join(name),
                Err(_) => path.components().collect(),
            },
            _ => path.components().collect(),
        }
    }
}
