//! Primary-key issuance.
//!
//! Keys are wall-clock nanoseconds since the Unix epoch, forced strictly
//! increasing within one generator. Generators are not coordinated across
//! processes: two writers in separate processes can issue the same key.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Monotonic primary-key generator.
///
/// Owned by a database handle; every table of that handle draws from the
/// same sequence.
///
/// # Example
///
/// ```rust
/// use linedb_common::types::IdGenerator;
///
/// let ids = IdGenerator::new();
/// let a = ids.next_id();
/// let b = ids.next_id();
/// assert!(b > a);
/// ```
pub struct IdGenerator {
    /// Last issued id.
    last: Mutex<i64>,
}

impl IdGenerator {
    /// Creates a generator that has issued nothing yet.
    pub fn new() -> Self {
        Self { last: Mutex::new(0) }
    }

    /// Creates a generator whose next id is greater than `last`.
    pub fn starting_after(last: i64) -> Self {
        Self {
            last: Mutex::new(last),
        }
    }

    /// Returns the current wall-clock time in nanoseconds.
    #[inline]
    fn wall_clock_nanos() -> i64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos();
        i64::try_from(nanos).unwrap_or(i64::MAX)
    }

    /// Issues the next id.
    ///
    /// The id is the current wall-clock reading, or `last + 1` when the
    /// clock has not advanced past the previous id.
    pub fn next_id(&self) -> i64 {
        let mut last = self.last.lock();
        let now = Self::wall_clock_nanos();
        let id = now.max(last.saturating_add(1));
        *last = id;
        tracing::trace!(id, "issued record id");
        id
    }

    /// Returns the last issued id (0 if none).
    pub fn last_id(&self) -> i64 {
        *self.last.lock()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("last", &self.last_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_strictly_increase() {
        let ids = IdGenerator::new();
        let mut prev = ids.next_id();
        assert!(prev > 0);
        for _ in 0..10_000 {
            let id = ids.next_id();
            assert!(id > prev);
            prev = id;
        }
        assert_eq!(ids.last_id(), prev);
    }

    #[test]
    fn test_clock_behind_last_id() {
        let ids = IdGenerator::starting_after(i64::MAX - 10);
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a, i64::MAX - 9);
        assert_eq!(b, i64::MAX - 8);
    }

    #[test]
    fn test_concurrent_ids_unique() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..1000).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
