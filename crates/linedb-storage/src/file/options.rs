//! Line store options.

use bytes::Bytes;
use linedb_common::config::DatabaseConfig;
use linedb_common::constants::LINE_TERMINATOR;
use linedb_common::error::{LineDbError, LineDbResult};

/// Options shared by every line store of a database.
///
/// # Example
///
/// ```rust
/// use linedb_storage::file::StoreOptions;
///
/// let options = StoreOptions::new()
///     .flush_threshold(8192)
///     .sync_writes(true);
/// assert_eq!(options.terminator_bytes(), b"\n");
/// ```
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Record terminator.
    pub(crate) terminator: Bytes,
    /// Buffered rewrite bytes that trigger a flush; 0 flushes every record.
    pub(crate) flush_threshold: usize,
    /// Fsync before rename and the directory after it.
    pub(crate) sync_writes: bool,
}

impl StoreOptions {
    /// Creates options with newline-terminated records and per-record flushing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terminator: Bytes::from_static(LINE_TERMINATOR),
            flush_threshold: 0,
            sync_writes: false,
        }
    }

    /// Derives store options from a database configuration.
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new()
            .flush_threshold(config.flush_threshold)
            .sync_writes(config.sync_writes)
    }

    /// Sets the record terminator.
    ///
    /// The terminator must be non-empty and made of `\n` and `\r` bytes
    /// only, since those are the bytes escaped out of stored records.
    pub fn terminator(mut self, terminator: impl Into<Bytes>) -> LineDbResult<Self> {
        let terminator = terminator.into();
        if terminator.is_empty() {
            return Err(LineDbError::invalid_config("record terminator must not be empty"));
        }
        if terminator.iter().any(|&b| b != b'\n' && b != b'\r') {
            return Err(LineDbError::invalid_config(
                "record terminator may only contain line-break bytes",
            ));
        }
        self.terminator = terminator;
        Ok(self)
    }

    /// Sets the flush threshold.
    #[must_use]
    pub fn flush_threshold(mut self, bytes: usize) -> Self {
        self.flush_threshold = bytes;
        self
    }

    /// Sets whether rewrites are fsynced.
    #[must_use]
    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.sync_writes = enabled;
        self
    }

    /// Returns the record terminator.
    #[inline]
    pub fn terminator_bytes(&self) -> &[u8] {
        &self.terminator
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new()
    }
}
