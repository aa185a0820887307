//! Line store: raw access to one table file.
//!
//! A table file is a sequence of records, each followed by the line
//! terminator. Line breaks inside a record are escaped on write and
//! restored on read, so callbacks always see the original bytes.
//! The first [`HEADER_LINES`] records are the reserved header; every pass
//! hands them to an open hook before the data records are streamed.
//!
//! Mutations never write the table file in place. [`LineStore::rewrite`]
//! streams the source into a sibling temp file and renames it over the
//! original only after every record was written and flushed, so the table
//! file is always either the old or the new version.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use linedb_common::constants::{HEADER_END, HEADER_LINES, HEADER_START, TEMP_SUFFIX};
use linedb_common::error::{LineDbError, LineDbResult};
use tracing::{debug, warn};

use super::escape::{escape, unescape};
use super::lock::{LockRegistry, TableLock};
use super::options::StoreOptions;
use super::scanner::RecordScanner;

/// Header records, unescaped.
pub type HeaderLines = Vec<Vec<u8>>;

/// What a rewrite callback does with one data record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Copy the record through byte-identical.
    Keep,
    /// Remove the record.
    Drop,
    /// Replace the record with another line.
    Replace(Vec<u8>),
    /// Replace the record with zero or more lines.
    Splice(Vec<Vec<u8>>),
}

/// Counters reported by a rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Data records read from the source.
    pub read: usize,
    /// Data records written to the destination.
    pub written: usize,
    /// Source records that were not kept byte-identical.
    pub changed: usize,
}

/// Line-framed storage for one table file.
///
/// Every operation holds the table's exclusive lock from open to close.
#[derive(Debug, Clone)]
pub struct LineStore {
    /// Logical table name, used in error messages.
    table: String,
    /// Table file path.
    path: PathBuf,
    /// Framing and flush options.
    options: StoreOptions,
    /// Exclusive lock for this file identity.
    lock: TableLock,
}

impl LineStore {
    /// Creates a store for `path`, sharing locks through `registry`.
    pub fn open(
        registry: &LockRegistry,
        table: impl Into<String>,
        path: impl Into<PathBuf>,
        options: StoreOptions,
    ) -> Self {
        let path = path.into();
        let lock = registry.lock_for(&path);
        Self {
            table: table.into(),
            path,
            options,
            lock,
        }
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the table file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the rewrite temp file.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".");
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    /// Returns the store options.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Returns true if the table file exists.
    pub fn exists(&self) -> bool {
        let _guard = self.lock.lock();
        self.path.is_file()
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Reads and validates the header.
    pub fn read_header(&self) -> LineDbResult<HeaderLines> {
        let _guard = self.lock.lock();
        let file = self.open_source()?;
        let mut scanner = RecordScanner::new(file, self.options.terminator_bytes());
        self.consume_header(&mut scanner)
    }

    /// Streams every data record to `visit`.
    ///
    /// `open` receives the header first and produces the state handed to
    /// each visit. A visit returning `Ok(false)` ends the scan early. The
    /// state is returned once the scan ends.
    pub fn scan<T, O, V>(&self, open: O, mut visit: V) -> LineDbResult<T>
    where
        O: FnOnce(&[Vec<u8>]) -> LineDbResult<T>,
        V: FnMut(&T, usize, &[u8]) -> LineDbResult<bool>,
    {
        let _guard = self.lock.lock();
        let file = self.open_source()?;
        let mut scanner = RecordScanner::new(file, self.options.terminator_bytes());

        let header = self.consume_header(&mut scanner)?;
        let state = open(&header)?;

        let mut visited = 0;
        while let Some(record) = scanner.next_record()? {
            let index = visited;
            visited += 1;
            if !visit(&state, index, &unescape(&record))? {
                break;
            }
        }

        debug!(path = %self.path.display(), visited, "scanned table");
        Ok(state)
    }

    // =========================================================================
    // Append Path
    // =========================================================================

    /// Appends the lines produced by `build` to the end of the file.
    ///
    /// `build` runs after the header was read, under the table lock. The
    /// whole batch is encoded into one buffer and handed to the file in a
    /// single write, so a failing `build` writes nothing. Returns the
    /// number of lines written.
    pub fn append<T, O, B>(&self, open: O, build: B) -> LineDbResult<usize>
    where
        O: FnOnce(&[Vec<u8>]) -> LineDbResult<T>,
        B: FnOnce(&T) -> LineDbResult<Vec<Vec<u8>>>,
    {
        let _guard = self.lock.lock();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.map_open_error(e))?;

        let mut scanner = RecordScanner::new(&file, self.options.terminator_bytes());
        let header = self.consume_header(&mut scanner)?;
        let state = open(&header)?;

        let lines = build(&state)?;
        let terminator = self.options.terminator_bytes();
        let mut batch = Vec::with_capacity(
            lines.iter().map(|l| l.len() + terminator.len()).sum(),
        );
        for line in &lines {
            batch.extend_from_slice(&escape(line));
            batch.extend_from_slice(terminator);
        }
        (&file).write_all(&batch)?;
        if self.options.sync_writes {
            file.sync_data()?;
        }

        debug!(path = %self.path.display(), appended = lines.len(), "appended records");
        Ok(lines.len())
    }

    // =========================================================================
    // Rewrite Path
    // =========================================================================

    /// Rewrites the whole file through a temp file.
    ///
    /// `open` receives the stored header and returns the state for the
    /// record callback plus the header lines to emit. Each data record is
    /// then replaced according to the returned [`Rewrite`]. The temp file
    /// is renamed over the table only after the pass completed; on any
    /// error the table is untouched and the temp file is left behind.
    pub fn rewrite<T, O, F>(&self, open: O, mut rewrite: F) -> LineDbResult<RewriteStats>
    where
        O: FnOnce(HeaderLines) -> LineDbResult<(T, HeaderLines)>,
        F: FnMut(&T, usize, &[u8]) -> LineDbResult<Rewrite>,
    {
        let _guard = self.lock.lock();
        let source = self.open_source()?;
        let temp_path = self.temp_path();

        let result = (|| -> LineDbResult<RewriteStats> {
            let temp = File::create(&temp_path)?;
            let mut scanner = RecordScanner::new(source, self.options.terminator_bytes());

            let header = self.consume_header(&mut scanner)?;
            let (state, header_out) = open(header)?;

            let mut writer = RecordWriter::new(&temp, &self.options);
            for line in &header_out {
                writer.write_record(line)?;
            }

            let mut stats = RewriteStats::default();
            while let Some(stored) = scanner.next_record()? {
                let index = stats.read;
                stats.read += 1;
                match rewrite(&state, index, &unescape(&stored))? {
                    Rewrite::Keep => {
                        writer.write_stored(&stored)?;
                        stats.written += 1;
                    }
                    Rewrite::Drop => stats.changed += 1,
                    Rewrite::Replace(line) => {
                        writer.write_record(&line)?;
                        stats.written += 1;
                        stats.changed += 1;
                    }
                    Rewrite::Splice(lines) => {
                        for line in &lines {
                            writer.write_record(line)?;
                        }
                        stats.written += lines.len();
                        stats.changed += 1;
                    }
                }
            }

            writer.finish()?;
            if self.options.sync_writes {
                temp.sync_all()?;
            }
            Ok(stats)
        })();

        let stats = match result {
            Ok(stats) => stats,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    temp = %temp_path.display(),
                    error = %e,
                    "rewrite aborted, table left unchanged"
                );
                return Err(e);
            }
        };

        fs::rename(&temp_path, &self.path)?;
        if self.options.sync_writes {
            self.sync_parent_dir()?;
        }

        debug!(
            path = %self.path.display(),
            read = stats.read,
            written = stats.written,
            changed = stats.changed,
            "rewrote table"
        );
        Ok(stats)
    }

    /// Rewrites data records, re-emitting the header unchanged.
    pub fn update<T, O, F>(&self, open: O, rewrite: F) -> LineDbResult<RewriteStats>
    where
        O: FnOnce(&[Vec<u8>]) -> LineDbResult<T>,
        F: FnMut(&T, usize, &[u8]) -> LineDbResult<Rewrite>,
    {
        self.rewrite(
            |header| {
                let state = open(&header)?;
                Ok((state, header))
            },
            rewrite,
        )
    }

    /// Deletes the data record at `index`.
    pub fn delete_at(&self, index: usize) -> LineDbResult<RewriteStats> {
        self.update(
            |_| Ok(()),
            |_, i, _| Ok(if i == index { Rewrite::Drop } else { Rewrite::Keep }),
        )
    }

    /// Deletes every data record for which `predicate` returns true.
    pub fn delete_by<P>(&self, mut predicate: P) -> LineDbResult<RewriteStats>
    where
        P: FnMut(usize, &[u8]) -> LineDbResult<bool>,
    {
        self.update(
            |_| Ok(()),
            |_, i, record| {
                Ok(if predicate(i, record)? {
                    Rewrite::Drop
                } else {
                    Rewrite::Keep
                })
            },
        )
    }

    /// Inserts `data` before the data record at `index`.
    ///
    /// An index past the last record leaves the file unchanged.
    pub fn insert_at(&self, index: usize, data: Vec<u8>) -> LineDbResult<RewriteStats> {
        let mut data = Some(data);
        self.update(
            |_| Ok(()),
            |_, i, record| match (i == index).then(|| data.take()).flatten() {
                Some(line) => Ok(Rewrite::Splice(vec![line, record.to_vec()])),
                None => Ok(Rewrite::Keep),
            },
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Creates the table file holding only `header`.
    ///
    /// Returns `false` without touching anything if the file exists.
    pub fn create(&self, header: &[Vec<u8>]) -> LineDbResult<bool> {
        let _guard = self.lock.lock();
        if self.path.exists() {
            return Ok(false);
        }
        if header.len() != HEADER_LINES {
            return Err(LineDbError::format(
                &self.path,
                format!("header must have {HEADER_LINES} records, got {}", header.len()),
            ));
        }

        let temp_path = self.temp_path();
        {
            let temp = File::create(&temp_path)?;
            let mut writer = RecordWriter::new(&temp, &self.options);
            for line in header {
                writer.write_record(line)?;
            }
            writer.finish()?;
            if self.options.sync_writes {
                temp.sync_all()?;
            }
        }
        fs::rename(&temp_path, &self.path)?;
        if self.options.sync_writes {
            self.sync_parent_dir()?;
        }

        debug!(path = %self.path.display(), "created table file");
        Ok(true)
    }

    /// Removes the table file. Returns `false` if it did not exist.
    pub fn remove(&self) -> LineDbResult<bool> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn open_source(&self) -> LineDbResult<File> {
        File::open(&self.path).map_err(|e| self.map_open_error(e))
    }

    fn map_open_error(&self, err: io::Error) -> LineDbError {
        if err.kind() == io::ErrorKind::NotFound {
            LineDbError::TableNotFound {
                table: self.table.clone(),
                path: self.path.clone(),
            }
        } else {
            err.into()
        }
    }

    /// Reads the fixed header and checks its record count and sentinels.
    fn consume_header<R: io::Read>(
        &self,
        scanner: &mut RecordScanner<R>,
    ) -> LineDbResult<HeaderLines> {
        let header: HeaderLines = scanner
            .take_records(HEADER_LINES)?
            .into_iter()
            .map(|line| unescape(&line).into_owned())
            .collect();
        if header.len() != HEADER_LINES {
            return Err(LineDbError::format(
                &self.path,
                format!("expected {HEADER_LINES} header records, found {}", header.len()),
            ));
        }
        if header[0] != HEADER_START.as_bytes() {
            return Err(LineDbError::format(&self.path, "missing start sentinel"));
        }
        if header[HEADER_LINES - 1] != HEADER_END.as_bytes() {
            return Err(LineDbError::format(&self.path, "missing end sentinel"));
        }
        Ok(header)
    }

    /// Makes the rename durable.
    fn sync_parent_dir(&self) -> LineDbResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        File::open(dir)?.sync_all()?;
        Ok(())
    }
}

/// Buffered record writer honoring the flush threshold.
///
/// Records are escaped on the way out; [`RecordWriter::write_stored`]
/// copies an already-escaped record through.
struct RecordWriter<'a, W: Write> {
    inner: BufWriter<W>,
    terminator: &'a [u8],
    threshold: usize,
}

impl<'a, W: Write> RecordWriter<'a, W> {
    fn new(sink: W, options: &'a StoreOptions) -> Self {
        Self {
            inner: BufWriter::with_capacity(options.flush_threshold.max(8 * 1024), sink),
            terminator: options.terminator_bytes(),
            threshold: options.flush_threshold,
        }
    }

    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.write_stored(&escape(record))
    }

    fn write_stored(&mut self, stored: &[u8]) -> io::Result<()> {
        self.inner.write_all(stored)?;
        self.inner.write_all(self.terminator)?;
        if self.inner.buffer().len() >= self.threshold {
            self.inner.flush()?;
        }
        Ok(())
    }

    fn finish(mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
