//! Line-framed record scanner.
//!
//! Splits a byte stream into records on a (possibly multi-byte) terminator.
//! A trailing record without a closing terminator is still returned; an
//! empty stream yields no records.

use std::io::{self, Read};

use linedb_common::constants::SCAN_BUFFER_SIZE;

/// Streaming record reader.
///
/// Only the unconsumed tail of the stream is buffered, so memory use is
/// bounded by the longest record plus one read chunk.
pub struct RecordScanner<R> {
    /// Source stream.
    reader: R,
    /// Record terminator.
    terminator: Vec<u8>,
    /// Buffered bytes not yet returned.
    buf: Vec<u8>,
    /// Start of unconsumed data in `buf`.
    pos: usize,
    /// Offset (relative to `pos`) already searched for a terminator.
    searched: usize,
    /// Whether the source hit end of stream.
    eof: bool,
    /// Number of records returned so far.
    count: usize,
}

impl<R: Read> RecordScanner<R> {
    /// Creates a scanner over `reader`.
    ///
    /// An empty terminator never matches, so the whole stream is one record.
    pub fn new(reader: R, terminator: &[u8]) -> Self {
        Self {
            reader,
            terminator: terminator.to_vec(),
            buf: Vec::with_capacity(SCAN_BUFFER_SIZE),
            pos: 0,
            searched: 0,
            eof: false,
            count: 0,
        }
    }

    /// Returns how many records have been returned.
    pub fn records_read(&self) -> usize {
        self.count
    }

    /// Reads the next record, without its terminator.
    pub fn next_record(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(at) = self.find_terminator() {
                let start = self.pos;
                let record = self.buf[start..start + at].to_vec();
                self.pos = start + at + self.terminator.len();
                self.searched = 0;
                self.count += 1;
                return Ok(Some(record));
            }

            if self.eof {
                if self.pos >= self.buf.len() {
                    return Ok(None);
                }
                let record = self.buf[self.pos..].to_vec();
                self.pos = self.buf.len();
                self.count += 1;
                return Ok(Some(record));
            }

            self.fill()?;
        }
    }

    /// Reads up to `n` records.
    pub fn take_records(&mut self, n: usize) -> io::Result<Vec<Vec<u8>>> {
        let mut records = Vec::with_capacity(n);
        while records.len() < n {
            match self.next_record()? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        Ok(records)
    }

    /// Searches the unconsumed window for the terminator.
    fn find_terminator(&mut self) -> Option<usize> {
        let window = &self.buf[self.pos..];
        let dlen = self.terminator.len();
        if dlen == 0 || window.len() < dlen {
            return None;
        }
        let found = window[self.searched..]
            .windows(dlen)
            .position(|w| w == self.terminator.as_slice())
            .map(|i| i + self.searched);
        if found.is_none() {
            // A terminator may straddle the next read.
            self.searched = window.len() + 1 - dlen;
        }
        found
    }

    /// Compacts the buffer and reads another chunk.
    fn fill(&mut self) -> io::Result<()> {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        let old_len = self.buf.len();
        self.buf.resize(old_len + SCAN_BUFFER_SIZE, 0);
        let n = loop {
            match self.reader.read(&mut self.buf[old_len..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(old_len);
                    return Err(e);
                }
            }
        };
        self.buf.truncate(old_len + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }
}

impl<R: Read> Iterator for RecordScanner<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
