//! Line-break escaping.
//!
//! Records are framed by line breaks, so a record holding `\n` or `\r` is
//! escaped before it is written: the backslash doubles and each line-break
//! byte becomes a backslash followed by `n` or `r`. Unescaping reverses
//! this; a backslash followed by any other byte is kept as-is, so files
//! written without escaping still read back unchanged.

use std::borrow::Cow;

const ESCAPE: u8 = b'\\';

/// Escapes `record` for storage. Borrows when nothing needs escaping.
pub fn escape(record: &[u8]) -> Cow<'_, [u8]> {
    if !record.iter().any(|&b| matches!(b, ESCAPE | b'\n' | b'\r')) {
        return Cow::Borrowed(record);
    }
    let mut out = Vec::with_capacity(record.len() + 8);
    for &b in record {
        match b {
            ESCAPE => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(b),
        }
    }
    Cow::Owned(out)
}

/// Reverses [`escape`]. Borrows when the record holds no backslash.
pub fn unescape(stored: &[u8]) -> Cow<'_, [u8]> {
    if !stored.contains(&ESCAPE) {
        return Cow::Borrowed(stored);
    }
    let mut out = Vec::with_capacity(stored.len());
    let mut bytes = stored.iter().copied();
    while let Some(b) = bytes.next() {
        if b != ESCAPE {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(ESCAPE) => out.push(ESCAPE),
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(other) => out.extend_from_slice(&[ESCAPE, other]),
            None => out.push(ESCAPE),
        }
    }
    Cow::Owned(out)
}
