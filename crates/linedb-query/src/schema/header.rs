//! Header codec.
//!
//! Header layout (0-indexed records):
//!
//! ```text
//! 0      start
//! 1-2    reserved
//! 3      field names
//! 4      field types (int|float|bool|string)
//! 5      sort ordinals (optional, numeric)
//! 6      remarks
//! 7-10   reserved
//! 11     end
//! ```
//!
//! Records 3 to 6 are joined with the cell delimiter like data records.

use std::collections::HashSet;
use std::path::Path;

use linedb_common::constants::{
    HEADER_END, HEADER_LINES, HEADER_NAMES_LINE, HEADER_REMARKS_LINE, HEADER_SORT_LINE,
    HEADER_START, HEADER_TYPES_LINE,
};
use linedb_common::error::{LineDbError, LineDbResult};
use linedb_common::types::FieldType;

use super::{FieldDescriptor, Schema};
use crate::record::{join_cells, split_cells};

/// Decodes the 12 header records of `path` into a schema.
///
/// Fails closed: a wrong record count, a missing sentinel, an empty or
/// repeated field name, or non-UTF-8 text is a format error.
pub fn decode_header(path: &Path, lines: &[Vec<u8>], delimiter: &[u8]) -> LineDbResult<Schema> {
    if lines.len() != HEADER_LINES {
        return Err(LineDbError::format(
            path,
            format!("expected {HEADER_LINES} header records, found {}", lines.len()),
        ));
    }
    if lines[0] != HEADER_START.as_bytes() {
        return Err(LineDbError::format(path, "missing start sentinel"));
    }
    if lines[HEADER_LINES - 1] != HEADER_END.as_bytes() {
        return Err(LineDbError::format(path, "missing end sentinel"));
    }

    let names = text_cells(path, lines, HEADER_NAMES_LINE, delimiter)?;
    let types = text_cells(path, lines, HEADER_TYPES_LINE, delimiter)?;
    let sorts = text_cells(path, lines, HEADER_SORT_LINE, delimiter)?;
    let remarks = text_cells(path, lines, HEADER_REMARKS_LINE, delimiter)?;

    let mut seen = HashSet::with_capacity(names.len());
    let mut fields = Vec::with_capacity(names.len());
    for (ordinal, name) in names.into_iter().enumerate() {
        if name.is_empty() {
            return Err(LineDbError::format(
                path,
                format!("field {ordinal} has no name"),
            ));
        }
        if !seen.insert(name) {
            return Err(LineDbError::format(
                path,
                format!("duplicate field name '{name}'"),
            ));
        }
        fields.push(FieldDescriptor {
            ordinal,
            name: name.to_string(),
            field_type: types
                .get(ordinal)
                .map_or(FieldType::String, |t| FieldType::parse(t)),
            remark: remarks.get(ordinal).map_or_else(String::new, |r| r.to_string()),
            sort: sorts.get(ordinal).and_then(|s| s.trim().parse().ok()),
        });
    }

    Ok(Schema::new(fields))
}

fn text_cells<'a>(
    path: &Path,
    lines: &'a [Vec<u8>],
    line: usize,
    delimiter: &[u8],
) -> LineDbResult<Vec<&'a str>> {
    split_cells(&lines[line], delimiter)
        .into_iter()
        .map(|cell| {
            std::str::from_utf8(cell)
                .map_err(|_| LineDbError::format(path, format!("header record {line} is not UTF-8")))
        })
        .collect()
}

/// Encodes a schema into 12 header records, blank-filling reserved slots.
pub fn encode_header(schema: &Schema, delimiter: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = vec![Vec::new(); HEADER_LINES];
    lines[0] = HEADER_START.as_bytes().to_vec();
    lines[HEADER_LINES - 1] = HEADER_END.as_bytes().to_vec();

    let fields = schema.fields();
    lines[HEADER_NAMES_LINE] = join_cells(fields.iter().map(|f| f.name.as_bytes()), delimiter);
    lines[HEADER_TYPES_LINE] =
        join_cells(fields.iter().map(|f| f.field_type.as_str().as_bytes()), delimiter);

    let sorts: Vec<String> = fields
        .iter()
        .map(|f| f.sort.map(|s| s.to_string()).unwrap_or_default())
        .collect();
    lines[HEADER_SORT_LINE] = join_cells(sorts.iter().map(|s| s.as_bytes()), delimiter);
    lines[HEADER_REMARKS_LINE] = join_cells(fields.iter().map(|f| f.remark.as_bytes()), delimiter);

    lines
}
