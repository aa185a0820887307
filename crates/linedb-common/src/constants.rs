//! System-wide constants for linedb.
//!
//! This module defines the on-disk layout constants shared by the storage
//! and query layers.

// =============================================================================
// Table File Layout
// =============================================================================

/// Number of reserved header records at the top of every table file.
pub const HEADER_LINES: usize = 12;

/// Sentinel stored in header record 0.
pub const HEADER_START: &str = "start";

/// Sentinel stored in header record 11.
pub const HEADER_END: &str = "end";

/// Header record holding the field names.
pub const HEADER_NAMES_LINE: usize = 3;

/// Header record holding the declared field types.
pub const HEADER_TYPES_LINE: usize = 4;

/// Header record holding the optional sort ordinals.
pub const HEADER_SORT_LINE: usize = 5;

/// Header record holding the field remarks.
pub const HEADER_REMARKS_LINE: usize = 6;

/// Terminator written after every record, header lines included.
pub const LINE_TERMINATOR: &[u8] = b"\n";

/// Default cell delimiter: space, 0xFF, space.
///
/// 0xFF never occurs in valid UTF-8, so text cells cannot collide with it.
pub const DEFAULT_DELIMITER: [u8; 3] = [b' ', 0xFF, b' '];

// =============================================================================
// Naming Defaults
// =============================================================================

/// Default name of the primary-key column (always ordinal 0).
pub const DEFAULT_PRIMARY_KEY: &str = "time";

/// Remark written for the primary-key column when a table is created.
pub const PRIMARY_KEY_REMARK: &str = "primary key, timestamp";

/// Default tag key handed to the marshalling layer.
pub const DEFAULT_TAG: &str = "orm";

/// Default file extension of table files.
pub const DEFAULT_EXTENSION: &str = "ldb";

/// Suffix appended to a table file name for its rewrite temp file.
pub const TEMP_SUFFIX: &str = "temp";

// =============================================================================
// I/O
// =============================================================================

/// Read buffer size used by the record scanner.
pub const SCAN_BUFFER_SIZE: usize = 64 * 1024;
