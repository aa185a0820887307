//! Database configuration structures.
//!
//! These structures define all configurable aspects of a linedb instance.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DELIMITER, DEFAULT_EXTENSION, DEFAULT_PRIMARY_KEY, DEFAULT_TAG};
use crate::error::{LineDbError, LineDbResult};

/// Main database configuration.
///
/// # Example
///
/// ```rust
/// use linedb_common::config::DatabaseConfig;
///
/// let config = DatabaseConfig::default();
/// assert_eq!(config.primary_key, "time");
/// assert_eq!(config.delimiter, vec![b' ', 0xFF, b' ']);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding one file per table.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Byte sequence joining the cells of a record, header lines included.
    #[serde(default = "default_delimiter")]
    pub delimiter: Vec<u8>,

    /// Name of the primary-key column (ordinal 0).
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Reserved marshalling tag key.
    ///
    /// Read and saved with the rest of the file but has no effect: column
    /// names come from the serde attributes of the record type.
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Buffered bytes that trigger a flush while rewriting a table.
    /// 0 flushes after every record. Appends always issue one write.
    #[serde(default)]
    pub flush_threshold: usize,

    /// File extension of table files.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Fsync rewritten files and their directory around the rename.
    #[serde(default)]
    pub sync_writes: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_delimiter() -> Vec<u8> {
    DEFAULT_DELIMITER.to_vec()
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            delimiter: default_delimiter(),
            primary_key: default_primary_key(),
            tag: default_tag(),
            flush_threshold: 0,
            extension: default_extension(),
            sync_writes: false,
        }
    }
}

impl DatabaseConfig {
    /// Creates a new configuration with the specified data directory.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a configuration for tests rooted at `data_dir`.
    #[must_use]
    pub fn for_testing(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            flush_threshold: 4096,
            ..Default::default()
        }
    }

    /// Creates a builder for configuration.
    #[must_use]
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::new()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LineDbResult<()> {
        if self.delimiter.is_empty() {
            return Err(LineDbError::invalid_config("delimiter must not be empty"));
        }
        if self.delimiter.contains(&b'\n') {
            return Err(LineDbError::invalid_config(
                "delimiter must not contain the line terminator",
            ));
        }
        if self.primary_key.trim().is_empty() {
            return Err(LineDbError::invalid_config("primary_key must not be empty"));
        }
        if self.extension.is_empty() || self.extension.contains(['/', '\\']) {
            return Err(LineDbError::invalid_config(format!(
                "invalid table file extension '{}'",
                self.extension
            )));
        }
        Ok(())
    }

    /// Returns the path of the file backing `table`.
    #[must_use]
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", table, self.extension))
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> LineDbResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LineDbError::invalid_config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> LineDbResult<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> LineDbResult<String> {
        toml::to_string_pretty(self).map_err(|e| LineDbError::invalid_config(e.to_string()))
    }
}

/// Builder for database configuration.
#[derive(Debug, Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Sets the cell delimiter.
    pub fn delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    /// Sets the primary-key column name.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.config.primary_key = name.into();
        self
    }

    /// Sets the reserved marshalling tag key.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tag = tag.into();
        self
    }

    /// Sets the write-buffer flush threshold.
    pub fn flush_threshold(mut self, bytes: usize) -> Self {
        self.config.flush_threshold = bytes;
        self
    }

    /// Sets the table file extension.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.config.extension = extension.into();
        self
    }

    /// Enables fsync around rewrites.
    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.config.sync_writes = enabled;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> LineDbResult<DatabaseConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
