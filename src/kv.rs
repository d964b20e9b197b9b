//! Line-oriented `KEY=VALUE` files.
//!
//! Both the quota ledger and the saved preferences use this format: one record
//! per line, the first `=` separates key from value, blank lines are skipped.

use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Errors while reading or writing a key/value file
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// A line without a `=` separator
    #[error("malformed line {line}: {content:?}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// Offending line content
        content: String,
    },
}

/// Ordered list of key/value records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvRecords {
    entries: Vec<(String, String)>,
}

impl KvRecords {
    /// Create an empty record list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse records from text
    pub fn parse(text: &str) -> Result<Self, KvError> {
        let mut records = Self::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| KvError::MalformedLine {
                line: index + 1,
                content: line.to_string(),
            })?;
            records.set(key.trim(), value);
        }
        Ok(records)
    }

    /// Read records from a file. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, KvError> {
        if !path.exists() {
            debug!(path = %path.display(), "Key/value file not found");
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| KvError::IoError(format!("Failed to read {}: {e}", path.display())))?;
        Self::parse(&text).map(Some)
    }

    /// Write records atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), KvError> {
        let parent_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent)
                    .map_err(|e| KvError::IoError(format!("Failed to create directory: {e}")))?;
                parent
            }
            _ => Path::new("."),
        };

        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| KvError::IoError(format!("Failed to create temp file: {e}")))?;
        temp_file
            .write_all(self.to_text().as_bytes())
            .map_err(|e| KvError::IoError(format!("Failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| KvError::IoError(format!("Failed to flush temp file: {e}")))?;
        temp_file
            .persist(path)
            .map_err(|e| KvError::IoError(format!("Failed to persist {}: {e}", path.display())))?;

        debug!(path = %path.display(), records = self.entries.len(), "Key/value file saved");
        Ok(())
    }

    /// Value for `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a value, keeping the position of an existing key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as newline separated `KEY=VALUE` lines
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
