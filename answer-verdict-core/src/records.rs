//! Blank-line separated record files
//!
//! Questions and reference answers are kept in plain text files, one record
//! per paragraph:
//!
//! ```text
//! What is the capital
//! of France?
//!
//! Who wrote Hamlet?
//! ```
//!
//! Consecutive non-blank lines are trimmed and joined with single spaces.
//! A blank line ends the current record and a trailing record without a
//! terminating blank line is still returned.

use std::path::Path;

use crate::error::RecordError;

/// Read records from a file
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<String>, RecordError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = parse_records(&content);
    tracing::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Split text into records
pub fn parse_records(content: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() {
            current.push(line);
        } else if !current.is_empty() {
            records.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        records.push(current.join(" "));
    }

    records
}
