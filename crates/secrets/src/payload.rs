//! Plaintext payload: KEY=value lines
//!
//! Blank lines and `#` comments are allowed anywhere. Every other line must
//! contain `=` with a non-empty key, and at least one such line must exist.

use crate::error::SecretsError;
use anyhow::{bail, Result};

/// One KEY=value line, trimmed on both sides of the first `=`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    /// Split a line at its first `=`. `None` when there is no `=` or the key
    /// is empty.
    pub fn parse(line: &str) -> Option<Self> {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        Some(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Non-blank, non-comment lines, trimmed
fn significant_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Strict parse for content about to be encrypted. The first bad line is
/// reported verbatim.
pub fn validate(text: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for line in significant_lines(text) {
        match Entry::parse(line) {
            Some(entry) => entries.push(entry),
            None => bail!(SecretsError::InvalidLine(line.to_string())),
        }
    }

    if entries.is_empty() {
        bail!(SecretsError::EmptyPayload);
    }

    Ok(entries)
}

/// Lenient parse for reading: lines that are not KEY=value are skipped
pub fn entries(text: &str) -> Vec<Entry> {
    significant_lines(text).filter_map(Entry::parse).collect()
}
