use std::fmt;

use super::StoreError;

const MAX_KEY_BYTES: usize = 768;

/// A validated location in the store, e.g. `userid/abc123`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a slash-separated path. Empty segments are skipped.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            validate_key(segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Path of the direct child `key`
    pub fn child(&self, key: &str) -> Result<Self, StoreError> {
        validate_key(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let forbidden = |c: char| matches!(c, '.' | '#' | '$' | '[' | ']' | '/') || c.is_ascii_control();

    if key.is_empty() || key.len() > MAX_KEY_BYTES || key.contains(forbidden) {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
