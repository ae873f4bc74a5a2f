//! Must-get lookups
//!
//! A required value that is absent or empty is a misconfiguration, never
//! something to default.

use std::collections::BTreeMap;
use thiserror::Error;

/// Failure of a must-get lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MustGetError {
    #[error("missing required key: {0}")]
    Missing(String),

    #[error("required key is empty: {0}")]
    Empty(String),
}

/// Get a value that must be present and non-empty
pub fn must_get<'a>(
    map: &'a BTreeMap<String, String>,
    key: &str,
) -> Result<&'a str, MustGetError> {
    match map.get(key) {
        None => Err(MustGetError::Missing(key.to_string())),
        Some(value) if value.is_empty() => Err(MustGetError::Empty(key.to_string())),
        Some(value) => Ok(value),
    }
}
