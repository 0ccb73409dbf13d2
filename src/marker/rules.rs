//! Domain rules applied while building a `MarkerSet`.
//!
//! These run after schema validation has already guaranteed field types, so
//! they only deal with what a schema cannot express cleanly: post-trim
//! emptiness, first-occurrence deduplication, and the strict version shape.

use std::collections::HashSet;
use thiserror::Error;

/// Why a marker set could not be constructed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MarkerSetError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("keywords must contain at least one non-empty keyword")]
    NoKeywords,
    #[error("version must match ^[0-9]+\\.[0-9]+\\.[0-9]+$, got '{0}'")]
    InvalidVersion(String),
}

pub fn validate_name(name: &str) -> Result<(), MarkerSetError> {
    if name.trim().is_empty() {
        return Err(MarkerSetError::EmptyName);
    }
    Ok(())
}

/// Trim every keyword, drop blanks, and keep the first occurrence of each.
pub fn normalize_keywords<I, S>(raw: I) -> Result<Vec<String>, MarkerSetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for keyword in raw {
        let trimmed = keyword.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            keywords.push(trimmed.to_string());
        }
    }

    if keywords.is_empty() {
        return Err(MarkerSetError::NoKeywords);
    }
    Ok(keywords)
}

/// Accepts exactly three dot-separated runs of ASCII digits.
pub fn validate_version(version: &str) -> Result<(), MarkerSetError> {
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(MarkerSetError::InvalidVersion(version.to_string()));
    }
    Ok(())
}
