//! The loader's single failure kind.
//!
//! Every failure the loader reports back to callers is a `LoadError` carrying a
//! human-readable message. When the failure came from one candidate file, the
//! file is kept alongside so callers (and aggregated directory errors) can say
//! which definition was rejected.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LoadError {
    message: String,
    file: Option<PathBuf>,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
        }
    }

    /// Error attributed to a single marker file.
    pub fn for_file(file: &Path, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: Some(file.to_path_buf()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The file this error originated from, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
