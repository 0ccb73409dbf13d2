//! Marker JSON Schema loading and memoization.
//!
//! The schema document is read from one fixed path, compiled once, and shared
//! by every validation call until the provider is invalidated. A missing or
//! corrupt schema is never degraded around: every caller gets the error.

use crate::error::{LoadError, Result};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Parsed and compiled marker schema.
pub struct MarkerSchema {
    path: PathBuf,
    raw: Value,
    compiled: JSONSchema,
}

impl MarkerSchema {
    /// Where the schema was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The schema document as parsed from disk.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Check `instance` against the schema, returning every violation as
    /// `<instance path>: <message>`.
    pub fn validate(&self, instance: &Value) -> std::result::Result<(), Vec<String>> {
        match self.compiled.validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|err| {
                    let pointer = err.instance_path.to_string();
                    if pointer.is_empty() {
                        format!("(root): {err}")
                    } else {
                        format!("{pointer}: {err}")
                    }
                })
                .collect()),
        }
    }
}

impl std::fmt::Debug for MarkerSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerSchema")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Read, parse, and compile a schema document.
pub fn load_json_schema(path: &Path) -> Result<MarkerSchema> {
    let contents = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => LoadError::new(format!("schema file not found: {}", path.display())),
        _ => LoadError::new(format!(
            "failed to load schema {}: {err}",
            path.display()
        )),
    })?;
    let raw: Value = serde_json::from_str(&contents)
        .map_err(|err| LoadError::new(format!("invalid JSON in schema file: {err}")))?;
    let compiled = JSONSchema::compile(&raw)
        .map_err(|err| LoadError::new(format!("invalid schema {}: {err}", path.display())))?;

    Ok(MarkerSchema {
        path: path.to_path_buf(),
        raw,
        compiled,
    })
}

/// Lazily loads the schema at a fixed path and keeps it until invalidated.
#[derive(Debug)]
pub struct SchemaProvider {
    path: PathBuf,
    cached: Mutex<Option<Arc<MarkerSchema>>>,
}

impl SchemaProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached schema, loading it on first use.
    ///
    /// Failures are not cached; the next call retries the read.
    pub fn get_schema(&self) -> Result<Arc<MarkerSchema>> {
        let mut cached = self.lock();
        if let Some(schema) = cached.as_ref() {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(load_json_schema(&self.path)?);
        debug!(schema = %self.path.display(), "loaded marker schema");
        *cached = Some(Arc::clone(&schema));
        Ok(schema)
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop the cached schema so the next call re-reads the file.
    pub fn invalidate(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<MarkerSchema>>> {
        self.cached.lock().unwrap_or_else(|err| err.into_inner())
    }
}
