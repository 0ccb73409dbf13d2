use anyhow::{Context, Result};
use markerkb::{MarkerLoader, SCHEMA_RELATIVE_PATH};
use serde_json::{Value, json};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn schema_path() -> PathBuf {
    repo_root().join(SCHEMA_RELATIVE_PATH)
}

/// Loader with its own caches, validating against the shipped schema.
pub fn fresh_loader() -> MarkerLoader {
    MarkerLoader::with_schema_path(schema_path())
}

pub fn valid_marker_data() -> Value {
    json!({
        "name": "Test-Marker",
        "keywords": ["test", "example", "sample"],
        "semanticHints": ["testing", "validation"],
        "promptInserts": {
            "de": "Test auf Deutsch",
            "en": "Test in English"
        },
        "version": "1.0.0"
    })
}

/// Temp directory holding a single valid `test_marker.json`.
pub fn marker_dir() -> Result<TempDir> {
    let temp = TempDir::new().context("failed to allocate marker dir")?;
    write_json(temp.path(), "test_marker.json", &valid_marker_data())?;
    Ok(temp)
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(name);
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn write_raw(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|err| err.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records formatted log lines.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
