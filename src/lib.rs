//! Marker knowledge-base loader.
//!
//! Reads a directory of marker-set definition files, validates each against
//! the marker JSON Schema, normalizes the records, and hands back a typed,
//! cached collection. Public functions here form the contract consumers depend
//! on: knowledge-base root discovery, the process-wide default loader, and the
//! `load_marker_sets`/`clear_cache` pair.
//!
//! Callers that want explicit lifetimes (tests, hot reload) construct their
//! own [`MarkerLoader`] instead of going through the default one.

use std::sync::{Arc, OnceLock};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod error;
pub mod loader;
pub mod marker;
pub mod schema_loader;

pub use error::LoadError;
pub use loader::{
    DirectoryReport, FileOutcome, FileReport, FileStatus, MarkerCatalog, MarkerLoader, SkipReason,
};
pub use marker::{MarkerSet, MarkerSetError, MarkerSetFields};
pub use schema_loader::{MarkerSchema, SchemaProvider};

/// Schema location relative to the knowledge-base root.
pub const SCHEMA_RELATIVE_PATH: &str = "kb/schema/marker.schema.json";
/// Seed marker sets shipped with the knowledge base.
pub const SEED_SETS_RELATIVE_PATH: &str = "kb/sets";

/// Places a knowledge base may live, most specific first: the
/// `MARKER_KB_ROOT` override, every ancestor of the running executable, then
/// the root recorded at build time.
fn root_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = env::var_os("MARKER_KB_ROOT")
        .filter(|root| !root.is_empty())
        .map(PathBuf::from)
        .into_iter()
        .collect();
    if let Ok(exe) = env::current_exe() {
        candidates.extend(exe.ancestors().skip(1).map(Path::to_path_buf));
    }
    if let Some(hint) = option_env!("MARKER_KB_ROOT_HINT") {
        candidates.push(PathBuf::from(hint));
    }
    candidates
}

/// First candidate that carries the marker schema, canonicalized.
fn first_kb_root<I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    candidates
        .into_iter()
        .find(|dir| dir.join(SCHEMA_RELATIVE_PATH).is_file())
        .map(|dir| fs::canonicalize(&dir).unwrap_or(dir))
}

/// Locate the knowledge-base root (the directory holding
/// `kb/schema/marker.schema.json`).
pub fn find_kb_root() -> Result<PathBuf, LoadError> {
    first_kb_root(root_candidates()).ok_or_else(|| {
        LoadError::new(format!(
            "unable to locate the marker knowledge base ({SCHEMA_RELATIVE_PATH}); set MARKER_KB_ROOT"
        ))
    })
}

/// Schema path under the discovered knowledge-base root.
pub fn default_schema_path() -> Result<PathBuf, LoadError> {
    Ok(find_kb_root()?.join(SCHEMA_RELATIVE_PATH))
}

static DEFAULT_LOADER: OnceLock<MarkerLoader> = OnceLock::new();

/// The process-wide loader behind [`load_marker_sets`] and [`clear_cache`].
///
/// Root discovery runs once; if it fails, the loader still exists and every
/// load reports the missing schema.
pub fn default_loader() -> &'static MarkerLoader {
    DEFAULT_LOADER.get_or_init(|| {
        let schema_path = default_schema_path()
            .unwrap_or_else(|_| PathBuf::from(SCHEMA_RELATIVE_PATH));
        MarkerLoader::with_schema_path(schema_path)
    })
}

/// Load and cache every marker set in `root` using the default loader.
pub fn load_marker_sets(root: impl AsRef<Path>) -> Result<Arc<MarkerCatalog>, LoadError> {
    default_loader().load_directory(root)
}

/// Clear the default loader's schema and directory caches.
pub fn clear_cache() {
    if let Some(loader) = DEFAULT_LOADER.get() {
        loader.invalidate_all();
    }
}
