//! Marker-set loading: single files, whole directories, and the result cache.
//!
//! A `MarkerLoader` owns both caches the loader needs: the schema provider and
//! a map from resolved directory path to the catalog loaded from it. Repeated
//! loads of the same directory return the same `Arc` without touching the file
//! system until `invalidate_all` is called.
//!
//! Directory loads favor availability: files that fail are reported and
//! skipped, and the call only fails when nothing at all could be loaded.

use crate::error::{LoadError, Result};
use crate::marker::{MarkerSet, MarkerSetFields};
use crate::schema_loader::{MarkerSchema, SchemaProvider};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Extension a file must carry to be considered a marker definition.
pub const MARKER_EXTENSION: &str = "json";

/// Why a directory entry was not treated as a marker definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotJson,
    Hidden,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotJson => "not a JSON file",
            SkipReason::Hidden => "hidden file",
        }
    }
}

/// Result of offering one file to the loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Loaded(MarkerSet),
    Skipped(SkipReason),
}

/// Per-file status recorded during a directory scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileStatus {
    Loaded { name: String },
    Skipped { reason: SkipReason },
    Failed { error: LoadError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Everything one uncached directory traversal produced.
#[derive(Clone, Debug)]
pub struct DirectoryReport {
    pub root: PathBuf,
    pub markers: Vec<MarkerSet>,
    pub files: Vec<FileReport>,
}

impl DirectoryReport {
    pub fn failures(&self) -> impl Iterator<Item = &LoadError> {
        self.files.iter().filter_map(|file| match &file.status {
            FileStatus::Failed { error } => Some(error),
            _ => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// Marker sets loaded from one directory, in file-name order.
///
/// Derefs to the loaded records. Files that failed during a partial load are
/// kept in `failures` so callers can surface them without treating the load
/// as an error.
#[derive(Debug)]
pub struct MarkerCatalog {
    root: PathBuf,
    markers: Vec<MarkerSet>,
    failures: Vec<LoadError>,
}

impl MarkerCatalog {
    /// The resolved directory this catalog was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn markers(&self) -> &[MarkerSet] {
        &self.markers
    }

    pub fn failures(&self) -> &[LoadError] {
        &self.failures
    }

    pub fn find(&self, name: &str) -> Option<&MarkerSet> {
        self.markers.iter().find(|marker| marker.name() == name)
    }
}

impl Deref for MarkerCatalog {
    type Target = [MarkerSet];

    fn deref(&self) -> &[MarkerSet] {
        &self.markers
    }
}

/// Catalogs keyed by canonical root, plus every spelling that resolved to one.
#[derive(Debug, Default)]
struct CatalogCache {
    by_root: HashMap<PathBuf, Arc<MarkerCatalog>>,
    aliases: HashMap<PathBuf, PathBuf>,
}

impl CatalogCache {
    fn by_alias(&self, key: &Path) -> Option<&Arc<MarkerCatalog>> {
        self.by_root.get(self.aliases.get(key)?)
    }

    fn clear(&mut self) {
        self.by_root.clear();
        self.aliases.clear();
    }
}

/// Loads marker sets from directories and memoizes the results per path.
#[derive(Debug)]
pub struct MarkerLoader {
    schema: SchemaProvider,
    catalogs: Mutex<CatalogCache>,
}

impl MarkerLoader {
    /// Loader using the schema under the discovered knowledge-base root.
    pub fn new() -> Result<Self> {
        Ok(Self::with_schema_path(crate::default_schema_path()?))
    }

    pub fn with_schema_path(schema_path: impl Into<PathBuf>) -> Self {
        Self {
            schema: SchemaProvider::new(schema_path),
            catalogs: Mutex::new(CatalogCache::default()),
        }
    }

    pub fn schema(&self) -> &SchemaProvider {
        &self.schema
    }

    /// Load every marker set in `dir`, reusing the cached catalog when the
    /// path has been loaded before.
    ///
    /// A path spelling seen before is answered from the cache without any file
    /// system access, even if the directory has since changed or disappeared.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<Arc<MarkerCatalog>> {
        let key = cache_key(dir.as_ref())?;
        if let Some(catalog) = self.cache().by_alias(&key) {
            debug!(dir = %catalog.root.display(), markers = catalog.len(), "returning cached marker sets");
            return Ok(Arc::clone(catalog));
        }

        let root = resolve_directory(&key)?;
        {
            let mut cache = self.cache();
            if let Some(catalog) = cache.by_root.get(&root).cloned() {
                cache.aliases.insert(key, root);
                debug!(dir = %catalog.root.display(), markers = catalog.len(), "returning cached marker sets");
                return Ok(catalog);
            }
        }

        let report = self.scan_resolved(root)?;
        let failures: Vec<LoadError> = report.failures().cloned().collect();

        if !failures.is_empty() && report.markers.is_empty() {
            let details = failures
                .iter()
                .map(LoadError::message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(LoadError::new(format!(
                "failed to load any marker sets from {}. Errors: {details}",
                report.root.display()
            )));
        }

        if failures.is_empty() {
            info!(
                dir = %report.root.display(),
                loaded = report.markers.len(),
                "loaded {} marker sets",
                report.markers.len()
            );
        } else {
            warn!(
                dir = %report.root.display(),
                loaded = report.markers.len(),
                failures = failures.len(),
                "loaded {} marker sets with {} failures",
                report.markers.len(),
                failures.len()
            );
        }

        let catalog = Arc::new(MarkerCatalog {
            root: report.root,
            markers: report.markers,
            failures,
        });
        let mut cache = self.cache();
        cache.aliases.insert(key, catalog.root.clone());
        cache
            .by_root
            .insert(catalog.root.clone(), Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Walk `dir` without consulting or filling the cache, reporting the
    /// outcome of every entry. Per-file failures never fail the scan.
    pub fn scan_directory(&self, dir: impl AsRef<Path>) -> Result<DirectoryReport> {
        let root = resolve_directory(&cache_key(dir.as_ref())?)?;
        self.scan_resolved(root)
    }

    /// Load one marker file, or report why it is not a candidate.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<FileOutcome> {
        let path = path.as_ref();
        if let Some(reason) = skip_reason(path) {
            return Ok(FileOutcome::Skipped(reason));
        }
        let schema = self.schema.get_schema()?;
        read_marker(&schema, path).map(FileOutcome::Loaded)
    }

    /// Whether a catalog for `dir` is currently cached.
    pub fn is_cached(&self, dir: impl AsRef<Path>) -> bool {
        let Ok(key) = cache_key(dir.as_ref()) else {
            return false;
        };
        if self.cache().by_alias(&key).is_some() {
            return true;
        }
        resolve_directory(&key)
            .map(|root| self.cache().by_root.contains_key(&root))
            .unwrap_or(false)
    }

    /// Number of cached directory catalogs.
    pub fn cached_len(&self) -> usize {
        self.cache().by_root.len()
    }

    /// Forget the schema and every cached directory catalog.
    pub fn invalidate_all(&self) {
        self.schema.invalidate();
        self.cache().clear();
        debug!("marker loader caches cleared");
    }

    fn scan_resolved(&self, root: PathBuf) -> Result<DirectoryReport> {
        // A missing or broken schema fails the whole load, not each file.
        let schema = self.schema.get_schema()?;
        let mut markers = Vec::new();
        let mut files = Vec::new();

        for path in candidate_files(&root)? {
            let status = if let Some(reason) = skip_reason(&path) {
                FileStatus::Skipped { reason }
            } else {
                match read_marker(&schema, &path) {
                    Ok(marker) => {
                        let name = marker.name().to_string();
                        markers.push(marker);
                        FileStatus::Loaded { name }
                    }
                    Err(error) => {
                        warn!(file = %path.display(), error = %error, "failed to load marker file");
                        FileStatus::Failed { error }
                    }
                }
            };
            files.push(FileReport { path, status });
        }

        Ok(DirectoryReport {
            root,
            markers,
            files,
        })
    }

    fn cache(&self) -> MutexGuard<'_, CatalogCache> {
        self.catalogs.lock().unwrap_or_else(|err| err.into_inner())
    }
}

/// Absolute spelling of `dir` with `.` components dropped. No file system
/// access; `..` is kept since it cannot be folded without resolving symlinks.
fn cache_key(dir: &Path) -> Result<PathBuf> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| LoadError::new(format!("unable to resolve {}: {err}", dir.display())))?
            .join(dir)
    };
    Ok(absolute
        .components()
        .filter(|part| !matches!(part, Component::CurDir))
        .collect())
}

/// Canonical form of an absolute directory path to load from.
fn resolve_directory(absolute: &Path) -> Result<PathBuf> {
    if !absolute.exists() {
        return Err(LoadError::new(format!(
            "directory not found: {}",
            absolute.display()
        )));
    }
    if !absolute.is_dir() {
        return Err(LoadError::new(format!(
            "not a directory: {}",
            absolute.display()
        )));
    }
    fs::canonicalize(absolute)
        .map_err(|err| LoadError::new(format!("unable to resolve {}: {err}", absolute.display())))
}

/// `*.json` entries directly inside `root`, sorted by file name.
fn candidate_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root)
        .map_err(|err| LoadError::new(format!("unable to read {}: {err}", root.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|err| LoadError::new(format!("unable to read {}: {err}", root.display())))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) == Some(MARKER_EXTENSION) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Parse, schema-check, and build one candidate file.
fn read_marker(schema: &MarkerSchema, path: &Path) -> Result<MarkerSet> {
    let file_name = display_name(path);

    let contents = fs::read_to_string(path)
        .map_err(|err| LoadError::for_file(path, format!("failed to read {file_name}: {err}")))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|err| LoadError::for_file(path, format!("invalid JSON in {file_name}: {err}")))?;

    if let Err(violations) = schema.validate(&value) {
        return Err(LoadError::for_file(
            path,
            format!(
                "schema validation failed for {file_name}: {}",
                violations.join("; ")
            ),
        ));
    }

    let marker = serde_json::from_value::<MarkerSetFields>(value)
        .map_err(|err| err.to_string())
        .and_then(|fields| MarkerSet::try_from(fields).map_err(|err| err.to_string()))
        .map_err(|err| {
            LoadError::for_file(path, format!("validation failed for {file_name}: {err}"))
        })?;

    debug!(marker = marker.name(), file = %file_name, "loaded marker set");
    Ok(marker)
}

fn skip_reason(path: &Path) -> Option<SkipReason> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(MARKER_EXTENSION) {
        return Some(SkipReason::NotJson);
    }
    let hidden = path
        .file_name()
        .is_some_and(|name| name.as_encoded_bytes().starts_with(b"."));
    if hidden {
        return Some(SkipReason::Hidden);
    }
    None
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
