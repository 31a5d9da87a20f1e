//! The catalog of loaded source files.
//!
//! [`Catalog`] is the single writer: it is not `Clone` and every mutator
//! takes `&mut self`. Readers go through [`CatalogReader`], whose snapshots
//! hold whole entries. Entries are never edited in place; a reload builds a
//! new entry and swaps the `Arc` under the write lock, so a reader sees
//! either the old index or the new one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::filter::SourceFilter;
use super::pool::{parse_source, read_source, ParsePool, ParsedFile, ParsedSource};
use super::scanner::discover;
use super::watches::{WatchBackend, WatchHandle, WatchTable, WatchTarget};
use crate::config::default_parse_threads;
use crate::error::ParseError;
use crate::graph::{FactParser, TripleIndex};
use crate::metrics::{gauge_value, PARSE_FAILURES, SOURCE_FILES, TRIPLES, WATCHED_PATHS};
use crate::Result;

type Shelf = BTreeMap<PathBuf, Arc<CatalogEntry>>;

/// Catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Number of parse worker threads.
    pub parse_threads: usize,
    /// Which files are sources.
    pub filter: SourceFilter,
    /// Honour `.gitignore` files during discovery.
    pub respect_gitignore: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            parse_threads: default_parse_threads(),
            filter: SourceFilter::default(),
            respect_gitignore: false,
        }
    }
}

/// One loaded source file.
#[derive(Debug)]
pub struct CatalogEntry {
    source_path: PathBuf,
    namespace: String,
    index: Arc<TripleIndex>,
    watch: WatchHandle,
    content_hash: String,
    loaded_at: DateTime<Utc>,
}

impl CatalogEntry {
    fn new(source_path: PathBuf, watch: WatchHandle, source: ParsedSource) -> Self {
        let namespace = namespace_of(&source_path);
        Self {
            source_path,
            namespace,
            index: Arc::new(source.index),
            watch,
            content_hash: source.content_hash,
            loaded_at: Utc::now(),
        }
    }

    /// Path of the source file.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Grouping label of the entry: the file's parent directory.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Index built from the last successful parse.
    #[must_use]
    pub fn index(&self) -> &TripleIndex {
        &self.index
    }

    /// Watch handle of the source file.
    #[must_use]
    pub const fn watch(&self) -> WatchHandle {
        self.watch
    }

    /// blake3 hash of the parsed content.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// When the index was built.
    #[must_use]
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Namespace label for a source path.
fn namespace_of(path: &Path) -> String {
    path.parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default()
}

fn count_failure(error: ParseError) -> ParseError {
    PARSE_FAILURES.inc();
    error
}

/// Outcome of loading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file was parsed and its entry published.
    Loaded { path: PathBuf, triples: usize },
    /// The file was not (re)published.
    Failed { path: PathBuf, error: ParseError },
}

impl LoadOutcome {
    /// Path the outcome is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Loaded { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    /// Check if the file was loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Outcome of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new index replaced the previous one.
    Replaced { triples: usize },
    /// The file had no entry yet (its earlier parse failed) and now has one.
    Loaded { triples: usize },
    /// The content hash matched; nothing was parsed.
    Unchanged,
    /// The path is not a watched source file.
    Untracked,
}

/// Counts of what a subtree removal released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtreeRemoval {
    pub entries: usize,
    pub watches: usize,
}

/// Cloneable read access to the catalog.
#[derive(Clone, Default)]
pub struct CatalogReader {
    shelf: Arc<RwLock<Shelf>>,
}

impl CatalogReader {
    /// Take a consistent view of every current entry, in path order.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        let entries = self.shelf.read().values().cloned().collect();
        CatalogSnapshot { entries }
    }

    /// Number of loaded source files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shelf.read().len()
    }

    /// Check if no source file is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shelf.read().is_empty()
    }
}

impl std::fmt::Debug for CatalogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogReader")
            .field("entries", &self.len())
            .finish()
    }
}

/// Immutable set of entries taken at one instant.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: Vec<Arc<CatalogEntry>>,
}

impl CatalogSnapshot {
    /// Iterate entries in source path order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().map(|entry| &**entry)
    }

    /// Entry for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&CatalogEntry> {
        self.iter().find(|entry| entry.source_path == path)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Facts across all entries.
    #[must_use]
    pub fn triple_count(&self) -> usize {
        self.iter().map(|entry| entry.index.fact_count()).sum()
    }
}

/// Registry of loaded source files and watched paths.
pub struct Catalog {
    shelf: Arc<RwLock<Shelf>>,
    watches: WatchTable,
    backend: Box<dyn WatchBackend>,
    pool: ParsePool,
    config: CatalogConfig,
}

impl Catalog {
    /// Create an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the parse workers cannot be started.
    pub fn new(
        config: CatalogConfig,
        parser: Arc<dyn FactParser>,
        backend: Box<dyn WatchBackend>,
    ) -> Result<Self> {
        let pool = ParsePool::new(parser, config.parse_threads)?;
        Ok(Self {
            shelf: Arc::default(),
            watches: WatchTable::new(),
            backend,
            pool,
            config,
        })
    }

    /// Read access for query handlers.
    #[must_use]
    pub fn reader(&self) -> CatalogReader {
        CatalogReader {
            shelf: Arc::clone(&self.shelf),
        }
    }

    /// The source filter in use.
    #[must_use]
    pub const fn filter(&self) -> &SourceFilter {
        &self.config.filter
    }

    /// Parse `paths` in parallel and publish every file that parsed.
    ///
    /// Every path gets a file watch, including ones that fail, so that a
    /// later fixed save is picked up. A path that is already catalogued is
    /// replaced on success and kept as is on failure. All successful
    /// entries are published under one write lock.
    pub fn load_bulk<I, P>(&mut self, paths: I) -> Vec<LoadOutcome>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        paths.sort();
        paths.dedup();
        if paths.is_empty() {
            return Vec::new();
        }

        for path in &paths {
            self.watches.register(path.clone(), WatchTarget::File);
        }

        let mut ready = Vec::new();
        let mut outcomes = Vec::with_capacity(paths.len());

        for ParsedFile { path, result } in self.pool.parse_all(&paths) {
            match result {
                Ok(source) => {
                    let triples = source.index.fact_count();
                    let watch = self.watches.register(path.clone(), WatchTarget::File);
                    ready.push(Arc::new(CatalogEntry::new(path.clone(), watch, source)));
                    outcomes.push(LoadOutcome::Loaded { path, triples });
                }
                Err(error) => {
                    PARSE_FAILURES.inc();
                    tracing::warn!(path = %path.display(), error = %error, "Failed to load source file");
                    if matches!(error, ParseError::Io { .. }) && !path.exists() {
                        self.watches.release_path(&path);
                    }
                    outcomes.push(LoadOutcome::Failed { path, error });
                }
            }
        }

        {
            let mut shelf = self.shelf.write();
            for entry in ready {
                shelf.insert(entry.source_path.clone(), entry);
            }
        }

        self.publish_metrics();

        let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
        tracing::info!(
            loaded,
            failed = outcomes.len() - loaded,
            "Loaded source files"
        );

        outcomes
    }

    /// Re-parse one watched source file and swap its index.
    ///
    /// # Errors
    ///
    /// Returns the read or parse error; the previous entry stays published.
    pub fn reload(&mut self, path: &Path) -> std::result::Result<ReloadOutcome, ParseError> {
        let Some(watch) = self
            .watches
            .handle_for(path)
            .filter(|_| self.watches.target_of(path) == Some(WatchTarget::File))
        else {
            return Ok(ReloadOutcome::Untracked);
        };

        let current = self.shelf.read().get(path).cloned();

        let content = read_source(path).map_err(count_failure)?;
        if current
            .as_ref()
            .is_some_and(|entry| entry.content_hash == content.hash)
        {
            tracing::debug!(path = %path.display(), "Source unchanged, skipping reload");
            return Ok(ReloadOutcome::Unchanged);
        }

        let source =
            parse_source(self.pool.parser(), path, content).map_err(count_failure)?;
        let triples = source.index.fact_count();
        let entry = Arc::new(CatalogEntry::new(path.to_path_buf(), watch, source));

        self.shelf.write().insert(path.to_path_buf(), entry);
        self.publish_metrics();

        tracing::info!(path = %path.display(), triples, "Reloaded source file");

        Ok(if current.is_some() {
            ReloadOutcome::Replaced { triples }
        } else {
            ReloadOutcome::Loaded { triples }
        })
    }

    /// Drop the entry and watch of one file. Absent paths are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, path: &Path) -> bool {
        let removed = self.shelf.write().remove(path).is_some();
        let released = self.watches.release_path(path).is_some();

        if removed || released {
            self.publish_metrics();
            tracing::info!(path = %path.display(), removed, "Removed source file");
        }

        removed
    }

    /// Drop every entry and watch on `dir` or below it.
    ///
    /// Paths are compared component-wise, so `/data/a` does not cover
    /// `/data/ab`. All entries disappear under one write lock.
    pub fn remove_subtree(&mut self, dir: &Path) -> SubtreeRemoval {
        let entries = {
            let mut shelf = self.shelf.write();
            let before = shelf.len();
            shelf.retain(|path, _| !path.starts_with(dir));
            before - shelf.len()
        };

        let released = self.watches.release_under(dir);
        for watched in released
            .iter()
            .filter(|w| w.target == WatchTarget::Directory)
        {
            // The platform usually drops watches of deleted directories itself.
            if let Err(e) = self.backend.unwatch_directory(&watched.path) {
                tracing::debug!(path = %watched.path.display(), error = %e, "Unwatch failed");
            }
        }

        self.publish_metrics();

        let removal = SubtreeRemoval {
            entries,
            watches: released.len(),
        };
        tracing::info!(
            dir = %dir.display(),
            entries = removal.entries,
            watches = removal.watches,
            "Removed directory subtree"
        );
        removal
    }

    /// Watch `dir` and every directory below it, then load the source files
    /// found there that are not watched yet.
    ///
    /// Files are listed after the watches are in place, so a file written
    /// meanwhile is either listed or reported by an event. A directory whose
    /// watch fails is logged and left unwatched.
    pub fn add_watched_directory(&mut self, dir: &Path) -> Vec<LoadOutcome> {
        let respect_gitignore = self.config.respect_gitignore;
        let directories = discover(dir, &self.config.filter, respect_gitignore).directories;

        for directory in &directories {
            self.watch_directory(directory);
        }

        let fresh: Vec<PathBuf> = discover(dir, &self.config.filter, respect_gitignore)
            .files
            .into_iter()
            .filter(|file| self.watches.handle_for(file).is_none())
            .collect();

        tracing::debug!(dir = %dir.display(), files = fresh.len(), "Discovered new source files");

        self.load_bulk(fresh)
    }

    /// Register a watch on one directory.
    fn watch_directory(&mut self, dir: &Path) {
        if self.watches.target_of(dir) == Some(WatchTarget::Directory) {
            return;
        }

        match self.backend.watch_directory(dir) {
            Ok(()) => {
                self.watches.register(dir.to_path_buf(), WatchTarget::Directory);
                tracing::debug!(path = %dir.display(), "Watching directory");
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Directory left unwatched");
            }
        }
    }

    /// Check if `path` is a watched directory.
    #[must_use]
    pub fn is_watched_directory(&self, path: &Path) -> bool {
        self.watches.target_of(path) == Some(WatchTarget::Directory)
    }

    /// Check if `path` is a watched source file, loaded or not.
    #[must_use]
    pub fn is_watched_file(&self, path: &Path) -> bool {
        self.watches.target_of(path) == Some(WatchTarget::File)
    }

    /// Check if `path` has a published entry.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.shelf.read().contains_key(path)
    }

    /// Number of watched paths.
    #[must_use]
    pub fn watched_paths(&self) -> usize {
        self.watches.len()
    }

    fn publish_metrics(&self) {
        let (files, triples) = {
            let shelf = self.shelf.read();
            let triples = shelf.values().map(|e| e.index.fact_count()).sum();
            (shelf.len(), triples)
        };
        SOURCE_FILES.set(gauge_value(files));
        TRIPLES.set(gauge_value(triples));
        WATCHED_PATHS.set(gauge_value(self.watches.len()));
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("entries", &self.shelf.read().len())
            .field("watches", &self.watches.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
