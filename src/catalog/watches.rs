//! Watch handles and the backend that delivers notifications for them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::WatchError;

/// Opaque identifier of one watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WatchHandle(u64);

/// What kind of path a watch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchTarget {
    /// Creations and deletions of the directory's children.
    Directory,
    /// Content changes of one source file.
    File,
}

/// A path registered in the watch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedPath {
    pub path: PathBuf,
    pub target: WatchTarget,
}

/// Notification source for directory watches.
///
/// File watches are logical: the directory watch of the parent delivers
/// their content events, the table only decides which ones are acted on.
pub trait WatchBackend: Send {
    /// Start receiving events for the direct children of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the watch.
    fn watch_directory(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Stop receiving events for `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path was not watched by the platform.
    fn unwatch_directory(&mut self, path: &Path) -> Result<(), WatchError>;
}

/// Backend that accepts every registration and never produces events.
///
/// Used when events are fed to the reactor by other means.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedBackend;

impl WatchBackend for DetachedBackend {
    fn watch_directory(&mut self, _path: &Path) -> Result<(), WatchError> {
        Ok(())
    }

    fn unwatch_directory(&mut self, _path: &Path) -> Result<(), WatchError> {
        Ok(())
    }
}

/// Bidirectional map between watch handles and watched paths.
#[derive(Debug, Default)]
pub struct WatchTable {
    next_handle: u64,
    by_handle: HashMap<WatchHandle, WatchedPath>,
    by_path: HashMap<PathBuf, WatchHandle>,
}

impl WatchTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path`, returning the existing handle if already watched.
    pub fn register(&mut self, path: impl Into<PathBuf>, target: WatchTarget) -> WatchHandle {
        let path = path.into();
        if let Some(handle) = self.by_path.get(&path) {
            return *handle;
        }

        let handle = WatchHandle(self.next_handle);
        self.next_handle += 1;
        self.by_path.insert(path.clone(), handle);
        self.by_handle.insert(handle, WatchedPath { path, target });
        handle
    }

    /// Release a handle.
    pub fn release(&mut self, handle: WatchHandle) -> Option<WatchedPath> {
        let watched = self.by_handle.remove(&handle)?;
        self.by_path.remove(&watched.path);
        Some(watched)
    }

    /// Release the handle watching `path`, if any.
    pub fn release_path(&mut self, path: &Path) -> Option<WatchedPath> {
        let handle = self.by_path.remove(path)?;
        self.by_handle.remove(&handle)
    }

    /// Release every handle on `dir` or a path below it.
    pub fn release_under(&mut self, dir: &Path) -> Vec<WatchedPath> {
        let doomed: Vec<WatchHandle> = self
            .by_handle
            .iter()
            .filter(|(_, watched)| watched.path.starts_with(dir))
            .map(|(handle, _)| *handle)
            .collect();

        let mut released: Vec<WatchedPath> = doomed
            .into_iter()
            .filter_map(|handle| self.release(handle))
            .collect();
        released.sort_by(|a, b| a.path.cmp(&b.path));
        released
    }

    /// Handle watching `path`.
    #[must_use]
    pub fn handle_for(&self, path: &Path) -> Option<WatchHandle> {
        self.by_path.get(path).copied()
    }

    /// Path watched by `handle`.
    #[must_use]
    pub fn get(&self, handle: WatchHandle) -> Option<&WatchedPath> {
        self.by_handle.get(&handle)
    }

    /// Kind of watch registered on `path`.
    #[must_use]
    pub fn target_of(&self, path: &Path) -> Option<WatchTarget> {
        self.handle_for(path)
            .and_then(|handle| self.get(handle))
            .map(|watched| watched.target)
    }

    /// Number of watched paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Check if nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut table = WatchTable::new();
        let a = table.register("/data/a.ttl", WatchTarget::File);
        let again = table.register("/data/a.ttl", WatchTarget::File);
        let b = table.register("/data/b.ttl", WatchTarget::File);

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_release_keeps_maps_in_sync() {
        let mut table = WatchTable::new();
        let a = table.register("/data/a.ttl", WatchTarget::File);

        let released = table.release(a).unwrap();
        assert_eq!(released.path, PathBuf::from("/data/a.ttl"));
        assert!(table.handle_for(Path::new("/data/a.ttl")).is_none());
        assert!(table.release(a).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_release_path() {
        let mut table = WatchTable::new();
        table.register("/data", WatchTarget::Directory);

        assert_eq!(table.target_of(Path::new("/data")), Some(WatchTarget::Directory));
        let released = table.release_path(Path::new("/data")).unwrap();
        assert_eq!(released.target, WatchTarget::Directory);
        assert!(table.release_path(Path::new("/data")).is_none());
    }

    #[test]
    fn test_release_under_is_component_wise() {
        let mut table = WatchTable::new();
        table.register("/data/a", WatchTarget::Directory);
        table.register("/data/a/x.ttl", WatchTarget::File);
        table.register("/data/a/sub", WatchTarget::Directory);
        table.register("/data/ab", WatchTarget::Directory);
        table.register("/data/ab/y.ttl", WatchTarget::File);

        let released = table.release_under(Path::new("/data/a"));
        let paths: Vec<&Path> = released.iter().map(|w| w.path.as_path()).collect();

        assert_eq!(
            paths,
            vec![
                Path::new("/data/a"),
                Path::new("/data/a/sub"),
                Path::new("/data/a/x.ttl"),
            ]
        );
        assert_eq!(table.len(), 2);
        assert!(table.handle_for(Path::new("/data/ab/y.ttl")).is_some());
    }

    #[test]
    fn test_detached_backend_accepts_everything() {
        let mut backend = DetachedBackend;
        assert!(backend.watch_directory(Path::new("/anywhere")).is_ok());
        assert!(backend.unwatch_directory(Path::new("/anywhere")).is_ok());
    }
}
