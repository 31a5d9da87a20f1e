//! Directory watching using notify-rs.

use std::path::Path;

use crossbeam_channel::Sender;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::events::{translate, FsEvent};
use crate::catalog::WatchBackend;
use crate::error::WatchError;
use crate::Result;

/// Watch backend delivering translated events to the reactor channel.
///
/// Directories are watched non-recursively; the catalog registers every
/// directory of the tree on its own.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a watcher sending events to `event_tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created.
    pub fn new(event_tx: Sender<FsEvent>) -> Result<Self> {
        let watcher = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for fs_event in translate(&event) {
                        if event_tx.send(fs_event).is_err() {
                            tracing::debug!("Reactor stopped, dropping event");
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Watch error");
                }
            },
        )
        .map_err(|e| WatchError::Init(e.to_string()))?;

        Ok(Self { watcher })
    }
}

impl WatchBackend for FileWatcher {
    fn watch_directory(&mut self, path: &Path) -> std::result::Result<(), WatchError> {
        if !path.is_dir() {
            return Err(WatchError::failed(path, "not a directory"));
        }

        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::failed(path, e))
    }

    fn unwatch_directory(&mut self, path: &Path) -> std::result::Result<(), WatchError> {
        self.watcher
            .unwatch(path)
            .map_err(|e| WatchError::failed(path, e))
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").finish_non_exhaustive()
    }
}
