//! Applies file system events to the catalog.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use serde::Serialize;

use super::events::{FsEvent, FsEventKind};
use crate::catalog::{Catalog, LoadOutcome, ReloadOutcome, SourceFilter, SubtreeRemoval};
use crate::error::ParseError;
use crate::metrics::REACTOR_EVENTS;
use crate::Result;

/// Statistics for event reactions.
#[derive(Debug, Default)]
pub struct ReactorStats {
    pub events_received: AtomicU64,
    pub events_ignored: AtomicU64,
    pub files_loaded: AtomicU64,
    pub files_reloaded: AtomicU64,
    pub files_removed: AtomicU64,
    pub subtrees_removed: AtomicU64,
    pub errors: AtomicU64,
}

impl ReactorStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> ReactorStatsSnapshot {
        ReactorStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            files_loaded: self.files_loaded.load(Ordering::Relaxed),
            files_reloaded: self.files_reloaded.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            subtrees_removed: self.subtrees_removed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64, by: usize) {
        counter.fetch_add(by as u64, Ordering::Relaxed);
    }
}

/// Snapshot of reactor stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactorStatsSnapshot {
    pub events_received: u64,
    pub events_ignored: u64,
    pub files_loaded: u64,
    pub files_reloaded: u64,
    pub files_removed: u64,
    pub subtrees_removed: u64,
    pub errors: u64,
}

/// Whether the reactor is waiting or inside a catalog mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorState {
    Idle,
    Applying,
}

/// What the reactor did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// A watched file changed and was re-parsed.
    Reloaded(ReloadOutcome),
    /// A watched file changed but could not be re-parsed.
    ReloadFailed(ParseError),
    /// A new source file appeared.
    Loaded(Vec<LoadOutcome>),
    /// A new directory appeared and was scanned.
    DirectoryAdded(Vec<LoadOutcome>),
    /// A source file disappeared.
    Removed { existed: bool },
    /// A directory disappeared.
    SubtreeRemoved(SubtreeRemoval),
    /// Nothing to do.
    Ignored,
}

/// The only writer of the catalog once it is running.
///
/// Events are applied one at a time in arrival order.
pub struct WatchReactor {
    catalog: Catalog,
    stats: Arc<ReactorStats>,
    state: ReactorState,
}

impl WatchReactor {
    /// Create a reactor owning `catalog`.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self::with_stats(catalog, ReactorStats::new())
    }

    /// Create a reactor that records into shared `stats`.
    #[must_use]
    pub fn with_stats(catalog: Catalog, stats: Arc<ReactorStats>) -> Self {
        Self {
            catalog,
            stats,
            state: ReactorState::Idle,
        }
    }

    /// The catalog being maintained.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn state(&self) -> ReactorState {
        self.state
    }

    /// Get current stats.
    #[must_use]
    pub fn stats(&self) -> Arc<ReactorStats> {
        Arc::clone(&self.stats)
    }

    /// Apply one event to the catalog.
    pub fn apply(&mut self, event: FsEvent) -> Reaction {
        self.state = ReactorState::Applying;
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);
        REACTOR_EVENTS.with_label_values(&[event.kind.as_str()]).inc();

        tracing::debug!(
            kind = event.kind.as_str(),
            is_dir = event.is_dir,
            path = %event.path.display(),
            "Applying event"
        );

        let reaction = self.react(&event);
        self.record(&reaction);

        self.state = ReactorState::Idle;
        reaction
    }

    fn react(&mut self, event: &FsEvent) -> Reaction {
        let path = event.path.as_path();

        match (event.kind, event.is_dir) {
            (FsEventKind::ContentModified, false) => match self.catalog.reload(path) {
                Ok(ReloadOutcome::Untracked) => Reaction::Ignored,
                Ok(outcome) => Reaction::Reloaded(outcome),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Reload failed, keeping previous index");
                    Reaction::ReloadFailed(e)
                }
            },
            (FsEventKind::ContentModified, true) => Reaction::Ignored,
            (FsEventKind::Created, true) => {
                if SourceFilter::is_hidden(path) {
                    Reaction::Ignored
                } else {
                    Reaction::DirectoryAdded(self.catalog.add_watched_directory(path))
                }
            }
            (FsEventKind::Created, false) => {
                if self.catalog.filter().is_source_file(path) {
                    Reaction::Loaded(self.catalog.load_bulk([path]))
                } else {
                    Reaction::Ignored
                }
            }
            (FsEventKind::Deleted, true) => {
                Reaction::SubtreeRemoved(self.catalog.remove_subtree(path))
            }
            (FsEventKind::Deleted, false) => {
                // Deleted directories are often reported without the folder flag.
                if self.catalog.is_watched_directory(path) {
                    Reaction::SubtreeRemoved(self.catalog.remove_subtree(path))
                } else if self.catalog.is_watched_file(path) || self.catalog.contains(path) {
                    Reaction::Removed {
                        existed: self.catalog.remove(path),
                    }
                } else {
                    Reaction::Ignored
                }
            }
        }
    }

    fn record(&self, reaction: &Reaction) {
        let stats = &self.stats;
        match reaction {
            Reaction::Reloaded(ReloadOutcome::Unchanged) | Reaction::Ignored => {
                ReactorStats::bump(&stats.events_ignored, 1);
            }
            Reaction::Reloaded(ReloadOutcome::Loaded { .. }) => {
                ReactorStats::bump(&stats.files_loaded, 1);
            }
            Reaction::Reloaded(_) => ReactorStats::bump(&stats.files_reloaded, 1),
            Reaction::ReloadFailed(_) => ReactorStats::bump(&stats.errors, 1),
            Reaction::Loaded(outcomes) | Reaction::DirectoryAdded(outcomes) => {
                let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
                ReactorStats::bump(&stats.files_loaded, loaded);
                ReactorStats::bump(&stats.errors, outcomes.len() - loaded);
            }
            Reaction::Removed { existed } => {
                ReactorStats::bump(&stats.files_removed, usize::from(*existed));
            }
            Reaction::SubtreeRemoved(removal) => {
                ReactorStats::bump(&stats.subtrees_removed, 1);
                ReactorStats::bump(&stats.files_removed, removal.entries);
            }
        }
    }

    /// Apply events until every sender is gone.
    pub fn run(mut self, event_rx: &Receiver<FsEvent>) {
        tracing::info!("Watch reactor started");

        for event in event_rx {
            self.apply(event);
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            received = snapshot.events_received,
            errors = snapshot.errors,
            "Event channel closed, watch reactor stopped"
        );
    }

    /// Run the reactor on its own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(self, event_rx: Receiver<FsEvent>) -> Result<JoinHandle<()>> {
        let handle = std::thread::Builder::new()
            .name("watch-reactor".to_string())
            .spawn(move || self.run(&event_rx))?;
        Ok(handle)
    }
}

impl std::fmt::Debug for WatchReactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchReactor")
            .field("catalog", &self.catalog)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogConfig, DetachedBackend};
    use crate::graph::{Node, TurtleParser};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const ALICE: &str = "<http://ex.org/Alice> <http://ex.org/knows> <http://ex.org/Bob> .\n";
    const BOB: &str = "<http://ex.org/Bob> <http://ex.org/knows> <http://ex.org/Carol> .\n";

    fn reactor_for(root: &Path) -> WatchReactor {
        let config = CatalogConfig {
            parse_threads: 2,
            ..CatalogConfig::default()
        };
        let mut catalog = Catalog::new(
            config,
            Arc::new(TurtleParser::new()),
            Box::new(DetachedBackend),
        )
        .unwrap();
        catalog.add_watched_directory(root);
        WatchReactor::new(catalog)
    }

    #[test]
    fn test_created_source_file_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let mut reactor = reactor_for(tmp.path());

        let path = tmp.path().join("a.ttl");
        fs::write(&path, ALICE).unwrap();

        let reaction = reactor.apply(FsEvent::created(&path, false));
        assert!(matches!(&reaction, Reaction::Loaded(outcomes) if outcomes[0].is_loaded()));
        assert!(reactor.catalog().contains(&path));
        assert_eq!(reactor.state(), ReactorState::Idle);
    }

    #[test]
    fn test_created_non_source_file_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut reactor = reactor_for(tmp.path());

        let path = tmp.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();

        assert_eq!(reactor.apply(FsEvent::created(&path, false)), Reaction::Ignored);
        assert_eq!(reactor.stats().snapshot().events_ignored, 1);
    }

    #[test]
    fn test_modified_file_is_reloaded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ttl");
        fs::write(&path, ALICE).unwrap();
        let mut reactor = reactor_for(tmp.path());

        fs::write(&path, format!("{ALICE}{BOB}")).unwrap();
        assert_eq!(
            reactor.apply(FsEvent::modified(&path)),
            Reaction::Reloaded(ReloadOutcome::Replaced { triples: 2 })
        );
        assert_eq!(reactor.stats().snapshot().files_reloaded, 1);
    }

    #[test]
    fn test_modified_to_broken_keeps_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ttl");
        fs::write(&path, ALICE).unwrap();
        let mut reactor = reactor_for(tmp.path());
        let reader = reactor.catalog().reader();

        fs::write(&path, "<http://ex.org/Alice> <http://ex.org/knows> .").unwrap();
        let reaction = reactor.apply(FsEvent::modified(&path));

        assert!(matches!(reaction, Reaction::ReloadFailed(ParseError::Syntax { .. })));
        let snapshot = reader.snapshot();
        assert!(snapshot
            .get(&path)
            .unwrap()
            .index()
            .contains(&Node::iri("http://ex.org/Bob")));
        assert_eq!(reactor.stats().snapshot().errors, 1);
    }

    #[test]
    fn test_deleted_file_is_removed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ttl");
        fs::write(&path, ALICE).unwrap();
        let mut reactor = reactor_for(tmp.path());

        fs::remove_file(&path).unwrap();
        assert_eq!(
            reactor.apply(FsEvent::deleted(&path, false)),
            Reaction::Removed { existed: true }
        );
        assert!(reactor.catalog().reader().is_empty());
    }

    #[test]
    fn test_created_directory_is_scanned() {
        let tmp = TempDir::new().unwrap();
        let mut reactor = reactor_for(tmp.path());

        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.ttl"), ALICE).unwrap();

        let reaction = reactor.apply(FsEvent::created(&sub, true));
        assert!(matches!(&reaction, Reaction::DirectoryAdded(outcomes) if outcomes.len() == 1));
        assert!(reactor.catalog().is_watched_directory(&sub));
        assert!(reactor.catalog().contains(&sub.join("a.ttl")));
    }

    #[test]
    fn test_hidden_directory_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut reactor = reactor_for(tmp.path());

        let hidden = tmp.path().join(".git");
        fs::create_dir(&hidden).unwrap();

        assert_eq!(reactor.apply(FsEvent::created(&hidden, true)), Reaction::Ignored);
        assert!(!reactor.catalog().is_watched_directory(&hidden));
    }

    #[test]
    fn test_deleted_directory_without_folder_flag() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.ttl"), ALICE).unwrap();
        fs::write(tmp.path().join("b.ttl"), BOB).unwrap();
        let mut reactor = reactor_for(tmp.path());

        fs::remove_dir_all(&sub).unwrap();
        let reaction = reactor.apply(FsEvent::deleted(&sub, false));

        assert_eq!(
            reaction,
            Reaction::SubtreeRemoved(SubtreeRemoval {
                entries: 1,
                watches: 2,
            })
        );
        assert_eq!(reactor.catalog().reader().len(), 1);
    }

    #[test]
    fn test_run_drains_channel() {
        let tmp = TempDir::new().unwrap();
        let reactor = reactor_for(tmp.path());
        let reader = reactor.catalog().reader();
        let stats = reactor.stats();

        let path = tmp.path().join("a.ttl");
        fs::write(&path, ALICE).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = reactor.spawn(rx).unwrap();
        tx.send(FsEvent::created(&path, false)).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(reader.len(), 1);
        assert_eq!(stats.snapshot().events_received, 1);
    }
}
