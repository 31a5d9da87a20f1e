//! File system watching.
//!
//! This module provides:
//! - Translation of notify events into reactor events
//! - The notify-backed directory watcher
//! - The reactor applying events to the catalog

mod backend;
mod events;
mod reactor;

pub use backend::FileWatcher;
pub use events::{translate, FsEvent, FsEventKind};
pub use reactor::{Reaction, ReactorState, ReactorStats, ReactorStatsSnapshot, WatchReactor};
