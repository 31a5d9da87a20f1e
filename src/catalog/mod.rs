//! Registry of loaded source files.
//!
//! This module provides:
//! - `Catalog`, the single writer owning entries and watch handles
//! - `CatalogReader` snapshots for concurrent queries
//! - Parallel parsing through `ParsePool`
//! - Source discovery and filtering

mod filter;
mod pool;
mod scanner;
mod store;
mod watches;

pub use filter::{SourceFilter, DEFAULT_EXTENSIONS};
pub use pool::{read_source, ParsePool, ParsedFile, ParsedSource, SourceContent};
pub use scanner::{discover, Discovery};
pub use store::{
    Catalog, CatalogConfig, CatalogEntry, CatalogReader, CatalogSnapshot, LoadOutcome,
    ReloadOutcome, SubtreeRemoval,
};
pub use watches::{DetachedBackend, WatchBackend, WatchHandle, WatchTable, WatchTarget, WatchedPath};
