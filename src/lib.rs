//! RDF Viewer Library
//!
//! Live in-memory index of RDF source files under a directory tree, kept
//! current by file system events and queried over HTTP.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod query;
pub mod server;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
