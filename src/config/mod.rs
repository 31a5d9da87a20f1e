//! Configuration management for the viewer.
//!
//! Values come from command-line arguments, falling back to environment
//! variables and then defaults.

mod settings;

pub use settings::{default_parse_threads, Config};
