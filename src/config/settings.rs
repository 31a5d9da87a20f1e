//! Configuration settings and validation.

use crate::catalog::{CatalogConfig, SourceFilter, DEFAULT_EXTENSIONS};
use crate::{Error, Result};
use std::path::PathBuf;

/// Upper bound for parse worker threads.
const MAX_PARSE_THREADS: usize = 64;

/// Main configuration for the viewer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the directory tree holding the source files.
    pub root_path: PathBuf,

    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Number of parse worker threads.
    pub parse_threads: usize,

    /// File extensions treated as source files.
    pub extensions: Vec<String>,

    /// Skip files matched by `.gitignore` during discovery.
    pub respect_gitignore: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            host: "localhost".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            parse_threads: default_parse_threads(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            respect_gitignore: false,
        }
    }
}

/// Available parallelism, capped at 8.
#[must_use]
pub fn default_parse_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4)
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        // Validate port
        if self.port == 0 {
            return Err(Error::config("port cannot be 0"));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.parse_threads == 0 {
            return Err(Error::config("parse_threads cannot be 0"));
        }

        if self.parse_threads > MAX_PARSE_THREADS {
            return Err(Error::config(format!(
                "parse_threads cannot exceed {MAX_PARSE_THREADS}"
            )));
        }

        // Validate host is not empty
        if self.host.is_empty() {
            return Err(Error::config("host cannot be empty"));
        }

        if SourceFilter::new(&self.extensions).extensions().is_empty() {
            return Err(Error::config("extensions cannot be empty"));
        }

        if !self.root_path.is_dir() {
            return Err(Error::config(format!(
                "root path '{}' is not an existing directory",
                self.root_path.display()
            )));
        }

        Ok(())
    }

    /// Get the server address as a string.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Catalog settings derived from this configuration.
    #[must_use]
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            parse_threads: self.parse_threads,
            filter: SourceFilter::new(&self.extensions),
            respect_gitignore: self.respect_gitignore,
        }
    }
}
