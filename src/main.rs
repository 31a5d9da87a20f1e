//! RDF Viewer - live lookup over a tree of Turtle files
//!
//! Entry point for the viewer server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use rdf_viewer::catalog::Catalog;
use rdf_viewer::config::default_parse_threads;
use rdf_viewer::graph::TurtleParser;
use rdf_viewer::metrics::init_metrics;
use rdf_viewer::query::QueryEngine;
use rdf_viewer::server::{init_tracing, App, AppState, ServerConfig};
use rdf_viewer::watcher::{FileWatcher, WatchReactor};
use rdf_viewer::{Config, Error, Result};

/// Loads Turtle files and serves lookups over HTTP, following changes to
/// the files while running
#[derive(Parser, Debug)]
#[command(name = "rdf-viewer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory with the source files to serve
    #[arg(long, alias = "root_path", env = "RDF_VIEWER_ROOT")]
    root_path: std::path::PathBuf,

    /// Host address to bind to
    #[arg(long, env = "RDF_VIEWER_HOST", default_value = "localhost")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "RDF_VIEWER_PORT", default_value = "8000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RDF_VIEWER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "RDF_VIEWER_LOG_JSON")]
    log_json: bool,

    /// Number of parse worker threads
    #[arg(long, env = "RDF_VIEWER_PARSE_THREADS", default_value_t = default_parse_threads())]
    parse_threads: usize,

    /// File extensions loaded as sources
    #[arg(long, env = "RDF_VIEWER_EXTENSIONS", value_delimiter = ',', default_value = "ttl")]
    extensions: Vec<String>,

    /// Skip files ignored by .gitignore
    #[arg(long, env = "RDF_VIEWER_RESPECT_GITIGNORE")]
    respect_gitignore: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with configuration
    init_tracing(&cli.log_level, cli.log_json)?;

    tracing::info!(
        "RDF Viewer v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Build config from CLI
    let config = Config {
        root_path: cli.root_path,
        host: cli.host,
        port: cli.port,
        log_level: cli.log_level,
        parse_threads: cli.parse_threads,
        extensions: cli.extensions,
        respect_gitignore: cli.respect_gitignore,
    };

    tracing::debug!(?config, "Configuration loaded");

    // Validate config
    config.validate()?;

    init_metrics();

    // Directory watches are registered before files are read, so changes
    // made during the initial load queue up for the reactor.
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let watcher = FileWatcher::new(event_tx)?;
    let mut catalog = Catalog::new(
        config.catalog_config(),
        Arc::new(TurtleParser::new()),
        Box::new(watcher),
    )?;
    let engine = QueryEngine::new(catalog.reader());

    tracing::info!(root = %config.root_path.display(), "Loading source files");
    let root = config.root_path.clone();
    let catalog = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let outcomes = catalog.add_watched_directory(&root);
        let snapshot = catalog.reader().snapshot();
        tracing::info!(
            files = snapshot.len(),
            failed = outcomes.iter().filter(|o| !o.is_loaded()).count(),
            triples = snapshot.triple_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "Initial load done"
        );
        catalog
    })
    .await
    .map_err(|e| Error::internal(format!("initial load failed: {e}")))?;

    let reactor = WatchReactor::new(catalog);
    let stats = reactor.stats();
    // The reactor owns the watcher feeding it and runs until the process exits.
    let _reactor = reactor.spawn(event_rx)?;

    let server_config = ServerConfig {
        host: config.host,
        port: config.port,
    };

    let app = App::new(server_config, AppState::new(engine, stats));
    app.run().await
}
