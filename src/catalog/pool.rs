//! Parse worker thread pool.
//!
//! Workers read and parse source files and hand back finished indexes.
//! They never touch the catalog; the caller commits the results.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blake3::Hasher;
use crossbeam_channel::{bounded, unbounded, Receiver, SendError, Sender};

use crate::error::ParseError;
use crate::graph::{FactParser, TripleIndex};
use crate::Result;

/// Raw content of a source file and its hash.
#[derive(Debug, Clone)]
pub struct SourceContent {
    pub bytes: Vec<u8>,
    pub hash: String,
}

/// A successfully parsed source file.
#[derive(Debug)]
pub struct ParsedSource {
    pub index: TripleIndex,
    pub content_hash: String,
}

/// Result of parsing one path.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub result: std::result::Result<ParsedSource, ParseError>,
}

/// Request to parse one file.
struct ParseJob {
    path: PathBuf,
    reply_tx: Sender<ParsedFile>,
}

/// Worker pool for parsing source files in parallel.
pub struct ParsePool {
    parser: Arc<dyn FactParser>,
    job_tx: Sender<ParseJob>,
    workers: Vec<std::thread::JoinHandle<()>>,
}

impl ParsePool {
    /// Create a new parse pool.
    ///
    /// # Arguments
    ///
    /// * `parser` - Parser shared by all workers
    /// * `num_workers` - Number of worker threads (at least one is started)
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be spawned.
    pub fn new(parser: Arc<dyn FactParser>, num_workers: usize) -> Result<Self> {
        let num_workers = num_workers.max(1);
        let (job_tx, job_rx): (Sender<ParseJob>, Receiver<ParseJob>) = bounded(100);
        let mut workers = Vec::with_capacity(num_workers);

        for i in 0..num_workers {
            let parser = Arc::clone(&parser);
            let rx = job_rx.clone();

            let handle = std::thread::Builder::new()
                .name(format!("parse-worker-{i}"))
                .spawn(move || worker_loop(&*parser, &rx))?;

            workers.push(handle);
        }

        tracing::info!(num_workers, "Parse worker pool started");

        Ok(Self {
            parser,
            job_tx,
            workers,
        })
    }

    /// The parser the workers use.
    #[must_use]
    pub fn parser(&self) -> &dyn FactParser {
        &*self.parser
    }

    /// Parse every path in parallel and wait for all of them.
    ///
    /// Results are sorted by path. A failure only affects its own path.
    #[must_use]
    pub fn parse_all(&self, paths: &[PathBuf]) -> Vec<ParsedFile> {
        let (reply_tx, reply_rx) = unbounded();
        let mut results = Vec::with_capacity(paths.len());
        let mut pending = 0_usize;

        for path in paths {
            let job = ParseJob {
                path: path.clone(),
                reply_tx: reply_tx.clone(),
            };
            match self.job_tx.send(job) {
                Ok(()) => pending += 1,
                Err(SendError(job)) => results.push(ParsedFile {
                    path: job.path,
                    result: Err(ParseError::WorkerPool(
                        "parse workers have shut down".to_string(),
                    )),
                }),
            }
        }
        drop(reply_tx);

        // Ends early if a worker dies holding a job.
        results.extend(reply_rx.iter().take(pending));

        if results.len() < paths.len() {
            let answered: HashSet<PathBuf> = results.iter().map(|r| r.path.clone()).collect();
            for path in paths.iter().filter(|p| !answered.contains(*p)) {
                results.push(ParsedFile {
                    path: path.clone(),
                    result: Err(ParseError::WorkerPool(format!(
                        "worker dropped job for '{}'",
                        path.display()
                    ))),
                });
            }
        }

        results.sort_by(|a, b| a.path.cmp(&b.path));
        results
    }
}

impl std::fmt::Debug for ParsePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsePool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

/// Worker loop that processes parse jobs until the pool is dropped.
fn worker_loop(parser: &dyn FactParser, job_rx: &Receiver<ParseJob>) {
    for job in job_rx {
        let result = read_source(&job.path).and_then(|content| parse_source(parser, &job.path, content));

        match &result {
            Ok(source) => tracing::debug!(
                path = %job.path.display(),
                triples = source.index.fact_count(),
                "Parsed source file"
            ),
            Err(e) => tracing::debug!(path = %job.path.display(), error = %e, "Parse failed"),
        }

        // Receiver gone means the caller stopped waiting.
        let _ = job.reply_tx.send(ParsedFile {
            path: job.path,
            result,
        });
    }
    tracing::debug!("Parse worker shutting down");
}

/// Read a source file and hash its content.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read.
pub fn read_source(path: &Path) -> std::result::Result<SourceContent, ParseError> {
    let bytes = std::fs::read(path).map_err(|e| ParseError::io(path, e))?;
    let hash = compute_hash(&bytes);
    Ok(SourceContent { bytes, hash })
}

/// Parse already-read content into an index.
///
/// # Errors
///
/// Returns the parser's error if the content is malformed.
pub fn parse_source(
    parser: &dyn FactParser,
    path: &Path,
    content: SourceContent,
) -> std::result::Result<ParsedSource, ParseError> {
    let facts = parser.parse(path, &content.bytes)?;
    Ok(ParsedSource {
        index: TripleIndex::build(facts),
        content_hash: content.hash,
    })
}

/// Compute blake3 hash of content.
fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}
