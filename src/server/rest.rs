//! REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};

use crate::graph::Node;
use crate::metrics::WATCHED_PATHS;
use crate::query::QueryEngine;
use crate::watcher::{ReactorStats, ReactorStatsSnapshot};

/// Search page served to browsers.
const MAIN_PAGE: &str = include_str!("static/main.html");

const JSON_MEDIA_TYPE: &str = "application/json";

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: QueryEngine,
    pub stats: Arc<ReactorStats>,
}

impl AppState {
    /// Create handler state.
    #[must_use]
    pub const fn new(engine: QueryEngine, stats: Arc<ReactorStats>) -> Self {
        Self { engine, stats }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub source_files: usize,
}

/// Status response with catalog and reactor statistics.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub source_files: usize,
    pub triples: usize,
    pub watched_paths: i64,
    pub reactor: ReactorStatsSnapshot,
    pub sources: Vec<SourceStatus>,
}

/// One loaded source file.
#[derive(Debug, Serialize)]
pub struct SourceStatus {
    pub path: String,
    pub namespace: String,
    pub triples: usize,
    pub content_hash: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UriParams {
    uri: Option<String>,
}

/// Create REST API router.
pub fn create_rest_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/v1/lookup", get(lookup))
        .route("/api/v1/label", get(label))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/status", get(status))
        .with_state(state)
}

/// Check if the first media type of the `Accept` header asks for JSON.
fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(|accept| accept.split(',').next())
        .and_then(|first| first.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Search page, or the resource view when JSON is requested.
async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Response {
    if !wants_json(&headers) {
        return Html(MAIN_PAGE).into_response();
    }

    let Some(uri) = params.search.filter(|s| !s.is_empty()) else {
        return bad_request("missing 'search' parameter");
    };

    tracing::debug!(uri = %uri, "Resource search");
    Json(state.engine.resolve(&uri)).into_response()
}

/// Predicate groups of one resource.
async fn lookup(State(state): State<Arc<AppState>>, Query(params): Query<UriParams>) -> Response {
    match params.uri.filter(|s| !s.is_empty()) {
        Some(uri) => Json(state.engine.lookup(&uri)).into_response(),
        None => bad_request("missing 'uri' parameter"),
    }
}

/// Labels of one resource.
async fn label(State(state): State<Arc<AppState>>, Query(params): Query<UriParams>) -> Response {
    match params.uri.filter(|s| !s.is_empty()) {
        Some(uri) => Json(state.engine.label(&Node::iri(uri))).into_response(),
        None => bad_request("missing 'uri' parameter"),
    }
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        source_files: state.engine.reader().len(),
    };

    tracing::debug!(source_files = response.source_files, "Health check");

    (StatusCode::OK, Json(response))
}

/// Prometheus metrics endpoint.
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            tracing::trace!("Metrics encoded successfully");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                buffer,
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                b"Failed to encode metrics".to_vec(),
            )
        }
    }
}

/// Status endpoint with statistics.
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.reader().snapshot();

    let response = StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        source_files: snapshot.len(),
        triples: snapshot.triple_count(),
        watched_paths: WATCHED_PATHS.get(),
        reactor: state.stats.snapshot(),
        sources: snapshot
            .iter()
            .map(|entry| SourceStatus {
                path: entry.source_path().display().to_string(),
                namespace: entry.namespace().to_string(),
                triples: entry.index().fact_count(),
                content_hash: entry.content_hash().to_string(),
                loaded_at: entry.loaded_at(),
            })
            .collect(),
    };

    tracing::debug!(
        source_files = response.source_files,
        triples = response.triples,
        "Status retrieved"
    );

    Json(response)
}
