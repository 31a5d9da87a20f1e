//! HTTP server.
//!
//! This module provides:
//! - REST API using axum (search page, lookup, label)
//! - Health, status and metrics endpoints
//! - Tracing setup and graceful shutdown

mod app;
mod observability;
mod rest;

pub use app::{App, ServerConfig};
pub use observability::{init_tracing, spans};
pub use rest::{create_rest_router, AppState, HealthResponse, SourceStatus, StatusResponse};
