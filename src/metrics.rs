//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Source files currently in the catalog.
pub static SOURCE_FILES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("rdf_viewer_source_files", "Number of loaded source files").unwrap()
});

/// Facts across all loaded source files.
pub static TRIPLES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("rdf_viewer_triples", "Number of indexed triples").unwrap()
});

/// Directories and files under watch.
pub static WATCHED_PATHS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("rdf_viewer_watched_paths", "Number of watched paths").unwrap()
});

/// Failed parses, at startup or on change.
pub static PARSE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rdf_viewer_parse_failures_total",
        "Total number of source files that failed to parse"
    )
    .unwrap()
});

/// Filesystem events applied by the reactor.
pub static REACTOR_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rdf_viewer_reactor_events_total",
        "Total number of filesystem events applied",
        &["kind"]
    )
    .unwrap()
});

/// Lookup latency histogram.
pub static LOOKUP_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "rdf_viewer_lookup_duration_seconds",
        "Lookup latency in seconds",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*SOURCE_FILES;
    let _ = &*TRIPLES;
    let _ = &*WATCHED_PATHS;
    let _ = &*PARSE_FAILURES;
    let _ = &*REACTOR_EVENTS;
    let _ = &*LOOKUP_LATENCY;

    tracing::debug!("Prometheus metrics initialized");
}

/// Convert a count to a gauge value.
#[allow(clippy::cast_possible_wrap)]
pub(crate) const fn gauge_value(count: usize) -> i64 {
    count as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_init() {
        init_metrics();

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "rdf_viewer_source_files"));
        assert!(names.iter().any(|n| n == "rdf_viewer_triples"));

        let before = REACTOR_EVENTS.with_label_values(&["created"]).get();
        REACTOR_EVENTS.with_label_values(&["created"]).inc();
        assert!(REACTOR_EVENTS.with_label_values(&["created"]).get() > before);
    }

    #[test]
    fn test_gauge_value() {
        assert_eq!(gauge_value(0), 0);
        assert_eq!(gauge_value(42), 42);
    }
}
