//! Prometheus metrics recording and background gauge collection.

use metrics::{counter, gauge, histogram};
use nimbusdb_core::hnsw::HnswIndex;
use std::path::Path;
use std::time::Duration;

/// Records per-request HTTP metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Counts one insert attempt by outcome.
pub fn record_insert(outcome: &'static str) {
    counter!("nimbus_inserts_total", "outcome" => outcome).increment(1);
}

/// Counts one search request.
pub fn record_search() {
    counter!("nimbus_searches_total").increment(1);
}

/// Updates the index-size and WAL-size gauges.
pub fn update_index_metrics(index: &HnswIndex, wal_path: &Path) {
    gauge!("nimbus_vectors_total").set(index.len() as f64);
    if let Ok(meta) = std::fs::metadata(wal_path) {
        gauge!("nimbus_wal_size_bytes").set(meta.len() as f64);
    }
}
