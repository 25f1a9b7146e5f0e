//! nimbusdb-server: HTTP surface for nimbusdb.
//!
//! A thin dispatch layer over `nimbusdb-core`: inserts go to the WAL first
//! and the index second; searches go to the index directly. Process
//! bootstrap (logging, WAL replay, graceful shutdown) lives in `main.rs`.

/// HTTP API layer: Axum router, handlers, models, errors, metrics.
pub mod api;
