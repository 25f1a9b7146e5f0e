//! Compile-time configuration constants for nimbusdb.
//!
//! Runtime configuration (port, WAL path, index tuning) is handled via CLI
//! arguments in the server's `main.rs`.

/// Default number of bidirectional links per HNSW node on non-zero layers.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during HNSW index construction.
///
/// Width of the candidate set maintained while linking a new node.
/// Higher values produce a better graph but slow down inserts.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default ef parameter during HNSW search.
///
/// Raised to `k` per query when `k` is larger. Higher values improve
/// recall at the cost of latency.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 50;

/// Maximum number of results (`k`) per search request.
pub const MAX_K: usize = 10_000;

/// Upper bound on the per-record vector length accepted during WAL replay.
///
/// A length field above this is treated as corruption and terminates replay
/// rather than triggering a multi-gigabyte allocation.
pub const WAL_MAX_VECTOR_COMPONENTS: usize = 1 << 24;

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 7878;

/// Default write-ahead log path.
pub const DEFAULT_WAL_PATH: &str = "./nimbus.wal";

/// Per-request timeout in seconds, enforced at the HTTP seam.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum HTTP request body size in bytes (10 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Interval between background metrics gauge updates, in seconds.
pub const METRICS_UPDATE_INTERVAL_SECS: u64 = 15;
