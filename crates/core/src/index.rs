//! The search result type and the contract all vector indexes implement.

use crate::error::Result;

/// A single search hit: the external id and its cosine similarity to the
/// query, in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    pub score: f32,
}

/// Contract for any vector indexing algorithm (HNSW, linear scan, ...).
///
/// Implementations must tolerate concurrent calls from multiple threads.
pub trait VectorIndex: Send + Sync {
    /// Stores `vector` under `id`.
    fn insert(&self, id: &str, vector: &[f32]) -> Result<()>;

    /// Returns up to `k` matches sorted by descending similarity.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Match>>;
}
