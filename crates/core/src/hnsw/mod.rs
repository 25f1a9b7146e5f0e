//! Hierarchical Navigable Small World (HNSW) approximate nearest-neighbor
//! index.
//!
//! A multi-layer proximity graph: layer 0 holds every node, each higher
//! layer an exponentially thinner sample. A query descends from the top
//! entry point with a beam of one, then runs a wider beam search on layer 0.
//! Inserts and searches are safe to call concurrently from parallel OS
//! threads; see [`graph`] for the lock discipline.

/// Graph structure, configuration, node arena, and shared state.
pub mod graph;
/// Pooled per-operation scratch (visited set plus traversal heaps).
pub mod scratch;
/// Generation-stamped visited set.
pub mod visited;

mod insert;
mod search;

pub use graph::{HnswConfig, HnswIndex};

use crate::error::Result;
use crate::index::{Match, VectorIndex};

impl VectorIndex for HnswIndex {
    fn insert(&self, id: &str, vector: &[f32]) -> Result<()> {
        HnswIndex::insert(self, id, vector)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Match>> {
        HnswIndex::search(self, query, k)
    }
}
