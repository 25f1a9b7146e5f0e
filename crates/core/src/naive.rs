//! Exact linear-scan index.
//!
//! O(n) per query, so it never sits on the request path; recall tests use
//! it as the ground-truth oracle the HNSW index is measured against.
//! Vectors are stored un-normalized and cosine similarity is computed in
//! full per comparison.

use crate::error::Result;
use crate::index::{Match, VectorIndex};
use crate::queue::MatchQueue;
use crate::vector;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Brute-force vector index backed by a map from external id to vector.
#[derive(Debug, Default)]
pub struct NaiveIndex {
    store: RwLock<HashMap<String, Vec<f32>>>,
}

impl NaiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }
}

impl VectorIndex for NaiveIndex {
    /// Stores the vector as given. An existing id is overwritten.
    fn insert(&self, id: &str, vector: &[f32]) -> Result<()> {
        self.store.write().insert(id.to_owned(), vector.to_vec());
        Ok(())
    }

    /// Scans every entry, keeping the top `k` by cosine similarity.
    /// Entries whose similarity cannot be computed (dimension mismatch,
    /// zero magnitude) are skipped.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Match>> {
        let store = self.store.read();
        let mut top = MatchQueue::new();
        for (id, v) in store.iter() {
            let Ok(score) = vector::cosine(query, v) else {
                continue;
            };
            top.push_with_limit(
                Match {
                    id: id.clone(),
                    score,
                },
                k,
            );
        }
        Ok(top.into_sorted_desc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_nearest_two_in_order() {
        let index = NaiveIndex::new();
        index.insert("A", &[1.0, 0.0, 1.0]).unwrap();
        index.insert("B", &[0.0, 1.0, 0.0]).unwrap();
        index.insert("C", &[0.0, 3.0, 4.0]).unwrap();
        index.insert("D", &[0.0, 1.0, 1.0]).unwrap();

        let results = index.search(&[0.0, 1.0, 1.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "D");
        assert_eq!(results[1].id, "C");
    }

    #[test]
    fn skips_mismatched_dimensions() {
        let index = NaiveIndex::new();
        index.insert("short", &[1.0, 0.0]).unwrap();
        index.insert("full", &[1.0, 0.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "full");
    }

    #[test]
    fn reinsert_overwrites() {
        let index = NaiveIndex::new();
        index.insert("a", &[1.0, 0.0]).unwrap();
        index.insert("a", &[0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 1);

        let results = index.search(&[0.0, 1.0], 1).unwrap();
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = NaiveIndex::new();
        assert!(index.search(&[1.0], 3).unwrap().is_empty());
    }
}
