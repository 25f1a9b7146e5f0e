//! HNSW search: greedy beam search within one layer, and the public
//! multi-layer k-nearest-neighbor query.

use crate::error::{Error, Result};
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::scratch::SearchScratch;
use crate::index::Match;
use crate::queue::Candidate;
use crate::vector;
use ordered_float::OrderedFloat;

impl HnswIndex {
    /// Returns up to `k` matches sorted by descending cosine similarity.
    ///
    /// Concurrent inserts may or may not appear in the result; the search
    /// runs over whatever subgraph is visible from its entry-point
    /// snapshot.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Match>> {
        if query.is_empty() {
            return Err(Error::EmptyVector);
        }
        let normalized = vector::normalize(query)?;

        let (entry_point, max_level) = {
            let state = self.state.read();
            (state.entry_point, state.max_level)
        };
        if max_level < 0 {
            return Ok(Vec::new());
        }

        let mut scratch = self.scratch.acquire();

        // Descend to layer 1 with a beam of one.
        let mut current = entry_point;
        for layer in (1..=max_level as usize).rev() {
            self.search_layer(&normalized, &[current], 1, layer, &mut scratch);
            if let Some(best) = scratch.results.drain_desc().pop() {
                current = best.id;
            }
        }

        // Full-width search at layer 0.
        let ef = self.config.ef_search.max(k);
        self.search_layer(&normalized, &[current], ef, 0, &mut scratch);
        let ranked = scratch.results.drain_desc();
        self.scratch.release(scratch);

        // Resolve external ids closest-first under one read lock.
        let state = self.state.read();
        let mut matches = Vec::with_capacity(k.min(ranked.len()));
        for candidate in ranked.iter().rev().take(k) {
            if let Some(external) = state.internal_to_id.get(&candidate.id) {
                matches.push(Match {
                    id: external.clone(),
                    score: 1.0 - candidate.dist.into_inner(),
                });
            }
        }
        Ok(matches)
    }

    /// Greedy beam search within a single layer.
    ///
    /// Seeds both heaps with the entry points, then repeatedly expands the
    /// closest unexpanded candidate until the closest remaining candidate
    /// cannot improve a full top-`ef` set. Neighbor lists are copied out
    /// under the owning node's read lock before any distance work. Results
    /// are left in `scratch.results` for the caller to drain.
    pub(crate) fn search_layer(
        &self,
        query: &[f32],
        entries: &[u64],
        ef: usize,
        layer: usize,
        scratch: &mut SearchScratch,
    ) {
        scratch.reset(ef);
        let SearchScratch {
            visited,
            candidates,
            results,
        } = scratch;

        for node in self.resolve(entries) {
            if !visited.insert(node.internal_id) {
                continue;
            }
            let dist = OrderedFloat(vector::cosine_distance(query, &node.vector));
            candidates.push(Candidate {
                dist,
                id: node.internal_id,
            });
            results.push(Candidate {
                dist,
                id: node.internal_id,
            });
        }

        while let Some(current) = candidates.pop() {
            if results.is_full() {
                if let Some(furthest) = results.furthest() {
                    // No unvisited neighbor can improve the top-ef set.
                    if current.dist > furthest {
                        break;
                    }
                }
            }

            let Some(node) = self.node_by_id(current.id) else {
                continue;
            };
            let Some(neighbor_ids) = node.neighbors_at(layer) else {
                continue;
            };

            for neighbor_id in neighbor_ids {
                if !visited.insert(neighbor_id) {
                    continue;
                }
                let Some(neighbor) = self.node_by_id(neighbor_id) else {
                    continue;
                };
                let dist = OrderedFloat(vector::cosine_distance(query, &neighbor.vector));
                if !results.is_full() || results.furthest().is_some_and(|f| dist < f) {
                    candidates.push(Candidate {
                        dist,
                        id: neighbor_id,
                    });
                    results.push(Candidate {
                        dist,
                        id: neighbor_id,
                    });
                }
            }
        }
    }
}
