//! HNSW insertion: publication, greedy descent, and layered linking.
//!
//! The duplicate re-check under the index write lock is the linearization
//! point for racing inserts of the same id, so exactly one wins.

use crate::error::{Error, Result};
use crate::hnsw::graph::{HnswIndex, Node};
use crate::vector;
use std::sync::Arc;

impl HnswIndex {
    /// Inserts `v` under `id`.
    ///
    /// Errors: [`Error::EmptyVector`], [`Error::ZeroMagnitude`],
    /// [`Error::DuplicateId`]. The stored copy is L2-normalized.
    pub fn insert(&self, id: &str, v: &[f32]) -> Result<()> {
        if v.is_empty() {
            return Err(Error::EmptyVector);
        }
        let normalized = vector::normalize(v)?;
        if self.state.read().id_to_internal.contains_key(id) {
            return Err(Error::DuplicateId(id.to_owned()));
        }

        let internal_id = self.alloc_internal_id();
        let level = self.random_level();
        let node = Arc::new(Node::new(internal_id, level, normalized));

        // Publish. A duplicate that raced past the pre-check is caught here;
        // its internal id is burned and the arena slot stays None.
        let (entry_point, max_level) = {
            let mut state = self.state.write();
            if state.id_to_internal.contains_key(id) {
                return Err(Error::DuplicateId(id.to_owned()));
            }
            state.id_to_internal.insert(id.to_owned(), internal_id);
            state.internal_to_id.insert(internal_id, id.to_owned());
            state.place(Arc::clone(&node));
            if state.max_level < 0 {
                // First node: it is the whole graph.
                state.entry_point = internal_id;
                state.max_level = level as i32;
                return Ok(());
            }
            (state.entry_point, state.max_level as usize)
        };

        let entry = self.greedy_descend(&node, entry_point, max_level);
        self.link_layers(&node, entry, max_level);

        // Promote. Another insert may have raised max_level meanwhile; the
        // entry point only needs to be an acceptably high node, not the
        // global maximum at every instant.
        if (level as i32) > self.state.read().max_level {
            let mut state = self.state.write();
            if (level as i32) > state.max_level {
                state.max_level = level as i32;
                state.entry_point = internal_id;
            }
        }
        Ok(())
    }

    /// Walks layers `max_level` down to `node.level + 1` greedily, hopping
    /// to any neighbor closer to the new vector than the current position.
    /// Single best node per layer, no candidate list.
    fn greedy_descend(&self, node: &Node, entry_point: u64, max_level: usize) -> u64 {
        let mut current = match self.node_by_id(entry_point) {
            Some(n) => n,
            // Stale entry point; nothing to descend through.
            None => return node.internal_id,
        };
        let mut current_dist = vector::cosine_distance(&node.vector, &current.vector);

        for layer in (node.level + 1..=max_level).rev() {
            let mut changed = true;
            while changed {
                changed = false;
                let Some(neighbor_ids) = current.neighbors_at(layer) else {
                    break;
                };
                for neighbor in self.resolve(&neighbor_ids) {
                    let d = vector::cosine_distance(&node.vector, &neighbor.vector);
                    if d < current_dist {
                        current_dist = d;
                        current = neighbor;
                        changed = true;
                    }
                }
            }
        }
        current.internal_id
    }

    /// Links the new node on every layer from `min(max_level, node.level)`
    /// down to 0: beam-search the layer, keep the `m` closest as out-edges,
    /// and ask each of them to link back.
    fn link_layers(&self, node: &Arc<Node>, entry: u64, max_level: usize) {
        let top = node.level.min(max_level);
        let mut current = entry;
        let mut scratch = self.scratch.acquire();

        for layer in (0..=top).rev() {
            self.search_layer(
                &node.vector,
                &[current],
                self.config.ef_construction,
                layer,
                &mut scratch,
            );
            // Furthest-to-closest; iterate from the back for the closest.
            let ranked = scratch.results.drain_desc();

            let selected: Vec<u64> = ranked
                .iter()
                .rev()
                .filter(|c| c.id != node.internal_id)
                .take(self.config.m)
                .map(|c| c.id)
                .collect();
            node.set_neighbors(layer, selected.clone());
            for &host in &selected {
                self.add_bidirectional(host, node.internal_id, layer);
            }

            if let Some(closest) = ranked.iter().rev().find(|c| c.id != node.internal_id) {
                current = closest.id;
            }
        }
        self.scratch.release(scratch);
    }

    /// Records `guest` as a neighbor of `host` at `layer`.
    ///
    /// The guest is deduplicated, and when the layer overflows its limit
    /// (`m_max0` at layer 0, `m` above) the single furthest existing
    /// neighbor is evicted, on the host side only. The far side keeps its
    /// edge; pruning both ends would require holding two node locks at
    /// once.
    fn add_bidirectional(&self, host_id: u64, guest_id: u64, layer: usize) {
        if host_id == guest_id {
            return;
        }
        // Index read lock held across the eviction scan so neighbor vectors
        // can be resolved without re-locking per id. Lock order stays
        // index -> node.
        let state = self.state.read();
        let Some(host) = state.node(host_id) else {
            return;
        };
        let mut neighbors = host.neighbors.write();
        if neighbors.len() <= layer {
            neighbors.resize(layer + 1, Vec::new());
        }
        let list = &mut neighbors[layer];
        if list.contains(&guest_id) {
            return;
        }
        list.push(guest_id);

        let limit = if layer == 0 {
            self.config.m_max0
        } else {
            self.config.m
        };
        if list.len() <= limit {
            return;
        }

        let mut furthest: Option<(usize, f32)> = None;
        for (i, &neighbor_id) in list.iter().enumerate() {
            let d = match state.node(neighbor_id) {
                Some(n) => vector::cosine_distance(&host.vector, &n.vector),
                // Dangling id: evict it first.
                None => f32::INFINITY,
            };
            match furthest {
                Some((_, worst)) if d <= worst => {}
                _ => furthest = Some((i, d)),
            }
        }
        if let Some((idx, _)) = furthest {
            list.swap_remove(idx);
        }
    }
}
