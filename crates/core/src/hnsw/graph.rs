//! HNSW graph structure, configuration, and shared state.
//!
//! The graph is an arena: every [`Node`] is owned by a dense vector indexed
//! by `internal_id - 1`, and edges are plain `u64` internal ids rather than
//! references. One index-wide `RwLock` guards the arena, the id maps, and
//! the entry-point metadata; each node carries its own `RwLock` over its
//! neighbor lists. Lock order is always index first, node second, and never
//! two node locks at once.

use crate::config;
use crate::hnsw::scratch::ScratchPool;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tuning parameters for an [`HnswIndex`]. Immutable after construction.
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Target out-degree per node on non-zero layers.
    pub m: usize,
    /// Maximum out-degree at layer 0 (typically `2 * m`).
    pub m_max0: usize,
    /// Candidate-set width while linking a new node.
    pub ef_construction: usize,
    /// Candidate-set width during search; raised to `k` per query.
    pub ef_search: usize,
    /// Exponential parameter for layer sampling, normally `1 / ln(m)`.
    pub level_multiplier: f64,
    /// Seed for the layer-sampling RNG. `None` seeds from OS entropy;
    /// fix it for reproducible graph shapes in tests.
    pub level_seed: Option<u64>,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::HNSW_DEFAULT_M,
            m_max0: config::HNSW_DEFAULT_M * 2,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            ef_search: config::HNSW_DEFAULT_EF_SEARCH,
            level_multiplier: 1.0 / (config::HNSW_DEFAULT_M as f64).ln(),
            level_seed: None,
        }
    }
}

impl HnswConfig {
    /// A config with out-degree `m`, deriving `m_max0` and the level
    /// multiplier from it.
    pub fn with_m(m: usize) -> Self {
        Self {
            m,
            m_max0: m * 2,
            level_multiplier: 1.0 / (m as f64).ln(),
            ..Self::default()
        }
    }
}

/// A graph vertex. Identity (id, level, vector) never changes after
/// construction; only the neighbor lists mutate, under the node's own lock.
#[derive(Debug)]
pub struct Node {
    pub(crate) internal_id: u64,
    pub(crate) level: usize,
    /// The stored vector, unit-length since insert normalizes it.
    pub(crate) vector: Vec<f32>,
    /// Per-layer neighbor ids for layers `0..=level`. `add_bidirectional`
    /// may extend the outer vec when a later insert links at a higher layer.
    pub(crate) neighbors: RwLock<Vec<Vec<u64>>>,
}

impl Node {
    pub(crate) fn new(internal_id: u64, level: usize, vector: Vec<f32>) -> Self {
        Self {
            internal_id,
            level,
            vector,
            neighbors: RwLock::new(vec![Vec::new(); level + 1]),
        }
    }

    /// Copies out the neighbor list at `layer` under the node read lock, so
    /// callers never compute distances while holding it.
    pub(crate) fn neighbors_at(&self, layer: usize) -> Option<Vec<u64>> {
        self.neighbors.read().get(layer).cloned()
    }

    pub(crate) fn set_neighbors(&self, layer: usize, ids: Vec<u64>) {
        let mut neighbors = self.neighbors.write();
        if neighbors.len() <= layer {
            neighbors.resize(layer + 1, Vec::new());
        }
        neighbors[layer] = ids;
    }
}

/// Everything guarded by the index-wide lock.
#[derive(Debug)]
pub(crate) struct GraphState {
    pub(crate) id_to_internal: HashMap<String, u64>,
    pub(crate) internal_to_id: HashMap<u64, String>,
    /// Arena owning every node, indexed by `internal_id - 1`. Slots left by
    /// ids burned on failed inserts stay `None`.
    pub(crate) nodes: Vec<Option<Arc<Node>>>,
    /// Internal id of the top entry node; 0 means the graph is empty.
    pub(crate) entry_point: u64,
    /// Highest occupied layer, or -1 when empty.
    pub(crate) max_level: i32,
}

impl GraphState {
    fn new() -> Self {
        Self {
            id_to_internal: HashMap::new(),
            internal_to_id: HashMap::new(),
            nodes: Vec::new(),
            entry_point: 0,
            max_level: -1,
        }
    }

    pub(crate) fn node(&self, internal_id: u64) -> Option<Arc<Node>> {
        if internal_id == 0 {
            return None;
        }
        self.nodes
            .get(internal_id as usize - 1)
            .and_then(|slot| slot.clone())
    }

    /// Places a node into the arena, growing with `None` fillers when ids
    /// were handed out out-of-order.
    pub(crate) fn place(&mut self, node: Arc<Node>) {
        let idx = node.internal_id as usize - 1;
        if idx >= self.nodes.len() {
            self.nodes.resize(idx + 1, None);
        }
        self.nodes[idx] = Some(node);
    }
}

/// Concurrent Hierarchical Navigable Small World index over cosine
/// similarity.
///
/// Inserts and searches may run from any number of threads. Stored vectors
/// are L2-normalized once at insert, so every distance inside the graph is
/// a single dot product (`1 - dot`).
#[derive(Debug)]
pub struct HnswIndex {
    pub config: HnswConfig,
    pub(crate) state: RwLock<GraphState>,
    next_id: AtomicU64,
    level_rng: Mutex<StdRng>,
    pub(crate) scratch: ScratchPool,
}

impl HnswIndex {
    pub fn new(config: HnswConfig) -> Self {
        let rng = match config.level_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state: RwLock::new(GraphState::new()),
            next_id: AtomicU64::new(0),
            level_rng: Mutex::new(rng),
            scratch: ScratchPool::default(),
        }
    }

    /// An index with default tuning (M=16, ef_construction=200, ef_search=50).
    pub fn with_default_config() -> Self {
        Self::new(HnswConfig::default())
    }

    /// Number of live vectors.
    pub fn len(&self) -> usize {
        self.state.read().id_to_internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored (normalized) vector for an external id, if present.
    pub fn stored_vector(&self, id: &str) -> Option<Vec<f32>> {
        let state = self.state.read();
        let internal = *state.id_to_internal.get(id)?;
        state.node(internal).map(|node| node.vector.clone())
    }

    /// Monotonically assigns the next internal id, starting at 1.
    pub(crate) fn alloc_internal_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Looks up a node under a brief index read lock.
    pub(crate) fn node_by_id(&self, internal_id: u64) -> Option<Arc<Node>> {
        self.state.read().node(internal_id)
    }

    /// Resolves a batch of ids to nodes under a single index read lock,
    /// silently dropping ids with no live node.
    pub(crate) fn resolve(&self, ids: &[u64]) -> Vec<Arc<Node>> {
        let state = self.state.read();
        ids.iter().filter_map(|&id| state.node(id)).collect()
    }

    /// Samples a layer for a new node: `floor(-ln(u) * level_multiplier)`
    /// with `u` uniform in (0, 1]. The distribution is geometric; a node
    /// lands on layer L with probability ~`exp(-L / level_multiplier)`.
    pub(crate) fn random_level(&self) -> usize {
        let mult = self.config.level_multiplier;
        if mult <= 0.0 {
            return 0;
        }
        let u: f64 = self.level_rng.lock().gen();
        if u <= 0.0 {
            return 0;
        }
        let level = (-u.ln() * mult).floor();
        if level.is_finite() && level > 0.0 {
            level as usize
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_derives_from_m() {
        let cfg = HnswConfig::default();
        assert_eq!(cfg.m, 16);
        assert_eq!(cfg.m_max0, 32);
        assert!((cfg.level_multiplier - 1.0 / (16f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn with_m_recomputes_derived_fields() {
        let cfg = HnswConfig::with_m(10);
        assert_eq!(cfg.m_max0, 20);
        assert!((cfg.level_multiplier - 1.0 / (10f64).ln()).abs() < 1e-12);
        assert_eq!(cfg.ef_construction, 200);
    }

    #[test]
    fn new_index_is_empty() {
        let index = HnswIndex::with_default_config();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        let state = index.state.read();
        assert_eq!(state.entry_point, 0);
        assert_eq!(state.max_level, -1);
    }

    #[test]
    fn internal_ids_start_at_one() {
        let index = HnswIndex::with_default_config();
        assert_eq!(index.alloc_internal_id(), 1);
        assert_eq!(index.alloc_internal_id(), 2);
    }

    #[test]
    fn place_grows_arena_with_fillers() {
        let mut state = GraphState::new();
        state.place(Arc::new(Node::new(3, 0, vec![1.0])));
        assert_eq!(state.nodes.len(), 3);
        assert!(state.node(1).is_none());
        assert!(state.node(2).is_none());
        assert!(state.node(3).is_some());
        assert!(state.node(0).is_none());
    }

    #[test]
    fn random_level_is_sane() {
        let mut cfg = HnswConfig::default();
        cfg.level_seed = Some(42);
        let index = HnswIndex::new(cfg);
        let mut seen_zero = false;
        for _ in 0..1000 {
            let level = index.random_level();
            assert!(level < 64, "implausibly high level {level}");
            seen_zero |= level == 0;
        }
        // With multiplier ~0.36, the vast majority of samples land on 0.
        assert!(seen_zero);
    }

    #[test]
    fn random_level_with_nonpositive_multiplier_is_zero() {
        let mut cfg = HnswConfig::default();
        cfg.level_multiplier = 0.0;
        let index = HnswIndex::new(cfg);
        for _ in 0..100 {
            assert_eq!(index.random_level(), 0);
        }
    }

    #[test]
    fn fixed_seed_reproduces_level_sequence() {
        let mut cfg = HnswConfig::default();
        cfg.level_seed = Some(7);
        let a = HnswIndex::new(cfg.clone());
        let b = HnswIndex::new(cfg);
        let seq_a: Vec<usize> = (0..100).map(|_| a.random_level()).collect();
        let seq_b: Vec<usize> = (0..100).map(|_| b.random_level()).collect();
        assert_eq!(seq_a, seq_b);
    }
}
