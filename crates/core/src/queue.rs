//! Priority-queue abstractions for graph traversal and top-k selection.
//!
//! [`CandidateHeap`] orders undiscovered graph nodes closest-first.
//! [`BoundedMaxHeap`] keeps the best `ef` candidates seen so far, with the
//! *furthest* of them at the root so it can be evicted in O(log ef).
//! Both retain their allocations across [`clear`](CandidateHeap::clear) /
//! [`reset`](BoundedMaxHeap::reset) so they can be pooled.
//!
//! [`MatchQueue`] is the top-k-by-score heap used by the linear-scan oracle.

use crate::index::Match;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A node discovered during layer traversal, keyed by distance to the query.
///
/// Ordering compares distance first and internal id second, so traversal
/// order is deterministic even among equidistant nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub dist: OrderedFloat<f32>,
    pub id: u64,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist
            .cmp(&other.dist)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Unbounded min-heap of candidates awaiting expansion; `pop` yields the
/// not-yet-expanded node closest to the query.
#[derive(Debug, Default)]
pub struct CandidateHeap {
    heap: BinaryHeap<Reverse<Candidate>>,
}

impl CandidateHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.heap.push(Reverse(candidate));
    }

    pub fn pop(&mut self) -> Option<Candidate> {
        self.heap.pop().map(|Reverse(c)| c)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Max-heap by distance holding at most `capacity` entries.
///
/// The root is the furthest retained candidate. A push against a full heap
/// replaces the root only when the newcomer is closer; otherwise it is
/// discarded.
#[derive(Debug, Default)]
pub struct BoundedMaxHeap {
    heap: BinaryHeap<Candidate>,
    capacity: usize,
}

impl BoundedMaxHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity: capacity.max(1),
        }
    }

    /// Empties the heap and re-arms it with a new capacity, keeping the
    /// underlying allocation.
    pub fn reset(&mut self, capacity: usize) {
        self.heap.clear();
        self.capacity = capacity.max(1);
    }

    pub fn push(&mut self, candidate: Candidate) {
        if self.heap.len() < self.capacity {
            self.heap.push(candidate);
        } else if let Some(furthest) = self.heap.peek() {
            if candidate < *furthest {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Distance of the furthest retained candidate.
    pub fn furthest(&self) -> Option<OrderedFloat<f32>> {
        self.heap.peek().map(|c| c.dist)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains all entries in furthest-to-closest order.
    pub fn drain_desc(&mut self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(candidate) = self.heap.pop() {
            out.push(candidate);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ScoredId {
    score: OrderedFloat<f32>,
    id: String,
}

/// Min-heap of matches keyed on score, tracking the top k *largest* scores.
///
/// [`push_with_limit`](MatchQueue::push_with_limit) pushes and then ejects
/// the root (the lowest retained score) whenever the size exceeds `k`.
#[derive(Debug, Default)]
pub struct MatchQueue {
    heap: BinaryHeap<Reverse<ScoredId>>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_with_limit(&mut self, m: Match, k: usize) {
        self.heap.push(Reverse(ScoredId {
            score: OrderedFloat(m.score),
            id: m.id,
        }));
        if self.heap.len() > k {
            self.heap.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Consumes the queue, returning matches sorted by descending score.
    pub fn into_sorted_desc(self) -> Vec<Match> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(s)| Match {
                id: s.id,
                score: s.score.into_inner(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(dist: f32, id: u64) -> Candidate {
        Candidate {
            dist: OrderedFloat(dist),
            id,
        }
    }

    #[test]
    fn candidate_heap_pops_closest_first() {
        let mut heap = CandidateHeap::new();
        heap.push(cand(0.7, 1));
        heap.push(cand(0.1, 2));
        heap.push(cand(0.4, 3));
        assert_eq!(heap.pop().unwrap().id, 2);
        assert_eq!(heap.pop().unwrap().id, 3);
        assert_eq!(heap.pop().unwrap().id, 1);
        assert!(heap.pop().is_none());
    }

    #[test]
    fn bounded_heap_discards_far_candidates_when_full() {
        let mut heap = BoundedMaxHeap::new(2);
        heap.push(cand(0.5, 1));
        heap.push(cand(0.3, 2));
        assert!(heap.is_full());

        // Further than the current root: discarded.
        heap.push(cand(0.9, 3));
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.furthest(), Some(OrderedFloat(0.5)));

        // Closer than the current root: replaces it.
        heap.push(cand(0.1, 4));
        assert_eq!(heap.furthest(), Some(OrderedFloat(0.3)));
    }

    #[test]
    fn bounded_heap_drains_furthest_to_closest() {
        let mut heap = BoundedMaxHeap::new(3);
        heap.push(cand(0.2, 1));
        heap.push(cand(0.8, 2));
        heap.push(cand(0.5, 3));
        let order: Vec<u64> = heap.drain_desc().iter().map(|c| c.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!(heap.is_empty());
    }

    #[test]
    fn bounded_heap_reset_reuses_allocation() {
        let mut heap = BoundedMaxHeap::new(1);
        heap.push(cand(0.2, 1));
        heap.reset(4);
        assert!(heap.is_empty());
        for i in 0..6 {
            heap.push(cand(i as f32 / 10.0, i));
        }
        assert_eq!(heap.len(), 4);
    }

    #[test]
    fn equal_distances_break_ties_by_id() {
        let mut heap = CandidateHeap::new();
        heap.push(cand(0.5, 9));
        heap.push(cand(0.5, 3));
        assert_eq!(heap.pop().unwrap().id, 3);
    }

    #[test]
    fn match_queue_keeps_top_k_by_score() {
        let mut queue = MatchQueue::new();
        for (id, score) in [("a", 0.1), ("b", 0.9), ("c", 0.5), ("d", 0.7)] {
            queue.push_with_limit(
                Match {
                    id: id.to_owned(),
                    score,
                },
                2,
            );
        }
        let out = queue.into_sorted_desc();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "b");
        assert_eq!(out[1].id, "d");
    }

    #[test]
    fn match_queue_with_zero_limit_stays_empty() {
        let mut queue = MatchQueue::new();
        queue.push_with_limit(
            Match {
                id: "a".to_owned(),
                score: 1.0,
            },
            0,
        );
        assert_eq!(queue.len(), 0);
    }
}
