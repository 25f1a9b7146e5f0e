//! Pooled per-operation scratch state for layer searches.
//!
//! A layer search needs three data structures (visited set, candidate
//! min-heap, bounded result heap). Allocating them per call would put three
//! allocations on every layer of every insert and search, so completed
//! operations park their scratch in a shared free list instead.

use crate::hnsw::visited::VisitedSet;
use crate::queue::{BoundedMaxHeap, CandidateHeap};
use parking_lot::Mutex;

/// The working state of one `search_layer` invocation.
#[derive(Debug, Default)]
pub struct SearchScratch {
    pub visited: VisitedSet,
    pub candidates: CandidateHeap,
    pub results: BoundedMaxHeap,
}

impl SearchScratch {
    /// Empties every structure and re-arms the result heap for `ef` entries.
    pub fn reset(&mut self, ef: usize) {
        self.visited.clear();
        self.candidates.clear();
        self.results.reset(ef);
    }
}

/// Thread-safe free list of [`SearchScratch`] objects.
///
/// Objects are reset on both acquire and release, so a pooled object is
/// always empty when handed out.
#[derive(Debug, Default)]
pub struct ScratchPool {
    free: Mutex<Vec<SearchScratch>>,
}

impl ScratchPool {
    pub fn acquire(&self) -> SearchScratch {
        let mut scratch = self.free.lock().pop().unwrap_or_default();
        scratch.reset(1);
        scratch
    }

    pub fn release(&self, mut scratch: SearchScratch) {
        scratch.reset(1);
        self.free.lock().push(scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Candidate;
    use ordered_float::OrderedFloat;

    #[test]
    fn released_scratch_comes_back_empty() {
        let pool = ScratchPool::default();
        let mut scratch = pool.acquire();
        scratch.results.reset(4);
        scratch.results.push(Candidate {
            dist: OrderedFloat(0.5),
            id: 1,
        });
        scratch.candidates.push(Candidate {
            dist: OrderedFloat(0.5),
            id: 1,
        });
        assert!(scratch.visited.insert(1));
        pool.release(scratch);

        let reused = pool.acquire();
        assert!(reused.results.is_empty());
        assert!(reused.candidates.is_empty());
    }

    #[test]
    fn acquire_on_empty_pool_allocates() {
        let pool = ScratchPool::default();
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.free.lock().len(), 2);
    }
}
