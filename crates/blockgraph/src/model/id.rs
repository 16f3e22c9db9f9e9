//! Integer block identifiers and their allocation.

use rustc_hash::FxHashMap;

use crate::limits::FIRST_BLOCK_ID;

/// Identifier of a block instance, unique within one [`crate::BlockGraph`].
///
/// An empty connector holds `None` where the save format would hold the NULL
/// sentinel.
pub type BlockId = u64;

/// Source ID → destination ID table used when loading a save into a graph
/// that may already hold blocks.
pub type IdMapping = FxHashMap<BlockId, BlockId>;

/// Monotonic ID counter.
///
/// Explicit IDs (from a load without remapping) may land below the counter and
/// fill gaps; the counter only moves backwards on [`IdAllocator::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: BlockId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next: FIRST_BLOCK_ID,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh ID and advances the counter.
    pub fn allocate(&mut self) -> BlockId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Records that `id` is in use so the counter never hands it out.
    pub fn claim(&mut self, id: BlockId) {
        if id >= self.next {
            self.next = id + 1;
        }
    }

    /// The ID the next call to [`allocate`](Self::allocate) returns.
    pub fn peek(&self) -> BlockId {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = FIRST_BLOCK_ID;
    }
}

/// Translates `id` through `mapping`, allocating a fresh ID the first time a
/// source ID is seen.
pub fn remap(ids: &mut IdAllocator, mapping: &mut IdMapping, id: BlockId) -> BlockId {
    *mapping.entry(id).or_insert_with(|| ids.allocate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 2);
        ids.claim(10);
        assert_eq!(ids.allocate(), 11);
        // Claiming below the counter is a gap fill and does not move it.
        ids.claim(5);
        assert_eq!(ids.peek(), 12);
    }

    #[test]
    fn test_reset_restarts_counter() {
        let mut ids = IdAllocator::new();
        ids.allocate();
        ids.allocate();
        ids.reset();
        assert_eq!(ids.allocate(), FIRST_BLOCK_ID);
    }

    #[test]
    fn test_remap_is_consistent() {
        let mut ids = IdAllocator::new();
        ids.claim(100);
        let mut mapping = IdMapping::default();
        let a = remap(&mut ids, &mut mapping, 7);
        let b = remap(&mut ids, &mut mapping, 8);
        assert_ne!(a, b);
        assert_eq!(remap(&mut ids, &mut mapping, 7), a);
        assert!(a > 100 && b > 100);
    }
}
