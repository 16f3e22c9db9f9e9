//! Diagnostics posted by the code generator against individual blocks.

use std::collections::BTreeMap;

use crate::model::BlockId;

/// Per-block complaint log. Complaints never block further mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Complaints {
    by_block: BTreeMap<BlockId, Vec<String>>,
}

impl Complaints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, block: BlockId, message: impl Into<String>) {
        self.by_block.entry(block).or_default().push(message.into());
    }

    pub fn for_block(&self, block: BlockId) -> &[String] {
        self.by_block.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of complaints across all blocks.
    pub fn count(&self) -> usize {
        self.by_block.values().map(Vec::len).sum()
    }

    /// Blocks with at least one complaint, in ID order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.by_block.keys().copied()
    }

    pub fn clear_block(&mut self, block: BlockId) {
        self.by_block.remove(&block);
    }

    pub fn clear(&mut self) {
        self.by_block.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complaints_accumulate() {
        let mut complaints = Complaints::new();
        complaints.post(3, "socket left empty");
        complaints.post(3, "unknown variable");
        complaints.post(1, "unreachable");
        assert_eq!(complaints.count(), 3);
        assert_eq!(complaints.for_block(3).len(), 2);
        assert_eq!(complaints.blocks().collect::<Vec<_>>(), vec![1, 3]);
        complaints.clear_block(3);
        assert_eq!(complaints.count(), 1);
        assert!(complaints.for_block(3).is_empty());
    }
}
