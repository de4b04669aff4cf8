//! Read-only view of the free lists, for diagnostics and tests.

use serde::Serialize;

use crate::arena::BlockId;

/// Free blocks of one size class, head first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSnapshot {
    pub index: usize,
    pub threshold: usize,
    /// Blocks in pop order.
    pub blocks: Vec<BlockId>,
    /// Stored size of each block in `blocks`.
    pub free_sizes: Vec<usize>,
}

/// Every size class's free list at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeListSnapshot {
    pub classes: Vec<ClassSnapshot>,
}

impl FreeListSnapshot {
    #[must_use]
    pub fn class(&self, index: usize) -> Option<&ClassSnapshot> {
        self.classes.get(index)
    }

    /// Stored sizes on list `index`, empty for unknown classes.
    #[must_use]
    pub fn free_sizes(&self, index: usize) -> &[usize] {
        self.class(index)
            .map(|class| class.free_sizes.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total_free(&self) -> usize {
        self.classes.iter().map(|class| class.blocks.len()).sum()
    }

    /// Which class's list holds `id`, if any.
    #[must_use]
    pub fn class_of(&self, id: BlockId) -> Option<usize> {
        self.classes
            .iter()
            .find(|class| class.blocks.contains(&id))
            .map(|class| class.index)
    }
}
