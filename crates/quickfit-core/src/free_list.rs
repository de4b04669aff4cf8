//! Free-list registry.
//!
//! One singly-linked LIFO chain per size class. The head of each chain lives
//! here; the links live in the `next` field of each free block's header, so a
//! free block costs no memory beyond its own region.

use crate::arena::{BlockArena, BlockId, BlockState};

#[derive(Debug)]
pub(crate) struct FreeListRegistry {
    heads: Vec<Option<BlockId>>,
    lens: Vec<usize>,
}

impl FreeListRegistry {
    pub(crate) fn new(classes: usize) -> Self {
        Self {
            heads: vec![None; classes],
            lens: vec![0; classes],
        }
    }

    /// Pushes `id` onto the head of list `class` and marks it free.
    pub(crate) fn push(&mut self, arena: &mut BlockArena, class: usize, id: BlockId) {
        arena.set_next(id, self.heads[class]);
        arena.set_state(id, BlockState::Free);
        self.heads[class] = Some(id);
        self.lens[class] += 1;
    }

    /// Pops the most recently pushed block of list `class` and marks it live.
    pub(crate) fn pop(&mut self, arena: &mut BlockArena, class: usize) -> Option<BlockId> {
        let head = self.heads[class]?;
        self.heads[class] = arena.header(head).and_then(|header| header.next);
        self.lens[class] = self.lens[class].saturating_sub(1);
        arena.set_state(head, BlockState::Live);
        Some(head)
    }

    pub(crate) fn len(&self, class: usize) -> usize {
        self.lens[class]
    }

    pub(crate) fn total_free(&self) -> usize {
        self.lens.iter().sum()
    }

    /// Walks list `class` from the head. The walk stops after the recorded
    /// length even if a corrupted link would loop.
    pub(crate) fn iter<'a>(&self, arena: &'a BlockArena, class: usize) -> FreeListIter<'a> {
        FreeListIter {
            arena,
            cursor: self.heads[class],
            remaining: self.lens[class],
        }
    }
}

pub(crate) struct FreeListIter<'a> {
    arena: &'a BlockArena,
    cursor: Option<BlockId>,
    remaining: usize,
}

impl Iterator for FreeListIter<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        self.remaining -= 1;
        self.cursor = self.arena.header(id).and_then(|header| header.next);
        Some(id)
    }
}
