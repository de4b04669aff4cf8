//! Index-based block arena.
//!
//! The arena owns every region the allocator has acquired. A block is named by
//! its [`BlockId`], the slot index it was given on creation, and that id never
//! changes or gets reused. Each slot records an explicit [`BlockState`] next to
//! the region, while the size and free-list link stay in the region's header.

use serde::Serialize;

use crate::header::{self, BLOCK_HEADER_SIZE, BlockHeader};
use crate::provider::RawRegion;

/// Stable identity of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Arena slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Ownership state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    /// Held by exactly one caller.
    Live,
    /// Sitting on exactly one free list.
    Free,
    /// Region handed back to the provider after an unclassifiable release.
    Retired,
}

#[derive(Debug)]
struct BlockSlot {
    region: Option<RawRegion>,
    state: BlockState,
}

#[derive(Debug, Default)]
pub(crate) struct BlockArena {
    slots: Vec<BlockSlot>,
    bytes_held: usize,
}

impl BlockArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adopts a fresh region, stamps its header with `size` and marks it live.
    ///
    /// The region must be at least `BLOCK_HEADER_SIZE + size` bytes.
    pub(crate) fn insert(&mut self, mut region: RawRegion, size: usize) -> BlockId {
        BlockHeader::fresh(size).write(region.as_mut_slice());
        let id = BlockId(self.slots.len());
        self.bytes_held += region.len();
        self.slots.push(BlockSlot {
            region: Some(region),
            state: BlockState::Live,
        });
        id
    }

    /// Header of `id`, or `None` if the block was retired.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this arena.
    pub(crate) fn header(&self, id: BlockId) -> Option<BlockHeader> {
        self.slots[id.0]
            .region
            .as_ref()
            .map(|region| BlockHeader::read(region.as_slice()))
    }

    pub(crate) fn set_next(&mut self, id: BlockId, next: Option<BlockId>) {
        if let Some(region) = self.slots[id.0].region.as_mut() {
            header::write_link(region.as_mut_slice(), next);
        }
    }

    pub(crate) fn set_state(&mut self, id: BlockId, state: BlockState) {
        self.slots[id.0].state = state;
    }

    /// State of `id`; `None` for ids this arena never issued.
    pub(crate) fn state(&self, id: BlockId) -> Option<BlockState> {
        self.slots.get(id.0).map(|slot| slot.state)
    }

    /// Usable bytes of `id`: everything after the header, up to the stored size.
    pub(crate) fn usable(&self, id: BlockId) -> &[u8] {
        match self.slots[id.0].region.as_ref() {
            Some(region) => {
                let bytes = region.as_slice();
                &bytes[BLOCK_HEADER_SIZE..usable_end(bytes)]
            }
            None => &[],
        }
    }

    pub(crate) fn usable_mut(&mut self, id: BlockId) -> &mut [u8] {
        match self.slots[id.0].region.as_mut() {
            Some(region) => {
                let bytes = region.as_mut_slice();
                let end = usable_end(bytes);
                &mut bytes[BLOCK_HEADER_SIZE..end]
            }
            None => &mut [],
        }
    }

    /// Detaches the region of `id` and marks the slot retired.
    pub(crate) fn retire(&mut self, id: BlockId) -> Option<RawRegion> {
        let slot = &mut self.slots[id.0];
        slot.state = BlockState::Retired;
        let region = slot.region.take()?;
        self.bytes_held -= region.len();
        Some(region)
    }

    /// Number of blocks ever created.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Region bytes currently owned, headers included.
    pub(crate) fn bytes_held(&self) -> usize {
        self.bytes_held
    }

    #[cfg(test)]
    pub(crate) fn overwrite_size(&mut self, id: BlockId, size: usize) {
        if let Some(region) = self.slots[id.0].region.as_mut() {
            let mut header = BlockHeader::read(region.as_slice());
            header.size = size;
            header.write(region.as_mut_slice());
        }
    }
}

fn usable_end(region: &[u8]) -> usize {
    let size = BlockHeader::read(region).size;
    BLOCK_HEADER_SIZE.saturating_add(size).min(region.len())
}
