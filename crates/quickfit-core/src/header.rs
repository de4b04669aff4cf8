//! Block header layout.
//!
//! Every region the allocator acquires starts with a fixed 16-byte header,
//! followed directly by the usable bytes handed to the caller:
//!
//! ```text
//!   offset 0        8        16                       16 + size
//!          ┌────────┬────────┬────────────────────────┐
//!          │  size  │  next  │      usable region     │
//!          └────────┴────────┴────────────────────────┘
//! ```
//!
//! Both fields are little-endian `u64`. `size` is the byte count requested when
//! the block was first created. `next` links free blocks of one class and is
//! only meaningful while the block sits on a free list; [`NO_NEXT`] ends a list.

use crate::arena::BlockId;

/// Bytes reserved before the usable region of every block.
pub const BLOCK_HEADER_SIZE: usize = 2 * size_of::<u64>();

/// Encoded `next` value marking the end of a free list.
pub const NO_NEXT: u64 = u64::MAX;

const SIZE_OFFSET: usize = 0;
const NEXT_OFFSET: usize = size_of::<u64>();

/// Decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Caller-requested byte length recorded at creation.
    pub size: usize,
    /// Next block on the same free list.
    pub next: Option<BlockId>,
}

impl BlockHeader {
    /// Header for a freshly created block.
    #[must_use]
    pub const fn fresh(size: usize) -> Self {
        Self { size, next: None }
    }

    /// Decodes the header from the first [`BLOCK_HEADER_SIZE`] bytes of `region`.
    ///
    /// A stored size that does not fit `usize` decodes as `usize::MAX`, which
    /// no size class accepts.
    ///
    /// # Panics
    ///
    /// Panics if `region` is shorter than the header.
    #[must_use]
    pub fn read(region: &[u8]) -> Self {
        let size = usize::try_from(read_u64(region, SIZE_OFFSET)).unwrap_or(usize::MAX);
        let next = match read_u64(region, NEXT_OFFSET) {
            NO_NEXT => None,
            raw => usize::try_from(raw).ok().map(BlockId),
        };
        Self { size, next }
    }

    /// Encodes the header into the first [`BLOCK_HEADER_SIZE`] bytes of `region`.
    ///
    /// # Panics
    ///
    /// Panics if `region` is shorter than the header.
    pub fn write(&self, region: &mut [u8]) {
        write_u64(region, SIZE_OFFSET, self.size as u64);
        write_link(region, self.next);
    }
}

/// Rewrites only the `next` field, leaving the stored size untouched.
pub(crate) fn write_link(region: &mut [u8], next: Option<BlockId>) {
    let raw = next.map_or(NO_NEXT, |id| id.0 as u64);
    write_u64(region, NEXT_OFFSET, raw);
}

fn read_u64(region: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; size_of::<u64>()];
    raw.copy_from_slice(&region[at..at + size_of::<u64>()]);
    u64::from_le_bytes(raw)
}

fn write_u64(region: &mut [u8], at: usize, value: u64) {
    region[at..at + size_of::<u64>()].copy_from_slice(&value.to_le_bytes());
}
