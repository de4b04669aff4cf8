//! # quickfit-core
//!
//! A quick-fit allocator: one free list per fixed size class, backed by a bulk
//! memory provider that is only consulted when a class's list is empty.
//!
//! ```
//! use quickfit_core::QuickFitAllocator;
//!
//! let mut alloc = QuickFitAllocator::with_defaults();
//! let block = alloc.allocate(50)?;
//! let id = block.id();
//! alloc.usable_mut(&block).fill(7);
//! alloc.release(block)?;
//!
//! // The most recently released block of the class is served next.
//! assert_eq!(alloc.allocate(40)?.id(), id);
//! # Ok::<(), quickfit_core::QuickFitError>(())
//! ```
//!
//! Blocks are never coalesced, split, or handed back to the provider, so a
//! class's free list can grow without bound. No `unsafe` code is permitted at
//! the crate level.

#![deny(unsafe_code)]

pub mod allocator;
pub mod arena;
pub mod config;
pub mod error;
mod free_list;
pub mod header;
pub mod lifecycle;
pub mod provider;
pub mod size_class;
pub mod snapshot;

pub use allocator::{AllocatorStats, BlockHandle, QuickFitAllocator};
pub use arena::{BlockId, BlockState};
pub use config::QuickFitConfig;
pub use error::{ConfigError, ProviderError, QuickFitError, QuickFitResult};
pub use header::{BLOCK_HEADER_SIZE, BlockHeader};
pub use lifecycle::{AllocatorLogLevel, AllocatorLogRecord};
pub use provider::{BoundedProvider, BulkProvider, RawRegion, SystemProvider};
pub use size_class::SizeClassTable;
pub use snapshot::{ClassSnapshot, FreeListSnapshot};
