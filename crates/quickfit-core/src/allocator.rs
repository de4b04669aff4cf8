//! Core allocator state.
//!
//! `QuickFitAllocator` owns the size-class table, the free-list registry, the
//! block arena and the bulk provider. Allocation pops from the matching free
//! list and only touches the provider when that list is empty; release reads
//! the block's stored size back out of its header and pushes it onto the list
//! that size classifies into.
//!
//! The allocator is single-threaded: every mutating call takes `&mut self` and
//! no internal locking exists. Hosts that share one instance wrap it in their
//! own mutex.

use std::collections::VecDeque;

use serde::Serialize;

use crate::arena::{BlockArena, BlockId, BlockState};
use crate::config::QuickFitConfig;
use crate::error::{ConfigError, ProviderError, QuickFitError, QuickFitResult};
use crate::free_list::FreeListRegistry;
use crate::header::BLOCK_HEADER_SIZE;
use crate::lifecycle::{
    AllocatorLogLevel, AllocatorLogRecord, DEFAULT_LIFECYCLE_CAPACITY, LifecycleEvent, LifecycleLog,
};
use crate::provider::{BulkProvider, SystemProvider};
use crate::size_class::SizeClassTable;
use crate::snapshot::{ClassSnapshot, FreeListSnapshot};

/// Caller's token for one live block.
///
/// Handles are move-only: [`QuickFitAllocator::release`] consumes the handle,
/// so safe code cannot release the same allocation twice through it.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a handle leaks its block until the allocator is dropped"]
pub struct BlockHandle {
    id: BlockId,
}

impl BlockHandle {
    /// Identity of the underlying block.
    pub fn id(&self) -> BlockId {
        self.id
    }
}

/// Operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocatorStats {
    /// Allocations served by acquiring a fresh region.
    pub fresh_blocks: u64,
    /// Allocations served from a free list.
    pub reused_blocks: u64,
    /// Releases pushed onto a free list.
    pub releases: u64,
    pub unsupported_requests: u64,
    pub out_of_memory: u64,
    pub unclassified_releases: u64,
    /// Blocks currently held by callers.
    pub live_blocks: usize,
    /// Blocks currently on free lists.
    pub free_blocks: usize,
    /// Region bytes owned by the allocator, headers included.
    pub bytes_held: usize,
}

/// Quick-fit allocator.
pub struct QuickFitAllocator<P: BulkProvider = SystemProvider> {
    classes: SizeClassTable,
    registry: FreeListRegistry,
    arena: BlockArena,
    provider: P,
    stats: AllocatorStats,
    log: LifecycleLog,
}

impl QuickFitAllocator<SystemProvider> {
    /// Default classes (`50, 100, 200`) over the system provider.
    pub fn with_defaults() -> Self {
        Self::with_provider(SystemProvider::new())
    }
}

impl Default for QuickFitAllocator<SystemProvider> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<P: BulkProvider> QuickFitAllocator<P> {
    /// Builds an allocator from `config`, failing if its thresholds are invalid.
    pub fn new(config: QuickFitConfig, provider: P) -> Result<Self, ConfigError> {
        let classes = config.size_classes()?;
        let log = LifecycleLog::new(config.lifecycle_logging, config.lifecycle_capacity);
        Ok(Self::from_parts(classes, log, provider))
    }

    /// Default classes over `provider`, with lifecycle records off.
    pub fn with_provider(provider: P) -> Self {
        let log = LifecycleLog::new(false, DEFAULT_LIFECYCLE_CAPACITY);
        Self::from_parts(SizeClassTable::default(), log, provider)
    }

    fn from_parts(classes: SizeClassTable, log: LifecycleLog, provider: P) -> Self {
        Self {
            registry: FreeListRegistry::new(classes.len()),
            classes,
            arena: BlockArena::new(),
            provider,
            stats: AllocatorStats::default(),
            log,
        }
    }

    /// Builds and appends a record only when recording is on.
    fn record(&mut self, event: impl FnOnce(&Self) -> LifecycleEvent) {
        if self.log.is_enabled() {
            let event = event(self);
            self.log
                .record(event, self.stats.live_blocks, self.stats.free_blocks);
        }
    }

    /// Allocates a block able to hold at least `size` bytes.
    ///
    /// A block popped from a free list keeps the stored size it was created
    /// with, so its usable length is that original request size rather than
    /// `size` or the class threshold. The bytes are returned as the previous
    /// holder left them; nothing is zeroed.
    pub fn allocate(&mut self, size: usize) -> QuickFitResult<BlockHandle> {
        let Some(class) = self.classes.classify(size) else {
            let largest = self.classes.largest();
            self.stats.unsupported_requests += 1;
            self.record(|_| LifecycleEvent {
                level: AllocatorLogLevel::Warn,
                symbol: "allocate",
                event: "size_not_supported",
                block: None,
                size: Some(size),
                class: None,
                outcome: "denied",
                details: format!("largest_class={largest}"),
            });
            return Err(QuickFitError::SizeNotSupported {
                requested: size,
                largest,
            });
        };

        if let Some(id) = self.registry.pop(&mut self.arena, class) {
            self.stats.reused_blocks += 1;
            self.stats.free_blocks -= 1;
            self.stats.live_blocks += 1;
            self.record(|this| LifecycleEvent {
                level: AllocatorLogLevel::Trace,
                symbol: "allocate",
                event: "alloc",
                block: Some(id),
                size: Some(size),
                class: Some(class),
                outcome: "success",
                details: format!(
                    "path=free_list stored_size={}",
                    this.arena.header(id).map_or(0, |header| header.size)
                ),
            });
            return Ok(BlockHandle { id });
        }

        // Thresholds are validated to leave room for the header.
        let total = BLOCK_HEADER_SIZE + size;
        let region = match self.provider.acquire_raw(total) {
            Ok(region) if region.len() == total => region,
            Ok(region) => {
                let actual = region.len();
                self.provider.release_raw(region);
                return Err(self.out_of_memory(
                    size,
                    class,
                    ProviderError::WrongLength {
                        requested: total,
                        actual,
                    },
                ));
            }
            Err(source) => return Err(self.out_of_memory(size, class, source)),
        };

        let id = self.arena.insert(region, size);
        self.stats.fresh_blocks += 1;
        self.stats.live_blocks += 1;
        self.stats.bytes_held = self.arena.bytes_held();
        self.record(|_| LifecycleEvent {
            level: AllocatorLogLevel::Trace,
            symbol: "allocate",
            event: "alloc",
            block: Some(id),
            size: Some(size),
            class: Some(class),
            outcome: "success",
            details: format!("path=fresh_region region_len={total}"),
        });
        Ok(BlockHandle { id })
    }

    fn out_of_memory(&mut self, size: usize, class: usize, source: ProviderError) -> QuickFitError {
        self.stats.out_of_memory += 1;
        self.record(|_| LifecycleEvent {
            level: AllocatorLogLevel::Warn,
            symbol: "allocate",
            event: "provider_failed",
            block: None,
            size: Some(size),
            class: Some(class),
            outcome: "oom",
            details: source.to_string(),
        });
        QuickFitError::OutOfMemory {
            requested: size,
            source,
        }
    }

    /// Returns a block to the free list its stored size classifies into.
    ///
    /// If the stored size fits no class the region goes back to the provider
    /// and [`QuickFitError::UnclassifiedBlockOnRelease`] is returned; no free
    /// list changes in that case.
    ///
    /// The handle must come from this allocator. Releasing a handle issued by
    /// another instance is a contract violation with unspecified results: it
    /// may corrupt a free list, and panics if the id is out of range. A handle
    /// naming a retired slot is reported as
    /// [`QuickFitError::RetiredBlockOnRelease`].
    pub fn release(&mut self, handle: BlockHandle) -> QuickFitResult<()> {
        let id = handle.id;

        let Some(header) = self.arena.header(id) else {
            // Only reachable through a handle from another instance.
            self.record(|_| LifecycleEvent {
                level: AllocatorLogLevel::Error,
                symbol: "release",
                event: "release_retired_block",
                block: Some(id),
                size: None,
                class: None,
                outcome: "rejected",
                details: "slot_has_no_region".to_string(),
            });
            return Err(QuickFitError::RetiredBlockOnRelease { block: id.index() });
        };

        let Some(class) = self.classes.classify(header.size) else {
            let was_free = self.arena.state(id) == Some(BlockState::Free);
            if let Some(region) = self.arena.retire(id) {
                self.provider.release_raw(region);
            }
            if was_free {
                self.stats.free_blocks = self.stats.free_blocks.saturating_sub(1);
            } else {
                self.stats.live_blocks = self.stats.live_blocks.saturating_sub(1);
            }
            self.stats.unclassified_releases += 1;
            self.stats.bytes_held = self.arena.bytes_held();
            self.record(|this| LifecycleEvent {
                level: AllocatorLogLevel::Error,
                symbol: "release",
                event: "unclassified_block",
                block: Some(id),
                size: Some(header.size),
                class: None,
                outcome: "returned_to_provider",
                details: format!("largest_class={}", this.classes.largest()),
            });
            return Err(QuickFitError::UnclassifiedBlockOnRelease { size: header.size });
        };

        self.registry.push(&mut self.arena, class, id);
        self.stats.releases += 1;
        self.stats.live_blocks = self.stats.live_blocks.saturating_sub(1);
        self.stats.free_blocks += 1;
        self.record(|this| LifecycleEvent {
            level: AllocatorLogLevel::Trace,
            symbol: "release",
            event: "free",
            block: Some(id),
            size: Some(header.size),
            class: Some(class),
            outcome: "success",
            details: format!("free_list_len={}", this.registry.len(class)),
        });
        Ok(())
    }

    /// [`Self::release`] for a handle that may be absent; `None` is a no-op.
    pub fn release_optional(&mut self, handle: Option<BlockHandle>) -> QuickFitResult<()> {
        match handle {
            Some(handle) => self.release(handle),
            None => {
                self.record(|_| LifecycleEvent {
                    level: AllocatorLogLevel::Debug,
                    symbol: "release",
                    event: "release_none",
                    block: None,
                    size: None,
                    class: None,
                    outcome: "noop",
                    details: "empty_handle".to_string(),
                });
                Ok(())
            }
        }
    }

    /// Size-class index for `size`, or `None` if no class holds it.
    #[must_use]
    pub fn classify(&self, size: usize) -> Option<usize> {
        self.classes.classify(size)
    }

    #[must_use]
    pub fn size_classes(&self) -> &SizeClassTable {
        &self.classes
    }

    /// Usable bytes of `handle`. The length is the block's stored size.
    ///
    /// # Panics
    ///
    /// Panics if `handle` came from another allocator with more blocks.
    #[must_use]
    pub fn usable(&self, handle: &BlockHandle) -> &[u8] {
        self.arena.usable(handle.id)
    }

    /// Mutable usable bytes of `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` came from another allocator with more blocks.
    pub fn usable_mut(&mut self, handle: &BlockHandle) -> &mut [u8] {
        self.arena.usable_mut(handle.id)
    }

    /// Current state of block `id`; `None` for ids this allocator never issued.
    #[must_use]
    pub fn block_state(&self, id: BlockId) -> Option<BlockState> {
        self.arena.state(id)
    }

    /// Number of blocks ever acquired from the provider.
    #[must_use]
    pub fn blocks_created(&self) -> usize {
        self.arena.len()
    }

    /// Free blocks of every class, head first, with their stored sizes.
    #[must_use]
    pub fn snapshot(&self) -> FreeListSnapshot {
        let classes = self
            .classes
            .thresholds()
            .iter()
            .enumerate()
            .map(|(index, &threshold)| {
                let blocks: Vec<BlockId> = self.registry.iter(&self.arena, index).collect();
                let free_sizes = blocks
                    .iter()
                    .filter_map(|&id| self.arena.header(id).map(|header| header.size))
                    .collect();
                ClassSnapshot {
                    index,
                    threshold,
                    blocks,
                    free_sizes,
                }
            })
            .collect();
        FreeListSnapshot { classes }
    }

    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        debug_assert_eq!(self.stats.free_blocks, self.registry.total_free());
        self.stats
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Consumes the allocator, returning its provider. Blocks still owned by
    /// the allocator are dropped without being handed to the provider.
    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Retained lifecycle records, oldest first.
    #[must_use]
    pub fn lifecycle_logs(&self) -> &VecDeque<AllocatorLogRecord> {
        self.log.records()
    }

    /// Records evicted from the lifecycle ring so far.
    #[must_use]
    pub fn lifecycle_records_dropped(&self) -> u64 {
        self.log.dropped()
    }

    pub fn drain_lifecycle_logs(&mut self) -> Vec<AllocatorLogRecord> {
        self.log.drain()
    }

    #[cfg(test)]
    fn overwrite_stored_size(&mut self, handle: &BlockHandle, size: usize) {
        self.arena.overwrite_size(handle.id, size);
    }
}
