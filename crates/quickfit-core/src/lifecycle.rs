//! Structured allocator lifecycle records.
//!
//! When enabled, the allocator appends one record per operation to an
//! in-memory ring that the host can inspect or drain. The ring holds at most
//! `capacity` records and drops the oldest one first. Records serialize to
//! JSON so a host can emit them as JSONL next to its own logs.

use std::collections::VecDeque;

use serde::Serialize;

use crate::arena::BlockId;

/// Allocator lifecycle log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatorLogLevel {
    Trace,
    Debug,
    Warn,
    Error,
}

/// Structured allocator lifecycle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatorLogRecord {
    /// Monotonic decision/event id, starting at 1.
    pub decision_id: u64,
    /// Correlation id: `quickfit::<symbol>::<decision id as hex>`.
    pub trace_id: String,
    pub level: AllocatorLogLevel,
    /// Operation (`allocate`, `release`).
    pub symbol: &'static str,
    /// Event kind (`alloc`, `free`, `size_not_supported`, ...).
    pub event: &'static str,
    /// Block involved in the event.
    pub block: Option<BlockId>,
    /// Size involved in the event.
    pub size: Option<usize>,
    /// Size-class index involved in the event.
    pub class: Option<usize>,
    /// Machine-readable outcome label.
    pub outcome: &'static str,
    /// Free-form details for debugging.
    pub details: String,
    /// Snapshot: blocks currently held by callers.
    pub live_blocks: usize,
    /// Snapshot: blocks currently on free lists.
    pub free_blocks: usize,
}

/// Records kept by an allocator when no capacity is configured.
pub const DEFAULT_LIFECYCLE_CAPACITY: usize = 1024;

/// Bounded in-memory record sink owned by one allocator.
#[derive(Debug)]
pub(crate) struct LifecycleLog {
    enabled: bool,
    capacity: usize,
    next_decision_id: u64,
    dropped: u64,
    records: VecDeque<AllocatorLogRecord>,
}

/// Fields of a record before the log assigns its ids.
pub(crate) struct LifecycleEvent {
    pub(crate) level: AllocatorLogLevel,
    pub(crate) symbol: &'static str,
    pub(crate) event: &'static str,
    pub(crate) block: Option<BlockId>,
    pub(crate) size: Option<usize>,
    pub(crate) class: Option<usize>,
    pub(crate) outcome: &'static str,
    pub(crate) details: String,
}

impl LifecycleLog {
    pub(crate) fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled: enabled && capacity > 0,
            capacity,
            next_decision_id: 1,
            dropped: 0,
            records: VecDeque::new(),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records evicted to stay within capacity.
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn record(&mut self, event: LifecycleEvent, live_blocks: usize, free_blocks: usize) {
        if !self.enabled {
            return;
        }
        let decision_id = self.next_decision_id;
        self.next_decision_id = self.next_decision_id.wrapping_add(1);
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(AllocatorLogRecord {
            decision_id,
            trace_id: format!("quickfit::{}::{:016x}", event.symbol, decision_id),
            level: event.level,
            symbol: event.symbol,
            event: event.event,
            block: event.block,
            size: event.size,
            class: event.class,
            outcome: event.outcome,
            details: event.details,
            live_blocks,
            free_blocks,
        });
    }

    pub(crate) fn records(&self) -> &VecDeque<AllocatorLogRecord> {
        &self.records
    }

    pub(crate) fn drain(&mut self) -> Vec<AllocatorLogRecord> {
        self.records.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(symbol: &'static str) -> LifecycleEvent {
        LifecycleEvent {
            level: AllocatorLogLevel::Trace,
            symbol,
            event: "alloc",
            block: Some(BlockId(2)),
            size: Some(50),
            class: Some(0),
            outcome: "success",
            details: String::new(),
        }
    }

    #[test]
    fn test_decision_ids_are_monotonic() {
        let mut log = LifecycleLog::new(true, 8);
        log.record(event("allocate"), 1, 0);
        log.record(event("release"), 0, 1);
        let ids: Vec<u64> = log.records().iter().map(|r| r.decision_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(log.records()[1].trace_id, "quickfit::release::0000000000000002");
        assert_eq!(log.records()[1].free_blocks, 1);
    }

    #[test]
    fn test_disabled_log_keeps_nothing() {
        let mut log = LifecycleLog::new(false, 8);
        log.record(event("allocate"), 1, 0);
        assert!(!log.is_enabled());
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_drain_empties_but_keeps_numbering() {
        let mut log = LifecycleLog::new(true, 8);
        log.record(event("allocate"), 1, 0);
        assert_eq!(log.drain().len(), 1);
        assert!(log.records().is_empty());
        log.record(event("allocate"), 2, 0);
        assert_eq!(log.records()[0].decision_id, 2);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(AllocatorLogLevel::Trace < AllocatorLogLevel::Warn);
        assert!(AllocatorLogLevel::Warn < AllocatorLogLevel::Error);
    }

    #[test]
    fn test_ring_drops_oldest_at_capacity() {
        let mut log = LifecycleLog::new(true, 3);
        for _ in 0..10 {
            log.record(event("allocate"), 1, 0);
        }
        let ids: Vec<u64> = log.records().iter().map(|r| r.decision_id).collect();
        assert_eq!(ids, vec![8, 9, 10]);
        assert_eq!(log.dropped(), 7);
    }

    #[test]
    fn test_zero_capacity_disables_recording() {
        let mut log = LifecycleLog::new(true, 0);
        log.record(event("allocate"), 1, 0);
        assert!(!log.is_enabled());
        assert!(log.records().is_empty());
    }
}
