//! Counters for allocator fallbacks.
//!
//! Neither fallback fails the allocation, so these counters are how operators
//! notice a registry that has outgrown the allocator.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AllocationStats {
    allocations: AtomicU64,
    prefix_exhausted: AtomicU64,
    timestamp_fallbacks: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationStatsSnapshot {
    pub allocations: u64,
    pub prefix_exhausted: u64,
    pub timestamp_fallbacks: u64,
}

impl AllocationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_prefix_exhausted(&self) {
        self.prefix_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timestamp_fallback(&self) {
        self.timestamp_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AllocationStatsSnapshot {
        AllocationStatsSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            prefix_exhausted: self.prefix_exhausted.load(Ordering::Relaxed),
            timestamp_fallbacks: self.timestamp_fallbacks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counts() {
        let stats = AllocationStats::new();
        stats.record_allocation();
        stats.record_allocation();
        stats.record_timestamp_fallback();
        assert_eq!(
            stats.snapshot(),
            AllocationStatsSnapshot { allocations: 2, prefix_exhausted: 0, timestamp_fallbacks: 1 }
        );
    }
}
