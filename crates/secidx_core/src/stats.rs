//! Store statistics.
//!
//! Counters for monitoring how much work index maintenance costs.
//!
//! # Usage
//!
//! ```rust,ignore
//! let stats = store.stats();
//! println!("Writes: {}", stats.writes);
//! println!("Index entry writes: {}", stats.index_entry_writes);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics and metrics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Primary record reads (single or batched, per key).
    reads: AtomicU64,
    /// Primary record writes.
    writes: AtomicU64,
    /// Primary records removed; deletes of absent keys are not counted.
    deletes: AtomicU64,
    /// Lookups through an index.
    index_lookups: AtomicU64,
    /// Index entries rewritten by maintenance.
    index_entry_writes: AtomicU64,
    /// Gate acquisitions through the locker.
    gate_acquisitions: AtomicU64,
    /// Gated calls that ran inside an already-held gate.
    reentrant_entries: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_reads(&self, count: usize) {
        self.reads.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_writes(&self, count: usize) {
        self.writes.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_deletes(&self, count: usize) {
        self.deletes.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_entry_writes(&self, count: usize) {
        self.index_entry_writes
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_gate_acquisition(&self) {
        self.gate_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reentrant_entry(&self) {
        self.reentrant_entries.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            index_entry_writes: self.index_entry_writes.load(Ordering::Relaxed),
            gate_acquisitions: self.gate_acquisitions.load(Ordering::Relaxed),
            reentrant_entries: self.reentrant_entries.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Primary record reads.
    pub reads: u64,
    /// Primary record writes.
    pub writes: u64,
    /// Primary records removed; deletes of absent keys are not counted.
    pub deletes: u64,
    /// Lookups through an index.
    pub index_lookups: u64,
    /// Index entries rewritten by maintenance.
    pub index_entry_writes: u64,
    /// Gate acquisitions through the locker.
    pub gate_acquisitions: u64,
    /// Gated calls that ran inside an already-held gate.
    pub reentrant_entries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = StoreStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = StoreStats::new();
        stats.record_reads(3);
        stats.record_writes(1);
        stats.record_deletes(2);
        stats.record_index_lookup();
        stats.record_index_entry_writes(4);

        let snap = stats.snapshot();
        assert_eq!(snap.reads, 3);
        assert_eq!(snap.writes, 1);
        assert_eq!(snap.deletes, 2);
        assert_eq!(snap.index_lookups, 1);
        assert_eq!(snap.index_entry_writes, 4);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(StoreStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_gate_acquisition();
                    s.record_reentrant_entry();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.gate_acquisitions, 1000);
        assert_eq!(snap.reentrant_entries, 1000);
    }
}
