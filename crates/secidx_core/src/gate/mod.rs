//! The concurrency gate guarding mutating store operations.
//!
//! Every mutating call (`set`, `delete`, each batch call as a whole) runs as
//! one critical section of the store's [`Locker`]. The gate adds
//! reentrancy on top of any locker: while a critical section is running, a
//! thread-local marker records which gate it belongs to, and gated calls
//! made from inside it run directly instead of asking the locker again.
//! A custom locker is therefore acquired exactly once per logical call,
//! even when the operation calls back into the store.

mod locker;

pub use locker::{Locker, PassthroughLocker, QueueLocker};

use crate::error::{CoreError, CoreResult};
use crate::stats::StoreStats;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

static NEXT_GATE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Gates whose critical section is running on this thread, innermost last.
    static HELD_GATES: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks a gate as held on the current thread for the guard's lifetime.
struct HeldMarker {
    gate_id: u64,
}

impl HeldMarker {
    fn enter(gate_id: u64) -> Self {
        HELD_GATES.with(|held| held.borrow_mut().push(gate_id));
        Self { gate_id }
    }
}

impl Drop for HeldMarker {
    fn drop(&mut self) {
        HELD_GATES.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&id| id == self.gate_id) {
                held.remove(pos);
            }
        });
    }
}

/// Serializes mutating operations of one store.
pub(crate) struct Gate {
    id: u64,
    locker: Arc<dyn Locker>,
}

impl Gate {
    pub(crate) fn new(locker: Arc<dyn Locker>) -> Self {
        Self {
            id: NEXT_GATE_ID.fetch_add(1, Ordering::Relaxed),
            locker,
        }
    }

    /// Returns true if the current thread is inside this gate's critical section.
    pub(crate) fn is_held(&self) -> bool {
        HELD_GATES.with(|held| held.borrow().contains(&self.id))
    }

    /// Runs `body` inside the gate.
    ///
    /// If the gate is already held by the current thread, `body` runs
    /// directly. Otherwise it runs as one critical section of the locker.
    /// The gate is released however `body` finishes.
    ///
    /// # Errors
    ///
    /// Returns `body`'s error, or [`CoreError::LockNotAcquired`] if the
    /// locker never ran the critical section.
    pub(crate) fn run<T>(
        &self,
        stats: &StoreStats,
        body: impl FnOnce() -> CoreResult<T>,
    ) -> CoreResult<T> {
        if self.is_held() {
            trace!(gate = self.id, "reentrant gate entry");
            stats.record_reentrant_entry();
            return body();
        }

        let mut body = Some(body);
        let mut outcome = None;
        self.locker.with_lock(&mut || {
            if let Some(body) = body.take() {
                let _marker = HeldMarker::enter(self.id);
                stats.record_gate_acquisition();
                outcome = Some(body());
            }
        });
        outcome.unwrap_or(Err(CoreError::LockNotAcquired))
    }
}
