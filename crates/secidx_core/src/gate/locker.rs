//! Lockers: the mutual-exclusion strategies a gate can use.

use parking_lot::{Condvar, Mutex};

/// A mutual-exclusion strategy for the store's mutating operations.
///
/// `with_lock` must run `critical` at most once, and should run it exactly
/// once while holding whatever exclusion the locker provides. A locker that
/// returns without running it makes the gated operation fail with
/// [`CoreError::LockNotAcquired`](crate::CoreError::LockNotAcquired).
///
/// Any `Fn(&mut dyn FnMut()) + Send + Sync` closure is a locker, which makes
/// it easy to plug in an external lock:
///
/// ```rust
/// use parking_lot::Mutex;
/// use secidx_core::Locker;
/// use std::sync::Arc;
///
/// let mutex = Arc::new(Mutex::new(()));
/// let locker = move |critical: &mut dyn FnMut()| {
///     let _held = mutex.lock();
///     critical();
/// };
/// let locker: Arc<dyn Locker> = Arc::new(locker);
/// ```
pub trait Locker: Send + Sync {
    /// Runs `critical` under this locker's exclusion.
    fn with_lock(&self, critical: &mut dyn FnMut());
}

impl<F> Locker for F
where
    F: Fn(&mut dyn FnMut()) + Send + Sync,
{
    fn with_lock(&self, critical: &mut dyn FnMut()) {
        self(critical);
    }
}

#[derive(Debug, Default)]
struct QueueState {
    /// Ticket handed to the next arrival.
    next_ticket: u64,
    /// Ticket currently allowed to run.
    serving: u64,
}

/// The default locker: a single-slot FIFO admission queue.
///
/// Callers are admitted strictly in arrival order, one at a time. A turn is
/// released when the critical section returns or unwinds, so a failed or
/// panicking operation never leaves the queue stuck.
#[derive(Debug, Default)]
pub struct QueueLocker {
    state: Mutex<QueueState>,
    turn_changed: Condvar,
}

impl QueueLocker {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many callers hold or await a turn.
    #[must_use]
    pub fn pending(&self) -> u64 {
        let state = self.state.lock();
        state.next_ticket - state.serving
    }

    fn admit(&self) -> QueueTurn<'_> {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        while state.serving != ticket {
            self.turn_changed.wait(&mut state);
        }
        QueueTurn { queue: self }
    }
}

impl Locker for QueueLocker {
    fn with_lock(&self, critical: &mut dyn FnMut()) {
        let _turn = self.admit();
        critical();
    }
}

/// A held turn in a [`QueueLocker`]; dropping it admits the next caller.
struct QueueTurn<'a> {
    queue: &'a QueueLocker,
}

impl Drop for QueueTurn<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.state.lock();
        state.serving += 1;
        drop(state);
        self.queue.turn_changed.notify_all();
    }
}

/// A locker that provides no exclusion at all.
///
/// Suitable only when a single writer is guaranteed by other means.
/// Concurrent writers that touch the same index entry can lose each
/// other's memberships (the last rewrite of the entry wins).
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughLocker;

impl Locker for PassthroughLocker {
    fn with_lock(&self, critical: &mut dyn FnMut()) {
        critical();
    }
}
