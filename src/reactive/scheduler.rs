//! Re-render scheduling
//!
//! Deduplicated FIFO of fibers awaiting re-render. A fiber is present at most once no
//! matter how many of its slots or bound outputs changed since the last drain.

use crate::types::FiberId;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Fibers accepted into the queue
    pub enqueued: u64,
    /// Enqueue calls absorbed by an existing entry
    pub deduplicated: u64,
    /// Fibers handed out by `take_all`
    pub drained: u64,
}

#[derive(Debug, Default)]
struct PendingQueue {
    order: VecDeque<FiberId>,
    members: HashSet<FiberId>,
}

#[derive(Debug, Default)]
pub struct ReactiveScheduler {
    pending: Mutex<PendingQueue>,
    enqueued: AtomicU64,
    deduplicated: AtomicU64,
    drained: AtomicU64,
}

impl ReactiveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fiber. Returns false if it was already pending.
    pub fn enqueue(&self, fiber: FiberId) -> bool {
        let mut pending = self.pending.lock();
        if !pending.members.insert(fiber) {
            self.deduplicated.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        pending.order.push_back(fiber);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Remove and return every pending fiber in enqueue order
    pub fn take_all(&self) -> Vec<FiberId> {
        let mut pending = self.pending.lock();
        pending.members.clear();
        let fibers: Vec<FiberId> = pending.order.drain(..).collect();
        self.drained
            .fetch_add(fibers.len() as u64, Ordering::Relaxed);
        fibers
    }

    /// Drop a fiber that no longer exists
    pub fn remove(&self, fiber: FiberId) {
        let mut pending = self.pending.lock();
        if pending.members.remove(&fiber) {
            pending.order.retain(|f| *f != fiber);
        }
    }

    pub fn contains(&self, fiber: FiberId) -> bool {
        self.pending.lock().members.contains(&fiber)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending(&self) -> Vec<FiberId> {
        self.pending.lock().order.iter().copied().collect()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}
