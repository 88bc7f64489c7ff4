//! Per-deployment reactive runtime
//!
//! Everything a render, a setter or an effect needs to share lives here: the hook slot
//! arena, the output bindings, the re-render queue and the live output store. Each
//! deployment owns its own runtime, so concurrent deployments never observe each other.

use crate::hooks::store::HookStore;
use crate::reactive::{BindingManager, OutputStore, ReactiveScheduler};
use crate::types::FiberId;
use crate::value::{OutputRef, OutputValue, Value};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Counters describing reactive activity so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// State slot writes that changed a value
    pub slot_writes: u64,
    /// Fibers accepted into the re-render queue
    pub enqueued: u64,
    /// Fibers taken out of the re-render queue
    pub drained: u64,
}

pub struct Runtime {
    pub(crate) hooks: Mutex<HookStore>,
    pub(crate) bindings: Mutex<BindingManager>,
    pub(crate) scheduler: ReactiveScheduler,
    pub(crate) outputs: Arc<OutputStore>,
}

impl Runtime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: Mutex::new(HookStore::default()),
            bindings: Mutex::new(BindingManager::new()),
            scheduler: ReactiveScheduler::new(),
            outputs: Arc::new(OutputStore::new()),
        })
    }

    pub fn outputs(&self) -> &Arc<OutputStore> {
        &self.outputs
    }

    pub fn scheduler(&self) -> &ReactiveScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> RuntimeStats {
        let scheduler = self.scheduler.stats();
        RuntimeStats {
            slot_writes: self.hooks.lock().slot_writes(),
            enqueued: scheduler.enqueued,
            drained: scheduler.drained,
        }
    }

    /// Push changed outputs into bound state slots and queue every affected fiber
    ///
    /// Bound state slots receive the new value as an internal write: the binding already
    /// exists, so nothing is re-bound. Fibers are queued even when their slot value did not
    /// move, since a render or effect binding may still need the fresh output.
    pub fn propagate(&self, changed: &BTreeSet<OutputRef>) -> BTreeSet<FiberId> {
        if changed.is_empty() {
            return BTreeSet::new();
        }
        let affected = self.bindings.lock().resolve(changed.iter());

        {
            let mut hooks = self.hooks.lock();
            for (fiber, slot, source) in affected.states {
                let value = self.outputs.get(&source);
                if hooks.write_state(fiber, slot, Value::Output(OutputValue { source, value })) {
                    trace!(fiber = %fiber, slot, "Refreshed bound state slot");
                }
            }
        }

        for fiber in &affected.fibers {
            self.scheduler.enqueue(*fiber);
        }
        debug!(
            outputs = changed.len(),
            fibers = affected.fibers.len(),
            "Propagated output changes"
        );
        affected.fibers
    }
}
