//! Persisted-state hook

use crate::error::HookError;
use crate::hooks::frame::HookFrame;
use crate::reactive::BindingTarget;
use crate::runtime::Runtime;
use crate::types::FiberId;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Setter for one state slot
///
/// Setters outlive the render that created them, so effects and lifecycle callbacks can
/// hold on to them.
#[derive(Clone)]
pub struct StateSetter {
    runtime: Arc<Runtime>,
    fiber: FiberId,
    slot: usize,
}

impl StateSetter {
    pub(crate) fn new(runtime: Arc<Runtime>, fiber: FiberId, slot: usize) -> Self {
        Self {
            runtime,
            fiber,
            slot,
        }
    }

    /// Write the slot
    ///
    /// Unchanged values are ignored. A changed value enqueues the owning fiber for
    /// re-render; a tagged provider output also binds the slot to that output, once.
    /// Returns whether the slot changed.
    pub fn set(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if !self
            .runtime
            .hooks
            .lock()
            .write_state(self.fiber, self.slot, value.clone())
        {
            return false;
        }

        if let Value::Output(output) = &value {
            let target = BindingTarget::State {
                fiber: self.fiber,
                slot: self.slot,
            };
            let mut bindings = self.runtime.bindings.lock();
            if !bindings.is_bound(&target) {
                trace!(fiber = %self.fiber, slot = self.slot, output = %output.source, "Binding state slot");
                bindings.bind(output.source.clone(), target);
            }
        }

        self.runtime.scheduler.enqueue(self.fiber);
        true
    }

    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Debug for StateSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("fiber", &self.fiber)
            .field("slot", &self.slot)
            .finish()
    }
}

/// State slot of the active fiber, initialized with `initial` on first render
pub fn use_state(initial: impl Into<Value>) -> Result<(Value, StateSetter), HookError> {
    let initial = initial.into();
    HookFrame::with_active("use_state", |frame| {
        let slot = frame.next_state_slot();
        let value = frame
            .runtime()
            .hooks
            .lock()
            .state_or_init(frame.fiber(), slot, initial);
        (
            value,
            StateSetter::new(frame.runtime().clone(), frame.fiber(), slot),
        )
    })
}
