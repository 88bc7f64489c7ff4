//! Hook context manager
//!
//! Each component render runs inside one [`HookFrame`] activation. The frame is stored in
//! task-local storage for exactly the duration of the component body, so hook calls find
//! "their" fiber without any process-global state, and deployments running concurrently on
//! other tasks never observe each other's counters.

use crate::dom::{Lifecycle, ResourceDescriptor};
use crate::error::HookError;
use crate::hooks::context::ContextStack;
use crate::runtime::Runtime;
use crate::types::FiberId;
use crate::value::OutputRef;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

tokio::task_local! {
    static ACTIVE_FRAME: HookFrame;
}

/// Hook kinds, recorded in call order to detect conditional hook calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Instance,
    State,
    Effect,
    Context,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Instance => "use_instance",
            HookKind::State => "use_state",
            HookKind::Effect => "use_effect",
            HookKind::Context => "use_context",
        };
        f.write_str(name)
    }
}

/// Per-kind slot counters for one activation
#[derive(Debug, Default)]
struct HookCursor {
    state: usize,
    effect: usize,
    /// Auto-id call index per resource kind
    instances: HashMap<String, usize>,
    order: Vec<HookKind>,
}

/// What a finished activation produced
#[derive(Debug, Default)]
pub(crate) struct FrameOutput {
    pub resources: Vec<ResourceDescriptor>,
    /// Outputs read directly by the component body
    pub reads: BTreeSet<OutputRef>,
    pub order: Vec<HookKind>,
}

/// Render-scoped hook context for one fiber
pub(crate) struct HookFrame {
    fiber: FiberId,
    component_path: String,
    resource_prefix: Vec<String>,
    lifecycle: Lifecycle,
    contexts: ContextStack,
    runtime: Arc<Runtime>,
    cursor: RefCell<HookCursor>,
    resources: RefCell<Vec<ResourceDescriptor>>,
    /// Stack of read-tracking windows; the bottom one spans the whole body
    windows: RefCell<Vec<BTreeSet<OutputRef>>>,
}

impl HookFrame {
    pub(crate) fn new(
        fiber: FiberId,
        component_path: String,
        resource_prefix: Vec<String>,
        lifecycle: Lifecycle,
        contexts: ContextStack,
        runtime: Arc<Runtime>,
    ) -> Self {
        Self {
            fiber,
            component_path,
            resource_prefix,
            lifecycle,
            contexts,
            runtime,
            cursor: RefCell::new(HookCursor::default()),
            resources: RefCell::new(Vec::new()),
            windows: RefCell::new(vec![BTreeSet::new()]),
        }
    }

    /// Run `body` with this frame active (begin render .. end render)
    pub(crate) fn activate<R>(self, body: impl FnOnce() -> R) -> (R, FrameOutput) {
        ACTIVE_FRAME.sync_scope(self, || {
            let result = body();
            let output = ACTIVE_FRAME.with(HookFrame::finish);
            (result, output)
        })
    }

    /// Run `f` against the active frame, or fail if no render is active
    pub(crate) fn with_active<R>(
        hook: &'static str,
        f: impl FnOnce(&HookFrame) -> R,
    ) -> Result<R, HookError> {
        ACTIVE_FRAME
            .try_with(f)
            .map_err(|_| HookError::NoActiveRender { hook })
    }

    #[cfg(test)]
    pub(crate) fn is_active() -> bool {
        ACTIVE_FRAME.try_with(|_| ()).is_ok()
    }

    /// Record an output read in the innermost tracking window, if a render is active
    pub(crate) fn record_read(output: &OutputRef) {
        let _ = ACTIVE_FRAME.try_with(|frame| {
            if let Some(window) = frame.windows.borrow_mut().last_mut() {
                window.insert(output.clone());
            }
        });
    }

    /// Evaluate `f` inside a nested tracking window and return the outputs it read
    pub(crate) fn track<R>(&self, f: impl FnOnce() -> R) -> (R, BTreeSet<OutputRef>) {
        self.windows.borrow_mut().push(BTreeSet::new());
        let result = f();
        let reads = self.windows.borrow_mut().pop().unwrap_or_default();
        (result, reads)
    }

    pub(crate) fn note_hook(&self, kind: HookKind) {
        self.cursor.borrow_mut().order.push(kind);
    }

    /// Next state slot index
    pub(crate) fn next_state_slot(&self) -> usize {
        let mut cursor = self.cursor.borrow_mut();
        cursor.order.push(HookKind::State);
        let slot = cursor.state;
        cursor.state += 1;
        slot
    }

    /// Next effect index
    pub(crate) fn next_effect_slot(&self) -> usize {
        let mut cursor = self.cursor.borrow_mut();
        cursor.order.push(HookKind::Effect);
        let slot = cursor.effect;
        cursor.effect += 1;
        slot
    }

    /// Call index of `kind` among this render's auto-identified resources
    pub(crate) fn next_instance_index(&self, kind: &str) -> usize {
        let mut cursor = self.cursor.borrow_mut();
        cursor.order.push(HookKind::Instance);
        let counter = cursor.instances.entry(kind.to_string()).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    pub(crate) fn push_resource(&self, descriptor: ResourceDescriptor) {
        self.resources.borrow_mut().push(descriptor);
    }

    pub(crate) fn fiber(&self) -> FiberId {
        self.fiber
    }

    pub(crate) fn component_path(&self) -> &str {
        &self.component_path
    }

    pub(crate) fn resource_prefix(&self) -> &[String] {
        &self.resource_prefix
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    pub(crate) fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    fn finish(&self) -> FrameOutput {
        let reads = self
            .windows
            .borrow_mut()
            .drain(..)
            .next()
            .unwrap_or_default();
        FrameOutput {
            resources: std::mem::take(&mut *self.resources.borrow_mut()),
            reads,
            order: std::mem::take(&mut self.cursor.borrow_mut().order),
        }
    }
}
