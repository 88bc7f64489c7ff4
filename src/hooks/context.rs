//! Context propagation
//!
//! A provider element pushes `(context id, value)` for the duration of its subtree; a
//! consumer resolves the innermost matching entry, or the context default.

use crate::error::HookError;
use crate::hooks::frame::{HookFrame, HookKind};
use crate::render::Element;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        ContextId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

type ContextValue = Arc<dyn Any + Send + Sync>;

/// One pushed provider value
#[derive(Clone)]
pub(crate) struct ContextEntry {
    pub(crate) id: ContextId,
    pub(crate) value: ContextValue,
}

/// Provider values visible at a point in the tree, outermost first
///
/// Each fiber keeps the stack it rendered under so it can be re-rendered on its own.
#[derive(Clone, Default)]
pub(crate) struct ContextStack {
    entries: Vec<ContextEntry>,
}

impl ContextStack {
    pub(crate) fn push(&self, entry: ContextEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self { entries }
    }

    pub(crate) fn lookup(&self, id: ContextId) -> Option<&ContextValue> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.id == id)
            .map(|e| &e.value)
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.entries.len()
    }
}

/// A typed context with a default value
pub struct Context<T> {
    id: ContextId,
    default: T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Context<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(default: T) -> Self {
        Self {
            id: ContextId::next(),
            default,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Provider element: `value` is visible to every descendant of `children`
    pub fn provide(&self, value: T, children: Vec<Element>) -> Element {
        Element::provider(
            ContextEntry {
                id: self.id,
                value: Arc::new(value),
            },
            children,
        )
    }
}

/// Read the innermost provided value of `context`, or its default
pub fn use_context<T>(context: &Context<T>) -> Result<T, HookError>
where
    T: Clone + Send + Sync + 'static,
{
    HookFrame::with_active("use_context", |frame| {
        frame.note_hook(HookKind::Context);
        match frame.contexts().lookup(context.id) {
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .ok_or(HookError::ContextTypeMismatch {
                    context: context.id.as_u64(),
                }),
            None => Ok(context.default.clone()),
        }
    })?
}
