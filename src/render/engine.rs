//! Render engine
//!
//! Walks the element tree, owns the fiber arena and re-renders queued fibers. A fiber's
//! subtree is always re-rendered with it, so a drain renders each queued fiber only if no
//! ancestor was already rendered in the same drain.

use crate::dom::ResourceDescriptor;
use crate::error::{EngineError, HookError};
use crate::hooks::context::ContextStack;
use crate::hooks::frame::{FrameOutput, HookFrame};
use crate::reactive::BindingTarget;
use crate::render::element::{Element, ElementKind};
use crate::render::fiber::{ChildKey, Fiber};
use crate::runtime::Runtime;
use crate::types::FiberId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

pub struct RenderEngine {
    runtime: Arc<Runtime>,
    fibers: HashMap<FiberId, Fiber>,
    root: Option<FiberId>,
    next_id: u64,
}

impl RenderEngine {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            fibers: HashMap::new(),
            root: None,
            next_id: 1,
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn root(&self) -> Option<FiberId> {
        self.root
    }

    /// Number of live fibers
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Live fiber at a component path such as `App/Service[api]/Database`
    pub fn fiber_at(&self, component_path: &str) -> Option<FiberId> {
        self.fibers
            .values()
            .find(|f| f.component_path() == component_path)
            .map(|f| f.id)
    }

    /// Render a fresh tree, replacing any tree rendered before
    #[instrument(skip(self, root), fields(component = root.name()))]
    pub fn render_root(&mut self, root: Element) -> Result<(), EngineError> {
        self.unmount();
        let key = ChildKey::for_siblings(std::slice::from_ref(&root))
            .pop()
            .unwrap_or(ChildKey::Positional {
                name: root.name().to_string(),
                index: 0,
            });
        let path = vec![key.segment()];
        let id = self.spawn(None, key, root, path, 0, Vec::new(), ContextStack::default());
        self.root = Some(id);
        self.render_fiber(id)?;
        debug!(fibers = self.fibers.len(), "Rendered tree");
        Ok(())
    }

    /// Re-render every queued fiber, shallowest first
    ///
    /// Fibers covered by an ancestor's re-render and fibers that no longer exist are
    /// skipped. Returns the number of fibers rendered from the queue.
    #[instrument(skip(self))]
    pub fn drain(&mut self) -> Result<usize, EngineError> {
        let mut queued: Vec<(usize, FiberId)> = self
            .runtime
            .scheduler
            .take_all()
            .into_iter()
            .filter_map(|id| self.fibers.get(&id).map(|f| (f.depth, id)))
            .collect();
        queued.sort_by_key(|(depth, _)| *depth);

        let mut rendered = HashSet::new();
        for (_, id) in queued {
            if !self.fibers.contains_key(&id) || self.is_covered(id, &rendered) {
                trace!(fiber = %id, "Skipping covered fiber");
                continue;
            }
            self.render_fiber(id)?;
            rendered.insert(id);
        }

        if !rendered.is_empty() {
            debug!(rendered = rendered.len(), "Drained scheduler");
        }
        Ok(rendered.len())
    }

    /// Resource descriptors of every live fiber, depth-first in tree order
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        let mut descriptors = Vec::new();
        let mut stack: Vec<FiberId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            if let Some(fiber) = self.fibers.get(&id) {
                descriptors.extend(fiber.resources.iter().cloned());
                stack.extend(fiber.children.iter().rev().copied());
            }
        }
        descriptors
    }

    /// Tear down the whole tree, running every pending effect cleanup
    pub fn unmount(&mut self) {
        if let Some(root) = self.root.take() {
            self.teardown(root);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn(
        &mut self,
        parent: Option<FiberId>,
        key: ChildKey,
        element: Element,
        path: Vec<String>,
        depth: usize,
        resource_prefix: Vec<String>,
        contexts: ContextStack,
    ) -> FiberId {
        let id = FiberId(self.next_id);
        self.next_id += 1;
        self.fibers.insert(
            id,
            Fiber {
                id,
                parent,
                key,
                element,
                path,
                depth,
                resource_prefix,
                contexts,
                resources: Vec::new(),
                children: Vec::new(),
                hook_order: None,
            },
        );
        trace!(fiber = %id, "Created fiber");
        id
    }

    fn render_fiber(&mut self, id: FiberId) -> Result<(), EngineError> {
        let Some(fiber) = self.fibers.get(&id) else {
            return Ok(());
        };
        let element = fiber.element.clone();
        let contexts = fiber.contexts.clone();

        let (children, child_contexts) = match &element.kind {
            ElementKind::Provider(entry) => {
                let children = element.props.child_elements().to_vec();
                (children, contexts.push(entry.clone()))
            }
            ElementKind::Component(component) => {
                let frame = HookFrame::new(
                    id,
                    fiber.component_path(),
                    fiber.resource_prefix.clone(),
                    element.props.lifecycle().clone(),
                    contexts.clone(),
                    self.runtime.clone(),
                );
                let (result, output) = frame.activate(|| component.call(&element.props));
                let children = result?;
                self.commit(id, output)?;
                trace!(fiber = %id, component = component.name(), "Rendered fiber");
                (children, contexts)
            }
        };

        self.reconcile_children(id, children, child_contexts)
    }

    /// Store what an activation produced on its fiber
    fn commit(&mut self, id: FiberId, output: FrameOutput) -> Result<(), EngineError> {
        let Some(fiber) = self.fibers.get_mut(&id) else {
            return Ok(());
        };

        if fiber.hook_order.is_none() {
            fiber.hook_order = Some(output.order.clone());
        }
        if let Some(expected) = fiber.hook_order.as_ref().filter(|o| **o != output.order) {
            return Err(HookError::OrderChanged {
                component: fiber.component_path(),
                expected: expected.iter().map(ToString::to_string).collect(),
                actual: output.order.iter().map(ToString::to_string).collect(),
            }
            .into());
        }

        fiber.resources = output.resources;
        self.runtime
            .bindings
            .lock()
            .rebind(BindingTarget::Render { fiber: id }, output.reads);
        Ok(())
    }

    /// Match new child elements against existing child fibers, then render them
    fn reconcile_children(
        &mut self,
        parent: FiberId,
        elements: Vec<Element>,
        contexts: ContextStack,
    ) -> Result<(), EngineError> {
        let Some(parent_fiber) = self.fibers.get(&parent) else {
            return Ok(());
        };
        let prefix = parent_fiber.child_prefix();
        let parent_path = parent_fiber.path.clone();
        let depth = parent_fiber.depth + 1;

        let mut existing: HashMap<ChildKey, FiberId> = parent_fiber
            .children
            .iter()
            .filter_map(|id| self.fibers.get(id).map(|f| (f.key.clone(), *id)))
            .collect();

        let keys = ChildKey::for_siblings(&elements);
        let mut children = Vec::with_capacity(elements.len());
        for (element, key) in elements.into_iter().zip(keys) {
            let mut path = parent_path.clone();
            path.push(key.segment());

            let id = match existing.remove(&key) {
                Some(id) => {
                    if let Some(fiber) = self.fibers.get_mut(&id) {
                        fiber.element = element;
                        fiber.path = path;
                        fiber.resource_prefix = prefix.clone();
                        fiber.contexts = contexts.clone();
                    }
                    id
                }
                None => self.spawn(
                    Some(parent),
                    key,
                    element,
                    path,
                    depth,
                    prefix.clone(),
                    contexts.clone(),
                ),
            };
            children.push(id);
        }

        for (_, stale) in existing {
            self.teardown(stale);
        }
        if let Some(parent_fiber) = self.fibers.get_mut(&parent) {
            parent_fiber.children = children.clone();
        }

        for child in children {
            self.render_fiber(child)?;
        }
        Ok(())
    }

    /// Remove a fiber and its subtree: run pending cleanups, drop slots and bindings
    fn teardown(&mut self, id: FiberId) {
        let Some(fiber) = self.fibers.remove(&id) else {
            return;
        };
        for child in fiber.children {
            self.teardown(child);
        }

        let cleanups = self.runtime.hooks.lock().remove_fiber(id);
        for cleanup in cleanups {
            cleanup();
        }
        self.runtime.bindings.lock().remove_fiber(id);
        self.runtime.scheduler.remove(id);
        trace!(fiber = %id, "Tore down fiber");
    }

    fn is_covered(&self, id: FiberId, rendered: &HashSet<FiberId>) -> bool {
        let mut current = self.fibers.get(&id).and_then(|f| f.parent);
        while let Some(parent) = current {
            if rendered.contains(&parent) {
                return true;
            }
            current = self.fibers.get(&parent).and_then(|f| f.parent);
        }
        false
    }
}
