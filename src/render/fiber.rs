//! Fibers: one node per component invocation

use crate::dom::ResourceDescriptor;
use crate::hooks::context::ContextStack;
use crate::hooks::HookKind;
use crate::render::element::Element;
use crate::types::FiberId;

/// One component invocation at a fixed tree position
///
/// Hook slots and effect records live in the runtime's hook store, keyed by the fiber id;
/// the fiber itself keeps what is needed to re-render it in isolation.
pub(crate) struct Fiber {
    pub id: FiberId,
    pub parent: Option<FiberId>,
    /// Position among the parent's children
    pub key: ChildKey,
    pub element: Element,
    /// Component names (with keys) from the root down to this fiber
    pub path: Vec<String>,
    pub depth: usize,
    /// Raw resource path of the nearest resource-registering ancestor
    pub resource_prefix: Vec<String>,
    /// Provider values visible to this fiber
    pub contexts: ContextStack,
    /// Resources registered by the last render
    pub resources: Vec<ResourceDescriptor>,
    pub children: Vec<FiberId>,
    /// Hook call order of the first render
    pub hook_order: Option<Vec<HookKind>>,
}

impl Fiber {
    pub fn component_path(&self) -> String {
        self.path.join("/")
    }

    /// Resource path prefix handed to children
    ///
    /// Children nest under this fiber's first registered resource; a fiber that registers
    /// nothing passes its own prefix through unchanged.
    pub fn child_prefix(&self) -> Vec<String> {
        match self.resources.first() {
            Some(resource) => resource.path.clone(),
            None => self.resource_prefix.clone(),
        }
    }
}

/// Identity of a child position, used to match children across renders
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ChildKey {
    Keyed { name: String, key: String },
    Positional { name: String, index: usize },
}

impl ChildKey {
    /// Keys for a list of sibling elements
    ///
    /// Unkeyed siblings are matched by their position among same-named unkeyed siblings.
    pub fn for_siblings(elements: &[Element]) -> Vec<ChildKey> {
        let mut positions: std::collections::HashMap<&str, usize> = Default::default();
        elements
            .iter()
            .map(|element| match element.key() {
                Some(key) => ChildKey::Keyed {
                    name: element.name().to_string(),
                    key: key.to_string(),
                },
                None => {
                    let index = positions.entry(element.name()).or_insert(0);
                    let key = ChildKey::Positional {
                        name: element.name().to_string(),
                        index: *index,
                    };
                    *index += 1;
                    key
                }
            })
            .collect()
    }

    /// Fiber path segment for this position
    pub fn segment(&self) -> String {
        match self {
            ChildKey::Keyed { name, key } => format!("{}[{}]", name, key),
            ChildKey::Positional { name, index: 0 } => name.clone(),
            ChildKey::Positional { name, index } => format!("{}#{}", name, index),
        }
    }
}
