//! CloudDOM
//!
//! The flattened, validated forest of resource descriptors produced by a render pass.
//! Every node has a unique id derived from its normalized path; parent/child edges link
//! nodes whose paths differ by exactly one trailing segment.

pub mod builder;
pub mod lifecycle;
pub mod path;
pub mod validator;

pub use builder::{CloudDomBuilder, MalformedPolicy};
pub use lifecycle::{Lifecycle, LifecycleCallback, LifecycleContext};

use crate::types::{FiberId, Hash, Outputs, PropertySnapshot, ResourceId};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A kind of deployable resource
///
/// Kinds are usually declared as constants next to the components that use them:
///
/// ```
/// use stratus::dom::ResourceKind;
///
/// const DATABASE: ResourceKind = ResourceKind::new("Database").with_required(&["engine"]);
/// assert_eq!(DATABASE.name(), "Database");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    name: &'static str,
    required: &'static [&'static str],
}

impl ResourceKind {
    pub const fn new(name: &'static str) -> Self {
        Self { name, required: &[] }
    }

    /// Properties that must be present (and defined) on every instance
    pub const fn with_required(mut self, required: &'static [&'static str]) -> Self {
        self.required = required;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn required(&self) -> &'static [&'static str] {
        self.required
    }
}

/// A resource as registered by a component, before normalization
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub kind: String,
    /// Raw path segments: resource-path prefix followed by the local id
    pub path: Vec<String>,
    pub props: PropertySnapshot,
    pub required: &'static [&'static str],
    pub lifecycle: Lifecycle,
    pub owner: FiberId,
    /// Slash-joined component names from the root to the owning component
    pub component_path: String,
}

/// A validated CloudDOM node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: ResourceId,
    pub path: Vec<String>,
    pub kind: String,
    pub props: PropertySnapshot,
    #[serde(default)]
    pub outputs: Outputs,
    #[serde(default)]
    pub children: Vec<ResourceId>,
    #[serde(default)]
    pub component_path: String,
    #[serde(skip)]
    pub lifecycle: Lifecycle,
    #[serde(skip)]
    pub owner: Option<FiberId>,
}

impl ResourceNode {
    /// Local (last) segment of the id
    pub fn local_id(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    pub fn lifecycle_context(&self) -> LifecycleContext {
        LifecycleContext::now(self.id.clone(), self.path.clone(), self.outputs.clone())
    }
}

/// The resource forest
#[derive(Debug, Clone, Default)]
pub struct CloudDom {
    /// Nodes keyed by id. Ordered, so ancestors always precede their descendants.
    nodes: BTreeMap<ResourceId, ResourceNode>,
    /// Map of child id to parent id
    parent_map: HashMap<ResourceId, ResourceId>,
}

impl CloudDom {
    /// Assemble a forest from nodes whose `children` edges are already set
    pub(crate) fn from_parts(nodes: BTreeMap<ResourceId, ResourceNode>) -> Self {
        let mut parent_map = HashMap::new();
        for (id, node) in &nodes {
            for child in &node.children {
                parent_map.insert(child.clone(), id.clone());
            }
        }
        Self { nodes, parent_map }
    }

    /// Rebuild a forest from a persisted node snapshot
    pub fn from_snapshot(nodes: Vec<ResourceNode>) -> Self {
        Self::from_parts(nodes.into_iter().map(|n| (n.id.clone(), n)).collect())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ResourceNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ancestors before descendants
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ResourceNode> {
        self.nodes.values_mut()
    }

    /// Nodes with no parent
    pub fn roots(&self) -> Vec<&ResourceNode> {
        self.nodes
            .values()
            .filter(|n| !self.parent_map.contains_key(&n.id))
            .collect()
    }

    pub fn find_parent(&self, id: &str) -> Option<&ResourceNode> {
        self.parent_map.get(id).and_then(|p| self.nodes.get(p))
    }

    pub fn children(&self, id: &str) -> Vec<&ResourceNode> {
        self.nodes
            .get(id)
            .map(|n| n.children.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Flat node list, for reconciliation and persistence
    pub fn flatten(&self) -> Vec<ResourceNode> {
        self.nodes.values().cloned().collect()
    }

    /// Copy outputs of every node present in `other` onto the matching node here
    pub fn carry_outputs_from(&mut self, other: &CloudDom) {
        for (id, node) in self.nodes.iter_mut() {
            if let Some(prev) = other.nodes.get(id) {
                if node.outputs.is_empty() {
                    node.outputs = prev.outputs.clone();
                }
            }
        }
    }

    /// Flattened output map keyed `parent.child.outputKey`
    pub fn flatten_outputs(&self) -> BTreeMap<String, serde_json::Value> {
        let mut flat = BTreeMap::new();
        for node in self.nodes.values() {
            for (key, value) in &node.outputs {
                flat.insert(format!("{}.{}", node.id, key), value.clone());
            }
        }
        flat
    }

    /// Deterministic fingerprint over ids, kinds, properties and hierarchy
    ///
    /// Outputs are excluded: two forests that describe the same desired state share a
    /// fingerprint regardless of what the materializer reported back.
    pub fn fingerprint(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(b"clouddom");
        hasher.update(&(self.nodes.len() as u64).to_be_bytes());

        for node in self.nodes.values() {
            hasher.update(b"node:");
            hasher.update(&(node.id.len() as u64).to_be_bytes());
            hasher.update(node.id.as_bytes());
            hasher.update(b"kind:");
            hasher.update(node.kind.as_bytes());
            for (key, value) in &node.props {
                hasher.update(key.as_bytes());
                hasher.update(b"=");
                hasher.update(value.to_string().as_bytes());
                hasher.update(b"\n");
            }
            for child in &node.children {
                hasher.update(b"child:");
                hasher.update(child.as_bytes());
            }
        }

        *hasher.finalize().as_bytes()
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }
}
