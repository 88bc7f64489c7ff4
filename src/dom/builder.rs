//! CloudDOM builder: normalizes, validates and assembles resource descriptors into a forest

use crate::dom::path;
use crate::dom::validator::Validator;
use crate::dom::{CloudDom, ResourceDescriptor, ResourceNode};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// What to do with a descriptor that cannot be placed in the forest
///
/// A descriptor is malformed when its own (last) path segment normalizes to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log a warning and leave the descriptor out of the forest
    #[default]
    Drop,
    /// Abort the build
    Fail,
}

/// Builds a [`CloudDom`] from per-fiber descriptor lists
#[derive(Debug, Clone, Default)]
pub struct CloudDomBuilder {
    policy: MalformedPolicy,
}

impl CloudDomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the forest
    ///
    /// Steps: normalize every path and recompute ids, reject duplicates and missing required
    /// properties, link each node to the node whose path is exactly one segment shorter,
    /// then check the assembled edges for cycles.
    #[instrument(skip_all, fields(descriptors = descriptors.len()))]
    pub fn build(&self, descriptors: &[ResourceDescriptor]) -> Result<CloudDom, ValidationError> {
        let start = Instant::now();
        let mut validator = Validator::new();

        // Step 1: normalize and validate
        let mut nodes: BTreeMap<String, ResourceNode> = BTreeMap::new();
        for descriptor in descriptors {
            let normalized = path::normalize_path(&descriptor.path);
            let local_is_empty = descriptor
                .path
                .last()
                .map_or(true, |local| path::normalize_segment(local).is_empty());
            if local_is_empty {
                match self.policy {
                    MalformedPolicy::Drop => {
                        warn!(
                            kind = %descriptor.kind,
                            component_path = %descriptor.component_path,
                            "Dropping resource with empty local id"
                        );
                        continue;
                    }
                    MalformedPolicy::Fail => {
                        return Err(ValidationError::EmptyPath {
                            kind: descriptor.kind.clone(),
                            component_path: descriptor.component_path.clone(),
                        });
                    }
                }
            }

            let id = path::generate_id(&normalized);
            validator.check_unique(&id, &descriptor.component_path)?;
            validator.check_required(&id, descriptor)?;

            nodes.insert(
                id.clone(),
                ResourceNode {
                    id,
                    path: normalized,
                    kind: descriptor.kind.clone(),
                    props: descriptor.props.clone(),
                    outputs: Default::default(),
                    children: Vec::new(),
                    component_path: descriptor.component_path.clone(),
                    lifecycle: descriptor.lifecycle.clone(),
                    owner: Some(descriptor.owner),
                },
            );
        }

        // Step 2: parent edges by exact one-segment extension
        let by_path: HashMap<Vec<String>, String> = nodes
            .values()
            .map(|n| (n.path.clone(), n.id.clone()))
            .collect();

        let mut edges: Vec<(String, String)> = Vec::new();
        for node in nodes.values() {
            if node.path.len() < 2 {
                continue;
            }
            let parent_path = &node.path[..node.path.len() - 1];
            if let Some(parent_id) = by_path.get(parent_path) {
                edges.push((parent_id.clone(), node.id.clone()));
            }
        }
        for (parent, child) in edges {
            if let Some(parent_node) = nodes.get_mut(&parent) {
                parent_node.children.push(child);
            }
        }

        // Step 3: cycle check over assembled edges
        validator.check_acyclic(&nodes)?;

        let dom = CloudDom::from_parts(nodes);
        debug!(roots = dom.roots().len(), "Assembled hierarchy");
        info!(
            node_count = dom.len(),
            fingerprint = %dom.fingerprint_hex(),
            duration_ms = start.elapsed().as_millis(),
            "CloudDOM build completed"
        );
        Ok(dom)
    }
}
