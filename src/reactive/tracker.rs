//! Output tracking
//!
//! [`OutputStore`] is the live output map every [`InstanceHandle`](crate::hooks::InstanceHandle)
//! reads from. After each materialization pass the [`OutputTracker`] diffs the forest's
//! outputs against the store, key by key, and reports exactly the outputs that changed.

use crate::dom::CloudDom;
use crate::types::Outputs;
use crate::value::OutputRef;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Live outputs of every known resource
#[derive(Debug, Default)]
pub struct OutputStore {
    outputs: RwLock<HashMap<String, Outputs>>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, output: &OutputRef) -> Option<serde_json::Value> {
        self.outputs
            .read()
            .get(&output.resource_id)
            .and_then(|o| o.get(&output.output_key))
            .cloned()
    }

    pub fn resource(&self, id: &str) -> Outputs {
        self.outputs.read().get(id).cloned().unwrap_or_default()
    }

    /// Load outputs without reporting changes (used for previously deployed state)
    pub fn seed(&self, dom: &CloudDom) {
        let mut outputs = self.outputs.write();
        for node in dom.nodes() {
            if !node.outputs.is_empty() {
                outputs.insert(node.id.clone(), node.outputs.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.outputs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.read().is_empty()
    }
}

/// Diffs materialized outputs against the live store
#[derive(Debug, Clone)]
pub struct OutputTracker {
    store: Arc<OutputStore>,
}

impl OutputTracker {
    pub fn new(store: Arc<OutputStore>) -> Self {
        Self { store }
    }

    /// Replace the store's contents with the forest's outputs and return what changed
    ///
    /// An output appearing for the first time counts as a change, so bindings made before
    /// it existed still fire. Values that compare equal never do. Outputs of resources that
    /// left the forest are removed and reported.
    pub fn apply(&self, dom: &CloudDom) -> BTreeSet<OutputRef> {
        let mut changed = BTreeSet::new();
        let mut store = self.store.outputs.write();

        for node in dom.nodes() {
            let previous = store.get(&node.id);
            for (key, value) in &node.outputs {
                if previous.and_then(|p| p.get(key)) != Some(value) {
                    changed.insert(OutputRef::new(node.id.clone(), key.clone()));
                }
            }
            if let Some(previous) = previous {
                for key in previous.keys() {
                    if !node.outputs.contains_key(key) {
                        changed.insert(OutputRef::new(node.id.clone(), key.clone()));
                    }
                }
            }
        }

        let removed: Vec<String> = store
            .keys()
            .filter(|id| !dom.contains(id))
            .cloned()
            .collect();
        for id in removed {
            if let Some(outputs) = store.remove(&id) {
                for key in outputs.into_keys() {
                    changed.insert(OutputRef::new(id.clone(), key));
                }
            }
        }

        for node in dom.nodes() {
            if node.outputs.is_empty() {
                store.remove(&node.id);
            } else {
                store.insert(node.id.clone(), node.outputs.clone());
            }
        }

        if !changed.is_empty() {
            debug!(changed = changed.len(), "Outputs changed");
        }
        changed
    }
}
