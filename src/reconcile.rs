//! Reconciliation
//!
//! Classifies the difference between two flat descriptor lists into creates, updates and
//! deletes. Nodes are matched by [`ReconcileKey`], never by position in the list.

use crate::dom::ResourceNode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Stable identity of a resource across renders
///
/// The id is built only from resource-registering ancestors, so inserting or removing a
/// wrapper component that registers nothing leaves every key unchanged. The full id is used
/// rather than the local id, so equal local ids on different branches never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReconcileKey {
    pub kind: String,
    pub id: String,
}

impl ReconcileKey {
    pub fn of(node: &ResourceNode) -> Self {
        Self {
            kind: node.kind.clone(),
            id: node.id.clone(),
        }
    }
}

/// A node whose properties changed
#[derive(Debug, Clone)]
pub struct Update {
    pub previous: ResourceNode,
    pub current: ResourceNode,
    /// Property keys added, removed or changed
    pub changed_props: Vec<String>,
}

/// Result of a reconciliation
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub creates: Vec<ResourceNode>,
    pub updates: Vec<Update>,
    pub deletes: Vec<ResourceNode>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }

    /// Ids that need deploying (creates then updates)
    pub fn deploy_ids(&self) -> Vec<&str> {
        self.creates
            .iter()
            .map(|n| n.id.as_str())
            .chain(self.updates.iter().map(|u| u.current.id.as_str()))
            .collect()
    }
}

/// Diff `previous` against `current`
pub fn reconcile(previous: &[ResourceNode], current: &[ResourceNode]) -> ChangeSet {
    let prev: BTreeMap<ReconcileKey, &ResourceNode> =
        previous.iter().map(|n| (ReconcileKey::of(n), n)).collect();
    let curr: BTreeMap<ReconcileKey, &ResourceNode> =
        current.iter().map(|n| (ReconcileKey::of(n), n)).collect();

    let mut changes = ChangeSet::default();

    for (key, node) in &curr {
        match prev.get(key) {
            None => changes.creates.push((*node).clone()),
            Some(old) => {
                let changed_props = changed_props(old, node);
                if !changed_props.is_empty() {
                    changes.updates.push(Update {
                        previous: (*old).clone(),
                        current: (*node).clone(),
                        changed_props,
                    });
                }
            }
        }
    }

    for (key, node) in &prev {
        if !curr.contains_key(key) {
            changes.deletes.push((*node).clone());
        }
    }

    debug!(
        creates = changes.creates.len(),
        updates = changes.updates.len(),
        deletes = changes.deletes.len(),
        "Reconciled"
    );
    changes
}

fn changed_props(old: &ResourceNode, new: &ResourceNode) -> Vec<String> {
    let keys: BTreeSet<&String> = old.props.keys().chain(new.props.keys()).collect();
    keys.into_iter()
        .filter(|k| old.props.get(*k) != new.props.get(*k))
        .cloned()
        .collect()
}
