//! Per-build CloudDOM validation
//!
//! A [`Validator`] is created fresh for every build so no state leaks between builds.
//! All checks are fail-fast: the first problem found is returned.

use crate::dom::{ResourceDescriptor, ResourceNode};
use crate::error::ValidationError;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct Validator {
    /// id -> originating component path
    seen: HashMap<String, String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an id, failing if it was already seen anywhere in this build
    pub fn check_unique(&mut self, id: &str, component_path: &str) -> Result<(), ValidationError> {
        if self.seen.contains_key(id) {
            return Err(ValidationError::DuplicateId {
                id: id.to_string(),
                component_path: component_path.to_string(),
            });
        }
        self.seen.insert(id.to_string(), component_path.to_string());
        Ok(())
    }

    /// Every required property of the descriptor's kind must be present
    pub fn check_required(
        &self,
        id: &str,
        descriptor: &ResourceDescriptor,
    ) -> Result<(), ValidationError> {
        for property in descriptor.required {
            let present = descriptor
                .props
                .get(*property)
                .map(|v| !v.is_null())
                .unwrap_or(false);
            if !present {
                return Err(ValidationError::MissingRequiredProperty {
                    id: id.to_string(),
                    property: property.to_string(),
                    component_path: descriptor.component_path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Depth-first search over child edges; any node reachable from itself is a cycle
    pub fn check_acyclic(
        &self,
        nodes: &BTreeMap<String, ResourceNode>,
    ) -> Result<(), ValidationError> {
        let mut state: HashMap<&str, Visit> = HashMap::new();

        for start in nodes.keys() {
            if state.contains_key(start.as_str()) {
                continue;
            }
            // Iterative DFS: (node, next child index)
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            state.insert(start.as_str(), Visit::InProgress);

            while let Some((id, idx)) = stack.pop() {
                let children = nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[]);
                if idx < children.len() {
                    stack.push((id, idx + 1));
                    let child = children[idx].as_str();
                    match state.get(child) {
                        Some(Visit::InProgress) => {
                            return Err(ValidationError::CircularHierarchy {
                                id: child.to_string(),
                            })
                        }
                        Some(Visit::Done) => {}
                        None => {
                            state.insert(child, Visit::InProgress);
                            stack.push((child, 0));
                        }
                    }
                } else {
                    state.insert(id, Visit::Done);
                }
            }
        }

        Ok(())
    }
}
