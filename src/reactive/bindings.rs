//! Output bindings
//!
//! Two-way index between provider outputs and the hook slots or renders that consume them.

use crate::types::FiberId;
use crate::value::OutputRef;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Consumer of a provider output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BindingTarget {
    /// A state slot holding the output's value
    State { fiber: FiberId, slot: usize },
    /// An effect whose dependency list read the output
    Effect { fiber: FiberId, index: usize },
    /// A render that read the output
    Render { fiber: FiberId },
}

impl BindingTarget {
    pub fn fiber(&self) -> FiberId {
        match self {
            BindingTarget::State { fiber, .. }
            | BindingTarget::Effect { fiber, .. }
            | BindingTarget::Render { fiber } => *fiber,
        }
    }
}

/// Result of resolving a set of changed outputs
#[derive(Debug, Default, PartialEq)]
pub struct Affected {
    /// Fibers to re-render
    pub fibers: BTreeSet<FiberId>,
    /// State slots to refresh with the new output value
    pub states: Vec<(FiberId, usize, OutputRef)>,
}

#[derive(Debug, Default)]
pub struct BindingManager {
    by_output: HashMap<OutputRef, BTreeSet<BindingTarget>>,
    by_target: HashMap<BindingTarget, BTreeSet<OutputRef>>,
}

impl BindingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, output: OutputRef, target: BindingTarget) {
        self.by_output
            .entry(output.clone())
            .or_default()
            .insert(target);
        self.by_target.entry(target).or_default().insert(output);
    }

    pub fn is_bound(&self, target: &BindingTarget) -> bool {
        self.by_target
            .get(target)
            .is_some_and(|outputs| !outputs.is_empty())
    }

    /// Replace every binding of `target` with `outputs`
    pub fn rebind(&mut self, target: BindingTarget, outputs: impl IntoIterator<Item = OutputRef>) {
        self.unbind(&target);
        for output in outputs {
            self.bind(output, target);
        }
    }

    pub fn unbind(&mut self, target: &BindingTarget) {
        let Some(outputs) = self.by_target.remove(target) else {
            return;
        };
        for output in outputs {
            if let Some(targets) = self.by_output.get_mut(&output) {
                targets.remove(target);
                if targets.is_empty() {
                    self.by_output.remove(&output);
                }
            }
        }
    }

    pub fn targets_for(&self, output: &OutputRef) -> Vec<BindingTarget> {
        self.by_output
            .get(output)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn outputs_for(&self, target: &BindingTarget) -> Vec<OutputRef> {
        self.by_target
            .get(target)
            .map(|outputs| outputs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every binding held by a fiber
    pub fn remove_fiber(&mut self, fiber: FiberId) {
        let targets: Vec<BindingTarget> = self
            .by_target
            .keys()
            .filter(|t| t.fiber() == fiber)
            .copied()
            .collect();
        for target in targets {
            self.unbind(&target);
        }
    }

    /// Fibers and state slots affected by the changed outputs
    pub fn resolve<'a>(&self, changed: impl IntoIterator<Item = &'a OutputRef>) -> Affected {
        let mut affected = Affected::default();
        for output in changed {
            let Some(targets) = self.by_output.get(output) else {
                continue;
            };
            for target in targets {
                affected.fibers.insert(target.fiber());
                if let BindingTarget::State { fiber, slot } = target {
                    affected.states.push((*fiber, *slot, output.clone()));
                }
            }
        }
        affected
    }

    pub fn len(&self) -> usize {
        self.by_target.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
