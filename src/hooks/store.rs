//! Hook slot arena
//!
//! Index-addressed state and effect slots per fiber. Slots survive re-renders of their
//! fiber and are dropped when the fiber is torn down.

use crate::hooks::effect::{Cleanup, EffectDeps, EffectFn};
use crate::types::FiberId;
use crate::value::{OutputRef, Value};
use std::collections::{BTreeMap, HashMap};

/// One registered effect
pub(crate) struct EffectRecord {
    pub callback: EffectFn,
    pub deps: EffectDeps,
    /// Outputs read while evaluating the dependency list
    pub bound: Vec<OutputRef>,
    pub last_deps: Option<Vec<Value>>,
    pub last_outputs: Option<Vec<Option<serde_json::Value>>>,
    pub runs: usize,
    pub cleanup: Option<Cleanup>,
}

impl EffectRecord {
    /// Whether this effect should run given the live values of its bound outputs
    pub fn is_due(&self, live: &[Option<serde_json::Value>]) -> bool {
        if live.iter().any(Option::is_none) {
            return false;
        }
        match &self.deps {
            EffectDeps::Every => true,
            EffectDeps::Once => self.runs == 0,
            EffectDeps::On(values) => {
                self.runs == 0
                    || self.last_deps.as_ref() != Some(values)
                    || self.last_outputs.as_deref() != Some(live)
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct HookStore {
    states: HashMap<FiberId, Vec<Value>>,
    effects: BTreeMap<FiberId, Vec<EffectRecord>>,
    slot_writes: u64,
}

impl HookStore {
    /// Current value of a state slot, initializing it on first use
    pub fn state_or_init(&mut self, fiber: FiberId, slot: usize, initial: Value) -> Value {
        let slots = self.states.entry(fiber).or_default();
        if slot >= slots.len() {
            slots.resize(slot, Value::Undefined);
            slots.push(initial);
        }
        slots[slot].clone()
    }

    #[cfg(test)]
    pub fn state(&self, fiber: FiberId, slot: usize) -> Option<&Value> {
        self.states.get(&fiber).and_then(|s| s.get(slot))
    }

    /// Write a slot. Returns false when the value is unchanged or the slot does not exist.
    pub fn write_state(&mut self, fiber: FiberId, slot: usize, value: Value) -> bool {
        let Some(current) = self.states.get_mut(&fiber).and_then(|s| s.get_mut(slot)) else {
            return false;
        };
        if *current == value {
            return false;
        }
        *current = value;
        self.slot_writes += 1;
        true
    }

    pub fn slot_writes(&self) -> u64 {
        self.slot_writes
    }

    /// Register or refresh the effect at `index`; run history and cleanup are kept
    pub fn register_effect(
        &mut self,
        fiber: FiberId,
        index: usize,
        callback: EffectFn,
        deps: EffectDeps,
        bound: Vec<OutputRef>,
    ) {
        let effects = self.effects.entry(fiber).or_default();
        if let Some(record) = effects.get_mut(index) {
            record.callback = callback;
            record.deps = deps;
            record.bound = bound;
        } else {
            effects.push(EffectRecord {
                callback,
                deps,
                bound,
                last_deps: None,
                last_outputs: None,
                runs: 0,
                cleanup: None,
            });
        }
    }

    pub fn effects_mut(&mut self) -> impl Iterator<Item = (FiberId, usize, &mut EffectRecord)> {
        self.effects
            .iter_mut()
            .flat_map(|(fiber, records)| {
                records
                    .iter_mut()
                    .enumerate()
                    .map(move |(i, r)| (*fiber, i, r))
            })
    }

    pub fn effect_mut(&mut self, fiber: FiberId, index: usize) -> Option<&mut EffectRecord> {
        self.effects.get_mut(&fiber).and_then(|e| e.get_mut(index))
    }

    /// Drop every slot of a fiber, returning the cleanups still pending
    pub fn remove_fiber(&mut self, fiber: FiberId) -> Vec<Cleanup> {
        self.states.remove(&fiber);
        self.effects
            .remove(&fiber)
            .map(|records| records.into_iter().filter_map(|r| r.cleanup).collect())
            .unwrap_or_default()
    }
}
