//! Deployment state persistence
//!
//! [`DeploymentState`] is what survives between deployments: the node snapshot, the flat
//! output map and the forest fingerprint. Backends store it as an opaque byte blob.

use crate::dom::{CloudDom, ResourceNode};
use crate::error::StateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Persisted outcome of one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentState {
    pub stack: String,
    pub nodes: Vec<ResourceNode>,
    /// Outputs keyed `id.outputKey`
    pub outputs: BTreeMap<String, serde_json::Value>,
    /// Hex BLAKE3 fingerprint of the forest
    pub fingerprint: String,
    /// RFC 3339 timestamp
    pub deployed_at: String,
}

impl DeploymentState {
    pub fn capture(stack: &str, dom: &CloudDom) -> Self {
        Self {
            stack: stack.to_string(),
            nodes: dom.flatten(),
            outputs: dom.flatten_outputs(),
            fingerprint: dom.fingerprint_hex(),
            deployed_at: Utc::now().to_rfc3339(),
        }
    }

    /// Forest described by this state, outputs included
    pub fn to_dom(&self) -> CloudDom {
        CloudDom::from_snapshot(self.nodes.clone())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        serde_json::to_vec(self).map_err(|e| StateError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        serde_json::from_slice(bytes).map_err(|e| StateError::Decode(e.to_string()))
    }

    pub fn deployed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.deployed_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Where deployment state lives
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// State of the last successful deployment, if any
    async fn load(&self, stack: &str) -> Result<Option<DeploymentState>, StateError>;

    async fn save(&self, stack: &str, state: &DeploymentState) -> Result<(), StateError>;

    /// Take the stack lock for `holder`, failing with `StateError::Locked` if someone else
    /// holds a lock that has not expired
    async fn acquire_lock(
        &self,
        _stack: &str,
        _holder: &str,
        _ttl: Duration,
    ) -> Result<(), StateError> {
        Ok(())
    }

    async fn release_lock(&self, _stack: &str, _holder: &str) -> Result<(), StateError> {
        Ok(())
    }
}

#[derive(Debug)]
struct LockEntry {
    holder: String,
    expires_at: DateTime<Utc>,
}

/// In-process state backend
#[derive(Debug, Default)]
pub struct MemoryStateBackend {
    states: Mutex<HashMap<String, Vec<u8>>>,
    locks: Mutex<HashMap<String, LockEntry>>,
    saves: Mutex<usize>,
}

impl MemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    /// Current lock holder, ignoring expired locks
    pub fn lock_holder(&self, stack: &str) -> Option<String> {
        self.locks
            .lock()
            .get(stack)
            .filter(|l| l.expires_at > Utc::now())
            .map(|l| l.holder.clone())
    }
}

#[async_trait]
impl StateBackend for MemoryStateBackend {
    async fn load(&self, stack: &str) -> Result<Option<DeploymentState>, StateError> {
        let bytes = self.states.lock().get(stack).cloned();
        bytes.map(|b| DeploymentState::from_bytes(&b)).transpose()
    }

    async fn save(&self, stack: &str, state: &DeploymentState) -> Result<(), StateError> {
        let bytes = state.to_bytes()?;
        self.states.lock().insert(stack.to_string(), bytes);
        *self.saves.lock() += 1;
        debug!(stack, fingerprint = %state.fingerprint, "Saved deployment state");
        Ok(())
    }

    async fn acquire_lock(
        &self,
        stack: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<(), StateError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StateError::Backend(format!("Invalid lock TTL: {}", e)))?;
        let mut locks = self.locks.lock();
        if let Some(existing) = locks.get(stack) {
            if existing.holder != holder && existing.expires_at > now {
                return Err(StateError::Locked {
                    stack: stack.to_string(),
                    holder: existing.holder.clone(),
                });
            }
        }
        locks.insert(
            stack.to_string(),
            LockEntry {
                holder: holder.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn release_lock(&self, stack: &str, holder: &str) -> Result<(), StateError> {
        let mut locks = self.locks.lock();
        if locks.get(stack).is_some_and(|l| l.holder == holder) {
            locks.remove(stack);
        }
        Ok(())
    }
}
