//! Shared test utilities for integration tests
//!
//! Recording materializers, the resource kinds used across scenarios, and isolated XDG
//! environment setup for configuration tests.

use async_trait::async_trait;
use parking_lot::Mutex as PlMutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;
use stratus::dom::{CloudDom, ResourceKind};
use stratus::deploy::{DeploymentState, StateBackend};
use stratus::error::{MaterializeError, StateError};
use stratus::reconcile::ChangeSet;
use stratus::Materializer;
use tempfile::TempDir;

pub const DATABASE: ResourceKind = ResourceKind::new("Database").with_required(&["engine"]);
pub const CACHE: ResourceKind = ResourceKind::new("Cache");
pub const API: ResourceKind = ResourceKind::new("Api");
pub const BUCKET: ResourceKind = ResourceKind::new("StorageBucket");

/// Materializer that deploys creates and updates, filling outputs by kind
///
/// Database gets `url`, Cache gets `endpoint`, everything else gets `arn`. Every deployed
/// id is recorded so tests can count materializations.
#[derive(Default)]
pub struct RecordingMaterializer {
    deployed: PlMutex<Vec<String>>,
    deleted: PlMutex<Vec<String>>,
    calls: PlMutex<usize>,
    errors: PlMutex<Vec<String>>,
}

impl RecordingMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids deployed so far, in order
    pub fn deployed(&self) -> Vec<String> {
        self.deployed.lock().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// Number of times an id was deployed
    pub fn deploy_count(&self, id: &str) -> usize {
        self.deployed.lock().iter().filter(|d| *d == id).count()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    /// Messages passed to the error hook
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

#[async_trait]
impl Materializer for RecordingMaterializer {
    async fn materialize(
        &self,
        dom: &mut CloudDom,
        changes: &ChangeSet,
    ) -> Result<(), MaterializeError> {
        *self.calls.lock() += 1;
        for id in changes.deploy_ids() {
            let Some(node) = dom.get_mut(id) else {
                continue;
            };
            let (key, value) = match node.kind.as_str() {
                "Database" => ("url", json!(format!("postgres://{}:5432", id))),
                "Cache" => ("endpoint", json!(format!("redis://{}:6379", id))),
                _ => ("arn", json!(format!("arn:stratus:{}", id))),
            };
            node.outputs.insert(key.to_string(), value);
            self.deployed.lock().push(id.to_string());
        }
        for node in &changes.deletes {
            self.deleted.lock().push(node.id.clone());
        }
        Ok(())
    }

    async fn on_error(&self, _dom: &CloudDom, error: &MaterializeError) {
        self.errors.lock().push(error.to_string());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Materializer that fails every deployment
#[derive(Default)]
pub struct FailingMaterializer {
    pub errors_seen: PlMutex<usize>,
}

#[async_trait]
impl Materializer for FailingMaterializer {
    async fn materialize(
        &self,
        _dom: &mut CloudDom,
        changes: &ChangeSet,
    ) -> Result<(), MaterializeError> {
        let id = changes.deploy_ids().first().map(|s| s.to_string()).unwrap_or_default();
        Err(MaterializeError::Resource {
            id,
            message: "quota exceeded".to_string(),
        })
    }

    async fn on_error(&self, _dom: &CloudDom, _error: &MaterializeError) {
        *self.errors_seen.lock() += 1;
    }
}

/// State backend whose writes always fail
#[derive(Default)]
pub struct ReadOnlyBackend {
    pub save_attempts: PlMutex<usize>,
}

#[async_trait]
impl StateBackend for ReadOnlyBackend {
    async fn load(&self, _stack: &str) -> Result<Option<DeploymentState>, StateError> {
        Ok(None)
    }

    async fn save(&self, _stack: &str, _state: &DeploymentState) -> Result<(), StateError> {
        *self.save_attempts.lock() += 1;
        Err(StateError::Backend("disk full".to_string()))
    }
}

/// Flattened outputs as plain strings, for compact assertions
pub fn string_outputs(outputs: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    outputs
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
        .collect()
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    vars: Vec<(&'static str, Option<String>)>,
}

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "STRATUS_ENV",
    "STRATUS_STACK",
    "STRATUS_MAX_REACTIVE_PASSES",
    "STRATUS_LOCK__TTL_SECS",
];

impl EnvState {
    fn capture() -> Self {
        Self {
            vars: ISOLATED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into `test_dir`
///
/// Stratus environment overrides are cleared for the duration and every variable is
/// restored afterwards. A global mutex keeps parallel tests from interleaving.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().to_str().unwrap());
    for name in &ISOLATED_VARS[2..] {
        std::env::remove_var(name);
    }

    let result = f();

    env_state.restore();
    result
}
