//! Deployment orchestration
//!
//! One deployment: lock the stack, render the tree, then repeat build → reconcile →
//! materialize → track outputs → re-render → run effects until a pass re-renders nothing
//! and nothing is queued. The converged forest is reconciled against the prior deployment
//! and persisted.

use crate::config::EngineConfig;
use crate::deploy::materializer::Materializer;
use crate::deploy::state::{DeploymentState, StateBackend};
use crate::dom::{CloudDom, CloudDomBuilder};
use crate::error::{EngineError, MaterializeError, StateError};
use crate::hooks::effect::run_effects;
use crate::reactive::OutputTracker;
use crate::reconcile::{reconcile, ChangeSet};
use crate::render::{Element, RenderEngine};
use crate::runtime::{Runtime, RuntimeStats};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of a successful deployment
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    pub stack: String,
    /// Reactive passes needed to reach the fixpoint
    pub passes: usize,
    /// Final forest against the prior deployment
    pub changes: ChangeSet,
    pub dom: CloudDom,
    /// Outputs keyed `id.outputKey`
    pub outputs: BTreeMap<String, serde_json::Value>,
    pub fingerprint: String,
    pub stats: RuntimeStats,
    /// Effect runs across all passes
    pub effects_run: usize,
}

/// Drives deployments of a stack against a materializer and a state backend
pub struct Orchestrator {
    config: EngineConfig,
    materializer: Arc<dyn Materializer>,
    backend: Arc<dyn StateBackend>,
}

impl Orchestrator {
    pub fn new(
        config: EngineConfig,
        materializer: Arc<dyn Materializer>,
        backend: Arc<dyn StateBackend>,
    ) -> Self {
        Self {
            config,
            materializer,
            backend,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Deploy the tree rooted at `root`
    ///
    /// The stack lock is held for the whole deployment and released on every exit path.
    /// State is persisted only when every pass succeeded.
    #[instrument(skip(self, root), fields(stack = %self.config.stack))]
    pub async fn deploy(&self, root: Element) -> Result<DeploymentReport, EngineError> {
        let stack = self.config.stack.as_str();
        let holder = lock_holder_id();
        let locking = self.config.lock.enabled;

        if locking {
            self.backend
                .acquire_lock(stack, &holder, Duration::from_secs(self.config.lock.ttl_secs))
                .await?;
            debug!(holder = %holder, "Acquired stack lock");
        }

        let result = self.run(root).await;

        if locking {
            if let Err(e) = self.backend.release_lock(stack, &holder).await {
                warn!(error = %e, "Failed to release stack lock");
                if result.is_ok() {
                    return Err(e.into());
                }
            }
        }

        match &result {
            Ok(report) => info!(
                passes = report.passes,
                resources = report.dom.len(),
                changes = report.changes.len(),
                "Deployment complete"
            ),
            Err(e) => error!(error = %e, "Deployment failed"),
        }
        result
    }

    async fn run(&self, root: Element) -> Result<DeploymentReport, EngineError> {
        let stack = self.config.stack.as_str();
        let prior = match self.backend.load(stack).await {
            Ok(state) => state.map(|state| state.to_dom()).unwrap_or_default(),
            Err(err) => return Err(self.persistence_failed(&CloudDom::default(), err).await),
        };

        let runtime = Runtime::new();
        runtime.outputs.seed(&prior);
        let mut engine = RenderEngine::new(runtime.clone());

        let outcome = self.converge(&mut engine, root, &prior).await;
        engine.unmount();
        let (dom, passes, effects_run) = outcome?;

        let changes = reconcile(&prior.flatten(), &dom.flatten());
        let state = DeploymentState::capture(stack, &dom);
        if let Err(err) = self.backend.save(stack, &state).await {
            return Err(self.persistence_failed(&dom, err).await);
        }

        Ok(DeploymentReport {
            stack: stack.to_string(),
            passes,
            changes,
            outputs: state.outputs,
            fingerprint: state.fingerprint,
            dom,
            stats: runtime.stats(),
            effects_run,
        })
    }

    /// Run reactive passes until the fixpoint; returns the final forest, pass and effect counts
    async fn converge(
        &self,
        engine: &mut RenderEngine,
        root: Element,
        prior: &CloudDom,
    ) -> Result<(CloudDom, usize, usize), EngineError> {
        let runtime = engine.runtime().clone();
        let tracker = OutputTracker::new(runtime.outputs.clone());
        let builder = CloudDomBuilder::new().with_policy(self.config.malformed_descriptors);
        let limit = self.config.max_reactive_passes;

        engine.render_root(root)?;

        let mut baseline = prior.clone();
        let mut passes = 0;
        let mut effects_run = 0;
        loop {
            passes += 1;

            let mut dom = builder.build(&engine.descriptors())?;
            dom.carry_outputs_from(&baseline);

            let changes = reconcile(&baseline.flatten(), &dom.flatten());
            if !changes.is_empty() {
                self.materialize(&mut dom, &changes).await?;
            }

            let changed = tracker.apply(&dom);
            runtime.propagate(&changed);
            baseline = dom;

            let rendered = engine.drain()?;
            effects_run += run_effects(&runtime).await;

            debug!(
                pass = passes,
                changes = changes.len(),
                outputs_changed = changed.len(),
                rendered,
                "Reactive pass finished"
            );

            if rendered == 0 && runtime.scheduler.is_empty() {
                break;
            }
            if passes >= limit {
                return Err(EngineError::ReactiveLoopExceeded {
                    limit,
                    pending: runtime.scheduler.len(),
                });
            }
        }

        Ok((baseline, passes, effects_run))
    }

    /// Materialize one change set and fire lifecycle callbacks for it
    async fn materialize(&self, dom: &mut CloudDom, changes: &ChangeSet) -> Result<(), EngineError> {
        info!(
            materializer = self.materializer.name(),
            creates = changes.creates.len(),
            updates = changes.updates.len(),
            deletes = changes.deletes.len(),
            "Materializing changes"
        );

        match self.run_materializer(dom, changes).await {
            Ok(()) => {
                for id in changes.deploy_ids() {
                    if let Some(node) = dom.get(id) {
                        node.lifecycle.deployed(&node.lifecycle_context());
                    }
                }
                for node in &changes.deletes {
                    node.lifecycle.destroyed(&node.lifecycle_context());
                }
                Ok(())
            }
            Err(err) => {
                self.materializer.on_error(dom, &err).await;
                for id in changes.deploy_ids() {
                    if let Some(node) = dom.get(id) {
                        node.lifecycle.failed(&node.lifecycle_context());
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Report a state backend failure to the materializer's error hook
    async fn persistence_failed(&self, dom: &CloudDom, err: StateError) -> EngineError {
        let reported = MaterializeError::Other(format!("state persistence failed: {}", err));
        self.materializer.on_error(dom, &reported).await;
        err.into()
    }

    async fn run_materializer(
        &self,
        dom: &mut CloudDom,
        changes: &ChangeSet,
    ) -> Result<(), MaterializeError> {
        self.materializer.pre_materialize(dom).await?;
        self.materializer.materialize(dom, changes).await?;
        let outputs = dom.flatten_outputs();
        self.materializer.post_materialize(dom, &outputs).await
    }
}

/// Lock holder identity, unique per deployment within this process
fn lock_holder_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!(
        "stratus-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}
