//! Lifecycle-effect hook
//!
//! Effects run after a materialization pass, once the outputs they depend on are known.
//! The dependency list is computed by a closure evaluated inside its own read-tracking
//! window: every resource output it reads becomes a binding, so the effect re-runs when that
//! output changes without the author naming output keys explicitly.

use crate::error::HookError;
use crate::hooks::frame::HookFrame;
use crate::reactive::BindingTarget;
use crate::runtime::Runtime;
use crate::types::FiberId;
use crate::value::Value;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

/// Cleanup returned by an effect run
pub type Cleanup = Box<dyn FnOnce() + Send>;

pub(crate) type EffectFn = Arc<dyn Fn() -> BoxFuture<'static, Option<Cleanup>> + Send + Sync>;

/// When an effect is eligible to run
#[derive(Debug, Clone, PartialEq)]
pub enum EffectDeps {
    /// Every materialization pass
    Every,
    /// Exactly once
    Once,
    /// Whenever a listed value (or a bound output) changed since the last run
    On(Vec<Value>),
}

/// Register an effect on the active fiber
///
/// ```no_run
/// # use stratus::hooks::{use_effect, use_instance, EffectDeps};
/// # use stratus::dom::ResourceKind;
/// # use stratus::render::Props;
/// # fn body() -> Result<(), stratus::error::HookError> {
/// const DATABASE: ResourceKind = ResourceKind::new("Database");
/// let db = use_instance(&DATABASE, Props::new())?;
/// let handle = db.clone();
/// use_effect(
///     move || EffectDeps::On(vec![handle.output("url").into()]),
///     || async { None },
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn use_effect<D, F, Fut>(deps: D, effect: F) -> Result<(), HookError>
where
    D: FnOnce() -> EffectDeps,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Cleanup>> + Send + 'static,
{
    HookFrame::with_active("use_effect", |frame| {
        let index = frame.next_effect_slot();
        let (deps, reads) = frame.track(deps);
        let bound: Vec<_> = reads.into_iter().collect();
        let callback: EffectFn = Arc::new(move || effect().boxed());

        let fiber = frame.fiber();
        let runtime = frame.runtime();
        runtime
            .bindings
            .lock()
            .rebind(BindingTarget::Effect { fiber, index }, bound.iter().cloned());
        runtime
            .hooks
            .lock()
            .register_effect(fiber, index, callback, deps, bound);
    })
}

struct DueEffect {
    fiber: FiberId,
    index: usize,
    callback: EffectFn,
    previous_cleanup: Option<Cleanup>,
}

/// Run every due effect: previous cleanup first, then the effect, then store its cleanup
///
/// Returns the number of effects that ran.
pub(crate) async fn run_effects(runtime: &Runtime) -> usize {
    let due: Vec<DueEffect> = {
        let mut hooks = runtime.hooks.lock();
        let due = hooks
            .effects_mut()
            .filter_map(|(fiber, index, record)| {
                let live: Vec<_> = record
                    .bound
                    .iter()
                    .map(|output| runtime.outputs.get(output))
                    .collect();
                if !record.is_due(&live) {
                    return None;
                }
                record.runs += 1;
                record.last_outputs = Some(live);
                record.last_deps = match &record.deps {
                    EffectDeps::On(values) => Some(values.clone()),
                    _ => None,
                };
                Some(DueEffect {
                    fiber,
                    index,
                    callback: record.callback.clone(),
                    previous_cleanup: record.cleanup.take(),
                })
            })
            .collect();
        due
    };

    let count = due.len();
    for effect in due {
        if let Some(cleanup) = effect.previous_cleanup {
            trace!(fiber = %effect.fiber, index = effect.index, "Running effect cleanup");
            cleanup();
        }
        let cleanup = (effect.callback)().await;

        let orphaned = {
            let mut hooks = runtime.hooks.lock();
            match hooks.effect_mut(effect.fiber, effect.index) {
                Some(record) => {
                    record.cleanup = cleanup;
                    None
                }
                None => cleanup,
            }
        };
        // Fiber was torn down while the effect ran
        if let Some(cleanup) = orphaned {
            cleanup();
        }
    }

    if count > 0 {
        debug!(effects = count, "Ran effects");
    }
    count
}
