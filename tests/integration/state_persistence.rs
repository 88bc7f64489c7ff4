//! Integration tests for state persistence and locking

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use stratus::deploy::StateBackend;
use stratus::error::{MaterializeError, StateError};
use stratus::hooks::{use_effect, use_instance, use_state, EffectDeps};
use stratus::{
    Component, Element, EngineConfig, EngineError, MemoryStateBackend, Orchestrator, Props,
};

use crate::integration::test_utils::{
    string_outputs, FailingMaterializer, ReadOnlyBackend, RecordingMaterializer, BUCKET,
    DATABASE,
};

fn two_buckets(with_logs: bool) -> Element {
    Component::new("Storage", move |_| {
        use_instance(&BUCKET, Props::new().key("assets"))?;
        if with_logs {
            use_instance(&BUCKET, Props::new().key("logs"))?;
        }
        Ok(vec![])
    })
    .element(Props::new())
}

#[tokio::test]
async fn test_successful_deploy_persists_state() {
    let backend = Arc::new(MemoryStateBackend::new());
    let orchestrator = Orchestrator::new(
        EngineConfig::for_stack("persist"),
        Arc::new(RecordingMaterializer::new()),
        backend.clone(),
    );

    let report = orchestrator.deploy(two_buckets(true)).await.unwrap();
    let state = backend.load("persist").await.unwrap().unwrap();

    assert_eq!(state.fingerprint, report.fingerprint);
    assert_eq!(state.nodes.len(), 2);
    assert_eq!(
        string_outputs(&state.outputs).get("assets.arn").map(String::as_str),
        Some("arn:stratus:assets")
    );
    assert!(state.deployed_at().is_some());
}

#[tokio::test]
async fn test_removed_resource_is_deleted_and_forgotten() {
    let materializer = Arc::new(RecordingMaterializer::new());
    let backend = Arc::new(MemoryStateBackend::new());
    let orchestrator = Orchestrator::new(
        EngineConfig::for_stack("persist"),
        materializer.clone(),
        backend.clone(),
    );

    orchestrator.deploy(two_buckets(true)).await.unwrap();
    let report = orchestrator.deploy(two_buckets(false)).await.unwrap();

    assert_eq!(report.changes.deletes.len(), 1);
    assert_eq!(report.changes.deletes[0].id, "logs");
    assert_eq!(materializer.deleted(), vec!["logs"]);
    let state = backend.load("persist").await.unwrap().unwrap();
    assert!(state.nodes.iter().all(|n| n.id != "logs"));
    assert!(!state.outputs.contains_key("logs.arn"));
}

#[tokio::test]
async fn test_materializer_failure_persists_nothing_and_releases_lock() {
    let backend = Arc::new(MemoryStateBackend::new());
    let materializer = Arc::new(FailingMaterializer::default());
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = failures.clone();

    let root = Component::new("Service", |_| {
        use_instance(&DATABASE, Props::new().set("engine", "postgres"))?;
        Ok(vec![])
    })
    .element(Props::new().on_error(move |ctx| sink.lock().push(ctx.resource_id.clone())));

    let err = Orchestrator::new(
        EngineConfig::for_stack("broken"),
        materializer.clone(),
        backend.clone(),
    )
    .deploy(root)
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Materialize(MaterializeError::Resource { ref id, .. }) if id == "database"
    ));
    assert_eq!(*materializer.errors_seen.lock(), 1);
    assert_eq!(*failures.lock(), vec!["database".to_string()]);
    assert_eq!(backend.save_count(), 0);
    assert!(backend.lock_holder("broken").is_none());
}

#[tokio::test]
async fn test_save_failure_reaches_error_hook() {
    let backend = Arc::new(ReadOnlyBackend::default());
    let materializer = Arc::new(RecordingMaterializer::new());

    let err = Orchestrator::new(
        EngineConfig::for_stack("readonly"),
        materializer.clone(),
        backend.clone(),
    )
    .deploy(two_buckets(false))
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        EngineError::State(StateError::Backend(ref message)) if message == "disk full"
    ));
    assert_eq!(*backend.save_attempts.lock(), 1);
    let errors = materializer.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("disk full"));
    // Resources were materialized before the save failed
    assert_eq!(materializer.deployed(), vec!["assets"]);
}

#[tokio::test]
async fn test_locked_stack_is_refused() {
    let backend = Arc::new(MemoryStateBackend::new());
    backend
        .acquire_lock("shared", "someone-else", Duration::from_secs(60))
        .await
        .unwrap();

    let err = Orchestrator::new(
        EngineConfig::for_stack("shared"),
        Arc::new(RecordingMaterializer::new()),
        backend.clone(),
    )
    .deploy(two_buckets(false))
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        EngineError::State(StateError::Locked { ref holder, .. }) if holder == "someone-else"
    ));
    assert_eq!(backend.lock_holder("shared").as_deref(), Some("someone-else"));
}

#[tokio::test]
async fn test_runaway_state_loop_hits_the_pass_bound() {
    let backend = Arc::new(MemoryStateBackend::new());
    let config = EngineConfig {
        max_reactive_passes: 4,
        ..EngineConfig::for_stack("runaway")
    };

    let root = Component::new("Counter", |_| {
        let (count, set_count) = use_state(0)?;
        let current = count.as_json().and_then(|v| v.as_i64()).unwrap_or(0);
        use_effect(
            || EffectDeps::Every,
            move || {
                let set_count = set_count.clone();
                async move {
                    set_count.set(current + 1);
                    None
                }
            },
        )?;
        Ok(vec![])
    })
    .element(Props::new());

    let err = Orchestrator::new(config, Arc::new(RecordingMaterializer::new()), backend.clone())
        .deploy(root)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::ReactiveLoopExceeded { limit: 4, pending: 1 }
    ));
    assert_eq!(backend.save_count(), 0);
    assert!(backend.lock_holder("runaway").is_none());
}
