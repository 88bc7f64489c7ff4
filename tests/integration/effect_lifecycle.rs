//! Integration tests for effects and lifecycle callbacks

use parking_lot::Mutex;
use std::sync::Arc;
use stratus::hooks::{use_effect, use_instance, use_state, Cleanup, EffectDeps};
use stratus::{Component, Element, EngineConfig, MemoryStateBackend, Orchestrator, Props};

use crate::integration::reactive_fixpoint::layered_stack;
use crate::integration::test_utils::{RecordingMaterializer, DATABASE};

type Log = Arc<Mutex<Vec<String>>>;

fn orchestrator(stack: &str) -> Orchestrator {
    Orchestrator::new(
        EngineConfig::for_stack(stack),
        Arc::new(RecordingMaterializer::new()),
        Arc::new(MemoryStateBackend::new()),
    )
}

/// A database with an effect keyed on one of its outputs
fn watched_database(log: Log, output: &'static str) -> Element {
    Component::new("Service", move |_| {
        let db = use_instance(&DATABASE, Props::new().set("engine", "postgres"))?;

        let handle = db.clone();
        let log = log.clone();
        use_effect(
            move || EffectDeps::On(vec![handle.output(output).into()]),
            move || {
                let log = log.clone();
                async move {
                    log.lock().push("run".to_string());
                    let cleanup_log = log.clone();
                    Some(Box::new(move || cleanup_log.lock().push("cleanup".to_string())) as Cleanup)
                }
            },
        )?;
        Ok(vec![])
    })
    .element(Props::new())
}

#[tokio::test]
async fn test_effect_waits_for_bound_output() {
    let log: Log = Arc::default();
    let report = orchestrator("effects")
        .deploy(watched_database(log.clone(), "replica_url"))
        .await
        .unwrap();

    assert_eq!(report.effects_run, 0);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_effect_runs_once_when_output_resolves() {
    let log: Log = Arc::default();
    let report = orchestrator("effects")
        .deploy(watched_database(log.clone(), "url"))
        .await
        .unwrap();

    assert_eq!(report.effects_run, 1);
    // The final cleanup runs when the tree is torn down at the end of the deployment
    assert_eq!(*log.lock(), vec!["run", "cleanup"]);
}

#[tokio::test]
async fn test_previous_cleanup_runs_before_next_run() {
    let log: Log = Arc::default();
    let sink = log.clone();
    let root = Component::new("Root", move |props| {
        let log = sink.clone();
        use_effect(
            || EffectDeps::Every,
            move || {
                let log = log.clone();
                async move {
                    log.lock().push("run".to_string());
                    let cleanup_log = log.clone();
                    Some(Box::new(move || cleanup_log.lock().push("cleanup".to_string())) as Cleanup)
                }
            },
        )?;
        Ok(props.child_elements().to_vec())
    })
    .element(Props::new().children(vec![layered_stack()]));

    let report = orchestrator("effects").deploy(root).await.unwrap();

    assert_eq!(report.passes, 3);
    let expected: Vec<&str> = ["run", "cleanup"].repeat(report.passes);
    assert_eq!(*log.lock(), expected);
}

#[tokio::test]
async fn test_effect_setting_state_feeds_the_next_render() {
    let seen: Log = Arc::default();
    let sink = seen.clone();
    let root = Component::new("Tagger", move |_| {
        let (tag, set_tag) = use_state("pending")?;
        let db = use_instance(
            &DATABASE,
            Props::new().set("engine", "postgres").set("tag", tag.clone()),
        )?;
        sink.lock()
            .push(tag.as_str().unwrap_or_default().to_string());

        let handle = db.clone();
        use_effect(
            move || EffectDeps::On(vec![handle.output("url").into()]),
            move || {
                let set_tag = set_tag.clone();
                async move {
                    set_tag.set("ready");
                    None
                }
            },
        )?;
        Ok(vec![])
    })
    .element(Props::new());

    let report = orchestrator("effects").deploy(root).await.unwrap();

    let db = report.dom.get("database").unwrap();
    assert_eq!(db.props.get("tag").and_then(|v| v.as_str()), Some("ready"));
    assert_eq!(seen.lock().last().map(String::as_str), Some("ready"));
    assert!(report.stats.slot_writes >= 1);
}

#[tokio::test]
async fn test_lifecycle_callbacks_fire_per_materialization() {
    let deployed: Log = Arc::default();
    let sink = deployed.clone();

    let service = Component::new("Service", |_| {
        use_instance(&DATABASE, Props::new().set("engine", "postgres"))?;
        Ok(vec![])
    });
    let root = service.element(Props::new().on_deploy(move |ctx| {
        let url = ctx
            .outputs
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        sink.lock().push(format!("{}={}", ctx.resource_id, url));
    }));

    orchestrator("effects").deploy(root).await.unwrap();
    assert_eq!(*deployed.lock(), vec!["database=postgres://database:5432"]);
}
