//! Integration tests for state slots bound to provider outputs
//!
//! A lifecycle callback stores a tagged output in a state slot before the output is known.
//! The slot is bound on that write and refreshed when the output resolves, which is what
//! expands the gated child.

use parking_lot::Mutex;
use std::sync::Arc;
use stratus::hooks::{use_instance, use_state, InstanceHandle, StateSetter};
use stratus::{Component, Element, EngineConfig, MemoryStateBackend, Orchestrator, Props, Value};

use crate::integration::test_utils::{RecordingMaterializer, BUCKET, DATABASE};

type Captured = Arc<Mutex<Option<(InstanceHandle, StateSetter)>>>;

fn uploads() -> Component {
    Component::new("Uploads", |props| {
        use_instance(&BUCKET, Props::new().set("u", props.get("url")))?;
        Ok(vec![])
    })
}

/// Database whose url is copied into state from `on_deploy`; the bucket waits for it
fn service(writes: Arc<Mutex<Vec<bool>>>) -> Element {
    let captured: Captured = Arc::default();
    let sink = captured.clone();

    let component = Component::new("Service", move |_| {
        let db = use_instance(&DATABASE, Props::new().set("engine", "postgres"))?;
        let (url, set_url) = use_state(Value::Undefined)?;
        *sink.lock() = Some((db, set_url));

        if url.is_undefined() {
            return Ok(vec![]);
        }
        Ok(vec![uploads().element(Props::new().set("url", url))])
    });

    component.element(Props::new().on_deploy(move |ctx| {
        if ctx.resource_id != "database" {
            return;
        }
        if let Some((db, set_url)) = captured.lock().as_ref() {
            writes.lock().push(set_url.set(db.output_ref("url")));
        }
    }))
}

#[tokio::test]
async fn test_output_written_to_state_is_replayed_when_resolved() {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let materializer = Arc::new(RecordingMaterializer::new());

    let report = Orchestrator::new(
        EngineConfig::for_stack("bound-state"),
        materializer.clone(),
        Arc::new(MemoryStateBackend::new()),
    )
    .deploy(service(writes.clone()))
    .await
    .unwrap();

    assert_eq!(report.passes, 2);
    let bucket = report.dom.get("database.storage-bucket").unwrap();
    assert_eq!(
        bucket.props.get("u").and_then(|v| v.as_str()),
        Some("postgres://database:5432")
    );
    assert_eq!(
        materializer.deployed(),
        vec!["database", "database.storage-bucket"]
    );

    // The callback's write happened while the url was still unknown
    assert_eq!(*writes.lock(), vec![true]);
    // One author write plus one replay
    assert_eq!(report.stats.slot_writes, 2);
}
