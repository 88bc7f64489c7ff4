//! Integration tests for wrapper components
//!
//! Components that register no resources contribute nothing to resource ids, so wrapping
//! or unwrapping a subtree never looks like a delete plus a create.

use std::sync::Arc;
use stratus::dom::CloudDomBuilder;
use stratus::hooks::use_instance;
use stratus::render::RenderEngine;
use stratus::runtime::Runtime;
use stratus::{Component, Element, EngineConfig, MemoryStateBackend, Orchestrator, Props};

use crate::integration::test_utils::{RecordingMaterializer, BUCKET};

fn assets() -> Element {
    Component::new("Assets", |_| {
        use_instance(&BUCKET, Props::new().set("versioned", true))?;
        Ok(vec![])
    })
    .element(Props::new())
}

fn wrap(name: &str, child: Element) -> Element {
    Component::new(name, |props| Ok(props.child_elements().to_vec()))
        .element(Props::new().children(vec![child]))
}

fn ids(root: Element) -> Vec<String> {
    let mut engine = RenderEngine::new(Runtime::new());
    engine.render_root(root).unwrap();
    let dom = CloudDomBuilder::new().build(&engine.descriptors()).unwrap();
    dom.nodes().map(|n| n.id.clone()).collect()
}

#[test]
fn test_wrapper_depth_does_not_change_ids() {
    let bare = ids(assets());
    let wrapped = ids(wrap("Layout", wrap("Region", assets())));
    assert_eq!(bare, vec!["storage-bucket"]);
    assert_eq!(wrapped, bare);
}

#[tokio::test]
async fn test_adding_a_wrapper_is_not_a_change() {
    let materializer = Arc::new(RecordingMaterializer::new());
    let backend = Arc::new(MemoryStateBackend::new());
    let orchestrator = Orchestrator::new(
        EngineConfig::for_stack("wrappers"),
        materializer.clone(),
        backend,
    );

    let first = orchestrator.deploy(assets()).await.unwrap();
    let second = orchestrator
        .deploy(wrap("Layout", assets()))
        .await
        .unwrap();

    assert!(second.changes.is_empty(), "changes: {:?}", second.changes);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(materializer.deploy_count("storage-bucket"), 1);
}

#[test]
fn test_resource_registering_parent_prefixes_children() {
    let site = Component::new("Site", |props| {
        use_instance(&BUCKET, Props::new().key("site"))?;
        Ok(props.child_elements().to_vec())
    });
    let root = site.element(Props::new().children(vec![wrap("Cdn", assets())]));
    assert_eq!(ids(root), vec!["site", "site.storage-bucket"]);
}

#[test]
fn test_blank_child_key_is_dropped_instead_of_taking_parent_id() {
    let child_id = Arc::new(parking_lot::Mutex::new(None));
    let sink = child_id.clone();

    let child = Component::new("Child", move |_| {
        let handle = use_instance(&BUCKET, Props::new().key("!!"))?;
        *sink.lock() = Some(handle.id().to_string());
        Ok(vec![])
    })
    .element(Props::new());
    let parent = Component::new("Parent", |props| {
        use_instance(&BUCKET, Props::new().key("app"))?;
        Ok(props.child_elements().to_vec())
    })
    .element(Props::new().children(vec![child]));

    assert_eq!(ids(parent), vec!["app"]);
    assert_eq!(child_id.lock().as_deref(), Some(""));
}
