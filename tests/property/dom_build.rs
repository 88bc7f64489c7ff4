//! Property-based tests for rendering keyed resources into a CloudDOM

use proptest::prelude::*;
use std::collections::HashSet;
use stratus::dom::path::normalize_segment;
use stratus::dom::{CloudDom, CloudDomBuilder, ResourceKind};
use stratus::error::ValidationError;
use stratus::hooks::use_instance;
use stratus::render::RenderEngine;
use stratus::runtime::Runtime;
use stratus::{Component, Props};

const BUCKET: ResourceKind = ResourceKind::new("StorageBucket");

fn render_keys(keys: Vec<String>) -> Result<CloudDom, ValidationError> {
    let root = Component::new("Buckets", move |_| {
        for key in &keys {
            use_instance(&BUCKET, Props::new().key(key.clone()))?;
        }
        Ok(vec![])
    })
    .element(Props::new());

    let mut engine = RenderEngine::new(Runtime::new());
    engine.render_root(root).unwrap();
    let result = CloudDomBuilder::new().build(&engine.descriptors());
    engine.unmount();
    result
}

proptest! {
    #[test]
    fn duplicate_ids_detected_iff_keys_collide(keys in prop::collection::vec("[ A-Za-z0-9_-]{0,6}", 0..8)) {
        let normalized: Vec<String> = keys
            .iter()
            .map(|k| normalize_segment(k))
            .filter(|k| !k.is_empty())
            .collect();
        let unique: HashSet<&String> = normalized.iter().collect();
        let collides = unique.len() != normalized.len();

        match render_keys(keys) {
            Ok(dom) => {
                prop_assert!(!collides);
                prop_assert_eq!(dom.len(), normalized.len());
                for id in &normalized {
                    prop_assert!(dom.contains(id));
                }
            }
            Err(ValidationError::DuplicateId { id, component_path }) => {
                prop_assert!(collides);
                prop_assert!(normalized.contains(&id));
                prop_assert_eq!(component_path, "Buckets");
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn fingerprint_ignores_registration_order(keys in prop::collection::hash_set("[a-z][a-z0-9]{0,6}", 1..6)) {
        let forward: Vec<String> = keys.into_iter().collect();
        let mut backward = forward.clone();
        backward.reverse();

        let first = render_keys(forward).unwrap();
        let second = render_keys(backward).unwrap();
        prop_assert_eq!(first.fingerprint_hex(), second.fingerprint_hex());
    }
}
