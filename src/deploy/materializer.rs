//! Materializer interface
//!
//! A materializer turns a change set into real infrastructure and writes each deployed
//! resource's outputs back onto its CloudDOM node.

use crate::dom::CloudDom;
use crate::error::MaterializeError;
use crate::reconcile::ChangeSet;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Deploys resources and fills in their outputs
#[async_trait]
pub trait Materializer: Send + Sync {
    /// Called before each materialization
    async fn pre_materialize(&self, _dom: &CloudDom) -> Result<(), MaterializeError> {
        Ok(())
    }

    /// Deploy `changes` and write outputs onto the matching nodes of `dom`
    async fn materialize(
        &self,
        dom: &mut CloudDom,
        changes: &ChangeSet,
    ) -> Result<(), MaterializeError>;

    /// Called after a successful materialization with the flattened output map
    async fn post_materialize(
        &self,
        _dom: &CloudDom,
        _outputs: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), MaterializeError> {
        Ok(())
    }

    /// Called when any of the above failed
    async fn on_error(&self, _dom: &CloudDom, _error: &MaterializeError) {}

    /// Name used in logs
    fn name(&self) -> &str {
        "materializer"
    }
}
