//! Resource lifecycle callbacks (`on_deploy`, `on_error`, `on_destroy`)

use crate::types::Outputs;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Context handed to every lifecycle callback
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleContext {
    pub resource_id: String,
    pub path: Vec<String>,
    pub outputs: Outputs,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleContext {
    pub fn now(resource_id: impl Into<String>, path: Vec<String>, outputs: Outputs) -> Self {
        Self {
            resource_id: resource_id.into(),
            path,
            outputs,
            timestamp: Utc::now(),
        }
    }
}

pub type LifecycleCallback = Arc<dyn Fn(&LifecycleContext) + Send + Sync>;

/// Lifecycle callbacks attached to a component, and from there to its resources
#[derive(Clone, Default)]
pub struct Lifecycle {
    pub on_deploy: Option<LifecycleCallback>,
    pub on_error: Option<LifecycleCallback>,
    pub on_destroy: Option<LifecycleCallback>,
}

impl Lifecycle {
    pub fn is_empty(&self) -> bool {
        self.on_deploy.is_none() && self.on_error.is_none() && self.on_destroy.is_none()
    }

    pub fn deployed(&self, ctx: &LifecycleContext) {
        if let Some(cb) = &self.on_deploy {
            cb(ctx);
        }
    }

    pub fn failed(&self, ctx: &LifecycleContext) {
        if let Some(cb) = &self.on_error {
            cb(ctx);
        }
    }

    pub fn destroyed(&self, ctx: &LifecycleContext) {
        if let Some(cb) = &self.on_destroy {
            cb(ctx);
        }
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("on_deploy", &self.on_deploy.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}
