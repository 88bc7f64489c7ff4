//! Values flowing through props, state slots and effect dependencies.
//!
//! A [`Value`] is either undefined, plain JSON, or an explicitly tagged provider output.
//! Tagged outputs carry the `(resource id, output key)` they were read from so the state
//! hook can bind a slot to that output without guessing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one output key of one resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputRef {
    pub resource_id: String,
    pub output_key: String,
}

impl OutputRef {
    pub fn new(resource_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            output_key: output_key.into(),
        }
    }

    /// Key used in the flattened output map: `parent.child.outputKey`
    pub fn flat_key(&self) -> String {
        format!("{}.{}", self.resource_id, self.output_key)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.resource_id, self.output_key)
    }
}

/// A provider output together with its value at the time it was read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub source: OutputRef,
    pub value: Option<serde_json::Value>,
}

/// Prop, state and dependency value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Undefined,
    Json(serde_json::Value),
    Output(OutputValue),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        match self {
            Value::Undefined => true,
            Value::Output(out) => out.value.is_none(),
            Value::Json(_) => false,
        }
    }

    /// Resolved JSON, if any. Unresolved outputs resolve to `None`.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Undefined => None,
            Value::Json(v) => Some(v),
            Value::Output(out) => out.value.as_ref(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(|v| v.as_str())
    }

    pub fn as_output(&self) -> Option<&OutputValue> {
        match self {
            Value::Output(out) => Some(out),
            _ => None,
        }
    }

    /// Snapshot form used in resource property maps
    pub fn to_snapshot(&self) -> Option<serde_json::Value> {
        self.as_json().cloned()
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Option<serde_json::Value>> for Value {
    fn from(v: Option<serde_json::Value>) -> Self {
        v.map(Value::Json).unwrap_or(Value::Undefined)
    }
}

impl From<OutputValue> for Value {
    fn from(v: OutputValue) -> Self {
        Value::Output(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Json(serde_json::Value::String(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Json(serde_json::Value::String(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Json(serde_json::Value::Bool(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Json(serde_json::Value::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Json(serde_json::Value::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Json(serde_json::Value::from(v))
    }
}
