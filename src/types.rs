//! Shared identifier types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one fiber within a render engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiberId(pub(crate) u64);

impl FiberId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiber#{}", self.0)
    }
}

/// Normalized, dot-joined resource id
pub type ResourceId = String;

/// Output map of a single resource
pub type Outputs = std::collections::BTreeMap<String, serde_json::Value>;

/// Property snapshot of a single resource
pub type PropertySnapshot = std::collections::BTreeMap<String, serde_json::Value>;

/// Content fingerprint (BLAKE3)
pub type Hash = [u8; 32];
