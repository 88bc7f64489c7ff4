//! Stratus: Reactive Cloud Resource Trees
//!
//! Components declare cloud resources through hooks. The engine renders the component tree
//! into a validated resource forest, reconciles it against what is deployed, hands the
//! difference to a materializer, and re-renders only the components whose output
//! dependencies changed, until nothing is left to do.

pub mod config;
pub mod deploy;
pub mod dom;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod reactive;
pub mod reconcile;
pub mod render;
pub mod runtime;
pub mod types;
pub mod value;

pub use config::{ConfigLoader, EngineConfig};
pub use deploy::{DeploymentReport, Materializer, MemoryStateBackend, Orchestrator, StateBackend};
pub use dom::{CloudDom, ResourceKind};
pub use error::EngineError;
pub use render::{Component, Element, Props};
pub use value::Value;
