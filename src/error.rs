//! Error types for the Stratus render/reconcile engine.

use thiserror::Error;

/// Hook misuse. These are programmer errors, never data-validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("No active render context: {hook} called outside a component render")]
    NoActiveRender { hook: &'static str },

    #[error(
        "Hook order changed in component '{component}': expected {expected:?} hooks, got {actual:?}. \
         Hooks must be called unconditionally and in the same order on every render."
    )]
    OrderChanged {
        component: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Context value type mismatch for context {context}")]
    ContextTypeMismatch { context: u64 },
}

/// CloudDOM build and validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Duplicate resource id '{id}' (from component path '{component_path}')")]
    DuplicateId { id: String, component_path: String },

    #[error("Circular hierarchy detected at resource '{id}'")]
    CircularHierarchy { id: String },

    #[error(
        "Resource '{id}' is missing required property '{property}' (from component path '{component_path}')"
    )]
    MissingRequiredProperty {
        id: String,
        property: String,
        component_path: String,
    },

    #[error("Resource of kind '{kind}' has an empty local id (from component path '{component_path}')")]
    EmptyPath { kind: String, component_path: String },
}

/// Failures reported by a materializer
#[derive(Debug, Clone, Error)]
pub enum MaterializeError {
    #[error("Failed to materialize resource '{id}': {message}")]
    Resource { id: String, message: String },

    #[error("Materializer failure: {0}")]
    Other(String),
}

/// Failures reported by a state backend
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("Stack '{stack}' is locked by '{holder}'")]
    Locked { stack: String, holder: String },

    #[error("Failed to encode deployment state: {0}")]
    Encode(String),

    #[error("Failed to decode deployment state: {0}")]
    Decode(String),

    #[error("State backend error: {0}")]
    Backend(String),
}

/// Top-level engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Materialization failed: {0}")]
    Materialize(#[from] MaterializeError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Component '{component}' failed: {message}")]
    Component { component: String, message: String },

    #[error(
        "Reactive loop did not reach a fixpoint within {limit} passes \
         ({pending} fibers still pending). Raise max_reactive_passes or break the output cycle."
    )]
    ReactiveLoopExceeded { limit: usize, pending: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}

impl EngineError {
    /// Build a component failure from any displayable error
    pub fn component(component: impl Into<String>, err: impl std::fmt::Display) -> Self {
        EngineError::Component {
            component: component.into(),
            message: err.to_string(),
        }
    }
}
