//! Deployment
//!
//! External collaborators (materializer, state backend) and the orchestrator that drives
//! the reactive loop against them.

pub mod materializer;
pub mod orchestrator;
pub mod state;

pub use materializer::Materializer;
pub use orchestrator::{DeploymentReport, Orchestrator};
pub use state::{DeploymentState, MemoryStateBackend, StateBackend};
