//! Reactivity
//!
//! Tracks which outputs changed after a materialization pass, which slots and renders are
//! bound to them, and which fibers must re-render as a result.

pub mod bindings;
pub mod scheduler;
pub mod tracker;

pub use bindings::{Affected, BindingManager, BindingTarget};
pub use scheduler::{ReactiveScheduler, SchedulerStats};
pub use tracker::{OutputStore, OutputTracker};
