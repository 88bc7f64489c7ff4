//! Hooks
//!
//! Hooks may only be called from a component body while it renders. Slots are addressed by
//! call order, so every component must call its hooks unconditionally and in the same order
//! on every render.

pub mod context;
pub mod effect;
pub(crate) mod frame;
pub mod instance;
pub mod state;
pub(crate) mod store;

pub use context::{use_context, Context, ContextId};
pub use effect::{use_effect, Cleanup, EffectDeps};
pub use frame::HookKind;
pub use instance::{use_instance, InstanceHandle};
pub use state::{use_state, StateSetter};
