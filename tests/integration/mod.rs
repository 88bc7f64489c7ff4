//! Integration tests for the Stratus render/reconcile/react engine

mod config_integration;
mod effect_lifecycle;
mod state_binding;
mod state_persistence;
pub mod test_utils;
mod wrapper_transparency;
