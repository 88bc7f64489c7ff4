//! Rendering
//!
//! Components are plain functions from [`Props`] to child [`Element`]s. The [`RenderEngine`]
//! keeps one fiber per tree position and re-renders only the fibers queued by the reactive
//! layer.

pub mod element;
pub mod engine;
pub(crate) mod fiber;

pub use element::{Component, Element, Props, RenderFn};
pub use engine::RenderEngine;
