//! Event renderers.
//!
//! Renderers subscribe to the [`crate::EventBus`] and turn events into
//! terminal output. They stop after the shutdown event.

pub mod cli;
pub mod json;

pub use cli::{CliRenderer, CliRendererConfig};
pub use json::JsonRenderer;
