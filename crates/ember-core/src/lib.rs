//! Ember Core - Foundational types for the Ember demo engine
//!
//! This crate provides the types that all other Ember crates depend on:
//! - `Vec2` - 2D screen-space vector (pixels, y-down)
//! - Error types and Result alias

mod error;
mod types;

pub use error::{EmberError, Result};
pub use types::{Rect, Vec2};
