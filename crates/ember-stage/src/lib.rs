//! Ember Stage - Retained-mode 2D visual store
//!
//! Holds the renderable state the simulation mutates every tick: position,
//! scale, rotation, anchor, visibility, and parent/child composition. A real
//! renderer consumes this store; the simulation only ever talks to the
//! narrow handle-based API here.

mod id;
mod stage;
mod visual;

pub use id::VisualId;
pub use stage::Stage;
pub use visual::{Anchor, Visual, VisualSpec};
