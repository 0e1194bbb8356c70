//! Ember Runtime - Tick loop infrastructure
//!
//! Provides the cooperative single-threaded plumbing the demos run on:
//! - `DemoClock` — fixed-timestep accumulator
//! - `DemoEvent` / `EventBus` — typed event queue for scene-to-app signals
//! - `DemoSystem` — trait for systems ticked by the loop, with
//!   `SceneServices` bundling the stage, tweener, and event bus borrows

mod clock;
mod events;
mod system;

pub use clock::DemoClock;
pub use events::{DemoEvent, EventBus};
pub use system::{DemoSystem, SceneServices};
