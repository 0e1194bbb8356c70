//! Ember Tween - Deferred numeric animation scheduler
//!
//! Schedules a float animation from A to B over a duration with an optional
//! delay and an easing curve. Owners drain sampled values once per tick and
//! apply them to whatever property they animate; nothing here ever blocks.
//! Cancellation by handle is a pure local removal.

mod easing;
mod tween;

pub use easing::Easing;
pub use tween::{Tween, TweenId, TweenUpdate, Tweener};
