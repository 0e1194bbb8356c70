//! Demo system trait

use crate::events::EventBus;
use ember_core::Result;
use ember_stage::Stage;
use ember_tween::Tweener;

/// The shared mutable services a system touches during one tick.
///
/// Exactly one system borrows these at a time; ownership of individual pool
/// slots transfers explicitly at hand-off points inside the systems, so no
/// further synchronization exists or is needed.
pub struct SceneServices<'a> {
    pub stage: &'a mut Stage,
    pub tweener: &'a mut Tweener,
    pub events: &'a mut EventBus,
}

/// A system advanced by the per-frame loop
///
/// Systems are updated in registration order, once per frame with the
/// frame's delta time.
pub trait DemoSystem {
    /// Called once before the first update
    fn initialize(&mut self, services: &mut SceneServices<'_>) -> Result<()>;

    /// Called once per frame
    fn update(&mut self, services: &mut SceneServices<'_>, dt: f32) -> Result<()>;

    /// Called when the owning scene is torn down
    fn shutdown(&mut self, services: &mut SceneServices<'_>) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
