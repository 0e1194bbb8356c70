//! Typed event queue for scene-to-app signals

use ember_stage::VisualId;

/// Events the simulation publishes for the surrounding application
#[derive(Debug, Clone, PartialEq)]
pub enum DemoEvent {
    /// A flying particle crossed the floor line this tick
    ParticleLanded {
        x: f32,
        y: f32,
        scale: f32,
        rotation: f32,
    },
    /// A landed particle finished its decay and its slot was recycled
    LandedExpired { slot: usize },
    /// An evolving particle reached its terminal form. Position/animation
    /// ownership of the visual is handed to the consumer; the slot stays
    /// reserved until `release_by_visual`.
    EggCreated { visual: VisualId, x: f32, y: f32 },
}

/// A simple event queue that systems push to and consumers drain
pub struct EventBus {
    events: Vec<DemoEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event onto the bus
    pub fn push(&mut self, event: DemoEvent) {
        self.events.push(event);
    }

    /// Drain all events from the bus, returning them
    pub fn drain(&mut self) -> Vec<DemoEvent> {
        std::mem::take(&mut self.events)
    }

    /// Check if there are pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }
}
