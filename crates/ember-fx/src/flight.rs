//! Fixed-capacity pool of in-flight particles

use ember_core::{Result, Vec2};
use ember_stage::{Stage, VisualId, VisualSpec};

/// One reusable flight slot. The visual is created at pool construction and
/// lives for the pool's whole lifetime; release only hides it.
#[derive(Debug, Clone)]
pub struct FlightParticle {
    pub visual: VisualId,
    /// Velocity in px/s
    pub velocity: Vec2,
    /// Seconds since this slot was (re)spawned
    pub age: f32,
    /// Configured maximum age; drives the growth ramp, not removal
    pub max_age: f32,
    /// Spawn-lane bookkeeping, cleared on release
    pub lane: Option<usize>,
    pub active: bool,
}

/// The flying-particle pool: no allocation after construction, acquisition
/// by first-inactive scan, release back to a fully reset state.
pub struct FlightPool {
    slots: Vec<FlightParticle>,
}

impl FlightPool {
    /// Create the pool and all of its visuals up front, hidden.
    pub fn new(stage: &mut Stage, capacity: usize, frame_set: &str, size: Vec2) -> Self {
        let slots = (0..capacity)
            .map(|_| {
                let visual = stage.create(VisualSpec::new(frame_set, size).hidden());
                FlightParticle {
                    visual,
                    velocity: Vec2::ZERO,
                    age: 0.0,
                    max_age: 0.0,
                    lane: None,
                    active: false,
                }
            })
            .collect();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Claim the first inactive slot. `None` means the pool is exhausted —
    /// expected backpressure the caller simply drops the spawn on.
    pub fn acquire(&mut self) -> Option<usize> {
        let idx = self.slots.iter().position(|s| !s.active)?;
        self.slots[idx].active = true;
        Some(idx)
    }

    /// Return a slot to the pool: hide the visual, zero the kinematics,
    /// clear the lane assignment.
    pub fn release(&mut self, slot: usize, stage: &mut Stage) -> Result<()> {
        let particle = &mut self.slots[slot];
        stage.set_visible(particle.visual, false)?;
        particle.velocity = Vec2::ZERO;
        particle.age = 0.0;
        particle.max_age = 0.0;
        particle.lane = None;
        particle.active = false;
        Ok(())
    }

    pub fn slot(&self, slot: usize) -> &FlightParticle {
        &self.slots[slot]
    }

    pub fn slot_mut(&mut self, slot: usize) -> &mut FlightParticle {
        &mut self.slots[slot]
    }

    /// Indices of all active slots, in slot order
    pub fn active_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, _)| i)
            .collect()
    }

    /// Advance physics for every active slot: constant gravity on the
    /// vertical axis, position integration, and rotation tracking the
    /// direction of travel.
    pub fn update(
        &mut self,
        stage: &mut Stage,
        dt: f32,
        gravity: f32,
        rotation_offset: f32,
    ) -> Result<()> {
        for particle in self.slots.iter_mut().filter(|s| s.active) {
            particle.velocity.y += gravity * dt;
            particle.age += dt;

            let position = match stage.get(particle.visual) {
                Some(v) => v.position,
                None => continue,
            };
            let next = position + particle.velocity * dt;
            stage.set_position(particle.visual, next)?;
            stage.set_rotation(particle.visual, particle.velocity.angle() + rotation_offset)?;
        }
        Ok(())
    }
}

/// The "puff" growth curve, applied alongside physics but owned by the
/// effect, not the pool: scale ramps linearly from `initial` to `peak` over
/// the first 10% of a particle's configured maximum age, then holds.
pub fn apply_scale_growth(
    pool: &FlightPool,
    stage: &mut Stage,
    initial: f32,
    peak: f32,
) -> Result<()> {
    for idx in pool.active_slots() {
        let particle = pool.slot(idx);
        let ramp = particle.max_age * 0.1;
        let t = if ramp <= 0.0 {
            1.0
        } else {
            (particle.age / ramp).min(1.0)
        };
        stage.set_scale(particle.visual, initial + (peak - initial) * t)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize) -> (Stage, FlightPool) {
        let mut stage = Stage::new();
        let pool = FlightPool::new(&mut stage, capacity, "spark", Vec2::new(96.0, 96.0));
        (stage, pool)
    }

    #[test]
    fn acquire_until_exhausted() {
        let (_stage, mut pool) = pool(3);
        assert_eq!(pool.active_count(), 0);

        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());
        assert_eq!(pool.active_count(), 3);
        // Exhaustion is a None, not a panic
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn conservation_across_acquire_release() {
        let (mut stage, mut pool) = pool(4);
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.capacity(), 4);

        pool.release(a, &mut stage).unwrap();
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.capacity(), 4);
        // The released slot is acquirable again
        assert_eq!(pool.acquire(), Some(a));
    }

    #[test]
    fn release_fully_resets_slot() {
        let (mut stage, mut pool) = pool(1);
        let idx = pool.acquire().unwrap();
        {
            let p = pool.slot_mut(idx);
            p.velocity = Vec2::new(50.0, -200.0);
            p.age = 1.5;
            p.max_age = 3.0;
            p.lane = Some(2);
        }
        let visual = pool.slot(idx).visual;
        stage.set_visible(visual, true).unwrap();

        pool.release(idx, &mut stage).unwrap();
        let p = pool.slot(idx);
        assert!(!p.active);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.lane, None);
        assert!(!stage.get(visual).unwrap().visible);
    }

    #[test]
    fn update_integrates_gravity_and_rotation() {
        let (mut stage, mut pool) = pool(1);
        let idx = pool.acquire().unwrap();
        let visual = pool.slot(idx).visual;
        stage.set_position(visual, Vec2::new(100.0, 100.0)).unwrap();
        pool.slot_mut(idx).velocity = Vec2::new(100.0, 0.0);
        pool.slot_mut(idx).max_age = 3.0;

        pool.update(&mut stage, 0.5, 1000.0, 0.0).unwrap();

        let p = pool.slot(idx);
        // vy picked up half a second of gravity
        assert!((p.velocity.y - 500.0).abs() < 1e-3);
        assert!((p.age - 0.5).abs() < 1e-6);
        let v = stage.get(visual).unwrap();
        assert!((v.position.x - 150.0).abs() < 1e-3);
        assert!((v.position.y - 350.0).abs() < 1e-3);
        // Rotation tracks the travel direction
        assert!((v.rotation - Vec2::new(100.0, 500.0).angle()).abs() < 1e-5);
    }

    #[test]
    fn inactive_slots_are_not_mutated() {
        let (mut stage, mut pool) = pool(2);
        let idx = pool.acquire().unwrap();
        pool.slot_mut(idx).velocity = Vec2::new(10.0, 0.0);
        pool.slot_mut(idx).max_age = 1.0;

        pool.update(&mut stage, 1.0, 100.0, 0.0).unwrap();

        // Slot 1 was never acquired; its kinematics are untouched
        let other = pool.slot(1);
        assert_eq!(other.velocity, Vec2::ZERO);
        assert_eq!(other.age, 0.0);
    }

    #[test]
    fn growth_ramps_then_holds() {
        let (mut stage, mut pool) = pool(1);
        let idx = pool.acquire().unwrap();
        let visual = pool.slot(idx).visual;
        pool.slot_mut(idx).max_age = 10.0; // ramp spans the first second

        pool.slot_mut(idx).age = 0.5;
        apply_scale_growth(&pool, &mut stage, 0.1, 0.3).unwrap();
        let mid = stage.get(visual).unwrap().scale;
        assert!((mid - 0.2).abs() < 1e-4);

        pool.slot_mut(idx).age = 5.0;
        apply_scale_growth(&pool, &mut stage, 0.1, 0.3).unwrap();
        let held = stage.get(visual).unwrap().scale;
        assert!((held - 0.3).abs() < 1e-4);
    }
}
