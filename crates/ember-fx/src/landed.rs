//! Landed sprite manager — the pause-then-shrink decay path

use crate::config::FxConfig;
use ember_core::{Result, Vec2};
use ember_runtime::{DemoEvent, EventBus};
use ember_stage::{Anchor, Stage, VisualId, VisualSpec};
use ember_tween::{Easing, Tween, TweenId, TweenUpdate, Tweener};
use std::collections::HashMap;

/// Anchor that puts the shrink origin `pivot_offset` unscaled pixels above
/// the visual's bottom edge.
pub(crate) fn pivot_anchor(size_y: f32, pivot_offset: f32) -> Anchor {
    if size_y <= 0.0 {
        return Anchor::CENTER;
    }
    Anchor::new(0.5, ((size_y - pivot_offset) / size_y).clamp(0.0, 1.0))
}

/// Anchor-point position that keeps the visual's bottom edge at `baseline_y`
/// under a pivot anchor: the baseline does not jump when the anchor switches
/// away from center at spawn time.
pub(crate) fn pivot_position(x: f32, baseline_y: f32, pivot_offset: f32, scale: f32) -> Vec2 {
    Vec2::new(x, baseline_y - pivot_offset * scale)
}

/// Identifies which slot incarnation a scheduled tween belongs to. A slot's
/// generation bumps on every release, so an update drained after the slot
/// was recycled matches nothing and is dropped — the liveness guard.
#[derive(Debug, Clone, Copy)]
struct TweenTag {
    slot: usize,
    generation: u32,
}

#[derive(Debug)]
struct LandedSlot {
    visual: VisualId,
    scale: f32,
    generation: u32,
    decay: Option<TweenId>,
    active: bool,
}

/// Fixed-capacity pool of decaying ground sprites.
///
/// Spawn holds for `pause_secs`, then shrinks the sprite to zero over
/// `shrink_secs` with an ease-in curve; reaching zero synchronously resets
/// the slot and reports `LandedExpired`. Spawning with no free slot returns
/// `false` — landings are dropped, never queued.
pub struct LandedPool {
    slots: Vec<LandedSlot>,
    pending: HashMap<TweenId, TweenTag>,
    pause_secs: f32,
    shrink_secs: f32,
    pivot_offset: f32,
    disposed: bool,
}

impl LandedPool {
    pub fn new(stage: &mut Stage, config: &FxConfig) -> Self {
        let slots = (0..config.landed_capacity)
            .map(|_| LandedSlot {
                visual: stage.create(
                    VisualSpec::new(&config.particle_frame_set, config.particle_size).hidden(),
                ),
                scale: 1.0,
                generation: 0,
                decay: None,
                active: false,
            })
            .collect();
        Self {
            slots,
            pending: HashMap::new(),
            pause_secs: config.pause_secs,
            shrink_secs: config.shrink_secs,
            pivot_offset: config.pivot_offset,
            disposed: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Update the decay timings for subsequent spawns (runtime tunables)
    pub fn set_timings(&mut self, pause_secs: f32, shrink_secs: f32, pivot_offset: f32) {
        self.pause_secs = pause_secs;
        self.shrink_secs = shrink_secs;
        self.pivot_offset = pivot_offset;
    }

    /// Spawn a decaying sprite at a landing point. Returns `false` when
    /// every slot is busy.
    pub fn spawn(
        &mut self,
        stage: &mut Stage,
        tweener: &mut Tweener,
        x: f32,
        y: f32,
        scale: f32,
    ) -> Result<bool> {
        let Some(idx) = self.slots.iter().position(|s| !s.active) else {
            return Ok(false);
        };
        let pivot_offset = self.pivot_offset;
        let (pause, shrink) = (self.pause_secs, self.shrink_secs);
        let slot = &mut self.slots[idx];
        let visual = slot.visual;

        let size_y = stage
            .get(visual)
            .map(|v| v.size.y)
            .unwrap_or_default();
        stage.set_anchor(visual, pivot_anchor(size_y, pivot_offset))?;
        stage.set_position(visual, pivot_position(x, y, pivot_offset, scale))?;
        stage.set_scale(visual, scale)?;
        stage.set_rotation(visual, 0.0)?;
        stage.set_visible(visual, true)?;

        let id = tweener.schedule(
            Tween::new(scale, 0.0, shrink)
                .after(pause)
                .with_easing(Easing::QuadIn),
        );
        self.pending.insert(
            id,
            TweenTag {
                slot: idx,
                generation: slot.generation,
            },
        );
        slot.decay = Some(id);
        slot.scale = scale;
        slot.active = true;
        Ok(true)
    }

    /// Apply this tick's drained tween updates to the slots that still own
    /// them. Every update passes the liveness guard first: manager not
    /// disposed, slot generation unchanged, visual still on the stage.
    pub fn apply_updates(
        &mut self,
        stage: &mut Stage,
        updates: &[TweenUpdate],
        events: &mut EventBus,
    ) -> Result<()> {
        for update in updates {
            let Some(tag) = self.pending.get(&update.id).copied() else {
                continue;
            };
            if update.finished {
                self.pending.remove(&update.id);
            }

            let slot = &mut self.slots[tag.slot];
            if self.disposed
                || slot.generation != tag.generation
                || !stage.contains(slot.visual)
            {
                continue;
            }

            slot.scale = update.value;
            stage.set_scale(slot.visual, update.value)?;

            if update.finished {
                // Synchronous recycle: never leave a visible zero-scale sprite
                stage.set_visible(slot.visual, false)?;
                stage.set_anchor(slot.visual, Anchor::CENTER)?;
                stage.set_scale(slot.visual, 1.0)?;
                slot.scale = 1.0;
                slot.decay = None;
                slot.generation += 1;
                slot.active = false;
                events.push(DemoEvent::LandedExpired { slot: tag.slot });
            }
        }
        Ok(())
    }

    /// Cancel all running decays and force every slot back to the inactive
    /// default state. Completion events are not emitted.
    pub fn reset(&mut self, stage: &mut Stage, tweener: &mut Tweener) -> Result<()> {
        for slot in &mut self.slots {
            if let Some(id) = slot.decay.take() {
                tweener.cancel(id);
            }
            if stage.contains(slot.visual) {
                stage.set_visible(slot.visual, false)?;
                stage.set_anchor(slot.visual, Anchor::CENTER)?;
                stage.set_scale(slot.visual, 1.0)?;
            }
            slot.scale = 1.0;
            slot.generation += 1;
            slot.active = false;
        }
        self.pending.clear();
        Ok(())
    }

    /// Mark the manager torn down: any update drained after this point is
    /// ignored without touching the stage.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    #[cfg(test)]
    pub(crate) fn slot_visual(&self, idx: usize) -> VisualId {
        self.slots[idx].visual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(capacity: usize) -> (Stage, Tweener, EventBus, LandedPool) {
        let mut stage = Stage::new();
        let config = FxConfig {
            landed_capacity: capacity,
            particle_size: Vec2::new(100.0, 100.0),
            pause_secs: 0.5,
            shrink_secs: 3.0,
            pivot_offset: 20.0,
            ..FxConfig::default()
        };
        let pool = LandedPool::new(&mut stage, &config);
        (stage, Tweener::new(), EventBus::new(), pool)
    }

    fn drive(
        pool: &mut LandedPool,
        stage: &mut Stage,
        tweener: &mut Tweener,
        events: &mut EventBus,
        seconds: f32,
        step: f32,
    ) {
        let mut t = 0.0;
        while t < seconds {
            let updates = tweener.advance(step);
            pool.apply_updates(stage, &updates, events).unwrap();
            t += step;
        }
    }

    #[test]
    fn pivot_anchor_math() {
        let anchor = pivot_anchor(100.0, 20.0);
        assert!((anchor.y - 0.8).abs() < 1e-6);
        // Degenerate height falls back to center
        assert_eq!(pivot_anchor(0.0, 20.0), Anchor::CENTER);
    }

    #[test]
    fn spawn_keeps_baseline_fixed() {
        let (mut stage, mut tweener, _events, mut pool) = setup(1);
        assert!(pool.spawn(&mut stage, &mut tweener, 200.0, 600.0, 0.4).unwrap());

        let visual = pool.slot_visual(0);
        let bounds = stage.bounds(visual).unwrap();
        // The bottom edge sits exactly on the landing line at spawn scale
        assert!((bounds.bottom() - 600.0).abs() < 1e-3);
        assert!(stage.get(visual).unwrap().visible);
    }

    #[test]
    fn spawn_fails_when_full_without_side_effects() {
        let (mut stage, mut tweener, _events, mut pool) = setup(2);
        assert!(pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap());
        assert!(pool.spawn(&mut stage, &mut tweener, 10.0, 600.0, 0.3).unwrap());
        assert_eq!(pool.active_count(), 2);

        assert!(!pool.spawn(&mut stage, &mut tweener, 20.0, 600.0, 0.3).unwrap());
        assert_eq!(pool.active_count(), 2);
        assert_eq!(tweener.active_count(), 2);
    }

    #[test]
    fn decay_pauses_shrinks_and_recycles() {
        let (mut stage, mut tweener, mut events, mut pool) = setup(1);
        pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap();
        let visual = pool.slot_visual(0);

        // 200 ms in: still inside the pause window
        drive(&mut pool, &mut stage, &mut tweener, &mut events, 0.2, 0.05);
        assert!((stage.get(visual).unwrap().scale - 0.3).abs() < 1e-5);

        // 2 s in (1.5 s into the shrink): strictly between initial and zero
        drive(&mut pool, &mut stage, &mut tweener, &mut events, 1.8, 0.05);
        let mid = stage.get(visual).unwrap().scale;
        assert!(mid > 0.0 && mid < 0.3);

        // 3.6 s in: slot recycled, scale reset to 1, hidden
        drive(&mut pool, &mut stage, &mut tweener, &mut events, 1.6, 0.05);
        assert_eq!(pool.active_count(), 0);
        let v = stage.get(visual).unwrap();
        assert!(!v.visible);
        assert!((v.scale - 1.0).abs() < 1e-6);
        assert_eq!(v.anchor, Anchor::CENTER);
        assert!(events
            .drain()
            .contains(&DemoEvent::LandedExpired { slot: 0 }));
    }

    #[test]
    fn decay_is_monotonic() {
        let (mut stage, mut tweener, mut events, mut pool) = setup(1);
        pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap();
        let visual = pool.slot_visual(0);

        let mut last = 0.3f32;
        let mut finished = false;
        for _ in 0..100 {
            let updates = tweener.advance(0.05);
            pool.apply_updates(&mut stage, &updates, &mut events).unwrap();
            if pool.active_count() == 0 {
                finished = true;
                break;
            }
            let scale = stage.get(visual).unwrap().scale;
            assert!(scale <= last + 1e-6, "scale went up mid-decay");
            last = scale;
        }
        assert!(finished, "decay never completed");
    }

    #[test]
    fn reset_cancels_without_events() {
        let (mut stage, mut tweener, mut events, mut pool) = setup(2);
        pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap();
        pool.spawn(&mut stage, &mut tweener, 10.0, 600.0, 0.3).unwrap();

        pool.reset(&mut stage, &mut tweener).unwrap();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(tweener.active_count(), 0);
        assert!(events.is_empty());

        // Late advances produce nothing the pool would act on
        let updates = tweener.advance(5.0);
        assert!(updates.is_empty());
    }

    #[test]
    fn stale_generation_updates_are_ignored() {
        let (mut stage, mut tweener, mut events, mut pool) = setup(1);
        pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap();
        let visual = pool.slot_visual(0);

        // Capture updates but reset the pool before applying them —
        // simulates a callback that outlives its slot incarnation
        let updates = tweener.advance(2.0);
        assert!(!updates.is_empty());
        pool.reset(&mut stage, &mut tweener).unwrap();
        pool.spawn(&mut stage, &mut tweener, 50.0, 600.0, 0.5).unwrap();

        pool.apply_updates(&mut stage, &updates, &mut events).unwrap();
        // The respawned slot keeps its own scale; the stale write was dropped
        assert!((stage.get(visual).unwrap().scale - 0.5).abs() < 1e-5);
    }

    #[test]
    fn disposed_pool_ignores_late_updates() {
        let (mut stage, mut tweener, mut events, mut pool) = setup(1);
        pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap();
        let visual = pool.slot_visual(0);

        let updates = tweener.advance(2.0);
        pool.dispose();
        pool.apply_updates(&mut stage, &updates, &mut events).unwrap();

        // Nothing moved and no completion fired
        assert!((stage.get(visual).unwrap().scale - 0.3).abs() < 1e-5);
        assert!(events.is_empty());
    }

    #[test]
    fn guard_survives_destroyed_visual() {
        let (mut stage, mut tweener, mut events, mut pool) = setup(1);
        pool.spawn(&mut stage, &mut tweener, 0.0, 600.0, 0.3).unwrap();
        let visual = pool.slot_visual(0);

        // Scene teardown destroys the visual while the decay is mid-flight
        stage.destroy(visual).unwrap();
        let updates = tweener.advance(2.0);
        // Must be a no-op, not an error
        pool.apply_updates(&mut stage, &updates, &mut events).unwrap();
    }
}
