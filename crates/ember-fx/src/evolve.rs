//! Evolving landed manager — click-driven evolution into a collectible

use crate::config::FxConfig;
use crate::landed::{pivot_anchor, pivot_position};
use ember_core::{Result, Vec2};
use ember_runtime::{DemoEvent, EventBus};
use ember_stage::{Anchor, Stage, VisualId, VisualSpec};
use ember_tween::{Easing, Tween, TweenId, TweenUpdate, Tweener};
use std::collections::HashMap;

/// Per-slot lifecycle state. Levels advance only forward within one spawn
/// cycle; `Collectible` is terminal until the slot is explicitly released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolvePhase {
    Inactive,
    Level0,
    Level1,
    Level2,
    Collectible,
}

impl EvolvePhase {
    /// Index into the per-level appearance list
    fn appearance_index(self) -> Option<usize> {
        match self {
            EvolvePhase::Inactive => None,
            EvolvePhase::Level0 => Some(0),
            EvolvePhase::Level1 => Some(1),
            EvolvePhase::Level2 => Some(2),
            EvolvePhase::Collectible => Some(3),
        }
    }

    fn next(self) -> Self {
        match self {
            EvolvePhase::Level0 => EvolvePhase::Level1,
            EvolvePhase::Level1 => EvolvePhase::Level2,
            EvolvePhase::Level2 => EvolvePhase::Collectible,
            other => other,
        }
    }

    /// Whether a click advances this phase
    fn clickable(self) -> bool {
        matches!(
            self,
            EvolvePhase::Level0 | EvolvePhase::Level1 | EvolvePhase::Level2
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TweenKind {
    Decay,
    Recovery,
}

#[derive(Debug, Clone, Copy)]
struct EvolveTag {
    slot: usize,
    generation: u32,
    kind: TweenKind,
}

#[derive(Debug)]
struct EvolveSlot {
    visual: VisualId,
    phase: EvolvePhase,
    clicks_at_level: u32,
    /// Scale recorded at spawn; every recovery bounce returns here
    original_scale: f32,
    scale: f32,
    generation: u32,
    decay: Option<TweenId>,
    recovery: Option<TweenId>,
}

/// The evolution variant of the landed manager.
///
/// Unclicked particles decay exactly like the plain landed pool. A click
/// cancels the decay, bounces the sprite back to full size, and counts
/// toward the next evolution level; the terminal level becomes a permanent
/// collectible whose only exit is `release_by_visual`.
pub struct EvolvingPool {
    /// Parent node all pooled visuals live under; collectibles detached for
    /// external animation come back here on release
    container: VisualId,
    slots: Vec<EvolveSlot>,
    pending: HashMap<TweenId, EvolveTag>,
    pause_secs: f32,
    shrink_secs: f32,
    recovery_secs: f32,
    pivot_offset: f32,
    clicks_per_level: u32,
    level_frame_sets: Vec<String>,
    collectible_offset: Vec2,
    disposed: bool,
}

impl EvolvingPool {
    pub fn new(stage: &mut Stage, config: &FxConfig) -> Self {
        let container = stage.create(VisualSpec::new("evolve_layer", Vec2::ZERO).hidden());
        let slots = (0..config.landed_capacity)
            .map(|_| EvolveSlot {
                visual: stage.create(
                    VisualSpec::new(&config.level_frame_sets[0], config.particle_size)
                        .hidden()
                        .under(container),
                ),
                phase: EvolvePhase::Inactive,
                clicks_at_level: 0,
                original_scale: 1.0,
                scale: 1.0,
                generation: 0,
                decay: None,
                recovery: None,
            })
            .collect();
        Self {
            container,
            slots,
            pending: HashMap::new(),
            pause_secs: config.pause_secs,
            shrink_secs: config.shrink_secs,
            recovery_secs: config.recovery_secs,
            pivot_offset: config.pivot_offset,
            clicks_per_level: config.clicks_per_level,
            level_frame_sets: config.level_frame_sets.clone(),
            collectible_offset: config.collectible_offset,
            disposed: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.phase != EvolvePhase::Inactive)
            .count()
    }

    /// Update the tunables consumed by subsequent spawns and clicks
    pub fn apply_tuning(&mut self, config: &FxConfig) {
        self.pause_secs = config.pause_secs;
        self.shrink_secs = config.shrink_secs;
        self.recovery_secs = config.recovery_secs;
        self.pivot_offset = config.pivot_offset;
        self.clicks_per_level = config.clicks_per_level;
        self.level_frame_sets = config.level_frame_sets.clone();
        self.collectible_offset = config.collectible_offset;
    }

    /// Spawn a fresh `Level0` particle at a landing point. Returns `false`
    /// when every slot is busy.
    pub fn spawn(
        &mut self,
        stage: &mut Stage,
        tweener: &mut Tweener,
        x: f32,
        y: f32,
        scale: f32,
    ) -> Result<bool> {
        let Some(idx) = self
            .slots
            .iter()
            .position(|s| s.phase == EvolvePhase::Inactive)
        else {
            return Ok(false);
        };
        let pivot_offset = self.pivot_offset;
        let frame_set = self.level_frame_sets[0].clone();
        let visual = self.slots[idx].visual;

        let size_y = stage.get(visual).map(|v| v.size.y).unwrap_or_default();
        stage.set_frame_set(visual, frame_set)?;
        stage.set_anchor(visual, pivot_anchor(size_y, pivot_offset))?;
        stage.set_position(visual, pivot_position(x, y, pivot_offset, scale))?;
        stage.set_scale(visual, scale)?;
        stage.set_rotation(visual, 0.0)?;
        stage.set_visible(visual, true)?;

        self.start_decay(tweener, idx, scale);
        let slot = &mut self.slots[idx];
        slot.phase = EvolvePhase::Level0;
        slot.clicks_at_level = 0;
        slot.original_scale = scale;
        slot.scale = scale;
        Ok(true)
    }

    /// Route a pointer press to the slot under it. Returns `true` when a
    /// clickable particle consumed the press; collectibles swallow clicks as
    /// a no-op and report `false`.
    pub fn click_at(
        &mut self,
        stage: &mut Stage,
        tweener: &mut Tweener,
        events: &mut EventBus,
        point: Vec2,
    ) -> Result<bool> {
        let hit = self.slots.iter().position(|s| {
            s.phase != EvolvePhase::Inactive
                && stage
                    .bounds(s.visual)
                    .is_some_and(|b| b.contains(point))
        });
        let Some(idx) = hit else {
            return Ok(false);
        };
        if !self.slots[idx].phase.clickable() {
            return Ok(false);
        }
        self.click(stage, tweener, events, idx)?;
        Ok(true)
    }

    fn click(
        &mut self,
        stage: &mut Stage,
        tweener: &mut Tweener,
        events: &mut EventBus,
        idx: usize,
    ) -> Result<()> {
        // Recovery bounce: snap back toward full size from wherever decay
        // left the sprite. A click mid-recovery simply restarts the bounce.
        let (current, original) = {
            let slot = &self.slots[idx];
            (slot.scale, slot.original_scale)
        };
        self.cancel_slot_tween(tweener, idx, TweenKind::Decay);
        self.cancel_slot_tween(tweener, idx, TweenKind::Recovery);
        let recovery = tweener.schedule(
            Tween::new(current, original, self.recovery_secs).with_easing(Easing::BackOut),
        );
        self.pending.insert(
            recovery,
            EvolveTag {
                slot: idx,
                generation: self.slots[idx].generation,
                kind: TweenKind::Recovery,
            },
        );
        self.slots[idx].recovery = Some(recovery);

        self.slots[idx].clicks_at_level += 1;
        if self.slots[idx].clicks_at_level >= self.clicks_per_level {
            self.slots[idx].clicks_at_level = 0;
            let next = self.slots[idx].phase.next();
            self.slots[idx].phase = next;
            let visual = self.slots[idx].visual;
            if let Some(appearance) = next.appearance_index() {
                stage.set_frame_set(visual, self.level_frame_sets[appearance].clone())?;
            }

            if next == EvolvePhase::Collectible {
                // Terminal: the decay stays cancelled for good, the visual
                // nudges into its display spot, and the consumer takes over
                // its position/animation from here.
                if let Some(v) = stage.get(visual) {
                    let at = v.position + self.collectible_offset;
                    stage.set_position(visual, at)?;
                    events.push(DemoEvent::EggCreated {
                        visual,
                        x: at.x,
                        y: at.y,
                    });
                }
                return Ok(());
            }
        }

        // Still evolving: an unclicked particle must eventually disappear
        self.start_decay(tweener, idx, original);
        Ok(())
    }

    fn start_decay(&mut self, tweener: &mut Tweener, idx: usize, from_scale: f32) {
        let id = tweener.schedule(
            Tween::new(from_scale, 0.0, self.shrink_secs)
                .after(self.pause_secs)
                .with_easing(Easing::QuadIn),
        );
        self.pending.insert(
            id,
            EvolveTag {
                slot: idx,
                generation: self.slots[idx].generation,
                kind: TweenKind::Decay,
            },
        );
        self.slots[idx].decay = Some(id);
    }

    fn cancel_slot_tween(&mut self, tweener: &mut Tweener, idx: usize, kind: TweenKind) {
        let handle = match kind {
            TweenKind::Decay => self.slots[idx].decay.take(),
            TweenKind::Recovery => self.slots[idx].recovery.take(),
        };
        if let Some(id) = handle {
            tweener.cancel(id);
            self.pending.remove(&id);
        }
    }

    /// Apply this tick's drained tween updates, behind the same liveness
    /// guard as the plain landed pool.
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
            if self.disposed || slot.generation != tag.generation || !stage.contains(slot.visual)
            {
                continue;
            }

            slot.scale = update.value;
            stage.set_scale(slot.visual, update.value)?;

            if update.finished {
                match tag.kind {
                    TweenKind::Decay => {
                        // Decayed to nothing: recycle the slot in this step
                        stage.set_visible(slot.visual, false)?;
                        stage.set_anchor(slot.visual, Anchor::CENTER)?;
                        stage.set_scale(slot.visual, 1.0)?;
                        slot.scale = 1.0;
                        slot.phase = EvolvePhase::Inactive;
                        slot.clicks_at_level = 0;
                        slot.decay = None;
                        slot.generation += 1;
                        events.push(DemoEvent::LandedExpired { slot: tag.slot });
                    }
                    TweenKind::Recovery => {
                        slot.recovery = None;
                    }
                }
            }
        }
        Ok(())
    }

    /// Return the slot owning `visual` to the pool. Reattaches the visual
    /// under the manager's container if a consumer had detached it, then
    /// fully resets the slot. This is the only exit for a `Collectible`.
    pub fn release_by_visual(
        &mut self,
        stage: &mut Stage,
        tweener: &mut Tweener,
        visual: VisualId,
    ) -> Result<bool> {
        let Some(idx) = self.slots.iter().position(|s| s.visual == visual) else {
            return Ok(false);
        };
        self.cancel_slot_tween(tweener, idx, TweenKind::Decay);
        self.cancel_slot_tween(tweener, idx, TweenKind::Recovery);

        if stage.contains(visual) {
            if stage.get(visual).and_then(|v| v.parent) != Some(self.container) {
                stage.reparent(visual, Some(self.container))?;
            }
            stage.set_visible(visual, false)?;
            stage.set_anchor(visual, Anchor::CENTER)?;
            stage.set_scale(visual, 1.0)?;
            stage.set_rotation(visual, 0.0)?;
        }

        let slot = &mut self.slots[idx];
        slot.phase = EvolvePhase::Inactive;
        slot.clicks_at_level = 0;
        slot.original_scale = 1.0;
        slot.scale = 1.0;
        slot.generation += 1;
        Ok(true)
    }

    /// Cancel everything and force all slots inactive without completion
    /// events.
    pub fn reset(&mut self, stage: &mut Stage, tweener: &mut Tweener) -> Result<()> {
        for idx in 0..self.slots.len() {
            self.cancel_slot_tween(tweener, idx, TweenKind::Decay);
            self.cancel_slot_tween(tweener, idx, TweenKind::Recovery);
            let slot = &mut self.slots[idx];
            if stage.contains(slot.visual) {
                stage.set_visible(slot.visual, false)?;
                stage.set_anchor(slot.visual, Anchor::CENTER)?;
                stage.set_scale(slot.visual, 1.0)?;
            }
            slot.phase = EvolvePhase::Inactive;
            slot.clicks_at_level = 0;
            slot.scale = 1.0;
            slot.original_scale = 1.0;
            slot.generation += 1;
        }
        self.pending.clear();
        Ok(())
    }

    /// Mark the manager torn down; late updates become no-ops
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    /// Center of the first clickable particle's footprint, if any — an
    /// automation/testing probe mirroring `try_spawn`.
    pub fn clickable_point(&self, stage: &Stage) -> Option<Vec2> {
        self.slots.iter().find_map(|s| {
            if !s.phase.clickable() {
                return None;
            }
            let b = stage.bounds(s.visual)?;
            Some(Vec2::new(b.x + b.width * 0.5, b.y + b.height * 0.5))
        })
    }

    #[cfg(test)]
    pub(crate) fn slot_visual(&self, idx: usize) -> VisualId {
        self.slots[idx].visual
    }

    #[cfg(test)]
    pub(crate) fn slot_phase(&self, idx: usize) -> EvolvePhase {
        self.slots[idx].phase
    }

    #[cfg(test)]
    pub(crate) fn slot_clicks(&self, idx: usize) -> u32 {
        self.slots[idx].clicks_at_level
    }
}
