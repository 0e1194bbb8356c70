//! Tween scheduling and per-tick advancement

use crate::easing::Easing;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A stable handle to a scheduled tween.
///
/// Handles are never recycled, so a drained update can always be matched
/// against the owner's bookkeeping without ambiguity.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TweenId(pub u64);

impl TweenId {
    fn new() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TweenId({})", self.0)
    }
}

/// Parameters for one scheduled animation
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    /// Seconds to wait before the value starts moving
    pub delay: f32,
    /// Seconds from first movement to completion
    pub duration: f32,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration,
            easing: Easing::Linear,
        }
    }

    pub fn after(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// One sampled value reported by `Tweener::advance`
#[derive(Debug, Clone, Copy)]
pub struct TweenUpdate {
    pub id: TweenId,
    pub value: f32,
    /// True exactly once, on the update carrying the final value
    pub finished: bool,
}

struct ActiveTween {
    id: TweenId,
    tween: Tween,
    elapsed: f32,
}

/// The scheduler: owns all in-flight tweens and advances them each tick.
///
/// Updates are delivered in scheduling order, pull-style; a cancelled tween
/// reports nothing further, ever.
pub struct Tweener {
    active: Vec<ActiveTween>,
}

impl Default for Tweener {
    fn default() -> Self {
        Self::new()
    }
}

impl Tweener {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Schedule a tween, returning its handle
    pub fn schedule(&mut self, tween: Tween) -> TweenId {
        let id = TweenId::new();
        self.active.push(ActiveTween {
            id,
            tween,
            elapsed: 0.0,
        });
        id
    }

    /// Cancel a tween by handle. Unknown or already-finished handles are a
    /// no-op.
    pub fn cancel(&mut self, id: TweenId) {
        self.active.retain(|t| t.id != id);
    }

    /// Whether a handle refers to a still-scheduled tween
    pub fn is_active(&self, id: TweenId) -> bool {
        self.active.iter().any(|t| t.id == id)
    }

    /// Number of in-flight tweens
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance all tweens by `dt` seconds and collect sampled values.
    ///
    /// Tweens still inside their delay window report nothing. A tween that
    /// crosses its end reports the exact final value with `finished = true`
    /// and is removed. Zero-duration tweens finish on the first advance past
    /// their delay.
    pub fn advance(&mut self, dt: f32) -> Vec<TweenUpdate> {
        let mut updates = Vec::new();

        for entry in &mut self.active {
            entry.elapsed += dt;
            let running = entry.elapsed - entry.tween.delay;
            if running < 0.0 {
                continue;
            }

            let progress = if entry.tween.duration <= 0.0 {
                1.0
            } else {
                (running / entry.tween.duration).min(1.0)
            };
            let finished = progress >= 1.0;
            let eased = entry.tween.easing.apply(progress);
            let value = entry.tween.from + (entry.tween.to - entry.tween.from) * eased;

            updates.push(TweenUpdate {
                id: entry.id,
                // Land exactly on the target, regardless of easing overshoot
                value: if finished { entry.tween.to } else { value },
                finished,
            });
        }

        self.active.retain(|entry| {
            let running = entry.elapsed - entry.tween.delay;
            !(running >= 0.0 && (entry.tween.duration <= 0.0 || running >= entry.tween.duration))
        });

        updates
    }
}
