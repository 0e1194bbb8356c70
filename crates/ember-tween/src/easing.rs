//! Easing curves — pure normalized-time remapping

use serde::{Deserialize, Serialize};

/// Overshoot constant for `BackOut` (the classic Penner value)
const BACK_OVERSHOOT: f32 = 1.70158;

/// How a tween's normalized time maps to its value curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum Easing {
    /// Constant-rate interpolation
    #[default]
    Linear,
    /// Accelerates from rest (t^2)
    QuadIn,
    /// Decelerates to rest
    QuadOut,
    /// Overshoots the target, then settles back — the "recovery bounce"
    BackOut,
}

impl Easing {
    /// Remap a normalized time `t` in [0, 1]. Values outside the range are
    /// clamped before remapping.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::BackOut => {
                let u = t - 1.0;
                u * u * ((BACK_OVERSHOOT + 1.0) * u + BACK_OVERSHOOT) + 1.0
            }
        }
    }
}
