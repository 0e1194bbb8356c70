//! Floor line derivation and crossing detection

use ember_stage::{Stage, VisualId};

/// Derives the floor line from the scene's main subject.
///
/// The line is a function of the subject's *current* bounds plus a tunable
/// offset, re-read on every query — the subject's scale slider can move at
/// runtime and the floor must follow immediately, so nothing is cached.
pub struct FloorProvider {
    subject: VisualId,
    pub offset: f32,
}

impl FloorProvider {
    pub fn new(subject: VisualId, offset: f32) -> Self {
        Self { subject, offset }
    }

    /// Current floor height, or `None` if the subject is gone
    pub fn floor_y(&self, stage: &Stage) -> Option<f32> {
        Some(stage.bounds(self.subject)?.bottom() + self.offset)
    }
}

/// Where and how a particle met the floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub x: f32,
    /// Clamped to the floor line, not the overshot position
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
}

/// Check one visual against the floor line.
///
/// Uses the visual's *bottom edge* under its anchor convention rather than
/// its raw position: the scale is animated every tick, so the effective
/// footprint changes as it flies.
pub fn check_floor(stage: &Stage, visual: VisualId, floor_y: f32) -> Option<Landing> {
    let bounds = stage.bounds(visual)?;
    if bounds.bottom() < floor_y {
        return None;
    }
    let v = stage.get(visual)?;
    Some(Landing {
        x: v.position.x,
        y: floor_y,
        scale: v.scale,
        rotation: v.rotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::Vec2;
    use ember_stage::VisualSpec;

    #[test]
    fn floor_follows_subject_scale() {
        let mut stage = Stage::new();
        let subject = stage.create(
            VisualSpec::new("bonfire", Vec2::new(200.0, 300.0)).at(Vec2::new(400.0, 500.0)),
        );
        let floor = FloorProvider::new(subject, 12.0);

        // Center anchor: bottom = 500 + 150
        assert!((floor.floor_y(&stage).unwrap() - 662.0).abs() < 1e-3);

        // Rescaling the subject moves the line on the very next read
        stage.set_scale(subject, 2.0).unwrap();
        assert!((floor.floor_y(&stage).unwrap() - 812.0).abs() < 1e-3);
    }

    #[test]
    fn floor_none_after_subject_destroyed() {
        let mut stage = Stage::new();
        let subject = stage.create(VisualSpec::new("bonfire", Vec2::new(10.0, 10.0)));
        let floor = FloorProvider::new(subject, 0.0);
        stage.destroy(subject).unwrap();
        assert!(floor.floor_y(&stage).is_none());
    }

    #[test]
    fn crossing_uses_scaled_bottom_edge() {
        let mut stage = Stage::new();
        // Half height 350 px at scale 0.3 puts the bottom 105 px below center
        let visual = stage.create(
            VisualSpec::new("spark", Vec2::new(700.0, 700.0))
                .at(Vec2::new(120.0, 480.0))
                .with_scale(0.3),
        );

        // Bottom edge at 585 — above the 600 floor
        assert!(check_floor(&stage, visual, 600.0).is_none());

        // One tick later the particle has fallen past the line
        stage.set_position(visual, Vec2::new(120.0, 520.0)).unwrap();
        stage.set_rotation(visual, 1.2).unwrap();
        let landing = check_floor(&stage, visual, 600.0).unwrap();
        assert_eq!(
            landing,
            Landing {
                x: 120.0,
                y: 600.0,
                scale: 0.3,
                rotation: 1.2,
            }
        );
    }

    #[test]
    fn crossing_reacts_to_scale_alone() {
        let mut stage = Stage::new();
        let visual = stage.create(
            VisualSpec::new("spark", Vec2::new(100.0, 100.0))
                .at(Vec2::new(0.0, 560.0))
                .with_scale(0.2),
        );
        // Bottom at 570 — clear of the floor
        assert!(check_floor(&stage, visual, 600.0).is_none());
        // The growth ramp alone can push the footprint over the line
        stage.set_scale(visual, 1.0).unwrap();
        assert!(check_floor(&stage, visual, 600.0).is_some());
    }
}
