//! Visual record and construction spec

use crate::id::VisualId;
use ember_core::Vec2;
use serde::{Deserialize, Serialize};

/// Normalized anchor point inside a visual's natural bounds.
///
/// (0, 0) is the top-left corner, (1, 1) the bottom-right. Position, scale,
/// and rotation all apply around this point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    /// The default anchor: the visual's geometric center.
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// One renderable token on the stage.
#[derive(Clone, Debug)]
pub struct Visual {
    /// Name of the frame set (sprite sheet / appearance) this visual shows
    pub frame_set: String,
    /// Anchor-point position in screen pixels
    pub position: Vec2,
    /// Uniform scale factor
    pub scale: f32,
    /// Rotation in radians around the anchor
    pub rotation: f32,
    /// Anchor the transform applies around
    pub anchor: Anchor,
    /// Whether the renderer draws this visual
    pub visible: bool,
    /// Natural (unscaled) pixel size of one frame
    pub size: Vec2,
    /// Optional parent for composed movement
    pub parent: Option<VisualId>,
}

/// Construction parameters for `Stage::create`.
#[derive(Clone, Debug)]
pub struct VisualSpec {
    pub frame_set: String,
    pub size: Vec2,
    pub position: Vec2,
    pub scale: f32,
    pub visible: bool,
    pub parent: Option<VisualId>,
}

impl VisualSpec {
    pub fn new(frame_set: impl Into<String>, size: Vec2) -> Self {
        Self {
            frame_set: frame_set.into(),
            size,
            position: Vec2::ZERO,
            scale: 1.0,
            visible: true,
            parent: None,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn under(mut self, parent: VisualId) -> Self {
        self.parent = Some(parent);
        self
    }
}
