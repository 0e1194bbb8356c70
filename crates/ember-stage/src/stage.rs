//! Stage - the retained visual store

use crate::id::VisualId;
use crate::visual::{Anchor, Visual, VisualSpec};
use ember_core::{EmberError, Rect, Result, Vec2};
use std::collections::HashMap;

/// The retained store of every visual in a scene.
///
/// Visuals are addressed by stable `VisualId` handles. The store never
/// recycles ids, so `contains` doubles as the liveness probe deferred
/// animation callbacks use before mutating a visual.
pub struct Stage {
    visuals: HashMap<VisualId, Visual>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// Create a new empty stage
    pub fn new() -> Self {
        Self {
            visuals: HashMap::new(),
        }
    }

    /// Create a visual from a spec, returning its handle
    pub fn create(&mut self, spec: VisualSpec) -> VisualId {
        let id = VisualId::new();
        self.visuals.insert(
            id,
            Visual {
                frame_set: spec.frame_set,
                position: spec.position,
                scale: spec.scale,
                rotation: 0.0,
                anchor: Anchor::CENTER,
                visible: spec.visible,
                size: spec.size,
                parent: spec.parent,
            },
        );
        id
    }

    /// Destroy a visual. Its children are reparented to the root.
    pub fn destroy(&mut self, id: VisualId) -> Result<()> {
        if self.visuals.remove(&id).is_none() {
            return Err(EmberError::VisualNotFound(id.to_string()));
        }
        for visual in self.visuals.values_mut() {
            if visual.parent == Some(id) {
                visual.parent = None;
            }
        }
        Ok(())
    }

    /// Whether this handle still refers to a live visual
    pub fn contains(&self, id: VisualId) -> bool {
        self.visuals.contains_key(&id)
    }

    /// Number of live visuals
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Read access to a visual
    pub fn get(&self, id: VisualId) -> Option<&Visual> {
        self.visuals.get(&id)
    }

    fn get_mut(&mut self, id: VisualId) -> Result<&mut Visual> {
        self.visuals
            .get_mut(&id)
            .ok_or_else(|| EmberError::VisualNotFound(id.to_string()))
    }

    pub fn set_position(&mut self, id: VisualId, position: Vec2) -> Result<()> {
        self.get_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_scale(&mut self, id: VisualId, scale: f32) -> Result<()> {
        self.get_mut(id)?.scale = scale;
        Ok(())
    }

    pub fn set_rotation(&mut self, id: VisualId, rotation: f32) -> Result<()> {
        self.get_mut(id)?.rotation = rotation;
        Ok(())
    }

    pub fn set_anchor(&mut self, id: VisualId, anchor: Anchor) -> Result<()> {
        self.get_mut(id)?.anchor = anchor;
        Ok(())
    }

    pub fn set_visible(&mut self, id: VisualId, visible: bool) -> Result<()> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_frame_set(&mut self, id: VisualId, frame_set: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.frame_set = frame_set.into();
        Ok(())
    }

    /// Move a visual under a new parent (or to the root with `None`).
    /// Rejects cycles and unknown handles.
    pub fn reparent(&mut self, child: VisualId, new_parent: Option<VisualId>) -> Result<()> {
        if !self.contains(child) {
            return Err(EmberError::VisualNotFound(child.to_string()));
        }
        if let Some(parent) = new_parent {
            if !self.contains(parent) {
                return Err(EmberError::VisualNotFound(parent.to_string()));
            }
            // Walk up from the proposed parent; hitting `child` means a cycle
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return Err(EmberError::StageError(format!(
                        "reparenting {child} under {parent} would create a cycle"
                    )));
                }
                cursor = self.visuals.get(&current).and_then(|v| v.parent);
            }
        }
        self.get_mut(child)?.parent = new_parent;
        Ok(())
    }

    /// Axis-aligned footprint of a visual at its current scale, honoring
    /// the anchor convention. Returns `None` for dead handles.
    pub fn bounds(&self, id: VisualId) -> Option<Rect> {
        let visual = self.visuals.get(&id)?;
        let w = visual.size.x * visual.scale;
        let h = visual.size.y * visual.scale;
        Some(Rect::new(
            visual.position.x - visual.anchor.x * w,
            visual.position.y - visual.anchor.y * h,
            w,
            h,
        ))
    }
}
