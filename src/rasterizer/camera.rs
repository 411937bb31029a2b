//! Viewer state for a single compile
//!
//! The portal renderer only supports yaw plus a look/tilt term, so the
//! camera is a position, an angle (stored as sine/cosine) and a tilt.

use super::math::{Vec2, Vec3};
use crate::world::SectorId;

/// Per-frame viewer pose consumed by the portal compiler
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    /// World position (x/y on the map, z = eye height)
    pub position: Vec3,
    /// Sector the viewer currently stands in
    pub sector: SectorId,
    pub angle_sin: f32,
    pub angle_cos: f32,
    /// Vertical look/tilt. 0 = level, positive looks up.
    pub look: f32,
    /// Multiplies both field-of-view scales
    pub zoom: f32,
}

impl ViewState {
    pub fn new(position: Vec3, sector: SectorId, angle: f32) -> Self {
        let (angle_sin, angle_cos) = angle.sin_cos();
        Self {
            position,
            sector,
            angle_sin,
            angle_cos,
            look: 0.0,
            zoom: 1.0,
        }
    }

    pub fn with_look(mut self, look: f32) -> Self {
        self.look = look;
        self
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Transform a map point into view space: `x` is the lateral offset
    /// (positive to the viewer's left), `y` is depth along the view direction.
    pub fn to_view(&self, p: Vec2) -> Vec2 {
        let vx = p.x - self.position.x;
        let vy = p.y - self.position.y;
        Vec2::new(
            vy * self.angle_cos - vx * self.angle_sin,
            vx * self.angle_cos + vy * self.angle_sin,
        )
    }

    /// Height relative to the eye, tilted by the look term at `depth`
    pub fn tilt(&self, height: f32, depth: f32) -> f32 {
        height - self.position.z - depth * self.look
    }
}
