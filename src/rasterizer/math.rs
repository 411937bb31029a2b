//! Geometry utilities for the portal compiler
//!
//! Small, stateless helpers: 2D/3D vectors, line intersection, scalar
//! min/max/clamp and range overlap tests.

use std::ops::Sub;
use serde::{Serialize, Deserialize};

/// Determinant magnitude below which two lines are treated as parallel
pub const PARALLEL_EPSILON: f32 = 1e-9;

/// 3D Vector (world position: x/y on the map plane, z up)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 2D Vector (map-plane points, view-space `(x, depth)` pairs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross)
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(Vec2::new(x1, y1), Vec2::new(x2, y2))
    }
}

/// Intersection of the infinite lines through two segments.
///
/// Returns `None` when the determinant is ~0 (parallel or degenerate lines).
/// Callers treat that as "no clip boundary here", never as an error.
pub fn intersect(a: Segment, b: Segment) -> Option<Vec2> {
    let da = a.b - a.a;
    let db = b.b - b.a;
    let det = da.cross(db);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let ca = a.a.cross(a.b);
    let cb = b.a.cross(b.b);
    let x = (da.x * cb - ca * db.x) / det;
    let y = (da.y * cb - ca * db.y) / det;

    let p = Vec2::new(x, y);
    if p.is_finite() { Some(p) } else { None }
}

#[inline]
pub fn min(a: f32, b: f32) -> f32 {
    if a < b { a } else { b }
}

#[inline]
pub fn max(a: f32, b: f32) -> f32 {
    if a > b { a } else { b }
}

/// Clamp `v` into `[lo, hi]`. Unlike `f32::clamp` this never panics when
/// `lo > hi`; the lower bound wins.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    max(lo, min(v, hi))
}

/// Do the closed ranges `[a0, a1]` and `[b0, b1]` overlap? Endpoints may be
/// given in either order.
pub fn overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> bool {
    min(a0, a1) <= max(b0, b1) && min(b0, b1) <= max(a0, a1)
}

/// Even-odd point-in-polygon test over a closed ring (`ring[n] == ring[0]`)
pub fn point_in_ring<I: IntoIterator<Item = Vec2>>(p: Vec2, ring: I) -> bool {
    let mut points = ring.into_iter();
    let Some(mut a) = points.next() else {
        return false;
    };
    let mut inside = false;
    for b in points {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        a = b;
    }
    inside
}
