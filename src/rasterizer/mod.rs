//! PS1-style software painter for compiled portal frames
//!
//! The portal compiler does all visibility work; this module holds the
//! shared math it runs on and a reference painter that turns a compiled
//! frame into pixels.
//!
//! # Module Organization
//!
//! - `math` - Vec2, Vec3, segment intersection, min/max/clamp, overlap tests
//! - `constants` - Screen resolution, FOV scales, clip frustum constants
//! - `camera` - ViewState (yaw + look only)
//! - `types` - Color and the texture-id palette
//! - `render` - Framebuffer and the painter's-algorithm fill

pub mod camera;
pub mod constants;
pub mod math;
pub mod render;
pub mod types;

// =============================================================================
// Convenience re-exports for commonly used items
// =============================================================================

pub use camera::ViewState;
pub use constants::*;
pub use math::{
    Vec2, Vec3, Segment, PARALLEL_EPSILON,
    intersect, min, max, clamp, overlap, point_in_ring,
};
pub use render::{Framebuffer, PaintScratch, paint_frame, paint_frame_parallel};
pub use types::{Color, Palette};
