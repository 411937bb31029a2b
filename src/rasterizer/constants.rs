//! Rasterizer constants
//!
//! Screen resolution, projection scales and view-frustum clip constants.

/// Screen width (authentic PS1 resolution)
pub const WIDTH: usize = 320;

/// Screen height (authentic PS1 resolution)
pub const HEIGHT: usize = 240;

/// Horizontal field-of-view scale, multiplied by the screen height
pub const HFOV: f32 = 0.73;

/// Vertical field-of-view scale, multiplied by the screen height
pub const VFOV: f32 = 0.2;

/// Depth of the near edge of the clip frustum
pub const NEAR_Z: f32 = 1e-4;
/// Depth of the far edge of the clip frustum
pub const FAR_Z: f32 = 5.0;
/// Half-width of the clip frustum at `NEAR_Z`
pub const NEAR_SIDE: f32 = 1e-5;
/// Half-width of the clip frustum at `FAR_Z`
pub const FAR_SIDE: f32 = 20.0;

/// Silhouette bound used for the seed window. Far outside any screen, so
/// the viewer's own sector is never clipped by an inherited silhouette.
pub const OPEN_SILHOUETTE: f32 = 1.0e5;

/// Depth at which the light falloff reaches `MIN_LIGHT`
pub const LIGHT_FALLOFF: f32 = 64.0;

/// Darkest light value written into a compiled corner
pub const MIN_LIGHT: f32 = 0.15;
