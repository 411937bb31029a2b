//! Core types for the reference painter
//!
//! Colors and the texture-id palette. The compiler itself never touches
//! these; they only matter to whoever paints a compiled frame.

use serde::{Serialize, Deserialize};
use crate::world::TextureId;

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    /// Neutral gray, used when a texture id has no palette entry
    pub const NEUTRAL: Color = Color { r: 128, g: 128, b: 128 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
        }
    }

    /// Convert to [u8; 4] for framebuffer (RGBA, always opaque)
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Flat colors indexed by texture id.
///
/// Stands in for texture sampling: every texel of a surface gets the color
/// of its texture id, modulated by the compiled light value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    pub fn color(&self, texture: TextureId) -> Color {
        self.colors
            .get(texture as usize)
            .copied()
            .unwrap_or(Color::NEUTRAL)
    }
}

impl Default for Palette {
    /// Muted PS1-ish set: stone, wood, moss, brick, sky, water, rust, bone
    fn default() -> Self {
        Self::new(vec![
            Color::new(140, 136, 128),
            Color::new(120, 84, 52),
            Color::new(86, 112, 64),
            Color::new(150, 72, 56),
            Color::new(92, 120, 168),
            Color::new(56, 88, 120),
            Color::new(160, 96, 40),
            Color::new(214, 204, 180),
        ])
    }
}
