//! Reference painter for compiled portal frames
//!
//! Fills each compiled trapezoid column by column with a flat palette color
//! shaded by the interpolated corner light. There is no depth buffer: sectors
//! are painted back to front and later writes win.

use rayon::prelude::*;
use crate::portal::{CompiledFrame, CompiledPolygon, CompiledSector};
use super::types::{Color, Palette};

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height * 4];
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    /// RGBA bytes at `(x, y)`, or `None` outside the buffer
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    /// Fill rows `y0..=y1` of column `x`. Both rows must be in range.
    fn fill_column(&mut self, x: usize, y0: usize, y1: usize, color: Color) {
        let bytes = color.to_bytes();
        for y in y0..=y1 {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&bytes);
        }
    }
}

/// One filled column run produced by a paint worker
#[derive(Debug, Clone, Copy)]
struct Span {
    x: usize,
    y0: usize,
    y1: usize,
    color: Color,
}

/// Per-sector span buffers for `paint_frame_parallel`. Keep one around
/// between frames so workers reuse their allocations.
#[derive(Debug, Default)]
pub struct PaintScratch {
    spans: Vec<Vec<Span>>,
}

impl PaintScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Walk the screen columns covered by `poly`, calling `span` with each
/// clipped `(x, y0, y1, color)` run.
fn rasterize_polygon<F>(poly: &CompiledPolygon, palette: &Palette, width: usize, height: usize, mut span: F)
where
    F: FnMut(usize, usize, usize, Color),
{
    if width == 0 || height == 0 {
        return;
    }
    let left = poly.left();
    let right = poly.right();
    let base = palette.color(poly.texture);

    let x_start = left.x.ceil().max(0.0);
    let x_end = right.x.floor().min(width as f32 - 1.0);
    if !(x_start <= x_end) {
        return;
    }
    let dx = right.x - left.x;
    let max_row = height as f32 - 1.0;

    for x in x_start as usize..=x_end as usize {
        let t = if dx > 0.0 { (x as f32 - left.x) / dx } else { 0.0 };
        let y_top = lerp(left.y_top, right.y_top, t).ceil().max(0.0);
        let y_bottom = lerp(left.y_bottom, right.y_bottom, t).floor().min(max_row);
        if !(y_top <= y_bottom) {
            continue;
        }
        let light = lerp(left.light, right.light, t);
        span(x, y_top as usize, y_bottom as usize, base.shade(light));
    }
}

fn paint_sector(fb: &mut Framebuffer, sector: &CompiledSector, palette: &Palette) {
    let (width, height) = (fb.width, fb.height);
    for poly in sector.polygons() {
        rasterize_polygon(poly, palette, width, height, |x, y0, y1, color| {
            fb.fill_column(x, y0, y1, color);
        });
    }
}

/// Paint a compiled frame back to front. Does not clear first.
pub fn paint_frame(fb: &mut Framebuffer, frame: &CompiledFrame, palette: &Palette) {
    for sector in frame.back_to_front() {
        paint_sector(fb, sector, palette);
    }
}

/// Same image as `paint_frame`, with one rayon task per compiled sector.
///
/// Workers only read the frame and write their own span buffer; the spans
/// are then composited back to front on the calling thread.
pub fn paint_frame_parallel(
    fb: &mut Framebuffer,
    frame: &CompiledFrame,
    palette: &Palette,
    scratch: &mut PaintScratch,
) {
    let sectors = frame.sectors();
    if scratch.spans.len() < sectors.len() {
        scratch.spans.resize_with(sectors.len(), Vec::new);
    }
    let (width, height) = (fb.width, fb.height);

    scratch.spans[..sectors.len()]
        .par_iter_mut()
        .zip(sectors.par_iter())
        .for_each(|(spans, sector)| {
            spans.clear();
            for poly in sector.polygons() {
                rasterize_polygon(poly, palette, width, height, |x, y0, y1, color| {
                    spans.push(Span { x, y0, y1, color });
                });
            }
        });

    for spans in scratch.spans[..sectors.len()].iter().rev() {
        for s in spans {
            fb.fill_column(s.x, s.y0, s.y1, s.color);
        }
    }
}
