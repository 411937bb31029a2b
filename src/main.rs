//! Portal viewer
//!
//! Walks a sector world with the portal compiler and the reference painter.
//!
//! Usage: `portal-viewer [world.ron] [config.ron]`
//! With no world file, a built-in sample corridor is shown.
//!
//! Controls: W/S or Up/Down move, A/D strafe, Left/Right turn,
//! PageUp/PageDown look, Tab toggles the stats overlay.

use macroquad::prelude::*;
use bonnie_portal::config::{load_config, CompilerConfig};
use bonnie_portal::portal::PortalCompiler;
use bonnie_portal::rasterizer::{
    paint_frame, paint_frame_parallel, Color as RasterColor, Framebuffer, PaintScratch, Palette,
    Vec3, ViewState,
};
use bonnie_portal::world::{load_world, sample_worlds, World};
use bonnie_portal::VERSION;

/// Eye height above the current sector's floor
const EYE_HEIGHT: f32 = 6.0;
/// Map units per second
const MOVE_SPEED: f32 = 12.0;
/// Radians per second
const TURN_SPEED: f32 = 2.2;
const LOOK_SPEED: f32 = 0.6;
const MAX_LOOK: f32 = 0.5;

const SKY: RasterColor = RasterColor::new(24, 20, 32);

fn window_conf() -> Conf {
    Conf {
        window_title: format!("BONNIE-32 Portal Viewer v{}", VERSION),
        window_width: 1280,
        window_height: 960,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// World from the first CLI argument, or the sample corridor
fn load_world_arg() -> World {
    match std::env::args().nth(1) {
        Some(path) => match load_world(&path) {
            Ok(world) => world,
            Err(e) => {
                log::error!("failed to load world {}: {}, using sample corridor", path, e);
                sample_worlds::corridor(12)
            }
        },
        None => sample_worlds::corridor(12),
    }
}

/// Config from the second CLI argument, or defaults
fn load_config_arg() -> CompilerConfig {
    match std::env::args().nth(2) {
        Some(path) => load_config(&path).unwrap_or_else(|e| {
            log::warn!("failed to load config {}: {}, using defaults", path, e);
            CompilerConfig::default()
        }),
        None => CompilerConfig::default(),
    }
}

/// Average of a sector's ring vertices
fn sector_center(world: &World, id: usize) -> (f32, f32) {
    let Some(sector) = world.sector(id) else {
        return (0.0, 0.0);
    };
    let n = sector.edge_count().max(1) as f32;
    let (sx, sy) = sector.vertices[..sector.edge_count()]
        .iter()
        .fold((0.0, 0.0), |(x, y), v| (x + v.pos.x, y + v.pos.y));
    (sx / n, sy / n)
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);
    env_logger::init();

    let world = load_world_arg();
    let config = load_config_arg();
    let mut compiler = match PortalCompiler::new(&world, config) {
        Ok(c) => c,
        Err(e) => {
            log::error!("cannot start portal compiler: {}", e);
            return;
        }
    };

    let (width, height) = (compiler.config().screen_width, compiler.config().screen_height);
    let mut fb = Framebuffer::new(width, height);
    let mut scratch = PaintScratch::new();
    let palette = Palette::default();

    let (start_x, start_y) = sector_center(&world, 0);
    let mut sector = 0;
    let mut angle = 0.0f32;
    let mut look = 0.0f32;
    let mut pos = (start_x, start_y);
    let mut show_stats = true;
    let mut parallel = cfg!(not(target_arch = "wasm32"));

    loop {
        let dt = get_frame_time();

        // Turn and look
        if is_key_down(KeyCode::Left) {
            angle += TURN_SPEED * dt;
        }
        if is_key_down(KeyCode::Right) {
            angle -= TURN_SPEED * dt;
        }
        if is_key_down(KeyCode::PageUp) {
            look = (look + LOOK_SPEED * dt).min(MAX_LOOK);
        }
        if is_key_down(KeyCode::PageDown) {
            look = (look - LOOK_SPEED * dt).max(-MAX_LOOK);
        }
        if is_key_pressed(KeyCode::Tab) {
            show_stats = !show_stats;
        }
        if is_key_pressed(KeyCode::P) {
            parallel = !parallel;
        }

        // Move, refusing steps that leave the world
        let (sin, cos) = angle.sin_cos();
        let mut forward = 0.0;
        let mut strafe = 0.0;
        if is_key_down(KeyCode::W) || is_key_down(KeyCode::Up) {
            forward += 1.0;
        }
        if is_key_down(KeyCode::S) || is_key_down(KeyCode::Down) {
            forward -= 1.0;
        }
        if is_key_down(KeyCode::A) {
            strafe += 1.0;
        }
        if is_key_down(KeyCode::D) {
            strafe -= 1.0;
        }
        if forward != 0.0 || strafe != 0.0 {
            let step = MOVE_SPEED * dt;
            let nx = pos.0 + (cos * forward - sin * strafe) * step;
            let ny = pos.1 + (sin * forward + cos * strafe) * step;
            if let Some(next) = world.track_sector(sector, nx, ny) {
                pos = (nx, ny);
                sector = next;
            }
        }

        let floor = world.sector(sector).map(|s| s.floor).unwrap_or(0.0);
        let view = ViewState::new(Vec3::new(pos.0, pos.1, floor + EYE_HEIGHT), sector, angle)
            .with_look(look);

        let frame = compiler.compile(&view);
        fb.clear(SKY);
        if parallel {
            paint_frame_parallel(&mut fb, &frame, &palette, &mut scratch);
        } else {
            paint_frame(&mut fb, &frame, &palette);
        }
        let stats = *frame.stats();

        clear_background(Color::from_rgba(10, 10, 12, 255));
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);

        // Letterbox to the framebuffer's aspect ratio
        let fb_aspect = fb.width as f32 / fb.height as f32;
        let (sw, sh) = (screen_width(), screen_height());
        let (draw_w, draw_h) = if sw / sh > fb_aspect { (sh * fb_aspect, sh) } else { (sw, sw / fb_aspect) };
        draw_texture_ex(
            &texture,
            (sw - draw_w) * 0.5,
            (sh - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );

        if show_stats {
            let lines = [
                format!("sector {}  fps {}", sector, get_fps()),
                format!(
                    "compiled {}  polygons {}  windows {}/{}",
                    stats.sectors_compiled, stats.polygons_emitted, stats.windows_processed, stats.windows_enqueued
                ),
                format!(
                    "gate skips {}  fallback {}  painter {}",
                    stats.gate_skips,
                    stats.fallback_enqueues,
                    if parallel { "parallel" } else { "serial" }
                ),
            ];
            for (i, line) in lines.iter().enumerate() {
                draw_text(line, 12.0, 24.0 + i as f32 * 20.0, 20.0, WHITE);
            }
            if stats.truncated() {
                draw_text(
                    &format!(
                        "TRUNCATED: {} windows, {} polygons dropped",
                        stats.windows_dropped, stats.polygons_dropped
                    ),
                    12.0,
                    24.0 + lines.len() as f32 * 20.0,
                    20.0,
                    RED,
                );
            }
        }

        next_frame().await;
    }
}
