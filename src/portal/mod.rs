//! Portal visibility compiler
//!
//! Walks the sector graph breadth-first from the viewer's sector, clipping
//! each sector's edges against the screen window it is seen through, and
//! writes screen-space surface quads into a pooled arena.
//!
//! # Lifecycle
//!
//! - `PortalCompiler::new` validates the world, sanitizes the config and sizes
//!   every buffer. This is the only fallible call.
//! - `compile` runs once per frame. It bumps a generation stamp instead of
//!   clearing per-sector state and overwrites arena slots in place, so it
//!   never allocates.
//! - The returned `CompiledFrame` borrows the compiler and is gone before the
//!   next `compile` can run.
//!
//! Sectors come out in acquisition order (nearest first). Painting them in
//! reverse with no depth buffer gives the correct image.

pub mod arena;
pub mod queue;

pub use arena::{CompiledPolygon, CompiledSector, PolygonArena, PolygonKind, ScreenCorner, ScreenEdge};
pub use queue::{RingQueue, Window};

use crate::config::CompilerConfig;
use crate::rasterizer::{
    clamp, intersect, overlap, Segment, Vec2, ViewState, FAR_SIDE, FAR_Z, LIGHT_FALLOFF, MIN_LIGHT,
    NEAR_SIDE, NEAR_Z, OPEN_SILHOUETTE, PARALLEL_EPSILON,
};
use crate::world::{SectorId, TextureId, World, WorldError, validate_world};

/// Why a compiler could not be set up
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid world: {0}")]
    World(#[from] WorldError),

    #[error("screen must be at least 2x2 pixels, got {width}x{height}")]
    InvalidScreen { width: usize, height: usize },

    #[error("world has no sectors")]
    EmptyWorld,
}

/// Counters from one compile. Every truncation the compiler performs shows up
/// here so under-rendering can be told apart from a geometry bug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub compile_id: u32,
    /// Windows popped from the queue
    pub windows_processed: u32,
    /// Windows pushed, including the seed
    pub windows_enqueued: u32,
    /// Windows lost to a full queue
    pub windows_dropped: u32,
    /// Windows skipped by the per-sector visit limit
    pub gate_skips: u32,
    pub sectors_compiled: u32,
    /// Sector visits lost because every arena record was in use
    pub sector_records_dropped: u32,
    pub polygons_emitted: u32,
    /// Polygons lost to a full arena record
    pub polygons_dropped: u32,
    /// Windows pushed by the dead-end fallback
    pub fallback_enqueues: u32,
}

impl CompileStats {
    /// Did this compile lose anything to capacity limits?
    pub fn truncated(&self) -> bool {
        self.windows_dropped > 0 || self.sector_records_dropped > 0 || self.polygons_dropped > 0
    }
}

/// Read-only view of one compile's output
#[derive(Debug, Clone, Copy)]
pub struct CompiledFrame<'a> {
    sectors: &'a [CompiledSector],
    stats: CompileStats,
    max_ceiling_height: f32,
}

impl<'a> CompiledFrame<'a> {
    /// Compiled sectors in acquisition order
    pub fn sectors(&self) -> &'a [CompiledSector] {
        self.sectors
    }

    pub fn iter(&self) -> std::slice::Iter<'a, CompiledSector> {
        self.sectors.iter()
    }

    /// Painting order for a painter's-algorithm rasterizer
    pub fn back_to_front(&self) -> std::iter::Rev<std::slice::Iter<'a, CompiledSector>> {
        self.sectors.iter().rev()
    }

    /// First compiled record of `sector`, if it was reached
    pub fn find(&self, sector: SectorId) -> Option<&'a CompiledSector> {
        self.sectors.iter().find(|s| s.sector() == sector)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn polygon_count(&self) -> usize {
        self.sectors.iter().map(|s| s.len()).sum()
    }

    pub fn stats(&self) -> &CompileStats {
        &self.stats
    }

    /// World-wide ceiling limit, passed through from the config
    pub fn max_ceiling_height(&self) -> f32 {
        self.max_ceiling_height
    }
}

/// Per-sector usage gate. Stale when `compile_id` is not the current one.
#[derive(Debug, Clone, Copy, Default)]
struct VisitStamp {
    compile_id: u32,
    count: u8,
}

/// One screen column at either end of a visible edge span
#[derive(Debug, Clone, Copy)]
struct SpanEnd {
    x: f32,
    depth: f32,
    u: f32,
    light: f32,
    /// Inherited silhouette, clamped to the screen
    top: f32,
    bottom: f32,
    /// This sector's ceiling and floor, clamped into the silhouette
    ceil: f32,
    floor: f32,
}

impl SpanEnd {
    fn edge(&self, y_top: f32, y_bottom: f32) -> ScreenEdge {
        ScreenEdge { x: self.x, y_top, y_bottom, depth: self.depth, light: self.light }
    }
}

pub struct PortalCompiler<'w> {
    world: &'w World,
    config: CompilerConfig,
    queue: RingQueue<Window>,
    visits: Vec<VisitStamp>,
    compile_id: u32,
    arena: PolygonArena,
    stats: CompileStats,
    half_width: f32,
    half_height: f32,
    hfov_scale: f32,
    vfov_scale: f32,
}

impl<'w> PortalCompiler<'w> {
    /// Validate the world and size every buffer the compiler will ever use
    pub fn new(world: &'w World, config: CompilerConfig) -> Result<Self, SetupError> {
        let config = config.sanitized();
        if config.screen_width < 2 || config.screen_height < 2 {
            return Err(SetupError::InvalidScreen {
                width: config.screen_width,
                height: config.screen_height,
            });
        }
        if world.is_empty() {
            return Err(SetupError::EmptyWorld);
        }
        // Worlds can be deserialized without going through World::new
        validate_world(world)?;

        let sector_count = world.sector_count();
        let arena = PolygonArena::new(
            sector_count,
            config.max_sector_visits as usize,
            config.polygons_per_sector,
        );
        log::info!(
            "portal compiler ready: {} sectors, {}x{} screen, queue {}, {} records x {} polygons",
            sector_count,
            config.screen_width,
            config.screen_height,
            config.queue_capacity,
            arena.record_capacity(),
            config.polygons_per_sector
        );

        Ok(Self {
            world,
            queue: RingQueue::new(config.queue_capacity),
            visits: vec![VisitStamp::default(); sector_count],
            compile_id: 0,
            arena,
            stats: CompileStats::default(),
            half_width: config.screen_width as f32 * 0.5,
            half_height: config.screen_height as f32 * 0.5,
            hfov_scale: config.hfov_scale(),
            vfov_scale: config.vfov_scale(),
            config,
        })
    }

    /// The sanitized config actually in use
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile the visible surfaces for one frame
    pub fn compile(&mut self, view: &ViewState) -> CompiledFrame<'_> {
        self.next_generation();
        self.arena.reset();
        self.queue.clear();
        self.stats = CompileStats { compile_id: self.compile_id, ..CompileStats::default() };

        if view.sector < self.world.sector_count() {
            let seed = Window {
                sector: view.sector,
                x1: 0,
                x2: self.config.screen_width as i32 - 1,
                top: [-OPEN_SILHOUETTE; 2],
                bottom: [OPEN_SILHOUETTE; 2],
            };
            self.enqueue(seed);
            self.drain(view);
        } else {
            log::warn!(
                "view sector {} out of range ({} sectors), nothing compiled",
                view.sector,
                self.world.sector_count()
            );
        }

        self.stats.sector_records_dropped = self.arena.dropped_records();
        self.stats.polygons_dropped = self.arena.dropped_polygons();
        log::debug!(
            "compile {}: {} sectors, {} polygons, {} windows dropped, {} polygons dropped",
            self.stats.compile_id,
            self.stats.sectors_compiled,
            self.stats.polygons_emitted,
            self.stats.windows_dropped,
            self.stats.polygons_dropped
        );

        CompiledFrame {
            sectors: self.arena.sectors(),
            stats: self.stats,
            max_ceiling_height: self.config.max_ceiling_height,
        }
    }

    /// Advance the generation stamp. Stale visit counts are ignored rather
    /// than cleared, except once every 2^32 compiles when the id wraps.
    fn next_generation(&mut self) {
        self.compile_id = self.compile_id.wrapping_add(1);
        if self.compile_id == 0 {
            self.visits.fill(VisitStamp::default());
            self.compile_id = 1;
        }
    }

    fn drain(&mut self, view: &ViewState) {
        while let Some(window) = self.queue.pop() {
            self.stats.windows_processed += 1;

            let stamp = &mut self.visits[window.sector];
            if stamp.compile_id != self.compile_id {
                *stamp = VisitStamp { compile_id: self.compile_id, count: 0 };
            }
            if stamp.count >= self.config.max_sector_visits {
                self.stats.gate_skips += 1;
                continue;
            }
            stamp.count += 1;
            let first_visit = stamp.count == 1;

            self.compile_sector(view, &window, first_visit);
        }
    }

    fn enqueue(&mut self, window: Window) {
        if self.queue.push(window) {
            self.stats.windows_enqueued += 1;
        } else {
            self.stats.windows_dropped += 1;
        }
    }

    fn compile_sector(&mut self, view: &ViewState, window: &Window, first_visit: bool) {
        let id = window.sector;
        if !self.arena.bind(id, *window) {
            return;
        }
        self.stats.sectors_compiled += 1;

        let world = self.world;
        let sector = &world.sectors()[id];
        let mut forwarded = 0;
        for edge in 0..sector.edge_count() {
            if self.compile_edge(view, window, id, edge) {
                forwarded += 1;
            }
        }

        // Dead end on the first visit: push every distinct neighbor through
        // the unchanged window so thin or malformed portals still traverse.
        if first_visit && forwarded == 0 {
            for (i, neighbor) in sector.neighbors.iter().enumerate() {
                let Some(n) = *neighbor else {
                    continue;
                };
                if n == id || sector.neighbors[..i].contains(neighbor) {
                    continue;
                }
                self.stats.fallback_enqueues += 1;
                self.enqueue(Window { sector: n, ..*window });
            }
        }
    }

    /// Clip, project and emit one edge. Returns true if a window was sent on
    /// to a neighbor (whether or not the queue had room for it).
    fn compile_edge(&mut self, view: &ViewState, window: &Window, id: SectorId, edge: usize) -> bool {
        let world = self.world;
        let sector = &world.sectors()[id];
        let (a, b) = sector.edge(edge);
        let neighbor = sector.neighbor(edge);

        let mut p1 = view.to_view(a);
        let mut p2 = view.to_view(b);

        if p1.y <= 0.0 && p2.y <= 0.0 {
            // Standing in the portal: hand the whole window through
            return match neighbor {
                Some(n) if n != id => {
                    self.enqueue(Window { sector: n, ..*window });
                    true
                }
                _ => false,
            };
        }

        let length = (b - a).len();
        if length < PARALLEL_EPSILON {
            return false;
        }
        let (mut u0, mut u1) = (0.0, length);

        if p1.y < NEAR_Z || p2.y < NEAR_Z {
            let (o1, o2) = (p1, p2);
            let line = Segment::new(o1, o2);
            let hits = [
                intersect(line, Segment::from_coords(-NEAR_SIDE, NEAR_Z, -FAR_SIDE, FAR_Z)),
                intersect(line, Segment::from_coords(NEAR_SIDE, NEAR_Z, FAR_SIDE, FAR_Z)),
            ];
            if p1.y < NEAR_Z {
                match entry_point(o1, &hits) {
                    Some(p) => p1 = p,
                    None => return false,
                }
            }
            if p2.y < NEAR_Z {
                match entry_point(o2, &hits) {
                    Some(p) => p2 = p,
                    None => return false,
                }
            }

            // Interpolate U along the longer axis of the unclipped edge
            let span = o2 - o1;
            let along = |p: Vec2| {
                if span.x.abs() > span.y.abs() {
                    (p.x - o1.x) / span.x
                } else {
                    (p.y - o1.y) / span.y
                }
            };
            u0 = along(p1) * length;
            u1 = along(p2) * length;
        }
        if p1.y <= 0.0 || p2.y <= 0.0 {
            return false;
        }

        let hscale = self.hfov_scale * view.zoom;
        let sx1 = self.half_width - p1.x * hscale / p1.y;
        let sx2 = self.half_width - p2.x * hscale / p2.y;
        // Back-facing, edge-on, or non-finite
        if !(sx1 < sx2) {
            return false;
        }
        if !overlap(sx1, sx2, window.x1 as f32, window.x2 as f32) {
            return false;
        }
        let begin = (sx1.ceil() as i32).max(window.x1);
        let end = (sx2.floor() as i32).min(window.x2);
        if begin > end {
            return false;
        }

        let screen_bottom = self.config.screen_height as f32 - 1.0;
        let vscale = self.vfov_scale * view.zoom;
        let half_height = self.half_height;
        let project = |height: f32, depth: f32| half_height - view.tilt(height, depth) * vscale / depth;

        let span_end = |column: i32| {
            let x = column as f32;
            let t = (x - sx1) / (sx2 - sx1);
            let inv_z = (1.0 - t) / p1.y + t / p2.y;
            let depth = 1.0 / inv_z;
            let u = ((1.0 - t) * u0 / p1.y + t * u1 / p2.y) * depth;
            let top = clamp(window.top_at(column), 0.0, screen_bottom);
            let bottom = clamp(window.bottom_at(column), top, screen_bottom);
            SpanEnd {
                x,
                depth,
                u,
                light: light_at(sector.ambient, depth),
                top,
                bottom,
                ceil: clamp(project(sector.ceil, depth), top, bottom),
                floor: clamp(project(sector.floor, depth), top, bottom),
            }
        };
        let l = span_end(begin);
        let r = span_end(end);

        let textures = sector.textures;
        self.emit(PolygonKind::Ceiling, None, textures.ceiling, l.edge(l.top, l.ceil), r.edge(r.top, r.ceil), (l.u, r.u));
        self.emit(PolygonKind::Floor, None, textures.floor, l.edge(l.floor, l.bottom), r.edge(r.floor, r.bottom), (l.u, r.u));

        let Some(n) = neighbor else {
            self.emit(PolygonKind::Wall, None, textures.wall, l.edge(l.ceil, l.floor), r.edge(r.ceil, r.floor), (l.u, r.u));
            return false;
        };

        let next = &world.sectors()[n];
        // Neighbor's heights, clamped into this sector's opening
        let opening = |e: &SpanEnd| {
            (
                clamp(project(next.ceil, e.depth), e.ceil, e.floor),
                clamp(project(next.floor, e.depth), e.ceil, e.floor),
            )
        };
        let (l_ceil, l_floor) = opening(&l);
        let (r_ceil, r_floor) = opening(&r);

        if next.ceil < sector.ceil {
            self.emit(PolygonKind::Upper, Some(n), textures.upper, l.edge(l.ceil, l_ceil), r.edge(r.ceil, r_ceil), (l.u, r.u));
        }
        if next.floor > sector.floor {
            self.emit(PolygonKind::Lower, Some(n), textures.lower, l.edge(l_floor, l.floor), r.edge(r_floor, r.floor), (l.u, r.u));
        }

        if n == id {
            return false;
        }
        self.enqueue(Window {
            sector: n,
            x1: begin,
            x2: end,
            top: [l_ceil, r_ceil],
            bottom: [l_floor, r_floor],
        });
        true
    }

    /// Acquire a slot and write the trapezoid between two vertical sides
    fn emit(
        &mut self,
        kind: PolygonKind,
        neighbor: Option<SectorId>,
        texture: TextureId,
        left: ScreenEdge,
        right: ScreenEdge,
        (u0, u1): (f32, f32),
    ) {
        if let Some(poly) = self.arena.acquire(kind, neighbor, texture, u0, u1) {
            poly.rect(left, right);
            self.stats.polygons_emitted += 1;
        }
    }
}

/// Of the frustum-side hits with a forward depth, the one nearest the
/// endpoint being replaced.
fn entry_point(from: Vec2, hits: &[Option<Vec2>; 2]) -> Option<Vec2> {
    hits.iter()
        .flatten()
        .filter(|p| p.y > 0.0)
        .copied()
        .min_by(|p, q| (*p - from).len().total_cmp(&(*q - from).len()))
}

/// Sector ambient scaled by a linear depth falloff
fn light_at(ambient: f32, depth: f32) -> f32 {
    ambient * clamp(1.0 - depth / LIGHT_FALLOFF, MIN_LIGHT, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Vec3;
    use crate::world::sample_worlds::{self, EDGE_WEST};
    use std::f32::consts::{FRAC_PI_4, PI};

    fn compiler(world: &World) -> PortalCompiler<'_> {
        PortalCompiler::new(world, CompilerConfig::default()).unwrap()
    }

    fn view(x: f32, y: f32, z: f32, sector: SectorId, angle: f32) -> ViewState {
        ViewState::new(Vec3::new(x, y, z), sector, angle)
    }

    fn polygon_bits(frame: &CompiledFrame) -> Vec<u32> {
        frame
            .iter()
            .flat_map(|s| s.polygons().iter())
            .flat_map(|p| {
                p.corners
                    .iter()
                    .flat_map(|c| [c.x, c.y, c.depth, c.light])
                    .chain([p.u0, p.u1, p.depth])
                    .map(f32::to_bits)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_closed_room_facing_wall() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(0.0, 0.0, 6.0, 0, 0.0));

        assert_eq!(frame.len(), 1);
        let room = &frame.sectors()[0];
        assert_eq!(room.count(PolygonKind::Ceiling), 1);
        assert_eq!(room.count(PolygonKind::Floor), 1);
        assert_eq!(room.count(PolygonKind::Wall), 1);
        assert_eq!(room.count(PolygonKind::Upper), 0);
        assert_eq!(room.count(PolygonKind::Lower), 0);
        assert_eq!(frame.stats().windows_enqueued, 1);
    }

    #[test]
    fn test_closed_room_facing_corner() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(0.0, 0.0, 6.0, 0, FRAC_PI_4));

        assert_eq!(frame.len(), 1);
        let room = &frame.sectors()[0];
        assert_eq!(room.count(PolygonKind::Wall), 2);
        assert_eq!(room.count(PolygonKind::Ceiling), 2);
        assert_eq!(room.count(PolygonKind::Floor), 2);
        assert_eq!(room.count(PolygonKind::Upper) + room.count(PolygonKind::Lower), 0);
    }

    #[test]
    fn test_unit_square_room() {
        // A unit room seen from its center on a 64 px screen. Only the walls
        // in front of the viewer survive: an edge with both ends behind the
        // viewer is culled before projection, and the ~84 degree field of
        // view never reaches a third side of a square. So a closed room gives
        // one ceiling, floor and wall per visible edge, never four walls.
        let world = sample_worlds::single_room(1.0);
        let config = CompilerConfig::default().with_screen(64, 48);
        let mut c = PortalCompiler::new(&world, config).unwrap();

        let frame = c.compile(&view(0.0, 0.0, 6.0, 0, 0.0));
        assert_eq!(frame.len(), 1);
        let room = &frame.sectors()[0];
        assert_eq!(room.count(PolygonKind::Ceiling), 1);
        assert_eq!(room.count(PolygonKind::Floor), 1);
        assert_eq!(room.count(PolygonKind::Wall), 1);
        assert_eq!(room.len(), 3);
        assert_eq!(frame.stats().windows_enqueued, 1);

        let frame = c.compile(&view(0.0, 0.0, 6.0, 0, FRAC_PI_4));
        let room = &frame.sectors()[0];
        assert_eq!(room.count(PolygonKind::Wall), 2);
        assert_eq!(room.len(), 6);

        for step in 0..32 {
            let angle = step as f32 * PI / 16.0;
            let frame = c.compile(&view(0.0, 0.0, 6.0, 0, angle));
            assert_eq!(frame.len(), 1);
            let room = &frame.sectors()[0];
            let walls = room.count(PolygonKind::Wall);
            assert!((1..=2).contains(&walls), "angle {}: {} walls", angle, walls);
            assert_eq!(room.count(PolygonKind::Ceiling), walls);
            assert_eq!(room.count(PolygonKind::Floor), walls);
            assert_eq!(room.count(PolygonKind::Upper) + room.count(PolygonKind::Lower), 0);
        }
    }

    #[test]
    fn test_wall_spans_screen_in_order() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(0.0, 0.0, 6.0, 0, 0.0));

        let wall = frame.sectors()[0]
            .polygons()
            .iter()
            .find(|p| p.kind == PolygonKind::Wall)
            .unwrap();
        assert_eq!(wall.left().x, 0.0);
        assert_eq!(wall.right().x, 319.0);
        assert!(wall.left().y_top <= wall.left().y_bottom);
        assert!(wall.u0 < wall.u1);
        // Facing the wall head on: constant depth
        assert!((wall.left().depth - 4.0).abs() < 0.01);
        assert!((wall.right().depth - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_zoom_scales_projection() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let far_wall = |frame: &CompiledFrame| {
            frame.sectors()[0]
                .polygons()
                .iter()
                .find(|p| {
                    p.kind == PolygonKind::Wall
                        && (p.left().depth - 7.0).abs() < 0.01
                        && (p.right().depth - 7.0).abs() < 0.01
                })
                .map(|p| p.right().x - p.left().x)
        };

        let v = view(-3.0, 0.0, 6.0, 0, 0.0);
        let normal = far_wall(&c.compile(&v)).unwrap();
        let zoomed_out = far_wall(&c.compile(&v.with_zoom(0.5))).unwrap();
        assert_eq!(normal, 200.0);
        assert_eq!(zoomed_out, 100.0);
    }

    #[test]
    fn test_lip_emits_one_upper_and_enqueues_neighbor() {
        let world = sample_worlds::two_rooms_lip(15.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(4.0, 0.0, 6.0, 0, 0.0));

        let a = frame.find(0).unwrap();
        assert_eq!(a.count(PolygonKind::Upper), 1);
        assert_eq!(a.count(PolygonKind::Lower), 0);
        let upper = a.polygons().iter().find(|p| p.kind == PolygonKind::Upper).unwrap();
        assert_eq!(upper.neighbor, Some(1));
        // Ceiling and floor quads belong to A itself
        assert!(a
            .polygons()
            .iter()
            .filter(|p| matches!(p.kind, PolygonKind::Ceiling | PolygonKind::Floor))
            .all(|p| p.neighbor.is_none()));
        assert!(upper.left().y_bottom > upper.left().y_top);

        assert!(frame.find(1).is_some());
    }

    #[test]
    fn test_step_emits_one_lower_matching_neighbor_window() {
        let world = sample_worlds::two_rooms_step(2.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(4.0, 0.0, 6.0, 0, 0.0));

        let a = frame.find(0).unwrap();
        assert_eq!(a.count(PolygonKind::Lower), 1);
        assert_eq!(a.count(PolygonKind::Upper), 0);
        let lower = a.polygons().iter().find(|p| p.kind == PolygonKind::Lower).unwrap();

        let b = frame.find(1).unwrap();
        let w = b.window();
        assert_eq!(w.x1 as f32, lower.left().x);
        assert_eq!(w.x2 as f32, lower.right().x);
        // Neighbor sees the opening above the step
        assert_eq!(w.bottom[0], lower.left().y_top);
        assert_eq!(w.bottom[1], lower.right().y_top);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let world = sample_worlds::corridor(6);
        let mut c = compiler(&world);
        let v = view(4.0, 0.5, 8.0, 0, 0.1).with_look(0.05);

        let first = polygon_bits(&c.compile(&v));
        let second = polygon_bits(&c.compile(&v));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_portal_cycle_terminates_within_visit_limit() {
        let world = sample_worlds::portal_cycle();
        let mut c = compiler(&world);
        let limit = c.config().max_sector_visits as usize;
        let frame = c.compile(&view(4.0, 4.0, 6.0, 0, FRAC_PI_4));

        for id in 0..world.sector_count() {
            let visits = frame.iter().filter(|s| s.sector() == id).count();
            assert!(visits <= limit, "sector {} compiled {} times", id, visits);
        }
        let stats = frame.stats();
        assert_eq!(stats.windows_processed, stats.windows_enqueued);
        assert_eq!(stats.windows_processed, stats.sectors_compiled + stats.gate_skips);
    }

    #[test]
    fn test_single_visit_limit() {
        let world = sample_worlds::portal_cycle();
        let mut config = CompilerConfig::default();
        config.max_sector_visits = 1;
        let mut c = PortalCompiler::new(&world, config).unwrap();
        let frame = c.compile(&view(4.0, 4.0, 6.0, 0, FRAC_PI_4));

        for id in 0..world.sector_count() {
            assert!(frame.iter().filter(|s| s.sector() == id).count() <= 1);
        }
        assert!(frame.stats().gate_skips > 0);
    }

    #[test]
    fn test_edge_behind_viewer_emits_nothing() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let v = view(0.0, 0.0, 6.0, 0, 0.0);
        let window = Window { sector: 0, x1: 0, x2: 319, top: [0.0; 2], bottom: [239.0; 2] };

        c.arena.bind(0, window);
        assert!(!c.compile_edge(&v, &window, 0, EDGE_WEST));
        assert!(c.arena.get().is_empty());
        assert!(c.queue.is_empty());
    }

    #[test]
    fn test_portal_behind_viewer_passes_window_through() {
        let world = sample_worlds::two_rooms_step(2.0);
        let mut c = compiler(&world);
        // In room A, facing away from the portal to B
        let frame = c.compile(&view(4.0, 0.0, 6.0, 0, PI));

        let b = frame.find(1).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.window().x1, 0);
        assert_eq!(b.window().x2, 319);
        assert_eq!(b.window().top, [-OPEN_SILHOUETTE; 2]);
    }

    #[test]
    fn test_dead_end_fallback_reenqueues_neighbors() {
        // B's only portal faces away from the viewer, so B forwards nothing
        // on its first visit and pushes A back through its own window.
        let world = sample_worlds::two_rooms_step(2.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(4.0, 0.0, 6.0, 0, 0.0));

        let stats = *frame.stats();
        assert_eq!(stats.fallback_enqueues, 1);
        let order: Vec<SectorId> = frame.iter().map(|s| s.sector()).collect();
        assert_eq!(order, vec![0, 1, 0, 1]);
        assert_eq!(stats.gate_skips, 0);
    }

    #[test]
    fn test_full_queue_drops_are_counted() {
        let world = sample_worlds::portal_cycle();
        let config = CompilerConfig::default().with_queue_capacity(2);
        let mut c = PortalCompiler::new(&world, config).unwrap();
        let frame = c.compile(&view(4.0, 4.0, 6.0, 0, FRAC_PI_4));

        assert!(frame.stats().windows_dropped > 0);
        assert!(frame.stats().truncated());
    }

    #[test]
    fn test_full_arena_drops_are_counted() {
        let world = sample_worlds::single_room(8.0);
        let mut config = CompilerConfig::default();
        config.polygons_per_sector = 2;
        let mut c = PortalCompiler::new(&world, config).unwrap();
        let frame = c.compile(&view(0.0, 0.0, 6.0, 0, 0.0));

        assert_eq!(frame.sectors()[0].len(), 2);
        assert_eq!(frame.stats().polygons_dropped, 1);
        assert_eq!(frame.stats().polygons_emitted, 2);
    }

    #[test]
    fn test_non_power_of_two_queue_falls_back() {
        let world = sample_worlds::single_room(8.0);
        let config = CompilerConfig::default().with_queue_capacity(100);
        let c = PortalCompiler::new(&world, config).unwrap();
        assert_eq!(c.config().queue_capacity, crate::config::DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_out_of_range_view_sector() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let frame = c.compile(&view(0.0, 0.0, 6.0, 99, 0.0));
        assert!(frame.is_empty());
        assert_eq!(frame.stats().windows_processed, 0);
    }

    #[test]
    fn test_setup_errors() {
        let world = sample_worlds::single_room(8.0);
        let tiny = CompilerConfig::default().with_screen(1, 240);
        assert!(matches!(
            PortalCompiler::new(&world, tiny),
            Err(SetupError::InvalidScreen { width: 1, height: 240 })
        ));

        let empty = World::default();
        assert!(matches!(
            PortalCompiler::new(&empty, CompilerConfig::default()),
            Err(SetupError::EmptyWorld)
        ));
    }

    #[test]
    fn test_generation_stamp_advances_and_wraps() {
        let world = sample_worlds::single_room(8.0);
        let mut c = compiler(&world);
        let v = view(0.0, 0.0, 6.0, 0, 0.0);
        assert_eq!(c.compile(&v).stats().compile_id, 1);
        assert_eq!(c.compile(&v).stats().compile_id, 2);

        c.compile_id = u32::MAX;
        let frame = c.compile(&v);
        assert_eq!(frame.stats().compile_id, 1);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_stats_match_frame() {
        let world = sample_worlds::corridor(8);
        let mut c = compiler(&world);
        let frame = c.compile(&view(2.0, 0.0, 8.0, 0, 0.0));

        assert_eq!(frame.stats().polygons_emitted as usize, frame.polygon_count());
        assert_eq!(frame.stats().sectors_compiled as usize, frame.len());
        assert!(frame.len() > 1);
        assert_eq!(frame.back_to_front().next().map(|s| s.sector()), frame.sectors().last().map(|s| s.sector()));
    }

    #[test]
    fn test_light_falls_off_with_depth() {
        assert_eq!(light_at(1.0, 0.0), 1.0);
        assert!(light_at(1.0, 32.0) < light_at(1.0, 8.0));
        assert_eq!(light_at(1.0, 1000.0), MIN_LIGHT);
        assert!((light_at(0.5, 0.0) - 0.5).abs() < 0.001);
    }
}
