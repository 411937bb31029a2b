//! Polygon arena
//!
//! Pre-sized storage for compiled surfaces. Every compiled-sector record
//! owns a fixed block of polygon slots that is allocated once at setup;
//! each compile rewinds the cursors and overwrites slots in place.
//!
//! Anything read out of the arena is only meaningful until the next
//! compile. The borrow checker enforces that: frames borrow the compiler.

use super::queue::Window;
use crate::world::{SectorId, TextureId};

/// Which surface a compiled quad paints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PolygonKind {
    /// Full-height wall between this sector's ceiling and floor
    #[default]
    Wall,
    /// Strip above a portal where the neighbor's ceiling is lower
    Upper,
    /// Strip below a portal where the neighbor's floor is higher
    Lower,
    Ceiling,
    Floor,
}

/// One corner of a compiled quad
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenCorner {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub light: f32,
}

/// A vertical side of a trapezoid: one screen column with a top and bottom Y
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenEdge {
    pub x: f32,
    pub y_top: f32,
    pub y_bottom: f32,
    pub depth: f32,
    pub light: f32,
}

/// A screen-space surface quad with vertical left and right sides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompiledPolygon {
    pub kind: PolygonKind,
    /// Sector the surface belongs to
    pub sector: SectorId,
    /// Sector behind the portal for upper and lower strips. Ceiling and
    /// floor quads are this sector's own surfaces and always carry `None`.
    pub neighbor: Option<SectorId>,
    pub texture: TextureId,
    /// Corners in order: top-left, top-right, bottom-right, bottom-left
    pub corners: [ScreenCorner; 4],
    /// Texture U at the left and right sides
    pub u0: f32,
    pub u1: f32,
    /// Average corner depth, for callers that want to sort
    pub depth: f32,
}

impl CompiledPolygon {
    /// Write the four corners of the trapezoid spanned by two vertical sides
    pub fn rect(&mut self, left: ScreenEdge, right: ScreenEdge) {
        self.corners = [
            ScreenCorner { x: left.x, y: left.y_top, depth: left.depth, light: left.light },
            ScreenCorner { x: right.x, y: right.y_top, depth: right.depth, light: right.light },
            ScreenCorner { x: right.x, y: right.y_bottom, depth: right.depth, light: right.light },
            ScreenCorner { x: left.x, y: left.y_bottom, depth: left.depth, light: left.light },
        ];
        self.depth = self.corners.iter().map(|c| c.depth).sum::<f32>() * 0.25;
    }

    pub fn left(&self) -> ScreenEdge {
        let [tl, _, _, bl] = self.corners;
        ScreenEdge { x: tl.x, y_top: tl.y, y_bottom: bl.y, depth: tl.depth, light: tl.light }
    }

    pub fn right(&self) -> ScreenEdge {
        let [_, tr, br, _] = self.corners;
        ScreenEdge { x: tr.x, y_top: tr.y, y_bottom: br.y, depth: tr.depth, light: tr.light }
    }
}

/// One sector's polygons from one visit during a compile
#[derive(Debug, Clone)]
pub struct CompiledSector {
    sector: SectorId,
    window: Window,
    polygons: Vec<CompiledPolygon>,
    len: usize,
}

impl CompiledSector {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            sector: 0,
            window: Window::default(),
            polygons: vec![CompiledPolygon::default(); capacity],
            len: 0,
        }
    }

    pub fn sector(&self) -> SectorId {
        self.sector
    }

    /// The window this sector was compiled through
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Polygons in emission order
    pub fn polygons(&self) -> &[CompiledPolygon] {
        &self.polygons[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count(&self, kind: PolygonKind) -> usize {
        self.polygons().iter().filter(|p| p.kind == kind).count()
    }
}

/// Pools of compiled-sector records and their polygon slots
#[derive(Debug)]
pub struct PolygonArena {
    records: Vec<CompiledSector>,
    /// Records bound during the current compile
    bound: usize,
    polygons_per_sector: usize,
    dropped_polygons: u32,
    dropped_records: u32,
}

impl PolygonArena {
    /// Allocate `sector_count * factor` records of `polygons_per_sector` slots
    pub fn new(sector_count: usize, factor: usize, polygons_per_sector: usize) -> Self {
        let records = (0..sector_count * factor)
            .map(|_| CompiledSector::with_capacity(polygons_per_sector))
            .collect();
        Self {
            records,
            bound: 0,
            polygons_per_sector,
            dropped_polygons: 0,
            dropped_records: 0,
        }
    }

    /// Forget everything bound by the previous compile
    pub fn reset(&mut self) {
        self.bound = 0;
        self.dropped_polygons = 0;
        self.dropped_records = 0;
    }

    /// Take the next record for `sector` and rewind its polygon cursor.
    /// Returns false when every record is in use.
    pub fn bind(&mut self, sector: SectorId, window: Window) -> bool {
        let Some(record) = self.records.get_mut(self.bound) else {
            if self.dropped_records == 0 {
                log::error!(
                    "polygon arena out of sector records ({}), dropping sector {}",
                    self.records.len(),
                    sector
                );
            }
            self.dropped_records += 1;
            return false;
        };
        record.sector = sector;
        record.window = window;
        record.len = 0;
        self.bound += 1;
        true
    }

    /// Next free polygon slot of the current record, stamped with its
    /// metadata. Screen x and depth are not set here: the caller writes
    /// them, with the corner Y and light values, through
    /// `CompiledPolygon::rect`. `None` if nothing is bound or the record is
    /// full; running out is a sizing defect and is logged once per compile.
    pub fn acquire(
        &mut self,
        kind: PolygonKind,
        neighbor: Option<SectorId>,
        texture: TextureId,
        u0: f32,
        u1: f32,
    ) -> Option<&mut CompiledPolygon> {
        let capacity = self.polygons_per_sector;
        let record = self.bound.checked_sub(1).and_then(|i| self.records.get_mut(i))?;
        if record.len >= capacity {
            if self.dropped_polygons == 0 {
                log::error!(
                    "sector {} exceeded {} polygons per sector; raise polygons_per_sector",
                    record.sector,
                    capacity
                );
            }
            self.dropped_polygons += 1;
            return None;
        }

        let sector = record.sector;
        let poly = &mut record.polygons[record.len];
        record.len += 1;
        *poly = CompiledPolygon {
            kind,
            sector,
            neighbor,
            texture,
            u0,
            u1,
            ..CompiledPolygon::default()
        };
        Some(poly)
    }

    /// Polygons written since the last `bind`
    pub fn get(&self) -> &[CompiledPolygon] {
        self.bound
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
            .map(|r| r.polygons())
            .unwrap_or(&[])
    }

    /// Records bound during the current compile, in acquisition order
    pub fn sectors(&self) -> &[CompiledSector] {
        &self.records[..self.bound]
    }

    pub fn dropped_polygons(&self) -> u32 {
        self.dropped_polygons
    }

    pub fn dropped_records(&self) -> u32 {
        self.dropped_records
    }

    pub fn record_capacity(&self) -> usize {
        self.records.len()
    }
}
