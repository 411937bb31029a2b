//! Core geometry types for sector worlds
//!
//! A world is a flat list of sectors. Each sector is a closed polygon on the
//! map plane with a flat floor and ceiling. Edges either carry a wall or are
//! void, and void edges may open onto a neighbor sector (a portal).
//!
//! Rings are wound clockwise (with +Y up on the map), so the sector interior
//! lies to the right of every edge `ring[i] -> ring[i + 1]`.

use serde::{Serialize, Deserialize};
use crate::rasterizer::{Vec2, point_in_ring};
use super::level::{validate_world, WorldError};

/// Index of a sector within its world
pub type SectorId = usize;

/// Texture identifier, resolved by whoever paints the compiled frame
pub type TextureId = u16;

/// What the edge starting at a vertex is made of
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Solid wall surface
    #[default]
    Wall,
    /// No wall surface; may open onto a neighbor sector
    Void,
}

/// A ring vertex. Its `kind` describes the edge from this vertex to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: Vec2,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Vertex {
    pub fn wall(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), kind: EdgeKind::Wall }
    }

    pub fn is_void(&self) -> bool {
        self.kind == EdgeKind::Void
    }
}

/// Texture ids for each surface a sector can produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceTextures {
    pub floor: TextureId,
    pub ceiling: TextureId,
    pub wall: TextureId,
    /// Step strip above a portal (neighbor ceiling is lower)
    pub upper: TextureId,
    /// Step strip below a portal (neighbor floor is higher)
    pub lower: TextureId,
}

fn default_ambient() -> f32 {
    1.0
}

/// A sector: closed vertex ring plus flat floor/ceiling heights.
///
/// `vertices` holds N + 1 entries with `vertices[N] == vertices[0]`.
/// `neighbors` holds N entries; `neighbors[i]` is the sector behind the edge
/// `vertices[i] -> vertices[i + 1]`, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub vertices: Vec<Vertex>,
    pub neighbors: Vec<Option<SectorId>>,
    pub floor: f32,
    pub ceil: f32,
    #[serde(default)]
    pub textures: SurfaceTextures,
    /// Ambient light level (0.0 = dark, 1.0 = bright)
    #[serde(default = "default_ambient")]
    pub ambient: f32,
    /// Free-form tag for game logic (triggers, doors, ...)
    #[serde(default)]
    pub tag: String,
}

impl Sector {
    /// Build a sector from an open list of points. The ring is closed
    /// automatically and every edge starts out as a solid wall.
    pub fn new(points: &[(f32, f32)], floor: f32, ceil: f32) -> Self {
        let mut vertices: Vec<Vertex> = points.iter().map(|&(x, y)| Vertex::wall(x, y)).collect();
        if let Some(&first) = vertices.first() {
            vertices.push(first);
        }
        let neighbors = vec![None; points.len()];
        Self {
            vertices,
            neighbors,
            floor,
            ceil,
            textures: SurfaceTextures::default(),
            ambient: default_ambient(),
            tag: String::new(),
        }
    }

    /// Turn edge `edge` into a portal onto `neighbor`
    pub fn with_portal(mut self, edge: usize, neighbor: SectorId) -> Self {
        self.set_portal(edge, neighbor);
        self
    }

    pub fn with_textures(mut self, textures: SurfaceTextures) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Mark edge `edge` as void and link it to `neighbor`.
    /// Out-of-range edges are ignored; validation catches the rest.
    pub fn set_portal(&mut self, edge: usize, neighbor: SectorId) {
        if edge >= self.neighbors.len() {
            return;
        }
        self.neighbors[edge] = Some(neighbor);
        self.vertices[edge].kind = EdgeKind::Void;
        // Keep the closing duplicate in sync with the first vertex
        if edge == 0 {
            if let Some(last) = self.vertices.last_mut() {
                last.kind = EdgeKind::Void;
            }
        }
    }

    /// Number of boundary edges (ring length minus the closing duplicate)
    pub fn edge_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Endpoints of edge `i`
    pub fn edge(&self, i: usize) -> (Vec2, Vec2) {
        (self.vertices[i].pos, self.vertices[i + 1].pos)
    }

    /// Neighbor behind edge `i`, if the edge is a portal
    pub fn neighbor(&self, i: usize) -> Option<SectorId> {
        self.neighbors.get(i).copied().flatten()
    }

    /// Twice the signed ring area. Negative for clockwise rings.
    pub fn signed_area2(&self) -> f32 {
        self.vertices
            .windows(2)
            .map(|pair| pair[0].pos.cross(pair[1].pos))
            .sum()
    }

    /// Is `p` inside this sector's ring?
    pub fn contains(&self, p: Vec2) -> bool {
        point_in_ring(p, self.vertices.iter().map(|v| v.pos))
    }
}

/// The immutable sector graph a compiler walks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    sectors: Vec<Sector>,
}

impl World {
    /// Validate and wrap a sector list. Malformed data (unclosed rings,
    /// dangling neighbor references, mismatched neighbor arrays) is rejected
    /// here so that compiling never has to check it.
    pub fn new(sectors: Vec<Sector>) -> Result<Self, WorldError> {
        let world = Self { sectors };
        validate_world(&world)?;
        Ok(world)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id)
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Find the sector containing a map point
    pub fn sector_at(&self, x: f32, y: f32) -> Option<SectorId> {
        let p = Vec2::new(x, y);
        self.sectors.iter().position(|s| s.contains(p))
    }

    /// Re-locate a viewer that moved from `hint`. Checks `hint` and its
    /// neighbors before falling back to a full scan.
    pub fn track_sector(&self, hint: SectorId, x: f32, y: f32) -> Option<SectorId> {
        let p = Vec2::new(x, y);
        let current = self.sectors.get(hint)?;
        if current.contains(p) {
            return Some(hint);
        }
        current
            .neighbors
            .iter()
            .flatten()
            .copied()
            .find(|&n| self.sectors.get(n).map(|s| s.contains(p)).unwrap_or(false))
            .or_else(|| self.sector_at(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f32, y0: f32, size: f32) -> Sector {
        // Clockwise with +Y up
        Sector::new(
            &[(x0, y0), (x0, y0 + size), (x0 + size, y0 + size), (x0 + size, y0)],
            0.0,
            20.0,
        )
    }

    #[test]
    fn test_new_sector_closes_ring() {
        let s = square(0.0, 0.0, 4.0);
        assert_eq!(s.vertices.len(), 5);
        assert_eq!(s.vertices[4], s.vertices[0]);
        assert_eq!(s.neighbors.len(), 4);
        assert_eq!(s.edge_count(), 4);
    }

    #[test]
    fn test_clockwise_area_is_negative() {
        assert!(square(0.0, 0.0, 4.0).signed_area2() < 0.0);
    }

    #[test]
    fn test_set_portal_tags_vertex() {
        let s = square(0.0, 0.0, 4.0).with_portal(0, 1);
        assert_eq!(s.neighbor(0), Some(1));
        assert!(s.vertices[0].is_void());
        assert!(s.vertices[4].is_void());
        assert!(!s.vertices[1].is_void());
    }

    #[test]
    fn test_sector_at() {
        let world = World::new(vec![
            square(0.0, 0.0, 4.0).with_portal(2, 1),
            square(4.0, 0.0, 4.0).with_portal(0, 0),
        ])
        .unwrap();
        assert_eq!(world.sector_at(1.0, 1.0), Some(0));
        assert_eq!(world.sector_at(5.0, 1.0), Some(1));
        assert_eq!(world.sector_at(9.0, 1.0), None);
        assert!(world.sectors()[1].contains(Vec2::new(6.0, 2.0)));
    }

    #[test]
    fn test_track_sector_through_portal() {
        let world = World::new(vec![
            square(0.0, 0.0, 4.0).with_portal(2, 1),
            square(4.0, 0.0, 4.0).with_portal(0, 0),
        ])
        .unwrap();
        assert_eq!(world.track_sector(0, 1.0, 1.0), Some(0));
        assert_eq!(world.track_sector(0, 6.0, 1.0), Some(1));
        assert_eq!(world.track_sector(0, -3.0, 1.0), None);
    }
}
