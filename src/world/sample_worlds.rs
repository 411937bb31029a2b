//! Built-in sample worlds
//!
//! Small hand-made layouts used by the viewer when no world file is given,
//! and by tests that need a known sector graph.

use super::{Sector, SurfaceTextures, World};

/// Edge indices of a sector built by `box_sector`
pub const EDGE_WEST: usize = 0;
pub const EDGE_NORTH: usize = 1;
pub const EDGE_EAST: usize = 2;
pub const EDGE_SOUTH: usize = 3;

/// Axis-aligned box sector. Edges run west, north, east, south (clockwise).
pub fn box_sector(x0: f32, y0: f32, x1: f32, y1: f32, floor: f32, ceil: f32) -> Sector {
    Sector::new(&[(x0, y0), (x0, y1), (x1, y1), (x1, y0)], floor, ceil)
}

fn textures(wall: u16) -> SurfaceTextures {
    SurfaceTextures { floor: 0, ceiling: 7, wall, upper: 3, lower: 3 }
}

/// Build a world from sectors that are known to be valid.
/// Only used for the fixed layouts below.
fn build(sectors: Vec<Sector>) -> World {
    match World::new(sectors) {
        Ok(world) => world,
        Err(e) => unreachable!("built-in sample world is invalid: {}", e),
    }
}

/// A single closed room of side `size` centered on the origin, floor 0,
/// ceiling 20, no neighbors.
pub fn single_room(size: f32) -> World {
    let h = size * 0.5;
    build(vec![box_sector(-h, -h, h, h, 0.0, 20.0).with_textures(textures(1)).with_tag("room")])
}

/// Two 8x8 rooms joined by one portal on x = 8. Room B's floor sits at
/// `floor_b` (room A's floor is 0); both ceilings are 20.
pub fn two_rooms_step(floor_b: f32) -> World {
    build(vec![
        box_sector(0.0, -4.0, 8.0, 4.0, 0.0, 20.0)
            .with_portal(EDGE_EAST, 1)
            .with_textures(textures(1)),
        box_sector(8.0, -4.0, 16.0, 4.0, floor_b, 20.0)
            .with_portal(EDGE_WEST, 0)
            .with_textures(textures(3)),
    ])
}

/// Same layout as `two_rooms_step`, but room B has the same floor and a
/// ceiling at `ceil_b`, so a lip hangs above the portal.
pub fn two_rooms_lip(ceil_b: f32) -> World {
    build(vec![
        box_sector(0.0, -4.0, 8.0, 4.0, 0.0, 20.0)
            .with_portal(EDGE_EAST, 1)
            .with_textures(textures(1)),
        box_sector(8.0, -4.0, 16.0, 4.0, 0.0, ceil_b)
            .with_portal(EDGE_WEST, 0)
            .with_textures(textures(3)),
    ])
}

/// Four 8x8 rooms in a 2x2 grid, each linked to both grid neighbors, so
/// the graph holds the cycle A -> B -> C -> D -> A as well as every
/// two-sector back-link.
pub fn portal_cycle() -> World {
    build(vec![
        // A: south-west
        box_sector(0.0, 0.0, 8.0, 8.0, 0.0, 20.0)
            .with_portal(EDGE_EAST, 1)
            .with_portal(EDGE_NORTH, 3)
            .with_textures(textures(1)),
        // B: south-east
        box_sector(8.0, 0.0, 16.0, 8.0, 1.0, 20.0)
            .with_portal(EDGE_WEST, 0)
            .with_portal(EDGE_NORTH, 2)
            .with_textures(textures(2)),
        // C: north-east
        box_sector(8.0, 8.0, 16.0, 16.0, 2.0, 18.0)
            .with_portal(EDGE_SOUTH, 1)
            .with_portal(EDGE_WEST, 3)
            .with_textures(textures(3)),
        // D: north-west
        box_sector(0.0, 8.0, 8.0, 16.0, 1.0, 19.0)
            .with_portal(EDGE_SOUTH, 0)
            .with_portal(EDGE_EAST, 2)
            .with_textures(textures(6)),
    ])
}

/// `count` 8-unit segments in a row along +X, each stepping its floor up by
/// one and its ceiling down by one.
pub fn corridor(count: usize) -> World {
    let sectors = (0..count)
        .map(|i| {
            let x0 = i as f32 * 8.0;
            let step = (i % 4) as f32;
            let mut s = box_sector(x0, -3.0, x0 + 8.0, 3.0, step, 20.0 - step)
                .with_textures(textures((i % 8) as u16))
                .with_ambient(1.0 - (i % 3) as f32 * 0.2);
            if i > 0 {
                s = s.with_portal(EDGE_WEST, i - 1);
            }
            if i + 1 < count {
                s = s.with_portal(EDGE_EAST, i + 1);
            }
            s
        })
        .collect();
    build(sectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_valid() {
        assert_eq!(single_room(1.0).sector_count(), 1);
        assert_eq!(two_rooms_step(2.0).sector_count(), 2);
        assert_eq!(two_rooms_lip(15.0).sector_count(), 2);
        assert_eq!(portal_cycle().sector_count(), 4);
        assert_eq!(corridor(6).sector_count(), 6);
    }

    #[test]
    fn test_corridor_links_both_ways() {
        let world = corridor(3);
        assert_eq!(world.sectors()[1].neighbor(EDGE_WEST), Some(0));
        assert_eq!(world.sectors()[1].neighbor(EDGE_EAST), Some(2));
        assert_eq!(world.sectors()[0].neighbor(EDGE_WEST), None);
    }
}
