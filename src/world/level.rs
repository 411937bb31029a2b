//! World loading, saving and validation
//!
//! Uses RON (Rusty Object Notation) for human-readable world files.
//! Supports both compressed (brotli) and uncompressed RON files.
//! - Reading: Auto-detects format by checking for valid RON start
//! - Writing: Always uses brotli compression
//!
//! Every load path ends in `validate_world`, so a `World` in hand is always
//! safe to compile.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use super::{Sector, World};

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum number of sectors in a world
    pub const MAX_SECTORS: usize = 4096;
    /// Maximum ring length (edges) of a single sector
    pub const MAX_SECTOR_EDGES: usize = 256;
    /// Maximum tag length
    pub const MAX_TAG_LEN: usize = 256;
    /// Maximum coordinate value (prevents overflow issues)
    pub const MAX_COORD: f32 = 1_000_000.0;
}

/// Error type for world loading and validation
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Check if a float is valid (not NaN or Inf)
fn is_valid_float(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

/// Validate a sector's ring, neighbor array and heights
fn validate_sector(sector: &Sector, sector_idx: usize, total_sectors: usize) -> Result<(), String> {
    let context = format!("sector[{}]", sector_idx);

    let ring_len = sector.vertices.len();
    if ring_len < 4 {
        return Err(format!("{}: ring needs at least 3 vertices plus the closing duplicate (got {})",
            context, ring_len));
    }
    let edges = ring_len - 1;
    if edges > limits::MAX_SECTOR_EDGES {
        return Err(format!("{}: too many edges ({} > {})",
            context, edges, limits::MAX_SECTOR_EDGES));
    }

    for (i, v) in sector.vertices.iter().enumerate() {
        if !is_valid_float(v.pos.x) || !is_valid_float(v.pos.y) {
            return Err(format!("{} vertex[{}]: invalid coordinates ({}, {})",
                context, i, v.pos.x, v.pos.y));
        }
    }

    // Ring closure: last vertex duplicates the first
    if sector.vertices[edges].pos != sector.vertices[0].pos {
        return Err(format!("{}: ring is not closed (vertex[{}] != vertex[0])", context, edges));
    }

    if sector.signed_area2() >= 0.0 {
        return Err(format!("{}: ring must be wound clockwise with non-zero area", context));
    }

    if sector.neighbors.len() != edges {
        return Err(format!("{}: neighbor array length {} does not match {} edges",
            context, sector.neighbors.len(), edges));
    }

    for (i, neighbor) in sector.neighbors.iter().enumerate() {
        let Some(n) = *neighbor else { continue };
        if n >= total_sectors {
            return Err(format!("{} edge[{}]: invalid neighbor {} (only {} sectors)",
                context, i, n, total_sectors));
        }
        if !sector.vertices[i].is_void() {
            return Err(format!("{} edge[{}]: wall edge references neighbor {}", context, i, n));
        }
    }

    if !is_valid_float(sector.floor) || !is_valid_float(sector.ceil) {
        return Err(format!("{}: invalid heights floor={} ceil={}", context, sector.floor, sector.ceil));
    }
    if sector.floor >= sector.ceil {
        return Err(format!("{}: floor {} is not below ceiling {}", context, sector.floor, sector.ceil));
    }

    if !sector.ambient.is_finite() || !(0.0..=1.0).contains(&sector.ambient) {
        return Err(format!("{}: invalid ambient {}", context, sector.ambient));
    }

    if sector.tag.len() > limits::MAX_TAG_LEN {
        return Err(format!("{}: tag too long ({} > {})",
            context, sector.tag.len(), limits::MAX_TAG_LEN));
    }

    Ok(())
}

/// Validate an entire world
pub fn validate_world(world: &World) -> Result<(), WorldError> {
    let sectors = world.sectors();

    if sectors.len() > limits::MAX_SECTORS {
        return Err(WorldError::Validation(format!(
            "too many sectors ({} > {})", sectors.len(), limits::MAX_SECTORS
        )));
    }

    for (i, sector) in sectors.iter().enumerate() {
        validate_sector(sector, i, sectors.len())
            .map_err(WorldError::Validation)?;
    }

    Ok(())
}

/// RON files start with '(' or whitespace, brotli is binary
fn is_plain_ron(bytes: &[u8]) -> bool {
    bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false)
}

/// Parse world data from bytes (plain RON or brotli-compressed RON)
pub fn parse_world_data(bytes: &[u8]) -> Result<World, WorldError> {
    let contents = if is_plain_ron(bytes) {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e),
            ))?
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed)
            .map_err(|e| std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            ))?;
        String::from_utf8(decompressed)
            .map_err(|e| std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e),
            ))?
    };

    load_world_from_str(&contents)
}

/// Load a world from a RON file (supports both compressed and uncompressed)
pub fn load_world<P: AsRef<Path>>(path: P) -> Result<World, WorldError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let world = parse_world_data(&bytes).map_err(|e| {
        log::error!("failed to load world {}: {}", path.display(), e);
        e
    })?;
    log::info!("loaded world {} ({} sectors)", path.display(), world.sector_count());
    Ok(world)
}

/// Load a world from a RON string (for embedded worlds or testing)
pub fn load_world_from_str(s: &str) -> Result<World, WorldError> {
    let world: World = ron::from_str(s)?;
    validate_world(&world)?;
    Ok(world)
}

/// Serialize a world to compressed bytes
pub fn serialize_world(world: &World) -> Result<Vec<u8>, WorldError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let ron_string = ron::ser::to_string_pretty(world, config)?;

    // Compress with brotli (quality 6, window 22 - good balance of speed/ratio)
    let mut compressed = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(ron_string.as_bytes()), &mut compressed, &brotli::enc::BrotliEncoderParams {
        quality: 6,
        lgwin: 22,
        ..Default::default()
    }).map_err(|e| std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("brotli compression failed: {}", e),
    ))?;

    Ok(compressed)
}

/// Save a world to a compressed RON file (brotli)
pub fn save_world<P: AsRef<Path>>(world: &World, path: P) -> Result<(), WorldError> {
    let data = serialize_world(world)?;
    fs::write(path, data)?;
    Ok(())
}
