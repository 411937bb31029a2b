//! Setup-time configuration for the portal compiler
//!
//! Loaded from RON (or built in code). Every field has a default, so a
//! config file only needs the values it wants to change.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::rasterizer::{HEIGHT, HFOV, VFOV, WIDTH};

/// Queue capacity used when the configured one is not a power of two
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

fn default_width() -> usize { WIDTH }
fn default_height() -> usize { HEIGHT }
fn default_queue_capacity() -> usize { DEFAULT_QUEUE_CAPACITY }
fn default_polygons_per_sector() -> usize { 256 }
fn default_max_sector_visits() -> u8 { 4 }
fn default_max_ceiling_height() -> f32 { 1000.0 }
fn default_hfov() -> f32 { HFOV }
fn default_vfov() -> f32 { VFOV }

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Screen width in pixels
    #[serde(default = "default_width")]
    pub screen_width: usize,
    /// Screen height in pixels
    #[serde(default = "default_height")]
    pub screen_height: usize,
    /// Window queue slots. Must be a power of two.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Polygon slots in each compiled-sector record
    #[serde(default = "default_polygons_per_sector")]
    pub polygons_per_sector: usize,
    /// How many times one sector may be compiled per frame. Also the number
    /// of compiled-sector records provisioned per world sector.
    #[serde(default = "default_max_sector_visits")]
    pub max_sector_visits: u8,
    /// Tallest ceiling in the world. Not used by the compiler; handed through
    /// to the rasterizer for sky and clamp decisions.
    #[serde(default = "default_max_ceiling_height")]
    pub max_ceiling_height: f32,
    /// Horizontal FOV scale (multiplied by screen height)
    #[serde(default = "default_hfov")]
    pub hfov: f32,
    /// Vertical FOV scale (multiplied by screen height)
    #[serde(default = "default_vfov")]
    pub vfov: f32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            screen_width: default_width(),
            screen_height: default_height(),
            queue_capacity: default_queue_capacity(),
            polygons_per_sector: default_polygons_per_sector(),
            max_sector_visits: default_max_sector_visits(),
            max_ceiling_height: default_max_ceiling_height(),
            hfov: default_hfov(),
            vfov: default_vfov(),
        }
    }
}

impl CompilerConfig {
    pub fn with_screen(mut self, width: usize, height: usize) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Correct recoverable mistakes. A queue capacity that is not a power of
    /// two falls back to `DEFAULT_QUEUE_CAPACITY` with a warning; a zero
    /// visit limit becomes 1 so the viewer's own sector still compiles.
    pub fn sanitized(mut self) -> Self {
        if !self.queue_capacity.is_power_of_two() || self.queue_capacity < 2 {
            log::warn!(
                "queue capacity {} is not a power of two >= 2, using {}",
                self.queue_capacity,
                DEFAULT_QUEUE_CAPACITY
            );
            self.queue_capacity = DEFAULT_QUEUE_CAPACITY;
        }
        if self.max_sector_visits == 0 {
            log::warn!("max_sector_visits is 0, using 1");
            self.max_sector_visits = 1;
        }
        self
    }

    /// Horizontal projection scale in pixels at unit depth
    pub fn hfov_scale(&self) -> f32 {
        self.hfov * self.screen_height as f32
    }

    /// Vertical projection scale in pixels at unit depth
    pub fn vfov_scale(&self) -> f32 {
        self.vfov * self.screen_height as f32
    }
}

/// Load a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<CompilerConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CompilerConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_non_power_of_two_falls_back() {
        let config = CompilerConfig::default().with_queue_capacity(100).sanitized();
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_power_of_two_kept() {
        let config = CompilerConfig::default().with_queue_capacity(256).sanitized();
        assert_eq!(config.queue_capacity, 256);
    }

    #[test]
    fn test_zero_visits_corrected() {
        let mut config = CompilerConfig::default();
        config.max_sector_visits = 0;
        assert_eq!(config.sanitized().max_sector_visits, 1);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = load_config_from_str("(screen_width: 64, queue_capacity: 32)").unwrap();
        assert_eq!(config.screen_width, 64);
        assert_eq!(config.queue_capacity, 32);
        assert_eq!(config.screen_height, HEIGHT);
        assert_eq!(config.polygons_per_sector, 256);
    }

    #[test]
    fn test_load_config_file() {
        use std::io::Write;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "(screen_height: 120, max_sector_visits: 2)").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.screen_height, 120);
        assert_eq!(config.max_sector_visits, 2);
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        assert!(matches!(load_config_from_str("(screen_width: \"wide\")"), Err(ConfigError::Parse(_))));
    }
}
