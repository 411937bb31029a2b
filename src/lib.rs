//! BONNIE-32 portal renderer core
//!
//! 2.5D sector worlds (flat floors and ceilings joined by portals) compiled
//! into screen-space quads each frame:
//! - `world` - sector graph, validation, RON level files
//! - `portal` - breadth-first portal traversal into a pooled polygon arena
//! - `rasterizer` - shared math, view state and a reference painter
//! - `config` - setup-time compiler configuration

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod portal;
pub mod rasterizer;
pub mod world;
