//! World module - sector graph for portal rendering
//!
//! - Sectors with closed vertex rings and flat floor/ceiling
//! - Portal connectivity through void edges and parallel neighbor arrays
//! - RON world files with validation on load
//!
//! The world is built once and stays immutable while frames compile.

mod geometry;
mod level;
pub mod sample_worlds;

pub use geometry::*;
pub use level::*;
