//! Groundmark Core
//!
//! Ground decal and scar lifecycle for a heightmapped RTS terrain:
//! - Explosion scars with overlap eviction over a uniform grid
//! - Footprint decals following units, features and their ghosts
//! - Terrain-conforming geometry cached per decal
//! - Per-frame pass ordering over a pluggable draw backend

pub mod arena;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod handler;
pub mod interfaces;
pub mod map;
pub mod math;
pub mod objects;
pub mod render;
pub mod scar;
pub mod spatial;
pub mod time;

pub use glam;

pub use config::DecalConfig;
pub use error::{DecalError, ResourceKind};
pub use handler::{FrameSummary, GroundDecalHandler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
