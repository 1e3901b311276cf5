//! Groundmark Asset Pipeline
//!
//! Resource manifest, bitmap handling, scar atlas composition and the
//! texture loader the decal handler pulls its textures through.

pub mod atlas;
pub mod bitmap;
pub mod error;
pub mod loader;
pub mod manifest;

pub use atlas::ScarAtlas;
pub use bitmap::{Bitmap, BitmapSource, MemoryBitmaps};
pub use error::AssetError;
pub use loader::{AssetTextureLoader, TextureUploader};
pub use manifest::ResourceManifest;
