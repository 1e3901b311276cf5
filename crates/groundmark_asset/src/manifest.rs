//! Where the decal textures live on disk

use crate::error::AssetError;
use serde::{Deserialize, Serialize};

/// Names of the resources the decal subsystem loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceManifest {
    /// Prefix for scar bitmaps.
    pub bitmap_root: String,
    /// Scar bitmaps 1 to 4, relative to `bitmap_root`.
    pub scars: [String; 4],
    /// Directory holding object decal textures.
    pub object_decal_dir: String,
}

impl Default for ResourceManifest {
    fn default() -> Self {
        Self {
            bitmap_root: "bitmaps/".into(),
            scars: [1, 2, 3, 4].map(|n| format!("scars/scar{n}.bmp")),
            object_decal_dir: "unittextures/".into(),
        }
    }
}

impl ResourceManifest {
    pub fn from_json_str(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Full path of scar bitmap `n` (1-based). `None` outside 1..=4.
    pub fn scar_path(&self, n: usize) -> Option<String> {
        let name = self.scars.get(n.checked_sub(1)?)?;
        Some(format!("{}{}", self.bitmap_root, name))
    }

    /// Object decal texture names are case-insensitive.
    pub fn object_decal_path(&self, name: &str) -> String {
        format!("{}{}", self.object_decal_dir, name.to_lowercase())
    }
}
