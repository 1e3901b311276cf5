//! Scar texture atlas
//!
//! Four scar bitmaps packed into the quadrants of one 512x512 texture.
//! Scar records pick their quadrant through `AtlasVariant`.

use crate::bitmap::{Bitmap, BitmapSource};
use crate::manifest::ResourceManifest;
use tracing::warn;

pub const ATLAS_SIZE: u32 = 512;
pub const TILE_SIZE: u32 = 256;

/// Top-left texel of each scar bitmap, indexed by scar number - 1.
const TILE_OFFSETS: [(u32, u32); 4] = [(0, 256), (0, 0), (256, 0), (256, 256)];

/// Composed RGBA atlas, ready for upload.
#[derive(Debug, Clone)]
pub struct ScarAtlas {
    pixels: Vec<u8>,
    tiles_loaded: usize,
}

impl ScarAtlas {
    /// Blank (fully transparent) atlas.
    pub fn empty() -> Self {
        Self {
            pixels: vec![0; (ATLAS_SIZE * ATLAS_SIZE * 4) as usize],
            tiles_loaded: 0,
        }
    }

    /// Load and pack every scar bitmap the manifest names. Missing bitmaps
    /// leave their quadrant transparent.
    pub fn compose(manifest: &ResourceManifest, source: &mut dyn BitmapSource) -> Self {
        let mut atlas = Self::empty();

        for (n, &(x, y)) in TILE_OFFSETS.iter().enumerate() {
            let Some(path) = manifest.scar_path(n + 1) else {
                continue;
            };
            match source.load(&path) {
                Ok(bitmap) => {
                    atlas.blit_tile(&bitmap, is_bmp(&path), x, y);
                    atlas.tiles_loaded += 1;
                }
                Err(err) => warn!(path = %path, error = %err, "scar texture missing"),
            }
        }

        atlas
    }

    /// Copy `bitmap` into the tile at (`x`, `y`), rescaling it to the tile
    /// size first. BMP scars are greyscale masks: red drives a brown tint and
    /// green becomes alpha.
    pub fn blit_tile(&mut self, bitmap: &Bitmap, greyscale_mask: bool, x: u32, y: u32) {
        let tile = bitmap.rescaled(TILE_SIZE, TILE_SIZE);
        let stride = (ATLAS_SIZE * 4) as usize;

        for row in 0..TILE_SIZE {
            let src = tile.row(row);
            let start = (y + row) as usize * stride + x as usize * 4;
            let dst = &mut self.pixels[start..start + (TILE_SIZE * 4) as usize];

            if greyscale_mask {
                for (out, texel) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    let brightness = texel[0] as u32;
                    out[0] = (brightness * 90 / 255) as u8;
                    out[1] = (brightness * 60 / 255) as u8;
                    out[2] = (brightness * 30 / 255) as u8;
                    out[3] = texel[1];
                }
            } else {
                dst.copy_from_slice(src);
            }
        }
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * ATLAS_SIZE + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// How many scar bitmaps made it into the atlas.
    pub fn tiles_loaded(&self) -> usize {
        self.tiles_loaded
    }
}

fn is_bmp(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::MemoryBitmaps;

    fn manifest_with(ext: &str) -> ResourceManifest {
        ResourceManifest {
            scars: [1, 2, 3, 4].map(|n| format!("scars/scar{n}.{ext}")),
            ..ResourceManifest::default()
        }
    }

    #[test]
    fn scars_land_in_their_quadrants() {
        let manifest = manifest_with("tga");
        let mut source = MemoryBitmaps::new();
        for n in 1..=4u8 {
            source.insert(
                manifest.scar_path(n as usize).unwrap(),
                Bitmap::filled(TILE_SIZE, TILE_SIZE, [n, n, n, 255]),
            );
        }

        let atlas = ScarAtlas::compose(&manifest, &mut source);
        assert_eq!(atlas.tiles_loaded(), 4);
        assert_eq!(atlas.pixel(10, 10), [2, 2, 2, 255]);
        assert_eq!(atlas.pixel(300, 10), [3, 3, 3, 255]);
        assert_eq!(atlas.pixel(10, 300), [1, 1, 1, 255]);
        assert_eq!(atlas.pixel(511, 511), [4, 4, 4, 255]);
    }

    #[test]
    fn bmp_masks_are_tinted() {
        let manifest = ResourceManifest::default();
        let mut source = MemoryBitmaps::new();
        source.insert(
            manifest.scar_path(2).unwrap(),
            Bitmap::filled(TILE_SIZE, TILE_SIZE, [255, 128, 7, 0]),
        );

        let atlas = ScarAtlas::compose(&manifest, &mut source);
        assert_eq!(atlas.pixel(0, 0), [90, 60, 30, 128]);
    }

    #[test]
    fn odd_sizes_are_rescaled_to_a_tile() {
        let manifest = manifest_with("tga");
        let mut source = MemoryBitmaps::new();
        source.insert(
            manifest.scar_path(4).unwrap(),
            Bitmap::filled(64, 100, [9, 9, 9, 9]),
        );

        let atlas = ScarAtlas::compose(&manifest, &mut source);
        assert_eq!(atlas.pixel(256, 256), [9, 9, 9, 9]);
        assert_eq!(atlas.pixel(511, 511), [9, 9, 9, 9]);
        assert_eq!(atlas.pixel(255, 255), [0, 0, 0, 0]);
    }

    #[test]
    fn missing_bitmaps_leave_transparent_quadrants() {
        let manifest = manifest_with("tga");
        let mut source = MemoryBitmaps::new();
        source.insert(
            manifest.scar_path(1).unwrap(),
            Bitmap::filled(TILE_SIZE, TILE_SIZE, [5, 5, 5, 255]),
        );

        let atlas = ScarAtlas::compose(&manifest, &mut source);
        assert_eq!(atlas.tiles_loaded(), 1);
        assert_eq!(atlas.pixel(0, 300), [5, 5, 5, 255]);
        assert_eq!(atlas.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(atlas.pixels().len(), (ATLAS_SIZE * ATLAS_SIZE * 4) as usize);
    }
}
