//! Procedural stand-ins for the scar and footprint bitmaps

use groundmark_asset::{Bitmap, MemoryBitmaps, ResourceManifest};
use groundmark_core::math::DecalRng;

pub const FACTORY_DECAL: &str = "Factory_AOPlane.dds";
pub const TANK_DECAL: &str = "Tank_AOPlane.dds";

/// Radial burn mask in the greyscale layout scar BMPs use: red is
/// brightness, green is coverage.
fn scar_mask(size: u32, rng: &mut DecalRng) -> Bitmap {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let half = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).max(0.0);
            let grain = (rng.next_u32() >> 28) as f32 / 15.0;
            let brightness = (falloff * 200.0 + grain * 55.0) as u8;
            let coverage = (falloff * falloff * 255.0) as u8;
            pixels.extend_from_slice(&[brightness, coverage, 0, 255]);
        }
    }
    Bitmap::from_rgba(size, size, pixels).unwrap_or_else(|_| Bitmap::filled(size, size, [0; 4]))
}

/// Soft dark square with transparent edges.
fn footprint_shadow(size: u32) -> Bitmap {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let edge = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let dx = ((x as f32 + 0.5) - edge).abs() / edge;
            let dy = ((y as f32 + 0.5) - edge).abs() / edge;
            let alpha = ((1.0 - dx.max(dy)) * 4.0).clamp(0.0, 1.0);
            pixels.extend_from_slice(&[20, 18, 16, (alpha * 200.0) as u8]);
        }
    }
    Bitmap::from_rgba(size, size, pixels).unwrap_or_else(|_| Bitmap::filled(size, size, [0; 4]))
}

/// Every bitmap the demo references. Scar 4 is left out so its atlas
/// quadrant stays empty.
pub fn demo_bitmaps(manifest: &ResourceManifest, seed: u64) -> MemoryBitmaps {
    let mut rng = DecalRng::new(seed);
    let mut bitmaps = MemoryBitmaps::new();

    for n in 1..=3 {
        if let Some(path) = manifest.scar_path(n) {
            let size = if n == 3 { 128 } else { 256 };
            bitmaps.insert(path, scar_mask(size, &mut rng));
        }
    }

    bitmaps.insert(manifest.object_decal_path(FACTORY_DECAL), footprint_shadow(64));
    bitmaps.insert(manifest.object_decal_path(TANK_DECAL), footprint_shadow(32));
    bitmaps
}

