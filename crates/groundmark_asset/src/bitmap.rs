//! In-memory RGBA bitmaps
//!
//! Decoding image files is left to the host; a [`BitmapSource`] hands
//! over already-decoded pixels keyed by resource path.

use crate::error::AssetError;
use std::collections::HashMap;

/// Tightly packed 8-bit RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(AssetError::Dimensions {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }

    /// Nearest-neighbour resample.
    pub fn rescaled(&self, width: u32, height: u32) -> Bitmap {
        if width == self.width && height == self.height {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                pixels.extend_from_slice(&self.pixel(sx, sy));
            }
        }

        Bitmap {
            width,
            height,
            pixels,
        }
    }
}

/// Supplies decoded bitmaps by resource path.
pub trait BitmapSource {
    fn load(&mut self, path: &str) -> Result<Bitmap, AssetError>;
}

/// Bitmaps registered up front.
#[derive(Debug, Default)]
pub struct MemoryBitmaps {
    bitmaps: HashMap<String, Bitmap>,
}

impl MemoryBitmaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bitmap: Bitmap) {
        self.bitmaps.insert(path.into(), bitmap);
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }
}

impl BitmapSource for MemoryBitmaps {
    fn load(&mut self, path: &str) -> Result<Bitmap, AssetError> {
        self.bitmaps
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffers() {
        assert!(Bitmap::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Bitmap::from_rgba(0, 2, vec![]).is_err());
        assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn upscale_repeats_source_pixels() {
        // 2x1: red, blue
        let src = Bitmap::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let big = src.rescaled(4, 2);
        assert_eq!(big.width(), 4);
        assert_eq!(big.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(big.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(big.pixel(2, 0), [0, 0, 255, 255]);
        assert_eq!(big.pixel(3, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn downscale_samples_top_left() {
        let mut pixels = Vec::new();
        for i in 0..16u8 {
            pixels.extend_from_slice(&[i, 0, 0, 255]);
        }
        let src = Bitmap::from_rgba(4, 4, pixels).unwrap();
        let small = src.rescaled(2, 2);
        assert_eq!(small.pixel(0, 0)[0], 0);
        assert_eq!(small.pixel(1, 0)[0], 2);
        assert_eq!(small.pixel(0, 1)[0], 8);
        assert_eq!(small.pixel(1, 1)[0], 10);
    }

    #[test]
    fn memory_source_reports_missing_paths() {
        let mut source = MemoryBitmaps::new();
        source.insert("a.bmp", Bitmap::filled(1, 1, [1, 2, 3, 4]));
        assert_eq!(source.load("a.bmp").unwrap().pixel(0, 0), [1, 2, 3, 4]);
        assert!(matches!(source.load("b.bmp"), Err(AssetError::NotFound(p)) if p == "b.bmp"));
    }
}
