//! Box-filtered mip chains for uploaded RGBA textures

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Every level below the base image, down to 1x1.
pub fn mip_chain(width: u32, height: u32, pixels: &[u8]) -> Vec<MipLevel> {
    let mut levels = Vec::new();
    let (mut w, mut h) = (width, height);
    let mut prev: Vec<u8> = pixels.to_vec();

    while w > 1 || h > 1 {
        let nw = (w / 2).max(1);
        let nh = (h / 2).max(1);
        let mut next = Vec::with_capacity((nw * nh * 4) as usize);

        for y in 0..nh {
            let y0 = (y * 2).min(h - 1);
            let y1 = (y * 2 + 1).min(h - 1);
            for x in 0..nw {
                let x0 = (x * 2).min(w - 1);
                let x1 = (x * 2 + 1).min(w - 1);
                for c in 0..4 {
                    let at = |px: u32, py: u32| prev[((py * w + px) * 4 + c) as usize] as u32;
                    let sum = at(x0, y0) + at(x1, y0) + at(x0, y1) + at(x1, y1);
                    next.push(((sum + 2) / 4) as u8);
                }
            }
        }

        levels.push(MipLevel {
            width: nw,
            height: nh,
            pixels: next.clone(),
        });
        prev = next;
        w = nw;
        h = nh;
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(256, 64), 9);
    }

    #[test]
    fn chain_halves_down_to_one_texel() {
        let chain = mip_chain(4, 2, &[0u8; 4 * 2 * 4]);
        let sizes: Vec<_> = chain.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(2, 1), (1, 1)]);
        assert_eq!(chain.len() as u32 + 1, mip_level_count(4, 2));
    }

    #[test]
    fn texels_are_averaged() {
        // 2x2: alpha 0, 0, 255, 255
        let mut pixels = Vec::new();
        for a in [0u8, 0, 255, 255] {
            pixels.extend_from_slice(&[100, 0, 0, a]);
        }
        let chain = mip_chain(2, 2, &pixels);
        assert_eq!(chain[0].pixels, vec![100, 0, 0, 128]);
    }
}
