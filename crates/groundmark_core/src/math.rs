//! Math utilities
//!
//! Re-exports glam plus the deterministic generator used for scar variants

pub use glam::*;

/// Deterministic pseudo-random generator (LCG) for cosmetic choices.
///
/// Seeded, so replays and tests pick the same scar variants.
#[derive(Debug, Clone)]
pub struct DecalRng {
    state: u64,
}

impl DecalRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        // LCG constants
        const A: u64 = 1664525;
        const C: u64 = 1013904223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        self.state as u32
    }

    /// Coin flip taken from the high bits (low LCG bits have short periods).
    pub fn next_bool(&mut self) -> bool {
        self.next_u32() & 0x8000_0000 != 0
    }
}

impl Default for DecalRng {
    fn default() -> Self {
        Self::new(0x5eed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = DecalRng::new(7);
        let mut b = DecalRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn coin_flips_hit_both_sides() {
        let mut rng = DecalRng::new(1);
        let heads = (0..64).filter(|_| rng.next_bool()).count();
        assert!(heads > 0 && heads < 64);
    }
}
