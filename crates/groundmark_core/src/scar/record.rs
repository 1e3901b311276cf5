use crate::arena::Recycle;
use crate::geometry::DecalGeometry;
use crate::math::DecalRng;
use crate::spatial::TexelRect;
use glam::{Vec2, Vec3};

/// Frames over which a fading scar ramps up to its start alpha.
pub const SCAR_FADE_IN_FRAMES: u64 = 10;

/// Quadrant of the 2x2 scar atlas a scar samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtlasVariant {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl AtlasVariant {
    pub fn offset(self) -> Vec2 {
        match self {
            AtlasVariant::TopLeft => Vec2::new(0.0, 0.0),
            AtlasVariant::TopRight => Vec2::new(0.5, 0.0),
            AtlasVariant::BottomLeft => Vec2::new(0.0, 0.5),
            AtlasVariant::BottomRight => Vec2::new(0.5, 0.5),
        }
    }

    pub fn pick(rng: &mut DecalRng) -> Self {
        match (rng.next_bool(), rng.next_bool()) {
            (false, false) => AtlasVariant::TopLeft,
            (true, false) => AtlasVariant::TopRight,
            (false, true) => AtlasVariant::BottomLeft,
            (true, true) => AtlasVariant::BottomRight,
        }
    }
}

/// Explosion scar record. Lives in a slot of the scar registry.
#[derive(Debug, Default)]
pub struct Scar {
    pub(crate) pos: Vec3,
    pub(crate) radius: f32,
    pub(crate) creation_frame: u64,
    pub(crate) life_time: u64,
    pub(crate) start_alpha: f32,
    pub(crate) alpha_decay: f32,
    pub(crate) overdrawn: f32,
    pub(crate) bounds: TexelRect,
    pub(crate) base_area: i32,
    pub(crate) variant: AtlasVariant,
    pub(crate) geometry: DecalGeometry,
    pub(crate) last_test: u32,
    pub(crate) last_draw: Option<u64>,
}

impl Recycle for Scar {
    fn recycle(&mut self) {
        let mut geometry = std::mem::take(&mut self.geometry);
        geometry.invalidate();
        *self = Scar {
            geometry,
            ..Scar::default()
        };
    }
}

impl Scar {
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Drawn radius (world units).
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn creation_frame(&self) -> u64 {
        self.creation_frame
    }

    /// Simulation frame after which the scar expires.
    pub fn life_time(&self) -> u64 {
        self.life_time
    }

    pub fn start_alpha(&self) -> f32 {
        self.start_alpha
    }

    pub fn alpha_decay(&self) -> f32 {
        self.alpha_decay
    }

    pub fn overdrawn(&self) -> f32 {
        self.overdrawn
    }

    pub fn bounds(&self) -> TexelRect {
        self.bounds
    }

    pub fn base_area(&self) -> i32 {
        self.base_area
    }

    pub fn variant(&self) -> AtlasVariant {
        self.variant
    }

    pub fn geometry(&self) -> &DecalGeometry {
        &self.geometry
    }

    pub fn last_draw(&self) -> Option<u64> {
        self.last_draw
    }

    /// Alpha byte at simulation frame `frame`.
    ///
    /// With fading disabled scars are fully opaque; with it enabled they ramp
    /// in over [`SCAR_FADE_IN_FRAMES`] and then decay linearly.
    pub fn alpha_at(&self, frame: u64, fade: bool) -> u8 {
        if !fade {
            return 255;
        }
        let age = frame.saturating_sub(self.creation_frame) as f32;
        let alpha = if self.creation_frame + SCAR_FADE_IN_FRAMES > frame {
            self.start_alpha * age * 0.1
        } else {
            self.start_alpha - age * self.alpha_decay
        };
        alpha.clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_ramps_in_then_decays() {
        let scar = Scar {
            creation_frame: 100,
            start_alpha: 200.0,
            alpha_decay: 1.0,
            ..Default::default()
        };
        assert_eq!(scar.alpha_at(100, true), 0);
        assert_eq!(scar.alpha_at(105, true), 100);
        assert_eq!(scar.alpha_at(110, true), 190);
        assert_eq!(scar.alpha_at(400, true), 0);
        assert_eq!(scar.alpha_at(105, false), 255);
    }

    #[test]
    fn recycle_clears_fields_and_invalidates_geometry() {
        let mut scar = Scar {
            radius: 12.0,
            overdrawn: 3.5,
            last_test: 9,
            last_draw: Some(4),
            ..Default::default()
        };
        scar.recycle();
        assert_eq!(scar.radius, 0.0);
        assert_eq!(scar.overdrawn, 0.0);
        assert_eq!(scar.last_test, 0);
        assert_eq!(scar.last_draw, None);
        assert!(!scar.geometry.is_built());
    }

    #[test]
    fn variants_map_to_atlas_quadrants() {
        assert_eq!(AtlasVariant::BottomRight.offset(), Vec2::new(0.5, 0.5));
        let mut rng = DecalRng::new(3);
        let picks: Vec<_> = (0..32).map(|_| AtlasVariant::pick(&mut rng)).collect();
        assert!(picks.iter().any(|v| *v != picks[0]));
    }
}
