//! Turning an explosion into scar parameters.

use crate::map::{MapDims, SCAR_TEXEL_SIZE};
use crate::spatial::TexelRect;
use glam::Vec3;

/// Smallest ground-level radius that still leaves a mark.
pub const MIN_SCAR_RADIUS: f32 = 5.0;
/// Drawn scars are larger than the blast that caused them.
pub const SCAR_RADIUS_SCALE: f32 = 1.4;
/// Damage beyond this only grows with its square root.
pub const DAMAGE_SOFT_CAP: f32 = 400.0;

/// Explosion as reported by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub pos: Vec3,
    pub damage: f32,
    pub radius: f32,
}

/// Scar parameters derived from an explosion, before a slot is claimed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScarPlan {
    /// Ground-level centre, clamped into the map.
    pub pos: Vec3,
    /// Drawn radius.
    pub radius: f32,
    pub bounds: TexelRect,
    pub start_alpha: f32,
    /// Lifetime in simulation frames.
    pub ttl: u64,
}

impl ScarPlan {
    #[inline]
    pub fn alpha_decay(&self) -> f32 {
        self.start_alpha / self.ttl as f32
    }
}

/// Compute the scar an explosion leaves, or `None` when it leaves none:
/// the blast is underground, too high above the terrain, or too small once
/// projected onto the ground.
pub fn plan_scar(
    explosion: &Explosion,
    ground_height: f32,
    decal_level: u32,
    damage_limits_radius: bool,
    map: MapDims,
) -> Option<ScarPlan> {
    let Explosion {
        mut pos,
        mut damage,
        mut radius,
    } = *explosion;

    let altitude = pos.y - ground_height;
    if altitude <= -1.0 {
        return None;
    }
    if altitude >= radius {
        return None;
    }

    pos.y -= altitude;
    radius -= altitude;

    if radius < MIN_SCAR_RADIUS {
        return None;
    }

    damage = damage.min(radius * 30.0);
    damage *= radius / (radius + altitude);
    if damage_limits_radius {
        radius = radius.min(damage * 0.25);
    }

    if damage > DAMAGE_SOFT_CAP {
        damage = DAMAGE_SOFT_CAP + (damage - (DAMAGE_SOFT_CAP - 1.0)).sqrt();
    }

    let ttl = (decal_level as f32 * damage * 3.0).max(1.0) as u64;
    let pos = map.clamp_in_bounds(pos);

    let texel = SCAR_TEXEL_SIZE as f32;
    let bounds = TexelRect {
        x1: ((pos.x - radius) / texel).max(0.0) as i32,
        y1: ((pos.z - radius) / texel).max(0.0) as i32,
        x2: ((pos.x + radius) / texel + 1.0).min((map.hmapx() - 1) as f32) as i32,
        y2: ((pos.z + radius) / texel + 1.0).min((map.hmapy() - 1) as f32) as i32,
    };

    Some(ScarPlan {
        pos,
        radius: radius * SCAR_RADIUS_SCALE,
        bounds,
        start_alpha: damage.clamp(50.0, 255.0),
        ttl,
    })
}
