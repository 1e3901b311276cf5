//! Decal subsystem settings

use crate::error::DecalError;
use serde::{Deserialize, Serialize};

/// Hard ceiling on live explosion scars.
pub const DEFAULT_MAX_SCARS: usize = 4096;
/// 64 pages of 1024 decals.
pub const DEFAULT_MAX_OBJECT_DECALS: usize = 64 * 1024;

/// Engine-facing decal configuration.
///
/// Deserialized from JSON; every field falls back to its default when
/// absent, so an empty object `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecalConfig {
    /// Fixed capacity of the scar registry.
    pub max_scars: usize,
    /// Fixed capacity of the object decal pool.
    pub max_object_decals: usize,
    /// Visual quality level. 0 disables the whole subsystem.
    pub decal_level: u32,
    /// Fade scars in over their first frames and out over their lifetime.
    pub scar_alpha_fade: bool,
    /// Keep decals of previously seen buildings visible outside LOS.
    pub ghosted_buildings: bool,
    /// Shrink scar radius for weak explosions (`radius <= damage / 4`).
    pub damage_limits_radius: bool,
    /// Lower bound on an object decal's fade rate (alpha per second).
    pub min_decal_falloff: f32,
}

impl Default for DecalConfig {
    fn default() -> Self {
        Self {
            max_scars: DEFAULT_MAX_SCARS,
            max_object_decals: DEFAULT_MAX_OBJECT_DECALS,
            decal_level: 3,
            scar_alpha_fade: false,
            ghosted_buildings: true,
            damage_limits_radius: false,
            min_decal_falloff: 0.01,
        }
    }
}

impl DecalConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DecalError> {
        let config: DecalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DecalError> {
        if self.max_scars == 0 {
            return Err(DecalError::InvalidConfig("max_scars must be non-zero".into()));
        }
        if self.max_scars > u32::MAX as usize || self.max_object_decals > u32::MAX as usize {
            return Err(DecalError::InvalidConfig("pool capacity exceeds u32 range".into()));
        }
        if self.max_object_decals == 0 {
            return Err(DecalError::InvalidConfig(
                "max_object_decals must be non-zero".into(),
            ));
        }
        if !(self.min_decal_falloff > 0.0) {
            return Err(DecalError::InvalidConfig(
                "min_decal_falloff must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Whether decals are drawn (and tracked) at all.
    #[inline]
    pub fn draw_decals(&self) -> bool {
        self.decal_level > 0
    }

    /// Accumulated overdraw a scar tolerates before eviction.
    #[inline]
    pub fn overlap_threshold(&self) -> f32 {
        self.decal_level as f32 + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = DecalConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DecalConfig::default());
        assert_eq!(config.overlap_threshold(), 4.0);
        assert!(config.draw_decals());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config =
            DecalConfig::from_json_str(r#"{ "max_scars": 16, "scar_alpha_fade": true }"#).unwrap();
        assert_eq!(config.max_scars, 16);
        assert!(config.scar_alpha_fade);
        assert_eq!(config.decal_level, 3);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = DecalConfig::from_json_str(r#"{ "max_scars": 0 }"#).unwrap_err();
        assert!(matches!(err, DecalError::InvalidConfig(_)));
    }

    #[test]
    fn level_zero_disables_drawing() {
        let config = DecalConfig {
            decal_level: 0,
            ..Default::default()
        };
        assert!(!config.draw_decals());
        assert_eq!(config.overlap_threshold(), 1.0);
    }
}
