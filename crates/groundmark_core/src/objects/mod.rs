//! Footprint decals under buildings, units and features.

pub mod decal;
pub mod registry;

pub use decal::{
    DecalId, DecalOwner, DecalTypeId, GroundDecalDef, ObjectGroundDecal, SolidObjectDecalType,
    SolidObjectInfo,
};
pub use registry::{GatherOutcome, ObjectDecalRegistry};
