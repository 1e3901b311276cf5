//! Explosion scars: creation, overlap eviction and expiry.

pub mod explosion;
mod overlap;
pub mod record;
pub mod registry;

pub use explosion::{plan_scar, Explosion, ScarPlan};
pub use record::{AtlasVariant, Scar, SCAR_FADE_IN_FRAMES};
pub use registry::{ResolveOutcome, ScarId, ScarRegistry};
