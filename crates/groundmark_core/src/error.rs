use crate::arena::SlotId;
use std::fmt;
use thiserror::Error;

/// Kind of external resource the decal subsystem depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ObjectDecalTexture,
    ScarAtlas,
    Program,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ObjectDecalTexture => "object decal texture",
            ResourceKind::ScarAtlas => "scar atlas",
            ResourceKind::Program => "decal program",
        };
        f.write_str(name)
    }
}

/// Errors raised by the decal subsystem. None of them are fatal to a frame.
#[derive(Debug, Error)]
pub enum DecalError {
    #[error("pool capacity of {capacity} exhausted")]
    CapacityExhausted { capacity: usize },

    #[error("failed to load {kind} '{name}': {reason}")]
    ResourceLoad {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("handle {0:?} no longer refers to a live record")]
    StaleHandle(SlotId),

    #[error("invalid decal configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse decal configuration")]
    ConfigParse(#[from] serde_json::Error),
}

impl DecalError {
    pub fn resource(kind: ResourceKind, name: impl Into<String>, reason: impl fmt::Display) -> Self {
        DecalError::ResourceLoad {
            kind,
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
