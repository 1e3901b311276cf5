//! Groundmark Render
//!
//! wgpu implementation of the decal draw backend. Draw calls coming from
//! the handler are staged on the CPU and submitted in one render pass per
//! frame.

pub mod backend;
pub mod batch;
pub mod error;
pub mod mips;
pub mod pipeline;
pub mod target;
pub mod texture;
pub mod uniforms;

pub use wgpu;

pub use backend::{BackendSettings, SubmitStats, WgpuDecalBackend};
pub use error::RenderError;
pub use target::{headless_device, OffscreenTarget};
