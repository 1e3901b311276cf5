use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter")]
    NoAdapter,
    #[error("failed to open GPU device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("decal program is not ready")]
    ProgramNotReady,
}
