use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("bitmap '{0}' not found")]
    NotFound(String),
    #[error("{width}x{height} RGBA bitmap needs {expected} bytes, got {actual}")]
    Dimensions {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("failed to parse resource manifest")]
    Manifest(#[from] serde_json::Error),
    #[error("texture upload failed: {0}")]
    Upload(String),
}
