//! Error type shared by the terrain pipeline.
//!
//! Stage functions never return errors; they log and fall back. Only
//! allocation-time checks, file I/O and configuration parsing can fail.

use thiserror::Error;

/// Errors produced while setting up or persisting a generation run.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid heightfield dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("buffer holds {actual} samples, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
