use std::path::PathBuf;

use kornia::image::ImageError;

/// Errors produced by the demo library.
#[derive(Debug, thiserror::Error)]
pub enum FunsetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("kornia image error: {0}")]
    Kornia(#[from] ImageError),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("read image fail: {}", path.display())]
    Read { path: PathBuf },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("singular matrix: {0}")]
    Singular(String),

    #[error("video error: {0}")]
    Video(String),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("verification failed: {0}")]
    Verification(String),
}

pub type Result<T> = std::result::Result<T, FunsetError>;

pub(crate) fn ensure_nonzero(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FunsetError::DimensionMismatch(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}
