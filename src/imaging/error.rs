//! Error taxonomy shared by every imaging operation.
//!
//! The core never knows about HTTP status codes. It only distinguishes
//! *caller errors* (the input could not be used) from *internal failures*
//! (something went wrong while transforming a valid input). The boundary
//! layer maps these to user-facing responses via [`ImagingError::is_caller_error`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    /// The input bytes are not a valid or recognized raster image.
    #[error("Failed to decode image: {0}")]
    Decode(String),
    /// The requested output format, filter name, or input container is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Unexpected failure while clustering, compositing, or encoding.
    #[error("Processing failed: {0}")]
    Processing(String),
}

impl ImagingError {
    /// `true` when the failure was caused by the input rather than by the transform.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::UnsupportedFormat(_))
    }
}

/// Result type for imaging operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Reject images that have no pixels before any transform touches them.
pub(crate) fn ensure_non_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ImagingError::Processing(format!(
            "degenerate image dimensions {width}x{height}"
        )));
    }
    Ok(())
}
