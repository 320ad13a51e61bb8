//! Encoding of cropped output.
//!
//! `crop` hands back a surface; on a [`RasterSurface`](crate::RasterSurface)
//! the pixels can be persisted with these encoders.
//!
//! # Examples
//!
//! ```ignore
//! let output = cropper.crop(1.0, CropMode::Ratio)?;
//! let png = encode_png(output.pixels())?;
//! let jpeg = encode_jpeg(output.pixels(), 90, Color::WHITE)?;
//! ```

mod jpeg;
mod png;

use thiserror::Error;

pub use jpeg::encode_jpeg;
pub use png::encode_png;

/// Errors that can occur while encoding output.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

fn check_dimensions(width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    Ok(())
}
