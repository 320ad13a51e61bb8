//! Decode errors and EXIF orientation.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why image bytes could not become an [`ImageAsset`](crate::ImageAsset).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Neither JPEG nor PNG.
    #[error("unrecognized image format")]
    InvalidFormat,

    /// The decoder gave up part way.
    #[error("corrupted image data: {0}")]
    CorruptedFile(String),

    #[error("decoded image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// How the stored pixels must be transformed for display (EXIF tag 0x0112).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Normal,
    MirrorHorizontal,
    Rotate180,
    MirrorVertical,
    /// Mirrored across the top-left to bottom-right diagonal.
    Transpose,
    Rotate90,
    /// Mirrored across the top-right to bottom-left diagonal.
    Transverse,
    Rotate270,
}

impl Orientation {
    /// Map the raw tag value; unknown values mean no transform.
    pub fn from_exif(value: u32) -> Self {
        const TABLE: [Orientation; 8] = [
            Orientation::Normal,
            Orientation::MirrorHorizontal,
            Orientation::Rotate180,
            Orientation::MirrorVertical,
            Orientation::Transpose,
            Orientation::Rotate90,
            Orientation::Transverse,
            Orientation::Rotate270,
        ];
        value
            .checked_sub(1)
            .and_then(|i| TABLE.get(i as usize))
            .copied()
            .unwrap_or_default()
    }

    /// Transform stored pixels into display orientation.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => image,
            Orientation::MirrorHorizontal => image.fliph(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::MirrorVertical => image.flipv(),
            Orientation::Transpose => image.rotate90().fliph(),
            Orientation::Rotate90 => image.rotate90(),
            Orientation::Transverse => image.rotate270().fliph(),
            Orientation::Rotate270 => image.rotate270(),
        }
    }
}
