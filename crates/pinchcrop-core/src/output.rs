//! Output sizing for `crop`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CropperError;
use crate::geometry::{CropBox, CropRect};

/// How the `value` passed to `crop` determines the output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CropMode {
    /// Multiple of the on-screen crop-box size.
    #[default]
    Ratio,
    /// Multiple of the crop rectangle in natural image pixels.
    NaturalRatio,
    /// Fixed output width; height follows the crop-box aspect ratio.
    Width,
    /// Fixed output height; width follows the crop-box aspect ratio.
    Height,
}

impl CropMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CropMode::Ratio => "ratio",
            CropMode::NaturalRatio => "naturalRatio",
            CropMode::Width => "width",
            CropMode::Height => "height",
        }
    }
}

impl fmt::Display for CropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropMode {
    type Err = CropperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ratio" => Ok(CropMode::Ratio),
            "naturalRatio" => Ok(CropMode::NaturalRatio),
            "width" => Ok(CropMode::Width),
            "height" => Ok(CropMode::Height),
            other => Err(CropperError::InvalidCropMode(other.to_string())),
        }
    }
}

/// Longest output side; matches the largest canvas browsers allocate.
pub const MAX_OUTPUT_SIDE: u32 = 32_767;

/// Largest output area in pixels (a 16384×16384 canvas).
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Output surface size in whole pixels, never smaller than 1×1.
///
/// # Errors
///
/// `CropperError::InvalidOutputSize` when `value` is not positive and finite,
/// or when the resulting surface would exceed [`MAX_OUTPUT_SIDE`] or
/// [`MAX_OUTPUT_PIXELS`].
pub fn output_size(
    mode: CropMode,
    value: f64,
    crop_box: &CropBox,
    rect: &CropRect,
) -> Result<(u32, u32), CropperError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CropperError::InvalidOutputSize(value));
    }

    let aspect = crop_box.width / crop_box.height;
    let (width, height) = match mode {
        CropMode::Ratio => (crop_box.width * value, crop_box.height * value),
        CropMode::NaturalRatio => (rect.width * value, rect.height * value),
        CropMode::Width => (value, value / aspect),
        CropMode::Height => (value * aspect, value),
    };

    let (width, height) = (to_pixels(width), to_pixels(height));
    if width > MAX_OUTPUT_SIDE
        || height > MAX_OUTPUT_SIDE
        || u64::from(width) * u64::from(height) > MAX_OUTPUT_PIXELS
    {
        return Err(CropperError::InvalidOutputSize(value));
    }
    Ok((width, height))
}

#[inline]
fn to_pixels(size: f64) -> u32 {
    // float-to-int casts saturate
    (size.round() as u32).max(1)
}
