//! JPEG encoding for export.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use super::{check_dimensions, EncodeError};
use crate::config::Color;

/// Encode RGBA pixels to JPEG bytes.
///
/// JPEG has no alpha channel, so pixels are flattened onto `background`
/// first (a circular crop's transparent corners take that color).
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(image: &RgbaImage, quality: u8, background: Color) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();
    check_dimensions(width, height)?;

    let quality = quality.clamp(1, 100);
    let rgb = flatten(image, background);

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

fn flatten(image: &RgbaImage, background: Color) -> Vec<u8> {
    let bg = [background.r as f32, background.g as f32, background.b as f32];
    let mut rgb = Vec::with_capacity(image.as_raw().len() / 4 * 3);
    for pixel in image.pixels() {
        let a = pixel[3] as f32 / 255.0;
        for c in 0..3 {
            let v = pixel[c] as f32 * a + bg[c] * (1.0 - a);
            rgb.push(v.round().clamp(0.0, 255.0) as u8);
        }
    }
    rgb
}
