//! Decode encoded image bytes (JPEG, PNG) with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader, RgbaImage};

use super::{DecodeError, Orientation};
use crate::lifecycle::ImageAsset;

/// Decode image bytes, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format can't be detected,
/// `DecodeError::CorruptedFile` if decoding fails, and `DecodeError::Empty`
/// for images without pixels.
pub fn decode_image(bytes: &[u8]) -> Result<ImageAsset<RgbaImage>, DecodeError> {
    let orientation = extract_orientation(bytes);
    let img = decode_dynamic(bytes)?;
    into_asset(orientation.apply(img))
}

fn decode_dynamic(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

fn into_asset(img: DynamicImage) -> Result<ImageAsset<RgbaImage>, DecodeError> {
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty { width, height });
    }
    Ok(ImageAsset::new(width, height, rgba))
}

/// EXIF orientation of encoded image bytes; `Normal` when absent.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 255, 0, 255])
            }
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let asset = decode_image(&png_bytes(3, 2)).unwrap();
        assert_eq!((asset.width(), asset.height()), (3, 2));
        assert_eq!(asset.bitmap().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(asset.bitmap().get_pixel(2, 1).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = png_bytes(8, 8);
        assert!(decode_image(&bytes[..20]).is_err());
    }

    #[test]
    fn test_orientation_without_exif() {
        assert_eq!(extract_orientation(&png_bytes(1, 1)), Orientation::Normal);
        assert_eq!(extract_orientation(&[0x00]), Orientation::Normal);
    }
}
