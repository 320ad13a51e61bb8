//! Headless image decoding.
//!
//! Browsers hand the cropper an already-decoded `<img>`; everywhere else the
//! bytes are decoded here into an [`ImageAsset`](crate::ImageAsset) backed by
//! an `RgbaImage`, with EXIF orientation applied so the natural size matches
//! what a browser would display.

mod source;
mod types;

pub use source::decode_image;
pub use types::{DecodeError, Orientation};
