//! Geometry engine: crop-box placement, cover scale and pan limits.
//!
//! # Coordinate Systems
//!
//! - **Container space**: pixels of the on-screen container, origin top-left.
//!   The crop box and the view offset both live here.
//! - **Natural image space**: pixels of the unscaled source image.
//!
//! A view is `(offset_x, offset_y, scale)`: the image's top-left corner in
//! container space and its render scale. A point `p` in natural image space
//! is drawn at `offset + p * scale`.
//!
//! Everything in this module is pure; [`Viewport`] wraps the functions into
//! the state transitions used by the rest of the crate.

mod centroid;
mod viewport;

pub use centroid::centroid;
pub use viewport::{CropRect, OffsetRange, ViewState, Viewport};

use serde::{Deserialize, Serialize};

use crate::config::CropperConfig;
use crate::error::ConfigError;

/// A point in container space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of something.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Current size of the container element in device-independent pixels.
pub type ContainerFrame = Size;

/// Crop-box placement within the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub width: f64,
    pub height: f64,
    /// Top-left corner in container space.
    pub origin_x: f64,
    pub origin_y: f64,
}

impl CropBox {
    /// Compute the crop box for `frame` from `config`.
    ///
    /// Explicit `width`/`height` win. A missing dimension follows from
    /// `aspect_ratio`. With neither given, the box is fitted into the
    /// container at `contain_ratio`, constrained by whichever side is
    /// tighter for the requested aspect ratio. The box is always centered.
    ///
    /// Fails if the box would be empty or a circle is requested for a
    /// non-square box.
    pub fn compute(frame: ContainerFrame, config: &CropperConfig) -> Result<CropBox, ConfigError> {
        let aspect = config.aspect_ratio;
        let (width, height) = match (config.width, config.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w / aspect),
            (None, Some(h)) => (h * aspect, h),
            (None, None) => {
                if aspect > frame.aspect_ratio() {
                    let w = frame.width * config.contain_ratio;
                    (w, w / aspect)
                } else {
                    let h = frame.height * config.contain_ratio;
                    (h * aspect, h)
                }
            }
        };

        // A collapsed container yields an empty box
        for (name, value) in [("cropBoxWidth", width), ("cropBoxHeight", height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        if config.circle && (width - height).abs() > f64::EPSILON * width.max(height) {
            return Err(ConfigError::CircleRequiresSquare { width, height });
        }

        Ok(CropBox::centered(frame, width, height))
    }

    /// A `width`×`height` box centered in `frame`.
    pub fn centered(frame: ContainerFrame, width: f64, height: f64) -> CropBox {
        CropBox {
            width,
            height,
            origin_x: (frame.width - width) / 2.0,
            origin_y: (frame.height - height) / 2.0,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin_x + self.width / 2.0,
            self.origin_y + self.height / 2.0,
        )
    }
}

/// Smallest scale at which an `image` still covers a `crop` box on both axes.
pub fn min_scale(crop: Size, image: Size) -> f64 {
    (crop.width / image.width).max(crop.height / image.height)
}

/// Zoom can never go below full cover.
#[inline]
pub fn resolve_scale(requested: f64, min_scale: f64) -> f64 {
    requested.max(min_scale)
}

/// Clamp one axis of the view offset so the crop box never samples outside
/// the image.
#[inline]
pub fn clamp_offset(
    candidate: f64,
    scale: f64,
    crop_origin: f64,
    crop_size: f64,
    image_size: f64,
) -> f64 {
    OffsetRange::for_axis(scale, crop_origin, crop_size, image_size).clamp(candidate)
}

/// Offset that centers the scaled image over the crop box.
pub fn centered_offset(crop: &CropBox, image: Size, scale: f64) -> Point {
    Point::new(
        crop.origin_x - (image.width * scale - crop.width) / 2.0,
        crop.origin_y - (image.height * scale - crop.height) / 2.0,
    )
}
