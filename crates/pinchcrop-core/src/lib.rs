//! Pinchcrop Core - image cropping engine
//!
//! This crate provides the host-independent part of the pinchcrop cropper:
//! crop-box geometry, the pan/zoom view and its invariants, gesture
//! interpretation, mask rendering against an abstract [`Surface`], and the
//! lifecycle controller that sequences image loads, readiness, resizes and
//! teardown against an abstract [`Host`].
//!
//! # Module Structure
//!
//! - `geometry` - Crop-box placement, cover scale, offset ranges, [`Viewport`]
//! - `render` - Paint order and the CPU [`RasterSurface`]
//! - `gesture` - Pinch/pan interpretation with gesture-scoped anchors
//! - `lifecycle` - [`Cropper`], [`ReadyQueue`], [`InstanceRegistry`]
//! - `output` - Output sizing for `crop`
//! - `decode` / `encode` - Headless image decoding and PNG/JPEG encoding

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod lifecycle;
pub mod output;
pub mod render;

#[cfg(test)]
mod testing;

pub use config::{BorderOrigin, Color, CropperConfig};
pub use decode::{decode_image, DecodeError, Orientation};
pub use encode::{encode_jpeg, encode_png, EncodeError};
pub use error::{ConfigError, CropperError, LoadError};
pub use geometry::{centroid, ContainerFrame, CropBox, CropRect, Point, Size, ViewState, Viewport};
pub use gesture::{GestureAnchor, GestureEvent, GestureInterpreter, GestureResponse, TouchTracker};
pub use lifecycle::{
    Cropper, Host, HostImage, ImageAsset, InstanceRegistry, LoadErrorListener, LoadRequest,
    LoadTicket, ReadyCallback, ReadyQueue, Teardown,
};
pub use output::{output_size, CropMode};
pub use render::{paint, CompositeMode, MaskStyle, RasterSurface, Rect, Resample, Shape, Surface};
