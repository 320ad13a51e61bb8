//! Render coordinator: composites overlay, crop-box cutout, border and image.
//!
//! # Paint Order
//!
//! Every paint runs four passes, in this order, against a [`Surface`]:
//! 1. Reset the whole surface to transparent ([`CompositeMode::Replace`])
//! 2. Fill it with the dimming overlay
//! 3. Cut the crop-box hole out of the overlay ([`CompositeMode::CutOut`]),
//!    then stroke the border
//! 4. Draw the image *beneath* everything ([`CompositeMode::DrawUnder`]), so
//!    it shows at full strength through the hole and dimmed elsewhere
//!
//! A paint always takes the complete view; nothing is drawn incrementally.

mod raster;

pub use raster::{RasterSurface, Resample};

use crate::config::{BorderOrigin, Color, CropperConfig};
use crate::geometry::{ContainerFrame, CropBox, CropRect, ViewState};

/// How a drawing operation combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Replace the surface: drawn area takes the source, everything else is cleared.
    Replace,
    /// Normal alpha blending over existing content.
    SourceOver,
    /// Erase existing content where the source is drawn.
    CutOut,
    /// Draw behind existing content.
    DrawUnder,
}

impl CompositeMode {
    /// The canvas `globalCompositeOperation` name for this mode.
    pub fn as_css(self) -> &'static str {
        match self {
            CompositeMode::Replace => "copy",
            CompositeMode::SourceOver => "source-over",
            CompositeMode::CutOut => "destination-out",
            CompositeMode::DrawUnder => "destination-over",
        }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<CropRect> for Rect {
    fn from(rect: CropRect) -> Self {
        Rect::new(rect.x, rect.y, rect.width, rect.height)
    }
}

/// Path primitives a surface must be able to fill and stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Circle { cx: f64, cy: f64, radius: f64 },
}

impl Shape {
    /// The crop-box outline grown by `spread` on every side (negative shrinks).
    pub fn crop_box(crop: &CropBox, circle: bool, spread: f64) -> Shape {
        if circle {
            let center = crop.center();
            Shape::Circle {
                cx: center.x,
                cy: center.y,
                radius: (crop.width / 2.0 + spread).max(0.0),
            }
        } else {
            Shape::Rect(Rect::new(
                crop.origin_x - spread,
                crop.origin_y - spread,
                (crop.width + 2.0 * spread).max(0.0),
                (crop.height + 2.0 * spread).max(0.0),
            ))
        }
    }
}

/// Raster drawing target.
///
/// Implemented by a `<canvas>` 2D context in the browser and by
/// [`RasterSurface`] everywhere else. Drawing never fails from the caller's
/// point of view; implementations report platform failures themselves.
pub trait Surface {
    /// Bitmap type this surface can draw from.
    type Image;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize the backing store; contents are discarded.
    fn set_size(&mut self, width: u32, height: u32);

    fn fill(&mut self, shape: &Shape, color: Color, mode: CompositeMode);

    /// Stroke a shape outline centered on its path, with source-over blending.
    fn stroke(&mut self, shape: &Shape, color: Color, line_width: f64);

    /// Draw the `src` region of `image` (natural pixels) into `dest` (surface pixels).
    fn draw_image(&mut self, image: &Self::Image, src: Rect, dest: Rect, mode: CompositeMode);
}

/// Everything the coordinator needs to know about the mask's appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskStyle {
    pub circle: bool,
    pub modal_opacity: f64,
    pub border_color: Color,
    pub border_width: f64,
    pub border_origin: BorderOrigin,
}

impl From<&CropperConfig> for MaskStyle {
    fn from(config: &CropperConfig) -> Self {
        Self {
            circle: config.circle,
            modal_opacity: config.modal_opacity,
            border_color: config.border_color,
            border_width: config.border_width,
            border_origin: config.border_origin,
        }
    }
}

/// Paint one complete frame.
pub fn paint<S: Surface>(
    surface: &mut S,
    frame: ContainerFrame,
    crop: &CropBox,
    style: &MaskStyle,
    image: &S::Image,
    image_size: (u32, u32),
    view: &ViewState,
) {
    let full = Shape::Rect(Rect::new(0.0, 0.0, frame.width, frame.height));

    surface.fill(&full, Color::TRANSPARENT, CompositeMode::Replace);

    surface.fill(
        &full,
        Color::BLACK.with_opacity(style.modal_opacity),
        CompositeMode::SourceOver,
    );

    let hole = Shape::crop_box(
        crop,
        style.circle,
        style.border_origin.cutout_spread(style.border_width),
    );
    surface.fill(&hole, Color::BLACK, CompositeMode::CutOut);
    if style.border_width > 0.0 {
        let outline = Shape::crop_box(
            crop,
            style.circle,
            style.border_origin.stroke_spread(style.border_width),
        );
        surface.stroke(&outline, style.border_color, style.border_width);
    }

    let (natural_w, natural_h) = image_size;
    let (natural_w, natural_h) = (natural_w as f64, natural_h as f64);
    surface.draw_image(
        image,
        Rect::new(0.0, 0.0, natural_w, natural_h),
        Rect::new(
            view.offset_x,
            view.offset_y,
            natural_w * view.scale,
            natural_h * view.scale,
        ),
        CompositeMode::DrawUnder,
    );
}
