//! `<canvas>`-backed drawing surface.
//!
//! Each draw call saves the 2D context, sets the composite operation and
//! style it needs, and restores afterwards, so no drawing state leaks
//! between passes. Canvas calls that can fail are logged and skipped.

use std::f64::consts::TAU;

use pinchcrop_core::{Color, CompositeMode, CropperError, Rect, Shape, Surface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement};

/// A canvas element together with its 2D context.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Create a detached `width`×`height` canvas.
    pub fn create(document: &Document, width: u32, height: u32) -> Result<Self, CropperError> {
        let canvas = document
            .create_element("canvas")
            .map_err(platform_error)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| CropperError::Platform("created element is not a canvas".to_string()))?;
        canvas.set_width(width);
        canvas.set_height(height);

        let context = canvas
            .get_context("2d")
            .map_err(platform_error)?
            .ok_or_else(|| CropperError::Platform("2d context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| CropperError::Platform("unexpected 2d context type".to_string()))?;

        Ok(Self { canvas, context })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn into_canvas(self) -> HtmlCanvasElement {
        self.canvas
    }

    fn begin(&self, mode: CompositeMode) {
        self.context.save();
        report(
            self.context.set_global_composite_operation(mode.as_css()),
            "globalCompositeOperation",
        );
    }

    fn end(&self) {
        self.context.restore();
    }

    fn trace(&self, shape: &Shape) {
        self.context.begin_path();
        match *shape {
            Shape::Rect(Rect {
                x,
                y,
                width,
                height,
            }) => self.context.rect(x, y, width, height),
            Shape::Circle { cx, cy, radius } => {
                report(self.context.arc(cx, cy, radius, 0.0, TAU), "arc");
            }
        }
    }
}

impl Surface for CanvasSurface {
    type Image = HtmlImageElement;

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn fill(&mut self, shape: &Shape, color: Color, mode: CompositeMode) {
        self.begin(mode);
        self.context.set_fill_style_str(&color.to_css());
        self.trace(shape);
        self.context.fill();
        self.end();
    }

    fn stroke(&mut self, shape: &Shape, color: Color, line_width: f64) {
        self.begin(CompositeMode::SourceOver);
        self.context.set_stroke_style_str(&color.to_css());
        self.context.set_line_width(line_width);
        self.trace(shape);
        self.context.stroke();
        self.end();
    }

    fn draw_image(&mut self, image: &HtmlImageElement, src: Rect, dest: Rect, mode: CompositeMode) {
        self.begin(mode);
        report(
            self.context
                .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    image,
                    src.x,
                    src.y,
                    src.width,
                    src.height,
                    dest.x,
                    dest.y,
                    dest.width,
                    dest.height,
                ),
            "drawImage",
        );
        self.end();
    }
}

pub(crate) fn platform_error(error: JsValue) -> CropperError {
    CropperError::Platform(format!("{error:?}"))
}

fn report(result: Result<(), JsValue>, call: &'static str) {
    if let Err(error) = result {
        tracing::warn!(call, ?error, "canvas call failed");
    }
}
