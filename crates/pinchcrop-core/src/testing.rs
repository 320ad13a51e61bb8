//! Headless host used by the lifecycle tests.

use image::{Rgba, RgbaImage};

use crate::error::CropperError;
use crate::geometry::{ContainerFrame, Size};
use crate::lifecycle::{Host, ImageAsset, LoadRequest};
use crate::render::RasterSurface;

/// Records what the cropper asked of it; loads complete only when a test
/// calls `on_image_loaded`.
#[derive(Debug, Default)]
pub(crate) struct HeadlessHost {
    pub frame: Size,
    pub requests: Vec<LoadRequest>,
    pub mounted: usize,
    pub gestures_attached: bool,
    pub resize_subscriptions: usize,
}

impl HeadlessHost {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            frame: Size::new(width, height),
            ..Self::default()
        }
    }
}

impl Host for HeadlessHost {
    type Surface = RasterSurface;

    fn container_frame(&self) -> ContainerFrame {
        self.frame
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<RasterSurface, CropperError> {
        Ok(RasterSurface::new(width, height))
    }

    fn mount(&mut self, _surface: &RasterSurface) {
        self.mounted += 1;
    }

    fn unmount(&mut self, _surface: &RasterSurface) {
        self.mounted = self.mounted.saturating_sub(1);
    }

    fn load_image(&mut self, request: LoadRequest) {
        self.requests.push(request);
    }

    fn attach_gestures(&mut self, _surface: &RasterSurface) {
        self.gestures_attached = true;
    }

    fn detach_gestures(&mut self) {
        self.gestures_attached = false;
    }

    fn subscribe_resize(&mut self) {
        self.resize_subscriptions += 1;
    }

    fn unsubscribe_resize(&mut self) {
        self.resize_subscriptions = self.resize_subscriptions.saturating_sub(1);
    }
}

/// Red channel of [`gradient`] at column `x`.
pub(crate) fn gradient_red(x: u32, width: u32) -> u8 {
    (x * 255 / width.saturating_sub(1).max(1)) as u8
}

/// Opaque test image: red rises left to right, green top to bottom.
pub(crate) fn gradient(width: u32, height: u32) -> ImageAsset<RgbaImage> {
    let bitmap = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            gradient_red(x, width),
            gradient_red(y, height),
            128,
            255,
        ])
    });
    ImageAsset::new(width, height, bitmap)
}
