//! View state and the transitions that keep it valid.

use serde::{Deserialize, Serialize};

use super::{centered_offset, min_scale, resolve_scale, CropBox, Point, Size};

/// Image placement: top-left corner in container space plus render scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

/// Legal offsets on one axis for a given scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetRange {
    pub min: f64,
    pub max: f64,
}

impl OffsetRange {
    /// The image's far edge may not move inside the crop box, nor its near edge past it.
    pub fn for_axis(scale: f64, crop_origin: f64, crop_size: f64, image_size: f64) -> Self {
        Self {
            min: crop_origin - (image_size * scale - crop_size),
            max: crop_origin,
        }
    }

    /// Clamp `value` into the range.
    ///
    /// Rounding can leave `min` a hair above `max` at exactly the cover
    /// scale; `max` wins in that case.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        value >= self.min - tolerance && value <= self.max + tolerance
    }
}

/// The crop region in natural image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Geometry of one loaded image under one crop box, plus the current view.
///
/// Every mutation funnels through [`Viewport::apply`], so after any call the
/// scale is at least the cover scale and both offsets are inside their
/// ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    crop_box: CropBox,
    image: Size,
    min_scale: f64,
    range_x: OffsetRange,
    range_y: OffsetRange,
    view: ViewState,
}

impl Viewport {
    /// Image centered over the crop box at the cover scale.
    pub fn new(crop_box: CropBox, image: Size) -> Self {
        let min_scale = min_scale(crop_box.size(), image);
        let offset = centered_offset(&crop_box, image, min_scale);
        let mut viewport = Self {
            crop_box,
            image,
            min_scale,
            range_x: OffsetRange::for_axis(min_scale, crop_box.origin_x, crop_box.width, image.width),
            range_y: OffsetRange::for_axis(
                min_scale,
                crop_box.origin_y,
                crop_box.height,
                image.height,
            ),
            view: ViewState {
                offset_x: offset.x,
                offset_y: offset.y,
                scale: min_scale,
            },
        };
        viewport.apply(offset.x, offset.y, min_scale);
        viewport
    }

    pub fn crop_box(&self) -> &CropBox {
        &self.crop_box
    }

    pub fn image_size(&self) -> Size {
        self.image
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn offset(&self) -> Point {
        Point::new(self.view.offset_x, self.view.offset_y)
    }

    pub fn scale(&self) -> f64 {
        self.view.scale
    }

    /// Current scale relative to the cover scale (1.0 = fully zoomed out).
    pub fn zoom_ratio(&self) -> f64 {
        self.view.scale / self.min_scale
    }

    pub fn offset_ranges(&self) -> (OffsetRange, OffsetRange) {
        (self.range_x, self.range_y)
    }

    /// Move to a requested view, resolving the scale and clamping offsets.
    ///
    /// Offset ranges depend on the scale and are only recomputed when it
    /// changes.
    pub fn apply(&mut self, offset_x: f64, offset_y: f64, scale: f64) -> ViewState {
        let scale = resolve_scale(scale, self.min_scale);
        if scale != self.view.scale {
            let crop = &self.crop_box;
            self.range_x = OffsetRange::for_axis(scale, crop.origin_x, crop.width, self.image.width);
            self.range_y =
                OffsetRange::for_axis(scale, crop.origin_y, crop.height, self.image.height);
        }
        self.view = ViewState {
            offset_x: self.range_x.clamp(offset_x),
            offset_y: self.range_y.clamp(offset_y),
            scale,
        };
        self.view
    }

    /// Recenter at the cover scale.
    pub fn center(&mut self) -> ViewState {
        let offset = centered_offset(&self.crop_box, self.image, self.min_scale);
        self.apply(offset.x, offset.y, self.min_scale)
    }

    /// Translate the image by a container-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> ViewState {
        self.apply(self.view.offset_x + dx, self.view.offset_y + dy, self.view.scale)
    }

    /// Visible crop region in natural image pixels.
    pub fn crop_rect(&self) -> CropRect {
        let ViewState {
            offset_x,
            offset_y,
            scale,
        } = self.view;
        CropRect {
            x: (self.crop_box.origin_x - offset_x) / scale,
            y: (self.crop_box.origin_y - offset_y) / scale,
            width: self.crop_box.width / scale,
            height: self.crop_box.height / scale,
        }
    }

    /// The same image under a new crop box.
    ///
    /// With `preserve`, the current crop rectangle's top-left corner and the
    /// zoom ratio relative to the cover scale carry over; otherwise the view
    /// is recentered. An unchanged crop box keeps the view as-is.
    pub fn refit(&self, crop_box: CropBox, preserve: bool) -> Viewport {
        let mut next = Viewport::new(crop_box, self.image);
        if !preserve {
            return next;
        }
        if crop_box == self.crop_box {
            next.apply(self.view.offset_x, self.view.offset_y, self.view.scale);
            return next;
        }

        let rect = self.crop_rect();
        let scale = next.min_scale * self.zoom_ratio();
        next.apply(
            crop_box.origin_x - rect.x * scale,
            crop_box.origin_y - rect.y * scale,
            scale,
        );
        next
    }

    /// Whether the view satisfies the cover and bounds invariants.
    pub fn is_valid(&self, tolerance: f64) -> bool {
        let crop = &self.crop_box;
        let scale = self.view.scale;
        let range_x = OffsetRange::for_axis(scale, crop.origin_x, crop.width, self.image.width);
        let range_y = OffsetRange::for_axis(scale, crop.origin_y, crop.height, self.image.height);
        scale >= self.min_scale
            && range_x.contains(self.view.offset_x, tolerance)
            && range_y.contains(self.view.offset_y, tolerance)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Pan(f64, f64),
        Apply(f64, f64, f64),
        Refit(f64, f64, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-500.0f64..500.0, -500.0f64..500.0).prop_map(|(dx, dy)| Op::Pan(dx, dy)),
            (-2000.0f64..2000.0, -2000.0f64..2000.0, 0.01f64..5.0)
                .prop_map(|(x, y, s)| Op::Apply(x, y, s)),
            (50.0f64..1200.0, 50.0f64..1200.0, any::<bool>())
                .prop_map(|(w, h, keep)| Op::Refit(w, h, keep)),
        ]
    }

    proptest! {
        /// Property: the cover and bounds invariants hold after any sequence of updates.
        #[test]
        fn prop_invariants_hold_after_any_sequence(
            (img_w, img_h) in (10.0f64..4000.0, 10.0f64..4000.0),
            ops in prop::collection::vec(op_strategy(), 1..20),
        ) {
            let frame = Size::new(300.0, 300.0);
            let mut viewport = Viewport::new(
                CropBox::centered(frame, 276.0, 276.0),
                Size::new(img_w, img_h),
            );

            for op in ops {
                match op {
                    Op::Pan(dx, dy) => { viewport.pan_by(dx, dy); }
                    Op::Apply(x, y, s) => { viewport.apply(x, y, s); }
                    Op::Refit(w, h, keep) => {
                        let side = w.min(h) * 0.92;
                        let crop = CropBox::centered(Size::new(w, h), side, side);
                        viewport = viewport.refit(crop, keep);
                    }
                }
                prop_assert!(viewport.scale() >= viewport.min_scale());
                prop_assert!(viewport.is_valid(1e-6), "view escaped bounds: {:?}", viewport.view());
            }
        }

        /// Property: the crop rectangle never leaves the image.
        #[test]
        fn prop_crop_rect_inside_image(
            (img_w, img_h) in (10.0f64..4000.0, 10.0f64..4000.0),
            (x, y, s) in (-5000.0f64..5000.0, -5000.0f64..5000.0, 0.0f64..10.0),
        ) {
            let mut viewport = Viewport::new(
                CropBox::centered(Size::new(400.0, 300.0), 200.0, 150.0),
                Size::new(img_w, img_h),
            );
            viewport.apply(x, y, s);
            let rect = viewport.crop_rect();
            let tolerance = 1e-6 * img_w.max(img_h);
            prop_assert!(rect.x >= -tolerance);
            prop_assert!(rect.y >= -tolerance);
            prop_assert!(rect.x + rect.width <= img_w + tolerance);
            prop_assert!(rect.y + rect.height <= img_h + tolerance);
        }
    }
}
