//! CPU raster surface backed by an `image::RgbaImage`.
//!
//! Coverage is sampled once at each pixel center (no anti-aliasing). Images
//! are resampled by mapping every destination pixel center back to a
//! fractional source position, so a source rectangle is sampled exactly even
//! when it does not fall on pixel boundaries.

use std::f64::consts::PI;

use image::{Rgba, RgbaImage};

use super::{CompositeMode, Rect, Shape, Surface};
use crate::config::Color;

/// Straight-alpha RGBA in `[0, 1]`.
type Rgbaf = [f32; 4];

/// Resampling used when an image is drawn at a different size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resample {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

/// One source pixel contributing to an output pixel.
#[derive(Debug, Clone, Copy)]
struct Tap {
    index: u32,
    weight: f32,
}

impl Resample {
    fn support(self) -> f64 {
        match self {
            Resample::Nearest => 0.0,
            Resample::Bilinear => 1.0,
            Resample::Lanczos3 => 3.0,
        }
    }

    fn kernel(self, x: f64) -> f64 {
        match self {
            Resample::Nearest => 1.0,
            Resample::Bilinear => (1.0 - x.abs()).max(0.0),
            Resample::Lanczos3 if x.abs() < 3.0 => sinc(x) * sinc(x / 3.0),
            Resample::Lanczos3 => 0.0,
        }
    }

    /// Filter taps along one axis for `count` output pixels.
    ///
    /// Output pixel `i` covers source positions starting at
    /// `origin + i * step`; `len` is the source extent, and taps past either
    /// edge repeat the edge pixel. When shrinking, the kernel is widened by
    /// `step` so every source pixel contributes.
    fn taps(self, origin: f64, step: f64, count: u32, len: u32) -> Vec<Vec<Tap>> {
        let last = i64::from(len.saturating_sub(1));
        let spread = step.max(1.0);
        let radius = self.support() * spread;

        (0..count)
            .map(|i| {
                let center = origin + (f64::from(i) + 0.5) * step;
                let nearest = Tap {
                    index: (center.floor() as i64).clamp(0, last) as u32,
                    weight: 1.0,
                };
                if self == Resample::Nearest {
                    return vec![nearest];
                }

                let lo = (center - 0.5 - radius).ceil() as i64;
                let hi = (center - 0.5 + radius).floor() as i64;
                let mut taps: Vec<Tap> = (lo..=hi)
                    .filter_map(|k| {
                        let weight = self.kernel((k as f64 + 0.5 - center) / spread) as f32;
                        (weight != 0.0).then_some(Tap {
                            index: k.clamp(0, last) as u32,
                            weight,
                        })
                    })
                    .collect();

                let total: f32 = taps.iter().map(|t| t.weight).sum();
                if total.abs() < f32::EPSILON {
                    return vec![nearest];
                }
                for tap in &mut taps {
                    tap.weight /= total;
                }
                taps
            })
            .collect()
    }
}

/// An in-memory drawing surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
    filter: Resample,
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            filter: Resample::default(),
        }
    }

    /// Use `filter` when scaling images onto this surface.
    pub fn with_filter(mut self, filter: Resample) -> Self {
        self.filter = filter;
        self
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| *self.pixels.get_pixel(x, y))
    }

    fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn composite(&mut self, x: u32, y: u32, src: Rgbaf, mode: CompositeMode) {
        let dst = to_float(*self.pixels.get_pixel(x, y));
        let out = match mode {
            CompositeMode::Replace => src,
            CompositeMode::SourceOver => source_over(src, dst),
            CompositeMode::CutOut => [dst[0], dst[1], dst[2], dst[3] * (1.0 - src[3])],
            CompositeMode::DrawUnder => source_over(dst, src),
        };
        self.pixels.put_pixel(x, y, to_u8(out));
    }
}

impl Surface for RasterSurface {
    type Image = RgbaImage;

    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    fn fill(&mut self, shape: &Shape, color: Color, mode: CompositeMode) {
        let src = color_to_float(color);
        for y in 0..self.pixels.height() {
            for x in 0..self.pixels.width() {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                if contains(shape, px, py) {
                    self.composite(x, y, src, mode);
                } else if mode == CompositeMode::Replace {
                    self.pixels.put_pixel(x, y, Rgba([0, 0, 0, 0]));
                }
            }
        }
    }

    fn stroke(&mut self, shape: &Shape, color: Color, line_width: f64) {
        let src = color_to_float(color);
        let half = line_width / 2.0;
        for y in 0..self.pixels.height() {
            for x in 0..self.pixels.width() {
                if on_stroke(shape, x as f64 + 0.5, y as f64 + 0.5, half) {
                    self.composite(x, y, src, CompositeMode::SourceOver);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, src: Rect, dest: Rect, mode: CompositeMode) {
        if mode == CompositeMode::Replace {
            self.clear();
        }
        if dest.width <= 0.0 || dest.height <= 0.0 || src.width <= 0.0 || src.height <= 0.0 {
            return;
        }
        if image.width() == 0 || image.height() == 0 {
            return;
        }

        let (surface_w, surface_h) = (self.pixels.width() as f64, self.pixels.height() as f64);
        let vx0 = dest.x.round().clamp(0.0, surface_w);
        let vy0 = dest.y.round().clamp(0.0, surface_h);
        let vx1 = (dest.x + dest.width).round().clamp(0.0, surface_w);
        let vy1 = (dest.y + dest.height).round().clamp(0.0, surface_h);
        if vx1 <= vx0 || vy1 <= vy0 {
            return;
        }

        // Source position of the visible window's top-left corner
        let kx = src.width / dest.width;
        let ky = src.height / dest.height;
        let sx0 = src.x + (vx0 - dest.x) * kx;
        let sy0 = src.y + (vy0 - dest.y) * ky;

        let (out_w, out_h) = ((vx1 - vx0) as u32, (vy1 - vy0) as u32);
        let columns = self.filter.taps(sx0, kx, out_w, image.width());
        let rows = self.filter.taps(sy0, ky, out_h, image.height());
        let scaled = resample(image, &columns, &rows);

        let (left, top) = (vx0 as u32, vy0 as u32);
        for (y, line) in scaled.chunks(out_w as usize).enumerate() {
            for (x, pixel) in line.iter().enumerate() {
                self.composite(left + x as u32, top + y as u32, *pixel, mode);
            }
        }
    }
}

/// Separable resampling through precomputed taps. Returns straight-alpha
/// pixels in row-major order, `columns.len()` per row.
fn resample(image: &RgbaImage, columns: &[Vec<Tap>], rows: &[Vec<Tap>]) -> Vec<Rgbaf> {
    let width = columns.len();
    let (first_row, last_row) = rows
        .iter()
        .flatten()
        .fold((u32::MAX, 0), |(lo, hi), tap| (lo.min(tap.index), hi.max(tap.index)));
    if width == 0 || first_row > last_row {
        return Vec::new();
    }

    // Horizontal pass over just the rows the vertical taps read
    let mut horizontal = vec![[0.0f32; 4]; width * (last_row - first_row + 1) as usize];
    for (line, y) in horizontal.chunks_mut(width).zip(first_row..=last_row) {
        for (out, taps) in line.iter_mut().zip(columns) {
            for tap in taps {
                let pixel = premultiply(to_float(*image.get_pixel(tap.index, y)));
                accumulate(out, pixel, tap.weight);
            }
        }
    }

    let mut out = Vec::with_capacity(width * rows.len());
    for taps in rows {
        for x in 0..width {
            let mut acc = [0.0f32; 4];
            for tap in taps {
                let line = (tap.index - first_row) as usize;
                accumulate(&mut acc, horizontal[line * width + x], tap.weight);
            }
            out.push(unpremultiply(acc));
        }
    }
    out
}

fn accumulate(acc: &mut Rgbaf, pixel: Rgbaf, weight: f32) {
    for (a, p) in acc.iter_mut().zip(pixel) {
        *a += p * weight;
    }
}

fn premultiply(c: Rgbaf) -> Rgbaf {
    [c[0] * c[3], c[1] * c[3], c[2] * c[3], c[3]]
}

fn unpremultiply(c: Rgbaf) -> Rgbaf {
    let alpha = c[3].clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return [0.0; 4];
    }
    [c[0] / alpha, c[1] / alpha, c[2] / alpha, alpha]
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-9 {
        return 1.0;
    }
    let px = PI * x;
    px.sin() / px
}

fn contains(shape: &Shape, x: f64, y: f64) -> bool {
    match *shape {
        Shape::Rect(r) => x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height,
        Shape::Circle { cx, cy, radius } => {
            let (dx, dy) = (x - cx, y - cy);
            dx * dx + dy * dy <= radius * radius
        }
    }
}

fn on_stroke(shape: &Shape, x: f64, y: f64, half: f64) -> bool {
    match *shape {
        Shape::Rect(r) => {
            let outer = Rect::new(r.x - half, r.y - half, r.width + 2.0 * half, r.height + 2.0 * half);
            let inner = Rect::new(r.x + half, r.y + half, r.width - 2.0 * half, r.height - 2.0 * half);
            let in_inner = inner.width > 0.0 && inner.height > 0.0 && contains(&Shape::Rect(inner), x, y);
            contains(&Shape::Rect(outer), x, y) && !in_inner
        }
        Shape::Circle { cx, cy, radius } => {
            let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            (d - radius).abs() <= half
        }
    }
}

fn source_over(src: Rgbaf, dst: Rgbaf) -> Rgbaf {
    let out_a = src[3] + dst[3] * (1.0 - src[3]);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let channel = |i: usize| (src[i] * src[3] + dst[i] * dst[3] * (1.0 - src[3])) / out_a;
    [channel(0), channel(1), channel(2), out_a]
}

fn to_float(p: Rgba<u8>) -> Rgbaf {
    let [r, g, b, a] = p.0;
    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}

fn color_to_float(color: Color) -> Rgbaf {
    [
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        color.a.clamp(0.0, 1.0),
    ]
}

fn to_u8(c: Rgbaf) -> Rgba<u8> {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([q(c[0]), q(c[1]), q(c[2]), q(c[3])])
}
