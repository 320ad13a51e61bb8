//! Cropper configuration.
//!
//! Options mirror the JS constructor options (camelCase keys) so a plain
//! options object can be deserialized directly. Every field has a default;
//! call [`CropperConfig::validate`] before using a config.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the crop-box border is drawn relative to the nominal box edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderOrigin {
    /// Border sits entirely outside the box; the image under it stays undimmed.
    #[default]
    Out,
    /// Border sits entirely inside the box.
    In,
    /// Border straddles the box edge, half inside and half outside.
    Middle,
}

impl BorderOrigin {
    /// Per-side growth of the cutout hole for a border of `width`.
    pub fn cutout_spread(self, width: f64) -> f64 {
        match self {
            BorderOrigin::Out => width,
            BorderOrigin::In => -width,
            BorderOrigin::Middle => 0.0,
        }
    }

    /// Per-side offset of the stroke centerline for a border of `width`.
    pub fn stroke_spread(self, width: f64) -> f64 {
        self.cutout_spread(width) / 2.0
    }
}

impl FromStr for BorderOrigin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out" => Ok(BorderOrigin::Out),
            "in" => Ok(BorderOrigin::In),
            "middle" => Ok(BorderOrigin::Middle),
            other => Err(ConfigError::InvalidBorderOrigin(other.to_string())),
        }
    }
}

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 1.0);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 1.0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: (self.a as f64 * opacity).clamp(0.0, 1.0) as f32,
            ..self
        }
    }

    /// CSS `rgba()` representation, suitable for canvas fill/stroke styles.
    pub fn to_css(self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    /// Alpha as an 8-bit channel value.
    pub fn alpha_u8(self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::rgba(51, 153, 255, 0.75)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let value = s.trim().to_ascii_lowercase();

        match value.as_str() {
            "transparent" => return Ok(Color::TRANSPARENT),
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            _ => {}
        }

        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let body = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(invalid());
        }

        let channel = |part: &str| -> Result<u8, ConfigError> {
            let v: f64 = part.parse().map_err(|_| invalid())?;
            if !v.is_finite() {
                return Err(invalid());
            }
            Ok(v.clamp(0.0, 255.0).round() as u8)
        };

        let alpha = match parts.get(3) {
            Some(part) => {
                let v: f32 = part.parse().map_err(|_| invalid())?;
                if !v.is_finite() {
                    return Err(invalid());
                }
                v.clamp(0.0, 1.0)
            }
            None => 1.0,
        };

        Ok(Color::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha,
        ))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match hex.len() {
        3 => Some(Color::rgba(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            1.0,
        )),
        6 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, 1.0)),
        8 => Some(Color::rgba(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)? as f32 / 255.0,
        )),
        _ => None,
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_css()
    }
}

/// Options accepted when creating a cropper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropperConfig {
    /// Fixed crop-box width in container pixels.
    pub width: Option<f64>,
    /// Fixed crop-box height in container pixels.
    pub height: Option<f64>,
    /// Width / height of the crop box, used for any dimension not given explicitly.
    pub aspect_ratio: f64,
    /// Fraction of the container an auto-sized crop box occupies (≤ 1).
    pub contain_ratio: f64,
    /// Circular mask; the crop box must be square.
    pub circle: bool,
    /// Overlay alpha outside the crop box.
    pub modal_opacity: f64,
    pub border_color: Color,
    pub border_width: f64,
    pub border_origin: BorderOrigin,
    /// Subscribe to window resize notifications once ready.
    pub responsive: bool,
    /// Keep the current crop region when reacting to a window resize.
    pub restore: bool,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            aspect_ratio: 1.0,
            contain_ratio: 0.92,
            circle: false,
            modal_opacity: 0.6,
            border_color: Color::default(),
            border_width: 1.0,
            border_origin: BorderOrigin::Out,
            responsive: true,
            restore: true,
        }
    }
}

impl CropperConfig {
    /// Check every container-independent constraint.
    ///
    /// The circle/square constraint depends on the container when the box is
    /// auto-sized and is checked by [`crate::geometry::CropBox::compute`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("aspectRatio", self.aspect_ratio)?;
        positive("containRatio", self.contain_ratio)?;
        if self.contain_ratio > 1.0 {
            return Err(ConfigError::ContainRatioTooLarge(self.contain_ratio));
        }
        if let Some(width) = self.width {
            positive("width", width)?;
        }
        if let Some(height) = self.height {
            positive("height", height)?;
        }
        if !(0.0..=1.0).contains(&self.modal_opacity) {
            return Err(ConfigError::OpacityOutOfRange(self.modal_opacity));
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(ConfigError::InvalidBorderWidth(self.border_width));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
