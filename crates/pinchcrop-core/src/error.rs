//! Error types shared by the cropper engine.

use thiserror::Error;

/// Invalid cropper configuration.
///
/// Raised synchronously while constructing a cropper; no instance is
/// produced when validation fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `containRatio` above 1 would make the crop box larger than its container.
    #[error("containRatio must be less than or equal to 1, got {0}")]
    ContainRatioTooLarge(f64),

    /// A size or ratio that must be strictly positive and finite was not.
    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// `modalOpacity` outside `[0, 1]`.
    #[error("modalOpacity must be within [0, 1], got {0}")]
    OpacityOutOfRange(f64),

    /// Negative or non-finite `borderWidth`.
    #[error("borderWidth must be a non-negative finite number, got {0}")]
    InvalidBorderWidth(f64),

    /// The border color string is not a supported CSS color.
    #[error("unsupported color: {0:?}")]
    InvalidColor(String),

    /// `borderOrigin` is not one of `out`, `in` or `middle`.
    #[error("unsupported borderOrigin: {0:?}")]
    InvalidBorderOrigin(String),

    /// A circular mask needs a square crop box.
    #[error("can't use a circle crop box when width ({width}) is not equal to height ({height})")]
    CircleRequiresSquare { width: f64, height: f64 },
}

/// Errors returned by cropper operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropperError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// `crop` was called before the first image finished loading.
    #[error("can't crop before ready")]
    NotReady,

    /// The instance was torn down.
    #[error("cropper has been destroyed")]
    Destroyed,

    /// The requested output size is not a positive finite number, or the
    /// surface it implies is too large to allocate.
    #[error("invalid output size value: {0}")]
    InvalidOutputSize(f64),

    /// The crop mode string is not one of the supported modes.
    #[error("unsupported crop mode: {0:?}")]
    InvalidCropMode(String),

    /// The host platform failed to provide a resource (e.g. a drawing surface).
    #[error("platform error: {0}")]
    Platform(String),
}

/// Why an image source could not be turned into an [`ImageAsset`](crate::ImageAsset).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The platform reported a failure (network, CORS, missing file).
    #[error("failed to load image {src:?}: {reason}")]
    Failed { src: String, reason: String },

    /// The bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The image loaded but the cropper could not be set up around it.
    #[error("failed to show image: {0}")]
    Setup(String),
}
