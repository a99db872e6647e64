//! Error types returned by the viewer core.

use crate::geometry::{ImageExtent, OutputSurface, Rect};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when decoding a region of the image.
///
/// Decode failures are recoverable: the view keeps its current window and the
/// last good frame.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("region {region:?} is outside the {}x{} image", extent.width, extent.height)]
    OutOfBounds { region: Rect, extent: ImageExtent },
    #[error("region {0:?} is empty")]
    EmptyRegion(Rect),
    #[error(
        "image changed on disk: expected {}x{}, decoded {}x{}",
        expected.width, expected.height, actual.width, actual.height
    )]
    SizeChanged {
        expected: ImageExtent,
        actual: ImageExtent,
    },
    #[error("failed to decode image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors that can occur when opening an image for region decoding.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read image header of '{path}': {source}")]
    Header {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("image '{path}' has no pixels ({}x{})", extent.width, extent.height)]
    EmptyImage { path: PathBuf, extent: ImageExtent },
}

/// Errors returned by [`BigImageView`](crate::BigImageView) operations.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("no image is open")]
    NoImage,
    #[error("cannot lay out a {}x{} image on a {}x{} surface", extent.width, extent.height, surface.width, surface.height)]
    DegenerateLayout {
        surface: OutputSurface,
        extent: ImageExtent,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors that can occur when loading the viewer configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::de::SpannedError),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
