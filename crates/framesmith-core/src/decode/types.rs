//! Core types for bitmap loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::Raster;

/// Error types for bitmap loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("No image data")]
    Empty,

    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The image decoded to zero width or height.
    #[error("Image has no pixels ({width}x{height})")]
    ZeroSized { width: u32, height: u32 },

    /// The background decode task was dropped before finishing.
    #[error("Decode was cancelled")]
    Cancelled,
}

/// Filter type for resampling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, smooth).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A loaded bitmap: the file's intrinsic dimensions plus the (possibly
/// downscaled) raster the editor works from.
///
/// Immutable once produced. Loading a new file replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Width of the decoded file after orientation, before capping.
    pub intrinsic_width: u32,
    /// Height of the decoded file after orientation, before capping.
    pub intrinsic_height: u32,
    raster: Raster,
}

impl SourceImage {
    pub(crate) fn new(intrinsic_width: u32, intrinsic_height: u32, raster: Raster) -> Self {
        Self {
            intrinsic_width,
            intrinsic_height,
            raster,
        }
    }

    /// Wrap an already decoded raster with no capping applied.
    pub fn from_raster(raster: Raster) -> Self {
        Self::new(raster.width, raster.height, raster)
    }

    /// The capped raster.
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Dimensions of the capped raster.
    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Whether load-time capping scaled the image down.
    pub fn was_downscaled(&self) -> bool {
        self.raster.dimensions() != (self.intrinsic_width, self.intrinsic_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_conversion() {
        assert!(matches!(
            FilterType::Nearest.to_image_filter(),
            image::imageops::FilterType::Nearest
        ));
        assert!(matches!(
            FilterType::Bilinear.to_image_filter(),
            image::imageops::FilterType::Triangle
        ));
        assert!(matches!(
            FilterType::Lanczos3.to_image_filter(),
            image::imageops::FilterType::Lanczos3
        ));
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_source_image_downscaled_flag() {
        let src = SourceImage::from_raster(Raster::transparent(10, 5));
        assert!(!src.was_downscaled());

        let src = SourceImage::new(20, 10, Raster::transparent(10, 5));
        assert!(src.was_downscaled());
        assert_eq!(src.dimensions(), (10, 5));
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid or unsupported image format"
        );
        assert_eq!(
            DecodeError::ZeroSized { width: 0, height: 3 }.to_string(),
            "Image has no pixels (0x3)"
        );
    }
}
