//! Export encoding.
//!
//! This module provides functionality for:
//! - Encoding rasters to PNG (the default; keeps transparency)
//! - Encoding rasters to JPEG with a fixed quality (alpha composited onto black)
//!
//! Encoding is synchronous; the `background` module moves it off the
//! calling task when the `tokio` feature is enabled.

mod jpeg;
mod png;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::{Raster, CHANNELS};

pub use jpeg::encode_jpeg;
pub use png::encode_png;

/// Errors that can occur during export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Export was requested before any image was loaded.
    #[error("No image loaded")]
    NoImage,

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// The background encode task was dropped before finishing.
    #[error("Export was cancelled")]
    Cancelled,
}

/// Output encoding for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// JPEG at the given quality (clamped to 1-100).
    Jpeg { quality: u8 },
}

impl ExportFormat {
    /// MIME type of blobs in this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// An encoded image ready for handoff to an upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Format the bytes are encoded in.
    pub format: ExportFormat,
    /// Width of the encoded image.
    pub width: u32,
    /// Height of the encoded image.
    pub height: u32,
}

impl ExportBlob {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode a raster in the given format.
///
/// Deterministic: the same raster and format always produce the same bytes.
pub fn encode(raster: &Raster, format: ExportFormat) -> Result<ExportBlob, ExportError> {
    validate(raster)?;

    let bytes = match format {
        ExportFormat::Png => encode_png(&raster.pixels, raster.width, raster.height)?,
        ExportFormat::Jpeg { quality } => {
            encode_jpeg(&raster.pixels, raster.width, raster.height, quality)?
        }
    };

    Ok(ExportBlob {
        bytes,
        format,
        width: raster.width,
        height: raster.height,
    })
}

/// Check dimensions and buffer length before handing pixels to an encoder.
pub(crate) fn validate_pixels(pixels: &[u8], width: u32, height: u32) -> Result<(), ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * CHANNELS;
    if pixels.len() != expected {
        return Err(ExportError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

fn validate(raster: &Raster) -> Result<(), ExportError> {
    validate_pixels(&raster.pixels, raster.width, raster.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::position_raster;

    #[test]
    fn test_encode_png_blob() {
        let raster = position_raster(20, 10);
        let blob = encode(&raster, ExportFormat::Png).unwrap();

        assert_eq!((blob.width, blob.height), (20, 10));
        assert_eq!(blob.mime_type(), "image/png");
        assert!(!blob.is_empty());
    }

    #[test]
    fn test_encode_jpeg_blob() {
        let raster = position_raster(20, 10);
        let blob = encode(&raster, ExportFormat::Jpeg { quality: 85 }).unwrap();

        assert_eq!(blob.mime_type(), "image/jpeg");
        assert_eq!(&blob.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let raster = position_raster(33, 21);
        for format in [ExportFormat::Png, ExportFormat::Jpeg { quality: 90 }] {
            assert_eq!(encode(&raster, format), encode(&raster, format));
        }
    }

    #[test]
    fn test_encode_empty_raster() {
        let raster = Raster::transparent(0, 5);
        assert_eq!(
            encode(&raster, ExportFormat::Png),
            Err(ExportError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
    }

    #[test]
    fn test_encode_mismatched_buffer() {
        let raster = Raster {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            encode(&raster, ExportFormat::Png),
            Err(ExportError::InvalidPixelData {
                expected: 64,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::default(), ExportFormat::Png);
        assert_eq!(ExportFormat::Png.extension(), "png");
        assert_eq!(ExportFormat::Jpeg { quality: 1 }.extension(), "jpg");
    }
}
