//! PNG encoding for export.

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;

use super::{validate_pixels, ExportError};

/// Encode RGBA pixel data to PNG bytes.
///
/// Uses the encoder's default compression and filtering, so output is
/// stable for identical input.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    validate_pixels(pixels, width, height)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| ExportError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}
