//! JPEG encoding for export.
//!
//! JPEG has no alpha channel, so pixels are composited onto black first,
//! the same result a browser canvas gives when asked for a JPEG blob.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;

use super::{validate_pixels, ExportError};
use crate::raster::CHANNELS;

/// Encode RGBA pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (clamped to 1-100)
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, ExportError> {
    validate_pixels(pixels, width, height)?;

    let quality = quality.clamp(1, 100);
    let rgb = composite_on_black(pixels);

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| ExportError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

/// Drop alpha by blending each pixel onto black.
fn composite_on_black(pixels: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.len() / CHANNELS * 3);
    for px in pixels.chunks_exact(CHANNELS) {
        let a = px[3] as u16;
        for &c in &px[..3] {
            rgb.push(((c as u16 * a + 127) / 255) as u8);
        }
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Same input always produces same output (deterministic).
        #[test]
        fn prop_deterministic_output(
            (width, height) in (1u32..=20, 1u32..=20),
            quality in 1u8..=100,
            seed in any::<u8>(),
        ) {
            let pixels: Vec<u8> = (0..(width * height * 4) as usize)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();

            let a = encode_jpeg(&pixels, width, height, quality).unwrap();
            let b = encode_jpeg(&pixels, width, height, quality).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
