//! Raster resampling.
//!
//! Uses the `image` crate's resampling filters. All functions return new
//! `Raster` instances without modifying the input.

use super::{DecodeError, FilterType};
use crate::raster::Raster;

/// Resize a raster to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::ZeroSized` if either target dimension is zero and
/// `DecodeError::CorruptedFile` if the source buffer does not match its
/// dimensions.
pub fn resize(
    image: &Raster,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Raster, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSized { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgba_image = image
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbaImage".to_string()))?;

    let resized = image::imageops::resize(&rgba_image, width, height, filter.to_image_filter());

    Ok(Raster::from_rgba_image(resized))
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
///
/// The longer side becomes exactly `max_edge`; the shorter side is scaled
/// by the same factor and rounded, never below 1.
pub fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
