//! Axis-aligned cropping in pixel coordinates.
//!
//! A [`CropRegion`] is expressed in the coordinate space of the raster it
//! will be applied to. Out-of-range values are clamped, never rejected:
//! the origin is clamped into the raster first, then the size is clamped
//! against the already-clamped origin.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner
//! - `x` may equal the raster width (and `y` the height), which leaves an
//!   empty region

use serde::{Deserialize, Serialize};

use crate::raster::{Raster, CHANNELS};

/// A rectangle in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width of the region.
    pub width: u32,
    /// Height of the region.
    pub height: u32,
}

impl CropRegion {
    /// Create a region from raw values, without clamping.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The region covering a whole `width` x `height` raster.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Build a region from possibly negative or oversized values, clamped to
    /// a `bounds_width` x `bounds_height` raster.
    pub fn clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        bounds_width: u32,
        bounds_height: u32,
    ) -> Self {
        let x = clamp_to_u32(x, bounds_width);
        let y = clamp_to_u32(y, bounds_height);
        Self {
            x,
            y,
            width: clamp_to_u32(width, bounds_width - x),
            height: clamp_to_u32(height, bounds_height - y),
        }
    }

    /// This region clamped to a `bounds_width` x `bounds_height` raster.
    pub fn clamp_to(self, bounds_width: u32, bounds_height: u32) -> Self {
        Self::clamped(
            self.x as i64,
            self.y as i64,
            self.width as i64,
            self.height as i64,
            bounds_width,
            bounds_height,
        )
    }

    /// Whether the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies entirely inside a raster of the given size.
    pub fn fits_within(&self, bounds_width: u32, bounds_height: u32) -> bool {
        self.x as u64 + self.width as u64 <= bounds_width as u64
            && self.y as u64 + self.height as u64 <= bounds_height as u64
    }

    /// Whether the region covers the whole raster.
    pub fn is_full(&self, bounds_width: u32, bounds_height: u32) -> bool {
        *self == Self::full(bounds_width, bounds_height)
    }
}

#[inline]
fn clamp_to_u32(value: i64, max: u32) -> u32 {
    value.clamp(0, max as i64) as u32
}

/// Extract a region of a raster into a new buffer.
///
/// The region is clamped to the raster first, so the output is exactly the
/// region's size when it fits and smaller otherwise. An empty region yields
/// an empty raster.
pub fn apply_crop(image: &Raster, region: CropRegion) -> Raster {
    let region = region.clamp_to(image.width, image.height);

    if region.is_full(image.width, image.height) {
        return image.clone();
    }
    if region.is_empty() {
        return Raster::new(region.width, region.height, Vec::new());
    }

    let row_bytes = region.width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_bytes * region.height as usize);

    // Copy pixel data row by row
    for src_y in region.y..region.y + region.height {
        let start = image.offset(region.x, src_y);
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    Raster::new(region.width, region.height, output)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
