//! Bitmap source loading.
//!
//! This module provides functionality for:
//! - Decoding PNG and JPEG bytes (format sniffed from content)
//! - Applying EXIF orientation the way a browser displays the file
//! - Capping the longest side to the configured maximum
//! - Resampling rasters for load-time capping and destructive resizes
//!
//! Decoding is synchronous; the `background` module moves it off the
//! calling task when the `tokio` feature is enabled.

mod load;
mod resize;
mod types;

pub use load::{cap_raster, extract_orientation, load};
pub use resize::{calculate_fit_dimensions, resize};
pub use types::{DecodeError, FilterType, Orientation, SourceImage};

#[cfg(test)]
pub(crate) use load::test_support;
