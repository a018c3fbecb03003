//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;
use crate::encode::ExportFormat;
use crate::transform::InterpolationFilter;

/// Default cap for the longest side of a loaded image, in pixels.
pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 1000;

/// Default limit on the pixel count a destructive resize may produce.
pub const DEFAULT_MAX_RESIZE_PIXELS: u64 = 8192 * 8192;

/// Settings for an editor session.
///
/// Every field has a default, so a partial object (or none at all) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Longest side of a loaded image; larger images are scaled down.
    pub max_image_size: u32,
    /// Largest `width * height` a destructive resize may produce; larger
    /// targets are refused.
    pub max_resize_pixels: u64,
    /// Initial aspect-lock state for resize targets.
    pub maintain_aspect_ratio: bool,
    /// Filter used for load-time downscaling and destructive resizes.
    pub resize_filter: FilterType,
    /// Filter used when rotating the working raster.
    pub rotation_filter: InterpolationFilter,
    /// Encoding used by export.
    pub export_format: ExportFormat,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            max_resize_pixels: DEFAULT_MAX_RESIZE_PIXELS,
            maintain_aspect_ratio: true,
            resize_filter: FilterType::Bilinear,
            rotation_filter: InterpolationFilter::Bilinear,
            export_format: ExportFormat::Png,
        }
    }
}

impl EditorConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Same configuration with a different size cap. A cap of 0 is raised to 1.
    pub fn with_max_image_size(mut self, max_image_size: u32) -> Self {
        self.max_image_size = max_image_size.max(1);
        self
    }

    /// Same configuration with a different resize pixel limit (at least 1).
    pub fn with_max_resize_pixels(mut self, max_resize_pixels: u64) -> Self {
        self.max_resize_pixels = max_resize_pixels.max(1);
        self
    }

    /// Same configuration with a different export format.
    pub fn with_export_format(mut self, export_format: ExportFormat) -> Self {
        self.export_format = export_format;
        self
    }
}
