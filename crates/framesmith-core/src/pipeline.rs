//! Render pipeline: pure stages composing rotation, crop and resize.
//!
//! # Stage Order
//!
//! 1. Rotation (preview): the working raster rotated into a same-size
//!    surface. Recomputed from scratch on every render.
//! 2. Crop (destructive): the crop region cut from the *rendered* raster.
//! 3. Resize (destructive): the rendered raster resampled to the target.
//!
//! Destructive stages return the raster that replaces the working raster;
//! the caller is responsible for rebasing its [`TransformState`] onto it.
//! Because they start from the rendered raster, any pending rotation is
//! baked into their output.

use thiserror::Error;

use crate::config::EditorConfig;
use crate::decode::{self, DecodeError};
use crate::raster::{Raster, CHANNELS};
use crate::state::TransformState;
use crate::transform::{apply_crop, apply_rotation};

/// Why a destructive stage produced no raster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The crop region covers no pixels.
    #[error("Crop region is empty ({width}x{height})")]
    EmptyCrop { width: u32, height: u32 },

    /// The resize target exceeds the configured pixel limit or would not
    /// fit in memory.
    #[error("Resize target {width}x{height} exceeds the limit of {limit} pixels")]
    TooLarge { width: u32, height: u32, limit: u64 },

    /// Resampling failed.
    #[error("Resize failed: {0}")]
    Resize(#[from] DecodeError),
}

/// Stage 1: the working raster with the pending rotation applied.
///
/// The output always has the working raster's dimensions.
pub fn render(working: &Raster, state: &TransformState, config: &EditorConfig) -> Raster {
    apply_rotation(working, state.rotation(), config.rotation_filter)
}

/// Stage 2: crop the rendered raster to the state's crop region.
///
/// The output has exactly the region's dimensions.
pub fn bake_crop(
    working: &Raster,
    state: &TransformState,
    config: &EditorConfig,
) -> Result<Raster, PipelineError> {
    let region = state.crop();
    if region.is_empty() {
        return Err(PipelineError::EmptyCrop {
            width: region.width,
            height: region.height,
        });
    }

    let rendered = render(working, state, config);
    Ok(apply_crop(&rendered, region))
}

/// Stage 3: resample the rendered raster to the state's resize target.
///
/// Targets above `config.max_resize_pixels` are refused before anything is
/// allocated.
pub fn bake_resize(
    working: &Raster,
    state: &TransformState,
    config: &EditorConfig,
) -> Result<Raster, PipelineError> {
    let target = state.resize_target();
    check_resize_target(target.width, target.height, config.max_resize_pixels)?;

    let rendered = render(working, state, config);
    Ok(decode::resize(
        &rendered,
        target.width,
        target.height,
        config.resize_filter,
    )?)
}

fn check_resize_target(width: u32, height: u32, limit: u64) -> Result<(), PipelineError> {
    let pixels = u64::from(width) * u64::from(height);
    let fits_in_memory = usize::try_from(pixels)
        .ok()
        .and_then(|p| p.checked_mul(CHANNELS))
        .is_some();

    if pixels > limit || !fits_in_memory {
        return Err(PipelineError::TooLarge {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::position_raster;
    use crate::raster::TRANSPARENT;

    fn config() -> EditorConfig {
        EditorConfig::default()
    }

    #[test]
    fn test_render_without_rotation_is_working_raster() {
        let working = position_raster(40, 30);
        let state = TransformState::new(40, 30, true);

        assert_eq!(render(&working, &state, &config()), working);
    }

    #[test]
    fn test_render_with_rotation_keeps_dimensions() {
        let working = position_raster(80, 60);
        let mut state = TransformState::new(80, 60, true);
        state.set_rotation(45.0);

        let rendered = render(&working, &state, &config());
        assert_eq!(rendered.dimensions(), (80, 60));
        assert_ne!(rendered, working);
    }

    #[test]
    fn test_render_does_not_accumulate() {
        let working = position_raster(50, 50);
        let mut state = TransformState::new(50, 50, true);

        state.set_rotation(17.0);
        let _ = render(&working, &state, &config());
        state.set_rotation(123.0);
        let _ = render(&working, &state, &config());
        state.set_rotation(0.0);

        assert_eq!(render(&working, &state, &config()), working);
    }

    #[test]
    fn test_bake_crop_exact_size() {
        let working = position_raster(800, 600);
        let mut state = TransformState::new(800, 600, true);
        state.set_crop_region(100, 100, 400, 300);

        let cropped = bake_crop(&working, &state, &config()).unwrap();
        assert_eq!(cropped.dimensions(), (400, 300));
        assert_eq!(cropped.pixel(0, 0), working.pixel(100, 100));
    }

    #[test]
    fn test_bake_crop_uses_rotated_pixels() {
        let working = position_raster(100, 100);
        let mut state = TransformState::new(100, 100, true);
        state.set_rotation(45.0);
        state.set_crop_region(0, 0, 10, 10);

        let cropped = bake_crop(&working, &state, &config()).unwrap();
        // The top-left corner of a 45 degree render is outside the content
        assert_eq!(cropped.pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn test_bake_crop_empty_region() {
        let working = position_raster(800, 600);
        let mut state = TransformState::new(800, 600, true);
        state.set_crop_origin(900, 900);

        assert_eq!(
            bake_crop(&working, &state, &config()),
            Err(PipelineError::EmptyCrop {
                width: 0,
                height: 0
            })
        );
    }

    #[test]
    fn test_bake_resize_to_target() {
        let working = position_raster(400, 300);
        let mut state = TransformState::new(400, 300, true);
        state.set_resize_target(Some(200), None);

        let resized = bake_resize(&working, &state, &config()).unwrap();
        assert_eq!(resized.dimensions(), (200, 150));
    }

    #[test]
    fn test_bake_resize_refuses_huge_target() {
        let working = position_raster(4, 4);
        let mut state = TransformState::new(4, 4, false);
        state.set_resize_target(Some(u32::MAX), Some(u32::MAX));

        assert_eq!(
            bake_resize(&working, &state, &config()),
            Err(PipelineError::TooLarge {
                width: u32::MAX,
                height: u32::MAX,
                limit: 8192 * 8192,
            })
        );
    }

    #[test]
    fn test_bake_resize_respects_configured_limit() {
        let working = position_raster(10, 10);
        let mut state = TransformState::new(10, 10, false);
        let config = EditorConfig::new().with_max_resize_pixels(400);

        state.set_resize_target(Some(20), Some(20));
        assert!(bake_resize(&working, &state, &config).is_ok());

        state.set_resize_target(Some(21), Some(20));
        assert!(matches!(
            bake_resize(&working, &state, &config),
            Err(PipelineError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_check_resize_target_boundaries() {
        assert!(check_resize_target(1, 1, 1).is_ok());
        assert!(check_resize_target(2, 1, 1).is_err());
        // The byte count overflows even with no pixel limit
        assert!(check_resize_target(u32::MAX, u32::MAX, u64::MAX).is_err());
    }

    #[test]
    fn test_bake_resize_bakes_rotation() {
        let working = position_raster(40, 40);
        let mut state = TransformState::new(40, 40, false);
        state.set_rotation(45.0);

        let resized = bake_resize(&working, &state, &config()).unwrap();
        assert_eq!(resized.pixel(0, 0), TRANSPARENT);
    }
}
