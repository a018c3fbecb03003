//! Transform State: the pending edits for the current working raster.
//!
//! Every mutator is total. Out-of-range input is clamped or wrapped, never
//! rejected, so the state always satisfies:
//!
//! - `0 <= rotation < 360`
//! - the crop region lies inside the working raster
//! - both resize dimensions are at least 1 once a raster is present

use serde::{Deserialize, Serialize};

use crate::transform::CropRegion;

/// Normalize an angle in degrees into `[0, 360)`.
///
/// Non-finite input normalizes to 0.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = ((angle % 360.0) + 360.0) % 360.0;
    // -0.0 and values a hair below a full turn collapse to 0
    if wrapped == 0.0 || wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Target dimensions for the next destructive resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeTarget {
    pub width: u32,
    pub height: u32,
    /// When set, supplying one dimension derives the other from the
    /// working raster's aspect ratio.
    pub aspect_lock: bool,
}

/// Rotation, crop region and resize target for one working raster.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    bounds: (u32, u32),
    rotation: f64,
    crop: CropRegion,
    resize: ResizeTarget,
}

impl TransformState {
    /// State for a `width` x `height` working raster: no rotation, crop and
    /// resize covering the full extent.
    pub fn new(width: u32, height: u32, aspect_lock: bool) -> Self {
        Self {
            bounds: (width, height),
            rotation: 0.0,
            crop: CropRegion::full(width, height),
            resize: ResizeTarget {
                width,
                height,
                aspect_lock,
            },
        }
    }

    /// Dimensions of the working raster this state is clamped against.
    pub fn bounds(&self) -> (u32, u32) {
        self.bounds
    }

    /// Rotation in degrees, in `[0, 360)`.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn crop(&self) -> CropRegion {
        self.crop
    }

    pub fn resize_target(&self) -> ResizeTarget {
        self.resize
    }

    pub fn aspect_lock(&self) -> bool {
        self.resize.aspect_lock
    }

    /// Store `angle` wrapped into `[0, 360)`.
    pub fn set_rotation(&mut self, angle: f64) {
        self.rotation = normalize_angle(angle);
        log::debug!("rotation set to {}", self.rotation);
    }

    /// Move the crop origin, then re-clamp the current size against it.
    pub fn set_crop_origin(&mut self, x: i64, y: i64) {
        self.crop = CropRegion::clamped(
            x,
            y,
            self.crop.width as i64,
            self.crop.height as i64,
            self.bounds.0,
            self.bounds.1,
        );
        log::debug!("crop origin set to {:?}", self.crop);
    }

    /// Resize the crop region, clamped against the current origin.
    pub fn set_crop_size(&mut self, width: i64, height: i64) {
        self.crop = CropRegion::clamped(
            self.crop.x as i64,
            self.crop.y as i64,
            width,
            height,
            self.bounds.0,
            self.bounds.1,
        );
        log::debug!("crop size set to {:?}", self.crop);
    }

    /// Set origin and size together; origin is clamped first.
    pub fn set_crop_region(&mut self, x: i64, y: i64, width: i64, height: i64) {
        self.crop = CropRegion::clamped(x, y, width, height, self.bounds.0, self.bounds.1);
        log::debug!("crop region set to {:?}", self.crop);
    }

    /// Reset the crop region to the full working raster.
    pub fn reset_crop(&mut self) {
        self.crop = CropRegion::full(self.bounds.0, self.bounds.1);
    }

    pub fn set_aspect_lock(&mut self, aspect_lock: bool) {
        self.resize.aspect_lock = aspect_lock;
    }

    /// Set the resize target.
    ///
    /// With aspect lock on, a supplied width wins: the height becomes
    /// `round(width / aspect)`. With only a height, the width becomes
    /// `round(height * aspect)`. The aspect is that of the current working
    /// raster. With aspect lock off, supplied dimensions are taken as given
    /// and a missing one keeps its previous value. Every dimension is at
    /// least 1.
    pub fn set_resize_target(&mut self, width: Option<u32>, height: Option<u32>) {
        let aspect = self.aspect_ratio();

        let (new_width, new_height) = match (self.resize.aspect_lock, aspect, width, height) {
            (true, Some(aspect), Some(w), _) => {
                let w = w.max(1);
                (w, derive_dimension(w as f64 / aspect))
            }
            (true, Some(aspect), None, Some(h)) => {
                let h = h.max(1);
                (derive_dimension(h as f64 * aspect), h)
            }
            _ => (
                width.unwrap_or(self.resize.width).max(1),
                height.unwrap_or(self.resize.height).max(1),
            ),
        };

        self.resize.width = new_width;
        self.resize.height = new_height;
        log::debug!("resize target set to {}x{}", new_width, new_height);
    }

    /// Rebase onto a new working raster after a destructive operation or a
    /// reset: rotation 0, crop and resize target covering the new extent.
    /// The aspect-lock flag is kept.
    pub fn rebase(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height, self.resize.aspect_lock);
    }

    fn aspect_ratio(&self) -> Option<f64> {
        let (w, h) = self.bounds;
        (w > 0 && h > 0).then(|| w as f64 / h as f64)
    }
}

#[inline]
fn derive_dimension(value: f64) -> u32 {
    (value.round() as u32).max(1)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Whole turns never change the stored angle.
        #[test]
        fn prop_rotation_wraps_whole_turns(
            r in -100_000i32..100_000,
            k in -20i32..20,
        ) {
            let mut a = TransformState::new(10, 10, true);
            let mut b = TransformState::new(10, 10, true);

            a.set_rotation(r as f64);
            b.set_rotation(r as f64 + 360.0 * k as f64);

            prop_assert_eq!(a.rotation(), b.rotation());
            prop_assert!((0.0..360.0).contains(&a.rotation()));
        }

        /// Property: Any sequence of crop mutations keeps the region inside.
        #[test]
        fn prop_crop_always_within_bounds(
            (w, h) in (1u32..2000, 1u32..2000),
            ops in prop::collection::vec((any::<bool>(), -3000i64..3000, -3000i64..3000), 1..10),
        ) {
            let mut state = TransformState::new(w, h, true);
            for (is_origin, a, b) in ops {
                if is_origin {
                    state.set_crop_origin(a, b);
                } else {
                    state.set_crop_size(a, b);
                }
                let crop = state.crop();
                prop_assert!(crop.x <= w && crop.y <= h);
                prop_assert!(crop.fits_within(w, h));
            }
        }

        /// Property: Locked width-only resize derives height from the raster aspect.
        #[test]
        fn prop_locked_width_derives_height(
            (w, h) in (1u32..4000, 1u32..4000),
            target in 1u32..4000,
        ) {
            let mut state = TransformState::new(w, h, true);
            state.set_resize_target(Some(target), None);

            let expected = ((target as f64 / (w as f64 / h as f64)).round() as u32).max(1);
            prop_assert_eq!(state.resize_target().height, expected);
            prop_assert_eq!(state.resize_target().width, target);
        }
    }
}
