//! Geometric raster operations: rotation and cropping.
//!
//! These are the pure building blocks of the render pipeline. Each takes a
//! raster by reference and returns a new one.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Crop coordinates are integer pixels in the input raster's space
//! - Origin is top-left corner

mod crop;
mod rotation;

pub use crop::{apply_crop, CropRegion};
pub use rotation::{apply_rotation, InterpolationFilter};
