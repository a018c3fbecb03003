//! Same-size image rotation with bilinear and Lanczos3 interpolation.
//!
//! The raster is rotated about its own centre and drawn into an output of
//! the *same* dimensions. Corners that leave the frame are clipped and
//! areas the rotated content no longer covers become transparent.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each output pixel centre we find
//! the source position it came from and interpolate there. Angles follow
//! screen coordinates (y grows downwards), so a positive angle turns the
//! content clockwise. For an angle θ:
//!
//! ```text
//! src_x =  dx * cos(θ) + dy * sin(θ) + cx
//! src_y = -dx * sin(θ) + dy * cos(θ) + cy
//! ```
//!
//! Colour channels are interpolated with alpha weighting so transparent
//! source pixels never bleed dark fringes into opaque ones.

use serde::{Deserialize, Serialize};

use crate::raster::{Raster, CHANNELS, TRANSPARENT};

/// Angles closer than this to a multiple of 360 are treated as no rotation.
const ANGLE_EPSILON: f64 = 1e-9;

/// Slack for sample positions that land on the frame edge through rounding.
const EDGE_EPSILON: f64 = 1e-6;

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

/// Rotate a raster about its centre into a same-size output.
///
/// # Arguments
///
/// * `image` - Source raster
/// * `angle_degrees` - Rotation angle in degrees (positive = clockwise on screen)
/// * `filter` - Interpolation method
///
/// # Returns
///
/// A new `Raster` with exactly the source dimensions.
pub fn apply_rotation(image: &Raster, angle_degrees: f64, filter: InterpolationFilter) -> Raster {
    let normalized = angle_degrees.rem_euclid(360.0);
    if normalized < ANGLE_EPSILON || 360.0 - normalized < ANGLE_EPSILON || image.is_empty() {
        return image.clone();
    }

    let (w, h) = (image.width, image.height);
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;

    let angle_rad = normalized.to_radians();
    let (sin, cos) = snap_trig(angle_rad.sin_cos());

    let mut output = vec![0u8; image.pixels.len()];

    for dst_y in 0..h {
        let dy = dst_y as f64 + 0.5 - cy;
        for dst_x in 0..w {
            let dx = dst_x as f64 + 0.5 - cx;

            // Source position in pixel-index space (centre of pixel i is i)
            let src_x = dx * cos + dy * sin + cx - 0.5;
            let src_y = -dx * sin + dy * cos + cy - 0.5;

            let pixel = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
            };

            let dst_idx = (dst_y as usize * w as usize + dst_x as usize) * CHANNELS;
            output[dst_idx..dst_idx + CHANNELS].copy_from_slice(&pixel);
        }
    }

    Raster::new(w, h, output)
}

/// Round sin/cos values that are within float noise of -1, 0 or 1.
///
/// Keeps quarter turns on exact pixel centres.
fn snap_trig((sin, cos): (f64, f64)) -> (f64, f64) {
    let snap = |v: f64| {
        let r = v.round();
        if (v - r).abs() < 1e-12 {
            r
        } else {
            v
        }
    };
    (snap(sin), snap(cos))
}

/// Whether a sample position lies inside the source frame.
#[inline]
fn in_frame(image: &Raster, x: f64, y: f64) -> bool {
    let max_x = image.width as f64 - 0.5 + EDGE_EPSILON;
    let max_y = image.height as f64 - 0.5 + EDGE_EPSILON;
    let min = -0.5 - EDGE_EPSILON;
    x >= min && x < max_x && y >= min && y < max_y
}

/// Accumulates alpha-weighted samples.
#[derive(Default)]
struct Accumulator {
    color: [f64; 3],
    alpha: f64,
    weight: f64,
}

impl Accumulator {
    #[inline]
    fn add(&mut self, px: [u8; 4], weight: f64) {
        let a = px[3] as f64;
        self.color[0] += px[0] as f64 * a * weight;
        self.color[1] += px[1] as f64 * a * weight;
        self.color[2] += px[2] as f64 * a * weight;
        self.alpha += a * weight;
        self.weight += weight;
    }

    fn finish(self) -> [u8; 4] {
        if self.weight <= 0.0 || self.alpha <= 0.0 {
            return TRANSPARENT;
        }
        let alpha = (self.alpha / self.weight).clamp(0.0, 255.0);
        let to_u8 = |c: f64| (c / self.alpha).clamp(0.0, 255.0).round() as u8;
        [
            to_u8(self.color[0]),
            to_u8(self.color[1]),
            to_u8(self.color[2]),
            alpha.round() as u8,
        ]
    }
}

/// Sample a pixel using bilinear interpolation.
///
/// Positions outside the frame are transparent; positions in the outer half
/// pixel of the frame clamp to the edge pixels.
fn sample_bilinear(image: &Raster, x: f64, y: f64) -> [u8; 4] {
    if !in_frame(image, x, y) {
        return TRANSPARENT;
    }

    let x = x.clamp(0.0, (image.width - 1) as f64);
    let y = y.clamp(0.0, (image.height - 1) as f64);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let mut acc = Accumulator::default();
    acc.add(image.pixel(x0, y0), (1.0 - fx) * (1.0 - fy));
    acc.add(image.pixel(x1, y0), fx * (1.0 - fy));
    acc.add(image.pixel(x0, y1), (1.0 - fx) * fy);
    acc.add(image.pixel(x1, y1), fx * fy);
    acc.finish()
}

/// Sample a pixel using Lanczos3 interpolation.
///
/// Lanczos3 considers a 6x6 neighbourhood. Near the frame edges, where the
/// kernel would leave the image, it falls back to bilinear.
fn sample_lanczos3(image: &Raster, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width as i64, image.height as i64);

    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        return sample_bilinear(image, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut acc = Accumulator::default();
    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            acc.add(image.pixel(px as u32, py as u32), weight);
        }
    }
    acc.finish()
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
