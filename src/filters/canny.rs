//! Canny edge segmentation.
//!
//! Stages:
//! 1. Fixed 5x5 Gaussian smoothing (sigma 1.4)
//! 2. Sobel gradients, magnitude `|gx| + |gy|` kept in `f32`
//! 3. Non-maximum suppression along the gradient direction, quantized to
//!    0/45/90/135 degrees
//! 4. Double-threshold hysteresis with 8-connectivity
//!
//! Thresholds are bounded by the band's own maximum sample, and a reversed
//! `low > high` pair is swapped. Output samples are 255 (edge) or 0.

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use super::core::{ensure_non_empty, gaussian_blur_f32, replicate};
use super::threshold::threshold_range;
use crate::error::{RasterError, Result};

const SMOOTHING_KERNEL_SIZE: usize = 5;
const SMOOTHING_SIGMA: f32 = 1.4;

const EDGE: u8 = 255;

/// Hysteresis thresholds on the gradient magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannyParameters {
    pub low: f64,
    pub high: f64,
}

impl CannyParameters {
    /// Reject NaN thresholds. Ordering is not checked; [`canny`] swaps instead.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("low", self.low), ("high", self.high)] {
            if value.is_nan() {
                return Err(RasterError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Sobel responses of a float plane, borders replicated.
fn sobel_gradients(plane: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (height, width) = plane.dim();
    let mut gx = Array2::<f32>::zeros((height, width));
    let mut gy = Array2::<f32>::zeros((height, width));

    for y in 0..height {
        let up = replicate(y as isize - 1, height);
        let down = replicate(y as isize + 1, height);
        for x in 0..width {
            let left = replicate(x as isize - 1, width);
            let right = replicate(x as isize + 1, width);

            let tl = plane[[up, left]];
            let tc = plane[[up, x]];
            let tr = plane[[up, right]];
            let ml = plane[[y, left]];
            let mr = plane[[y, right]];
            let bl = plane[[down, left]];
            let bc = plane[[down, x]];
            let br = plane[[down, right]];

            gx[[y, x]] = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
            gy[[y, x]] = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);
        }
    }

    (gx, gy)
}

/// Thin the magnitude map to ridges one pixel wide.
///
/// A pixel survives when it is strictly greater than its neighbour against
/// the gradient and at least equal to the one along it, so a two-pixel
/// plateau keeps exactly one pixel.
fn non_maximum_suppression(
    magnitude: &Array2<f32>,
    gx: &Array2<f32>,
    gy: &Array2<f32>,
) -> Array2<f32> {
    let (height, width) = magnitude.dim();
    let mut thinned = Array2::<f32>::zeros((height, width));

    let at = |y: isize, x: isize| -> f32 {
        if y < 0 || x < 0 || y >= height as isize || x >= width as isize {
            0.0
        } else {
            magnitude[[y as usize, x as usize]]
        }
    };

    for y in 0..height {
        for x in 0..width {
            let m = magnitude[[y, x]];
            if m <= 0.0 {
                continue;
            }

            let mut angle = gy[[y, x]].atan2(gx[[y, x]]).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }

            // Offset (dy, dx) pointing along the gradient
            let (dy, dx): (isize, isize) = if !(22.5..157.5).contains(&angle) {
                (0, 1)
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (1, 0)
            } else {
                (1, -1)
            };

            let (yi, xi) = (y as isize, x as isize);
            let behind = at(yi - dy, xi - dx);
            let ahead = at(yi + dy, xi + dx);
            if m > behind && m >= ahead {
                thinned[[y, x]] = m;
            }
        }
    }

    thinned
}

/// Keep strong pixels and the weak pixels 8-connected to them.
fn hysteresis(thinned: &Array2<f32>, low: f32, high: f32) -> Array2<u8> {
    let (height, width) = thinned.dim();
    let mut output = Array2::<u8>::zeros((height, width));
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for ((y, x), &m) in thinned.indexed_iter() {
        if m > 0.0 && m >= high {
            output[[y, x]] = EDGE;
            stack.push((y, x));
        }
    }

    while let Some((y, x)) = stack.pop() {
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                if output[[ny, nx]] == EDGE {
                    continue;
                }
                let m = thinned[[ny, nx]];
                if m > 0.0 && m >= low {
                    output[[ny, nx]] = EDGE;
                    stack.push((ny, nx));
                }
            }
        }
    }

    output
}

/// Segment edges with the Canny detector.
///
/// # Arguments
/// * `band` - Input band
/// * `low` - Weak-edge threshold on the gradient magnitude
/// * `high` - Strong-edge threshold on the gradient magnitude
///
/// Both thresholds are clamped to `[0, max sample of band]`; if `low > high`
/// they are swapped.
///
/// # Returns
/// Binary band: 255 on edges, 0 elsewhere
pub fn canny(band: ArrayView2<u8>, low: f64, high: f64) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    CannyParameters { low, high }.validate()?;

    let (low, high) = if low > high {
        log::warn!("canny thresholds reversed (low {} > high {}), swapping", low, high);
        (high, low)
    } else {
        (low, high)
    };

    let (floor, ceiling) = threshold_range(band)?;
    let bounds = (floor as f64, ceiling as f64);
    let clamped_low = low.clamp(bounds.0, bounds.1);
    let clamped_high = high.clamp(bounds.0, bounds.1);
    if clamped_low != low || clamped_high != high {
        log::warn!(
            "canny thresholds ({}, {}) clamped to band range {:?}",
            low,
            high,
            bounds
        );
    }
    log::debug!(
        "canny on {}x{} band: low {}, high {}",
        band.nrows(),
        band.ncols(),
        clamped_low,
        clamped_high
    );

    let plane = band.mapv(|v| v as f32);
    let smoothed = gaussian_blur_f32(
        &plane,
        SMOOTHING_KERNEL_SIZE,
        SMOOTHING_SIGMA,
        SMOOTHING_SIGMA,
    )?;
    let (gx, gy) = sobel_gradients(&smoothed);

    let mut magnitude = Array2::<f32>::zeros(band.dim());
    Zip::from(&mut magnitude)
        .and(&gx)
        .and(&gy)
        .for_each(|m, &x, &y| *m = x.abs() + y.abs());

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    Ok(hysteresis(&thinned, clamped_low as f32, clamped_high as f32))
}

/// [`canny`] driven by a parameter struct.
pub fn canny_with(band: ArrayView2<u8>, params: &CannyParameters) -> Result<Array2<u8>> {
    canny(band, params.low, params.high)
}
