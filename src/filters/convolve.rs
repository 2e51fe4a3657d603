//! Bordered 2-D correlation with saturating 8-bit output.
//!
//! The kernel is applied without flipping (correlation, not convolution).
//! Its anchor is the centre element `size / 2`, so a 2x2 kernel is anchored at
//! its bottom-right element. Samples outside the band are replicated from the
//! nearest row/column, and each weighted sum is clipped to 0-255.
//!
//! Clipping discards the sign of a response: a negative gradient becomes 0.
//! [`correlate_raw`] keeps the raw 64-bit sums for callers that need them.

use ndarray::{Array2, ArrayView2};

use super::core::{ensure_non_empty, replicate, saturate_i64};
use crate::error::{RasterError, Result};

/// Immutable square matrix of integer weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    weights: Array2<i32>,
}

impl Kernel {
    /// Build a kernel from a square, non-empty weight matrix.
    pub fn new(weights: Array2<i32>) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows == 0 || rows != cols {
            return Err(RasterError::InvalidKernelShape { rows, cols });
        }
        Ok(Self { weights })
    }

    /// Build a 2x2 kernel.
    pub fn from_2x2(rows: [[i32; 2]; 2]) -> Self {
        Self {
            weights: Array2::from_shape_fn((2, 2), |(y, x)| rows[y][x]),
        }
    }

    /// Build a 3x3 kernel.
    pub fn from_3x3(rows: [[i32; 3]; 3]) -> Self {
        Self {
            weights: Array2::from_shape_fn((3, 3), |(y, x)| rows[y][x]),
        }
    }

    pub fn size(&self) -> usize {
        self.weights.nrows()
    }

    /// Offset of the anchor element from the top-left corner.
    pub fn anchor(&self) -> usize {
        self.size() / 2
    }

    pub fn weights(&self) -> ArrayView2<'_, i32> {
        self.weights.view()
    }
}

/// Correlate a band with a kernel, keeping the signed sums.
///
/// Sums are accumulated in `i64`, wide enough for any `i32` kernel of
/// practical size.
pub fn correlate_raw(band: ArrayView2<u8>, kernel: &Kernel) -> Result<Array2<i64>> {
    ensure_non_empty(&band)?;
    let (height, width) = band.dim();
    let size = kernel.size();
    let anchor = kernel.anchor() as isize;
    let weights = kernel.weights();

    let mut output = Array2::<i64>::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0i64;
            for ky in 0..size {
                let sy = replicate(y as isize + ky as isize - anchor, height);
                for kx in 0..size {
                    let w = weights[[ky, kx]] as i64;
                    if w == 0 {
                        continue;
                    }
                    let sx = replicate(x as isize + kx as isize - anchor, width);
                    sum += band[[sy, sx]] as i64 * w;
                }
            }
            output[[y, x]] = sum;
        }
    }
    Ok(output)
}

/// Correlate a band with a kernel and saturate the result to 0-255.
pub fn correlate(band: ArrayView2<u8>, kernel: &Kernel) -> Result<Array2<u8>> {
    Ok(correlate_raw(band, kernel)?.mapv(saturate_i64))
}
