//! Brightness adjustment.
//!
//! A pixel-wise operation that doesn't require spatial context. Results are
//! saturated on both ends of the 8-bit range.

use ndarray::{Array2, ArrayView2};

use super::core::{ensure_non_empty, saturate_f32};
use crate::error::{RasterError, Result};

/// Shift every sample of a band by a constant offset.
///
/// # Arguments
/// * `band` - Input band
/// * `offset` - Intensity offset in sample units, negative darkens, positive brightens
///
/// # Returns
/// `clamp(round(old + offset), 0, 255)` per pixel
pub fn brightness(band: ArrayView2<u8>, offset: f32) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    if !offset.is_finite() {
        return Err(RasterError::InvalidParameter {
            name: "offset",
            value: offset as f64,
        });
    }
    Ok(band.mapv(|v| saturate_f32(v as f32 + offset)))
}
