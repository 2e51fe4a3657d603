//! Histogram equalization.
//!
//! Remaps intensities through the normalized cumulative histogram so the
//! output spreads across the full 0-255 range.

use ndarray::{Array2, ArrayView2};

use super::histogram::{compute_histogram, Histogram};
use crate::error::Result;

/// Build the 256-entry equalization lookup table for a histogram.
///
/// `lut[v] = round((C[v] - Cmin) / (N - Cmin) * 255)`, clamped to 0-255, where
/// `C` is the cumulative histogram, `Cmin` its smallest nonzero entry and `N`
/// the pixel count. A degenerate histogram (`N == Cmin`, e.g. a constant band)
/// yields the identity table.
pub fn equalization_lut(histogram: &Histogram) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = i as u8;
    }

    let cumulative = histogram.cumulative();
    let total = cumulative.total();
    let c_min = match cumulative.min_nonzero() {
        Some(c) => c,
        None => return lut,
    };
    if total == c_min {
        return lut;
    }

    let range = (total - c_min) as f64;
    for (v, &c) in lut.iter_mut().zip(cumulative.counts().iter()) {
        let scaled = (c as f64 - c_min as f64) / range * 255.0;
        *v = scaled.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Equalize the histogram of one band.
///
/// # Returns
/// A new band; the input is untouched
pub fn equalize(band: ArrayView2<u8>) -> Result<Array2<u8>> {
    let histogram = compute_histogram(band)?;
    let lut = equalization_lut(&histogram);
    Ok(band.mapv(|v| lut[v as usize]))
}
