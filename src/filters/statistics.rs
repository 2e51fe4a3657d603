//! Descriptive statistics over bands.

use ndarray::{ArrayBase, ArrayView2, ArrayView3, Data, Dimension};
use serde::{Deserialize, Serialize};

use super::core::{ensure_non_empty, split_bands};
use crate::error::Result;

/// Summary statistics of a set of 8-bit samples.
///
/// `std` is the population standard deviation (divides by N).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStatistics {
    pub min: u8,
    pub max: u8,
    pub mean: f64,
    pub std: f64,
    pub sum: u64,
}

fn summarize<S, D>(samples: &ArrayBase<S, D>) -> Result<BandStatistics>
where
    S: Data<Elem = u8>,
    D: Dimension,
{
    ensure_non_empty(samples)?;

    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum = 0u64;
    let mut sum_sq = 0u128;
    for &v in samples.iter() {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
        sum_sq += (v as u128) * (v as u128);
    }

    // Integer accumulation keeps the variance exact for large bands
    let n = samples.len() as f64;
    let mean = sum as f64 / n;
    let variance = (sum_sq as f64 / n - mean * mean).max(0.0);

    Ok(BandStatistics {
        min,
        max,
        mean,
        std: variance.sqrt(),
        sum,
    })
}

/// Compute min, max, mean, standard deviation and sum over one band.
pub fn compute_statistics(band: ArrayView2<u8>) -> Result<BandStatistics> {
    summarize(&band)
}

/// Compute statistics for every band of a `(height, width, bands)` image.
pub fn compute_band_statistics(image: ArrayView3<u8>) -> Result<Vec<BandStatistics>> {
    ensure_non_empty(&image)?;
    split_bands(image).into_iter().map(compute_statistics).collect()
}

/// Compute statistics over all samples of all bands together.
pub fn compute_image_statistics(image: ArrayView3<u8>) -> Result<BandStatistics> {
    summarize(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RasterError;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn test_statistics_small_band() {
        let band = array![[0u8, 10], [20, 30]];
        let stats = compute_statistics(band.view()).unwrap();

        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 30);
        assert_eq!(stats.sum, 60);
        assert_abs_diff_eq!(stats.mean, 15.0);
        // population std of {0, 10, 20, 30}
        assert_abs_diff_eq!(stats.std, 125.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_statistics_constant_band_has_zero_std() {
        let band = Array2::<u8>::from_elem((5, 7), 200);
        let stats = compute_statistics(band.view()).unwrap();

        assert_eq!(stats.sum, 200 * 35);
        assert_abs_diff_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_statistics_empty_band() {
        let band = Array2::<u8>::zeros((0, 3));
        assert_eq!(
            compute_statistics(band.view()).unwrap_err(),
            RasterError::EmptyBuffer
        );
    }

    #[test]
    fn test_band_and_image_statistics() {
        let mut img = Array3::<u8>::zeros((2, 2, 2));
        img.index_axis_mut(ndarray::Axis(2), 1).fill(100);

        let per_band = compute_band_statistics(img.view()).unwrap();
        assert_eq!(per_band.len(), 2);
        assert_eq!(per_band[0].max, 0);
        assert_eq!(per_band[1].min, 100);

        let whole = compute_image_statistics(img.view()).unwrap();
        assert_eq!(whole.min, 0);
        assert_eq!(whole.max, 100);
        assert_abs_diff_eq!(whole.mean, 50.0);
        assert_abs_diff_eq!(whole.std, 50.0);
    }
}
