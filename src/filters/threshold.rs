//! Thresholding: global, adaptive (mean / Gaussian) and Otsu.
//!
//! Every variant produces a binary band whose samples are either 0 or the
//! caller's `max_value`.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::core::{
    ensure_non_empty, gaussian_blur, gaussian_blur_f32, replicate, validate_kernel_size,
};
use super::histogram::{compute_histogram, Histogram, BINS};
use crate::error::{RasterError, Result};

/// Threshold configuration shared by the adaptive and Otsu variants.
///
/// * `low` / `high` - ordered marker pair shown against the histogram; Otsu
///   computes its own split and never uses them to constrain it
/// * `block_size` - adaptive neighborhood size, or Otsu pre-blur kernel size
/// * `constant` - subtracted from the adaptive local reference (default 0)
/// * `max_value` - output value for samples that pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParameters {
    pub low: u8,
    pub high: u8,
    pub block_size: Option<usize>,
    pub constant: Option<f64>,
    pub max_value: u8,
}

impl Default for ThresholdParameters {
    fn default() -> Self {
        Self {
            low: 0,
            high: 255,
            block_size: None,
            constant: None,
            max_value: 255,
        }
    }
}

impl ThresholdParameters {
    /// Parameters for an adaptive threshold.
    pub fn adaptive(block_size: usize, constant: f64, max_value: u8) -> Self {
        Self {
            block_size: Some(block_size),
            constant: Some(constant),
            max_value,
            ..Self::default()
        }
    }

    /// Parameters for Otsu thresholding with an optional pre-blur kernel.
    pub fn otsu(blur_kernel_size: Option<usize>, max_value: u8) -> Self {
        Self {
            block_size: blur_kernel_size,
            max_value,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.low > self.high {
            return Err(RasterError::InvalidThresholdRange {
                low: self.low as f64,
                high: self.high as f64,
            });
        }
        if let Some(size) = self.block_size {
            validate_kernel_size(size)?;
        }
        if let Some(c) = self.constant {
            if !c.is_finite() {
                return Err(RasterError::InvalidParameter {
                    name: "constant",
                    value: c,
                });
            }
        }
        Ok(())
    }
}

/// Local reference used by [`adaptive_threshold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMethod {
    /// Arithmetic mean of the block
    #[default]
    Mean,

    /// Gaussian-weighted mean of the block, sigma derived from block size
    Gaussian,
}

/// Slider bounds for thresholds on this band: `(0, max sample)`.
pub fn threshold_range(band: ArrayView2<u8>) -> Result<(u8, u8)> {
    ensure_non_empty(&band)?;
    let max = band.iter().copied().max().unwrap_or(0);
    Ok((0, max))
}

// ============================================================================
// Global threshold
// ============================================================================

/// Apply a single global threshold.
///
/// `new = max_value if old >= threshold else 0`
pub fn global_threshold(band: ArrayView2<u8>, threshold: u8, max_value: u8) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    Ok(band.mapv(|v| if v >= threshold { max_value } else { 0 }))
}

// ============================================================================
// Adaptive threshold
// ============================================================================

/// Mean of each `block_size` x `block_size` neighborhood, borders replicated.
fn box_mean(band: ArrayView2<u8>, block_size: usize) -> Array2<f32> {
    let (height, width) = band.dim();
    let half = (block_size / 2) as isize;
    let mut rows = Array2::<u64>::zeros((height, width));
    let mut result = Array2::<f32>::zeros((height, width));

    // Horizontal pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u64;
            for k in -half..=half {
                sum += band[[y, replicate(x as isize + k, width)]] as u64;
            }
            rows[[y, x]] = sum;
        }
    }

    // Vertical pass
    let area = (block_size as f64) * (block_size as f64);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u64;
            for k in -half..=half {
                sum += rows[[replicate(y as isize + k, height), x]];
            }
            result[[y, x]] = (sum as f64 / area) as f32;
        }
    }

    result
}

/// Threshold each pixel against its local neighborhood.
///
/// The local reference is the (rounded) mean or Gaussian-weighted mean of the
/// `block_size` x `block_size` window around the pixel, with edge-replicated
/// borders. `new = max_value if old > reference - constant else 0`.
///
/// # Arguments
/// * `band` - Input band
/// * `method` - Mean or Gaussian local reference
/// * `params` - Requires `block_size` (odd, >= 3); `constant` defaults to 0
pub fn adaptive_threshold(
    band: ArrayView2<u8>,
    method: AdaptiveMethod,
    params: &ThresholdParameters,
) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    params.validate()?;
    let block_size = params.block_size.ok_or(RasterError::KernelSizeUnset)?;
    if block_size < 3 {
        return Err(RasterError::InvalidKernelSize { size: block_size });
    }
    let constant = params.constant.unwrap_or(0.0);

    let reference = match method {
        AdaptiveMethod::Mean => box_mean(band, block_size),
        AdaptiveMethod::Gaussian => {
            let plane = band.mapv(|v| v as f32);
            gaussian_blur_f32(&plane, block_size, 0.0, 0.0)?
        }
    };

    log::debug!(
        "adaptive threshold {:?}: {}x{} band, block {}, constant {}",
        method,
        band.nrows(),
        band.ncols(),
        block_size,
        constant
    );

    let max_value = params.max_value;
    let mut output = Array2::<u8>::zeros(band.dim());
    for ((pos, out), &v) in output.indexed_iter_mut().zip(band.iter()) {
        let local = reference[pos].round() as f64;
        *out = if v as f64 > local - constant { max_value } else { 0 };
    }
    Ok(output)
}

// ============================================================================
// Otsu threshold
// ============================================================================

/// Outcome of [`otsu_threshold`]: the chosen split and the binary band.
#[derive(Debug, Clone, PartialEq)]
pub struct OtsuResult {
    pub threshold: u8,
    pub output: Array2<u8>,
}

/// Find the split maximizing between-class variance `w0 * w1 * (mu0 - mu1)^2`.
///
/// Class 0 holds intensities below the returned value, class 1 the rest, so the
/// value plugs directly into [`global_threshold`]. When a run of consecutive
/// splits shares the maximal variance (empty bins between clusters), the
/// midpoint of the first such run is returned. A histogram with a single
/// occupied bin returns that bin.
pub fn otsu_threshold_from_histogram(histogram: &Histogram) -> u8 {
    let counts = histogram.counts();
    let total: f64 = histogram.total() as f64;
    let sum_all: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut weight_b = 0.0f64;
    let mut sum_b = 0.0f64;
    let mut best = f64::NEG_INFINITY;
    let mut run: Option<(usize, usize)> = None;
    let mut run_open = false;

    for (t, &count) in counts.iter().enumerate().take(BINS) {
        let weight_f = total - weight_b;
        if weight_b > 0.0 && weight_f > 0.0 {
            let mean_b = sum_b / weight_b;
            let mean_f = (sum_all - sum_b) / weight_f;
            let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);

            if variance > best {
                best = variance;
                run = Some((t, t));
                run_open = true;
            } else if variance == best && run_open {
                if let Some((first, _)) = run {
                    run = Some((first, t));
                }
            } else {
                run_open = false;
            }
        }

        weight_b += count as f64;
        sum_b += t as f64 * count as f64;
    }

    match run {
        Some((first, last)) => ((first + last) / 2) as u8,
        None => histogram.first_nonzero().unwrap_or(0),
    }
}

/// Otsu thresholding of one band.
///
/// When `params.block_size` is set the band is first Gaussian-blurred with
/// that kernel size (sigma derived from the size) and the blurred band is
/// thresholded. `params.low` is informational only.
pub fn otsu_threshold(band: ArrayView2<u8>, params: &ThresholdParameters) -> Result<OtsuResult> {
    ensure_non_empty(&band)?;
    params.validate()?;

    let source = match params.block_size {
        Some(size) => gaussian_blur(band, size, 0.0, 0.0)?,
        None => band.to_owned(),
    };
    let histogram = compute_histogram(source.view())?;
    let threshold = otsu_threshold_from_histogram(&histogram);
    log::debug!("otsu threshold selected: {}", threshold);

    let output = global_threshold(source.view(), threshold, params.max_value)?;
    Ok(OtsuResult { threshold, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn square_band() -> Array2<u8> {
        array![
            [10u8, 10, 10, 10],
            [10, 200, 200, 10],
            [10, 200, 200, 10],
            [10, 10, 10, 10]
        ]
    }

    #[test]
    fn test_global_threshold_square() {
        let out = global_threshold(square_band().view(), 100, 255).unwrap();
        assert_eq!(
            out,
            array![
                [0u8, 0, 0, 0],
                [0, 255, 255, 0],
                [0, 255, 255, 0],
                [0, 0, 0, 0]
            ]
        );
    }

    #[test]
    fn test_global_threshold_is_inclusive() {
        let band = array![[99u8, 100, 101]];
        let out = global_threshold(band.view(), 100, 7).unwrap();
        assert_eq!(out, array![[0u8, 7, 7]]);
    }

    #[test]
    fn test_threshold_range_uses_band_max() {
        assert_eq!(threshold_range(square_band().view()).unwrap(), (0, 200));
    }

    #[test]
    fn test_adaptive_rejects_bad_block_sizes() {
        let band = square_band();
        for size in [0usize, 1, 2, 4] {
            let params = ThresholdParameters::adaptive(size, 0.0, 255);
            assert_eq!(
                adaptive_threshold(band.view(), AdaptiveMethod::Mean, &params).unwrap_err(),
                RasterError::InvalidKernelSize { size }
            );
        }
    }

    #[test]
    fn test_adaptive_requires_block_size() {
        let params = ThresholdParameters::default();
        assert_eq!(
            adaptive_threshold(square_band().view(), AdaptiveMethod::Gaussian, &params)
                .unwrap_err(),
            RasterError::KernelSizeUnset
        );
    }

    #[test]
    fn test_adaptive_flat_band_depends_on_constant() {
        let band = Array2::<u8>::from_elem((5, 5), 80);

        // old > mean - C holds for C > 0
        let params = ThresholdParameters::adaptive(3, 2.0, 255);
        let out = adaptive_threshold(band.view(), AdaptiveMethod::Mean, &params).unwrap();
        assert!(out.iter().all(|&v| v == 255));

        // and fails for C = 0
        let params = ThresholdParameters::adaptive(3, 0.0, 255);
        let out = adaptive_threshold(band.view(), AdaptiveMethod::Gaussian, &params).unwrap();
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_adaptive_picks_out_bright_spot() {
        let mut band = Array2::<u8>::from_elem((7, 7), 50);
        band[[3, 3]] = 120;
        let params = ThresholdParameters::adaptive(3, 5.0, 200);

        for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
            let out = adaptive_threshold(band.view(), method, &params).unwrap();
            assert_eq!(out[[3, 3]], 200);
            assert!(out.iter().all(|&v| v == 0 || v == 200));
        }
    }

    #[test]
    fn test_adaptive_mean_replicates_corner() {
        // Window at [0, 0]: 120 x4, 50 x5 -> 730 / 9 = 81.1, rounds to 81
        let band = array![[120u8, 50], [50, 50]];
        let reference = box_mean(band.view(), 3);
        assert!((reference[[0, 0]] - 730.0 / 9.0).abs() < 1e-4);

        let params = ThresholdParameters::adaptive(3, 0.0, 255);
        let out = adaptive_threshold(band.view(), AdaptiveMethod::Mean, &params).unwrap();
        assert_eq!(out, array![[255u8, 0], [0, 0]]);

        // 120 > 81 - C fails once C reaches -39
        let params = ThresholdParameters::adaptive(3, -39.0, 255);
        let out = adaptive_threshold(band.view(), AdaptiveMethod::Mean, &params).unwrap();
        assert_eq!(out[[0, 0]], 0);
    }

    #[test]
    fn test_adaptive_block_larger_than_band() {
        let band = Array2::<u8>::from_elem((3, 3), 255);
        let params = ThresholdParameters::adaptive(4105, 1.0, 255);
        let out = adaptive_threshold(band.view(), AdaptiveMethod::Mean, &params).unwrap();
        assert!(out.iter().all(|&v| v == 255));

        let reference = box_mean(band.view(), 4105);
        assert!(reference.iter().all(|&m| (m - 255.0).abs() < 1e-3));
    }

    #[test]
    fn test_otsu_two_clusters() {
        let mut counts = [0u64; 256];
        counts[50] = 1;
        counts[200] = 1;
        let t = otsu_threshold_from_histogram(&Histogram::from_counts(counts));
        assert!(t > 50 && t < 200, "threshold {t} not between clusters");
    }

    #[test]
    fn test_otsu_single_value_histogram() {
        let mut counts = [0u64; 256];
        counts[77] = 12;
        assert_eq!(otsu_threshold_from_histogram(&Histogram::from_counts(counts)), 77);
    }

    #[test]
    fn test_otsu_band_separates_square() {
        let result = otsu_threshold(square_band().view(), &ThresholdParameters::otsu(None, 255))
            .unwrap();
        assert!(result.threshold > 10 && result.threshold <= 200);
        assert_eq!(result.output, global_threshold(square_band().view(), 100, 255).unwrap());
    }

    #[test]
    fn test_otsu_ignores_low_marker() {
        let band = square_band();
        let mut params = ThresholdParameters::otsu(None, 255);
        let baseline = otsu_threshold(band.view(), &params).unwrap();
        params.low = 150;
        let with_low = otsu_threshold(band.view(), &params).unwrap();
        assert_eq!(baseline, with_low);
    }

    #[test]
    fn test_otsu_validates_blur_kernel() {
        let params = ThresholdParameters::otsu(Some(4), 255);
        assert_eq!(
            otsu_threshold(square_band().view(), &params).unwrap_err(),
            RasterError::InvalidKernelSize { size: 4 }
        );
    }

    #[test]
    fn test_otsu_thresholds_the_blurred_band() {
        let band = Array2::from_shape_fn((12, 12), |(y, x)| {
            let base: u8 = if x < 6 { 40 } else { 190 };
            base + ((x * 7 + y * 11) % 9) as u8
        });
        let params = ThresholdParameters::otsu(Some(3), 255);
        let result = otsu_threshold(band.view(), &params).unwrap();

        let blurred = gaussian_blur(band.view(), 3, 0.0, 0.0).unwrap();
        assert_eq!(
            result.threshold,
            otsu_threshold_from_histogram(&compute_histogram(blurred.view()).unwrap())
        );
        assert_eq!(
            result.output,
            global_threshold(blurred.view(), result.threshold, 255).unwrap()
        );
        assert!(result.threshold > 48 && result.threshold < 190);
        assert_eq!(result.output[[0, 0]], 0);
        assert_eq!(result.output[[11, 11]], 255);
    }

    #[test]
    fn test_parameters_reject_inverted_range() {
        let params = ThresholdParameters {
            low: 200,
            high: 100,
            ..ThresholdParameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RasterError::InvalidThresholdRange { .. })
        ));
    }

    #[test]
    fn test_parameters_deserialize_with_defaults() {
        let params: ThresholdParameters =
            serde_json::from_str(r#"{"block_size": 11, "constant": 2.0}"#).unwrap();
        assert_eq!(params.block_size, Some(11));
        assert_eq!(params.max_value, 255);
        assert!(params.validate().is_ok());
    }
}
