//! Core utilities shared by the band filters.
//!
//! This module provides the infrastructure every engine operation relies on:
//! - Band selection, splitting and recombination for `(height, width, bands)` images
//! - Edge-replicating index arithmetic and 8-bit saturation
//! - Gaussian kernel generation and separable Gaussian blur

use ndarray::{stack, Array2, Array3, ArrayBase, ArrayView2, ArrayView3, Axis, Data, Dimension};
use rayon::prelude::*;

use crate::error::{RasterError, Result};

// ============================================================================
// Validation
// ============================================================================

/// Reject zero-sample buffers.
pub fn ensure_non_empty<S, D>(array: &ArrayBase<S, D>) -> Result<()>
where
    S: Data,
    D: Dimension,
{
    if array.is_empty() {
        return Err(RasterError::EmptyBuffer);
    }
    Ok(())
}

/// Check that `size` is a positive odd kernel size and return it.
pub fn validate_kernel_size(size: usize) -> Result<usize> {
    if size == 0 || size % 2 == 0 {
        return Err(RasterError::InvalidKernelSize { size });
    }
    Ok(size)
}

// ============================================================================
// Band selection
// ============================================================================

/// Number of bands in a `(height, width, bands)` image.
pub fn band_count(image: &ArrayView3<u8>) -> usize {
    image.dim().2
}

/// Borrow one band of a multi-band image.
///
/// # Arguments
/// * `image` - Image with shape (height, width, bands)
/// * `index` - Zero-based band index
pub fn select_band<'a>(image: ArrayView3<'a, u8>, index: usize) -> Result<ArrayView2<'a, u8>> {
    ensure_non_empty(&image)?;
    let count = band_count(&image);
    if index >= count {
        return Err(RasterError::BandIndexOutOfRange { index, count });
    }
    Ok(image.index_axis_move(Axis(2), index))
}

/// Borrow every band of a multi-band image, in order.
pub fn split_bands(image: ArrayView3<'_, u8>) -> Vec<ArrayView2<'_, u8>> {
    (0..band_count(&image))
        .map(|c| image.clone().index_axis_move(Axis(2), c))
        .collect()
}

/// Recombine bands into a `(height, width, bands)` image.
///
/// All bands must share one shape.
pub fn stack_bands(bands: &[ArrayView2<u8>]) -> Result<Array3<u8>> {
    let first = bands.first().ok_or(RasterError::EmptyBuffer)?;
    let expected = first.dim();
    for band in bands.iter().skip(1) {
        if band.dim() != expected {
            return Err(RasterError::BandShapeMismatch {
                expected,
                found: band.dim(),
            });
        }
    }
    stack(Axis(2), bands).map_err(|_| RasterError::BandShapeMismatch {
        expected,
        found: expected,
    })
}

/// Apply a per-band operation to every band and recombine the results.
///
/// Bands are processed in order on the calling thread.
pub fn map_bands<F>(image: ArrayView3<u8>, op: F) -> Result<Array3<u8>>
where
    F: Fn(ArrayView2<u8>) -> Result<Array2<u8>>,
{
    map_bands_indexed(image, |_, band| op(band))
}

/// Like [`map_bands`], but the operation also receives the band index.
pub fn map_bands_indexed<F>(image: ArrayView3<u8>, op: F) -> Result<Array3<u8>>
where
    F: Fn(usize, ArrayView2<u8>) -> Result<Array2<u8>>,
{
    ensure_non_empty(&image)?;
    let outputs = image
        .axis_iter(Axis(2))
        .enumerate()
        .map(|(c, band)| op(c, band))
        .collect::<Result<Vec<_>>>()?;
    restack(outputs)
}

/// Parallel variant of [`map_bands`] for callers that opt into rayon.
///
/// Bands are independent, so the result is identical to [`map_bands`].
pub fn par_map_bands<F>(image: ArrayView3<u8>, op: F) -> Result<Array3<u8>>
where
    F: Fn(ArrayView2<u8>) -> Result<Array2<u8>> + Sync + Send,
{
    ensure_non_empty(&image)?;
    let outputs = (0..band_count(&image))
        .into_par_iter()
        .map(|c| op(image.index_axis(Axis(2), c)))
        .collect::<Result<Vec<_>>>()?;
    restack(outputs)
}

fn restack(outputs: Vec<Array2<u8>>) -> Result<Array3<u8>> {
    let views: Vec<ArrayView2<u8>> = outputs.iter().map(|b| b.view()).collect();
    stack_bands(&views)
}

// ============================================================================
// Border and saturation helpers
// ============================================================================

/// Map a possibly out-of-range coordinate onto the nearest valid index.
#[inline]
pub fn replicate(pos: isize, len: usize) -> usize {
    pos.clamp(0, len as isize - 1) as usize
}

/// Clip an integer sum into the 8-bit range.
#[inline]
pub fn saturate_i64(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

/// Round and clip a float into the 8-bit range.
#[inline]
pub fn saturate_f32(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// Gaussian kernels and blur
// ============================================================================

/// Sigma used when the caller leaves it non-positive, derived from kernel size.
pub fn sigma_for_kernel_size(kernel_size: usize) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Generate a normalized 1D Gaussian kernel of odd length `kernel_size`.
///
/// # Arguments
/// * `kernel_size` - Kernel length, must be positive and odd
/// * `sigma` - Standard deviation; non-positive values are derived from `kernel_size`
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Result<Vec<f32>> {
    validate_kernel_size(kernel_size)?;
    if sigma.is_nan() {
        return Err(RasterError::InvalidParameter {
            name: "sigma",
            value: sigma as f64,
        });
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        sigma_for_kernel_size(kernel_size)
    };
    let half = (kernel_size / 2) as f32;

    let mut kernel: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    // Normalize
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    Ok(kernel)
}

/// Separable Gaussian blur over a float plane with replicated borders.
///
/// `sigma_y <= 0` reuses `sigma_x`, matching the usual two-sigma blur contract.
pub fn gaussian_blur_f32(
    plane: &Array2<f32>,
    kernel_size: usize,
    sigma_x: f32,
    sigma_y: f32,
) -> Result<Array2<f32>> {
    ensure_non_empty(plane)?;
    let sigma_y = if sigma_y > 0.0 { sigma_y } else { sigma_x };
    let kernel_x = gaussian_kernel_1d(kernel_size, sigma_x)?;
    let kernel_y = gaussian_kernel_1d(kernel_size, sigma_y)?;
    let half = (kernel_size / 2) as isize;
    let (height, width) = plane.dim();

    let mut temp = Array2::<f32>::zeros((height, width));
    let mut result = Array2::<f32>::zeros((height, width));

    // Horizontal pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel_x.iter().enumerate() {
                let sx = replicate(x as isize + ki as isize - half, width);
                sum += plane[[y, sx]] * kv;
            }
            temp[[y, x]] = sum;
        }
    }

    // Vertical pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel_y.iter().enumerate() {
                let sy = replicate(y as isize + ki as isize - half, height);
                sum += temp[[sy, x]] * kv;
            }
            result[[y, x]] = sum;
        }
    }

    Ok(result)
}

/// Apply a separable Gaussian blur to one band.
///
/// # Arguments
/// * `band` - Input band
/// * `kernel_size` - Positive odd kernel size
/// * `sigma_x` - Horizontal standard deviation (non-positive = derived from size)
/// * `sigma_y` - Vertical standard deviation (non-positive = same as `sigma_x`)
///
/// # Returns
/// Blurred band, rounded and saturated to 0-255
pub fn gaussian_blur(
    band: ArrayView2<u8>,
    kernel_size: usize,
    sigma_x: f32,
    sigma_y: f32,
) -> Result<Array2<u8>> {
    let plane = band.mapv(|v| v as f32);
    let blurred = gaussian_blur_f32(&plane, kernel_size, sigma_x, sigma_y)?;
    Ok(blurred.mapv(saturate_f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_select_band_out_of_range() {
        let img = Array3::<u8>::zeros((2, 2, 3));
        assert_eq!(
            select_band(img.view(), 3).unwrap_err(),
            RasterError::BandIndexOutOfRange { index: 3, count: 3 }
        );
        assert!(select_band(img.view(), 2).is_ok());
    }

    #[test]
    fn test_select_band_empty_image() {
        let img = Array3::<u8>::zeros((0, 4, 1));
        assert_eq!(select_band(img.view(), 0).unwrap_err(), RasterError::EmptyBuffer);
    }

    #[test]
    fn test_split_and_stack_round_trip() {
        let mut img = Array3::<u8>::zeros((2, 3, 3));
        for ((y, x, c), v) in img.indexed_iter_mut() {
            *v = (y * 30 + x * 10 + c) as u8;
        }
        let bands = split_bands(img.view());
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[2][[1, 2]], 52);
        assert_eq!(stack_bands(&bands).unwrap(), img);
    }

    #[test]
    fn test_stack_bands_rejects_mismatched_shapes() {
        let a = Array2::<u8>::zeros((2, 2));
        let b = Array2::<u8>::zeros((2, 3));
        assert_eq!(
            stack_bands(&[a.view(), b.view()]).unwrap_err(),
            RasterError::BandShapeMismatch {
                expected: (2, 2),
                found: (2, 3)
            }
        );
    }

    #[test]
    fn test_map_bands_indexed_passes_band_index() {
        let img = Array3::<u8>::zeros((2, 3, 4));
        let out = map_bands_indexed(img.view(), |c, band| Ok(band.mapv(|v| v + c as u8))).unwrap();
        for c in 0..4 {
            assert!(out.index_axis(Axis(2), c).iter().all(|&v| v == c as u8));
        }
    }

    #[test]
    fn test_par_map_bands_matches_map_bands() {
        let mut img = Array3::<u8>::zeros((4, 4, 3));
        for ((y, x, c), v) in img.indexed_iter_mut() {
            *v = (y * 16 + x * 4 + c * 50) as u8;
        }
        let invert = |band: ArrayView2<u8>| Ok(band.mapv(|v| 255 - v));
        let sequential = map_bands(img.view(), invert).unwrap();
        let parallel = par_map_bands(img.view(), invert).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential[[1, 2, 1]], 255 - img[[1, 2, 1]]);
    }

    #[test]
    fn test_validate_kernel_size() {
        assert!(validate_kernel_size(1).is_ok());
        assert!(validate_kernel_size(5).is_ok());
        assert_eq!(
            validate_kernel_size(0).unwrap_err(),
            RasterError::InvalidKernelSize { size: 0 }
        );
        assert_eq!(
            validate_kernel_size(4).unwrap_err(),
            RasterError::InvalidKernelSize { size: 4 }
        );
    }

    #[test]
    fn test_gaussian_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel_1d(7, 1.5).unwrap();
        assert_eq!(k.len(), 7);
        assert_abs_diff_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(k[0], k[6], epsilon = 1e-7);
        assert!(k[3] > k[2]);
    }

    #[test]
    fn test_gaussian_kernel_derives_sigma() {
        let derived = gaussian_kernel_1d(5, 0.0).unwrap();
        let explicit = gaussian_kernel_1d(5, sigma_for_kernel_size(5)).unwrap();
        assert_eq!(derived, explicit);
    }

    #[test]
    fn test_gaussian_blur_flat_is_unchanged() {
        let band = Array2::<u8>::from_elem((6, 5), 77);
        let out = gaussian_blur(band.view(), 5, 1.2, 0.0).unwrap();
        assert_eq!(out, band);
    }

    #[test]
    fn test_gaussian_blur_spreads_point() {
        let band = array![[0u8, 0, 0], [0, 255, 0], [0, 0, 0]];
        let out = gaussian_blur(band.view(), 3, 1.0, 1.0).unwrap();
        assert!(out[[1, 1]] < 255);
        assert!(out[[0, 1]] > 0);
        assert_eq!(out[[0, 1]], out[[1, 0]]);
    }

    #[test]
    fn test_saturation_helpers() {
        assert_eq!(saturate_i64(-40), 0);
        assert_eq!(saturate_i64(300), 255);
        assert_eq!(saturate_i64(i64::MAX), 255);
        assert_eq!(saturate_f32(127.6), 128);
        assert_eq!(saturate_f32(-0.2), 0);
    }
}
