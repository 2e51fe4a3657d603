//! Unsharp masking.
//!
//! `output = saturate(band + amount * (band - GaussianBlur(band)))`. The blur
//! is separable with replicated borders; see [`gaussian_blur`].

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use super::core::{ensure_non_empty, gaussian_blur, saturate_f32, validate_kernel_size};
use crate::error::{RasterError, Result};

/// Unsharp mask configuration.
///
/// `kernel_size` must be committed before use: `None` is rejected with
/// [`RasterError::KernelSizeUnset`] rather than replaced by a default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnsharpParameters {
    pub kernel_size: Option<usize>,
    #[serde(default)]
    pub sigma_x: f32,
    #[serde(default)]
    pub sigma_y: f32,
    pub amount: f32,
}

impl UnsharpParameters {
    pub fn new(kernel_size: usize, sigma_x: f32, sigma_y: f32, amount: f32) -> Self {
        Self {
            kernel_size: Some(kernel_size),
            sigma_x,
            sigma_y,
            amount,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let size = self.kernel_size.ok_or(RasterError::KernelSizeUnset)?;
        validate_kernel_size(size)?;
        let fields = [
            ("sigma_x", self.sigma_x),
            ("sigma_y", self.sigma_y),
            ("amount", self.amount),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(RasterError::InvalidParameter {
                    name,
                    value: value as f64,
                });
            }
        }
        Ok(())
    }
}

/// Sharpen a band by amplifying its high-frequency residual.
///
/// # Arguments
/// * `band` - Input band
/// * `kernel_size` - Positive odd Gaussian kernel size
/// * `sigma_x` - Horizontal blur sigma (non-positive = derived from size)
/// * `sigma_y` - Vertical blur sigma (non-positive = same as `sigma_x`)
/// * `amount` - Residual gain; 0 returns the band unchanged
///
/// # Returns
/// Sharpened band, rounded and saturated to 0-255
pub fn unsharp_mask(
    band: ArrayView2<u8>,
    kernel_size: usize,
    sigma_x: f32,
    sigma_y: f32,
    amount: f32,
) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    UnsharpParameters::new(kernel_size, sigma_x, sigma_y, amount).validate()?;

    let blurred = gaussian_blur(band, kernel_size, sigma_x, sigma_y)?;
    let mut output = Array2::<u8>::zeros(band.dim());
    Zip::from(&mut output)
        .and(&band)
        .and(&blurred)
        .for_each(|out, &v, &b| {
            let original = v as f32;
            let mask = original - b as f32;
            *out = saturate_f32(original + amount * mask);
        });
    Ok(output)
}

/// [`unsharp_mask`] driven by a parameter struct.
pub fn unsharp_mask_with(band: ArrayView2<u8>, params: &UnsharpParameters) -> Result<Array2<u8>> {
    let kernel_size = params.kernel_size.ok_or(RasterError::KernelSizeUnset)?;
    unsharp_mask(band, kernel_size, params.sigma_x, params.sigma_y, params.amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_band() -> Array2<u8> {
        Array2::from_shape_fn((6, 8), |(_, x)| if x < 4 { 60 } else { 180 })
    }

    #[test]
    fn test_zero_amount_is_identity() {
        let band = Array2::from_shape_fn((9, 7), |(y, x)| (y * 29 + x * 13) as u8);
        let out = unsharp_mask(band.view(), 3, 1.0, 1.0, 0.0).unwrap();
        assert_eq!(out, band);
    }

    #[test]
    fn test_sharpen_increases_step_contrast() {
        let band = step_band();
        let out = unsharp_mask(band.view(), 3, 1.0, 1.0, 1.5).unwrap();

        // Overshoot on both sides of the step
        assert!(out[[2, 3]] < 60);
        assert!(out[[2, 4]] > 180);
        // Far from the step nothing changes
        assert_eq!(out[[2, 0]], 60);
        assert_eq!(out[[2, 7]], 180);
    }

    #[test]
    fn test_flat_band_is_unchanged() {
        let band = Array2::<u8>::from_elem((5, 5), 140);
        let out = unsharp_mask(band.view(), 5, 0.0, 0.0, 3.0).unwrap();
        assert_eq!(out, band);
    }

    #[test]
    fn test_rejects_even_kernel() {
        let band = step_band();
        assert_eq!(
            unsharp_mask(band.view(), 4, 1.0, 1.0, 1.0).unwrap_err(),
            RasterError::InvalidKernelSize { size: 4 }
        );
    }

    #[test]
    fn test_unset_kernel_size_is_an_error() {
        let band = step_band();
        let params = UnsharpParameters {
            kernel_size: None,
            sigma_x: 1.0,
            sigma_y: 1.0,
            amount: 1.0,
        };
        assert_eq!(params.validate().unwrap_err(), RasterError::KernelSizeUnset);
        assert_eq!(
            unsharp_mask_with(band.view(), &params).unwrap_err(),
            RasterError::KernelSizeUnset
        );
    }

    #[test]
    fn test_parameters_from_json() {
        let params: UnsharpParameters =
            serde_json::from_str(r#"{"kernel_size":3,"amount":0.5}"#).unwrap();
        assert_eq!(params, UnsharpParameters::new(3, 0.0, 0.0, 0.5));
    }
}
