//! Noise injection: salt-and-pepper and additive Gaussian.
//!
//! Both generators are seeded explicitly, so the same `(band, parameters,
//! seed)` always yields the same output. Parameters are not clamped into
//! their documented ranges; out-of-range values simply produce the
//! corresponding degenerate result.

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::core::{ensure_non_empty, saturate_f32};
use crate::error::{RasterError, Result};

/// Noise model and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseParameters {
    /// `salt_probability` in `[0, 1]`; 1 leaves the band unchanged
    SaltAndPepper { salt_probability: f64 },

    /// Additive `Normal(mean, sigma)` noise, `sigma >= 0`
    Gaussian { mean: f64, sigma: f64 },
}

impl NoiseParameters {
    pub fn validate(&self) -> Result<()> {
        match *self {
            NoiseParameters::SaltAndPepper { salt_probability } => {
                if salt_probability.is_nan() {
                    return Err(RasterError::InvalidParameter {
                        name: "salt_probability",
                        value: salt_probability,
                    });
                }
            }
            NoiseParameters::Gaussian { mean, sigma } => {
                if !mean.is_finite() {
                    return Err(RasterError::InvalidParameter { name: "mean", value: mean });
                }
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(RasterError::InvalidParameter { name: "sigma", value: sigma });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Salt and pepper
// ============================================================================

/// Inject salt-and-pepper noise.
///
/// One uniform draw `r` in `[0, 1)` per pixel: `r > p` gives 255, otherwise
/// `r < 1 - p` gives 0, otherwise the sample is kept. Salt is checked first,
/// so for `p < 0.5` the overlap goes to salt.
///
/// # Arguments
/// * `band` - Input band
/// * `salt_probability` - `p` above
/// * `seed` - Random seed for deterministic results
pub fn salt_and_pepper(
    band: ArrayView2<u8>,
    salt_probability: f64,
    seed: u64,
) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    NoiseParameters::SaltAndPepper { salt_probability }.validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let pepper_below = 1.0 - salt_probability;
    Ok(band.mapv(|v| {
        let r: f64 = rng.random();
        if r > salt_probability {
            255
        } else if r < pepper_below {
            0
        } else {
            v
        }
    }))
}

// ============================================================================
// Gaussian
// ============================================================================

/// Add Gaussian noise, rounding and saturating each result to 0-255.
///
/// # Arguments
/// * `band` - Input band
/// * `mean` - Mean of the added noise
/// * `sigma` - Standard deviation of the added noise
/// * `seed` - Random seed for deterministic results
pub fn gaussian_noise(band: ArrayView2<u8>, mean: f64, sigma: f64, seed: u64) -> Result<Array2<u8>> {
    ensure_non_empty(&band)?;
    NoiseParameters::Gaussian { mean, sigma }.validate()?;

    let normal = Normal::new(mean, sigma)
        .map_err(|_| RasterError::InvalidParameter { name: "sigma", value: sigma })?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(band.mapv(|v| saturate_f32((v as f64 + normal.sample(&mut rng)) as f32)))
}

/// Apply the noise model described by `params`.
pub fn add_noise(band: ArrayView2<u8>, params: &NoiseParameters, seed: u64) -> Result<Array2<u8>> {
    match *params {
        NoiseParameters::SaltAndPepper { salt_probability } => {
            salt_and_pepper(band, salt_probability, seed)
        }
        NoiseParameters::Gaussian { mean, sigma } => gaussian_noise(band, mean, sigma, seed),
    }
}
