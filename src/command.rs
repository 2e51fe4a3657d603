//! Serializable operation requests.
//!
//! A [`Command`] names one engine operation together with its already-parsed
//! parameters, e.g.
//!
//! ```json
//! {"op": "global_threshold", "threshold": 100, "max_value": 255}
//! ```
//!
//! [`Command::apply`] selects the requested band, validates the parameters and
//! runs the matching pure function. Nothing is cached between calls; the band
//! index and any remembered kernel size are supplied by the caller every time.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};
use crate::filters::canny::{canny_with, CannyParameters};
use crate::filters::color_adjust::brightness;
use crate::filters::core::{map_bands_indexed, select_band};
use crate::filters::edge::{detect_edges, EdgeFilter};
use crate::filters::equalize::equalize;
use crate::filters::histogram::{compute_histogram, CumulativeHistogram, Histogram};
use crate::filters::noise::{add_noise, NoiseParameters};
use crate::filters::sharpen::{unsharp_mask_with, UnsharpParameters};
use crate::filters::statistics::{compute_statistics, BandStatistics};
use crate::filters::threshold::{
    adaptive_threshold, global_threshold, otsu_threshold, AdaptiveMethod, OtsuResult,
    ThresholdParameters,
};

fn default_max_value() -> u8 {
    255
}

/// One engine operation and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Statistics,
    Histogram,
    CumulativeHistogram,
    Equalize,
    Brightness {
        offset: f32,
    },
    GlobalThreshold {
        threshold: u8,
        #[serde(default = "default_max_value")]
        max_value: u8,
    },
    AdaptiveThreshold {
        #[serde(default)]
        method: AdaptiveMethod,
        block_size: Option<usize>,
        #[serde(default)]
        constant: f64,
        #[serde(default = "default_max_value")]
        max_value: u8,
    },
    Otsu {
        /// Pre-blur kernel size; `None` thresholds the band as is
        blur_kernel_size: Option<usize>,
        /// Informational lower marker, never constrains the split
        #[serde(default)]
        low: u8,
        #[serde(default = "default_max_value")]
        max_value: u8,
    },
    Edges {
        filter: EdgeFilter,
    },
    Noise {
        noise: NoiseParameters,
        seed: u64,
    },
    UnsharpMask(UnsharpParameters),
    Canny(CannyParameters),
}

/// Result of running a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Band(Array2<u8>),
    Statistics(BandStatistics),
    Histogram(Histogram),
    CumulativeHistogram(CumulativeHistogram),
    Otsu(OtsuResult),
}

impl CommandOutput {
    /// The produced band, if this output has one.
    pub fn band(&self) -> Option<&Array2<u8>> {
        match self {
            CommandOutput::Band(band) => Some(band),
            CommandOutput::Otsu(result) => Some(&result.output),
            _ => None,
        }
    }

    pub fn into_band(self) -> Option<Array2<u8>> {
        match self {
            CommandOutput::Band(band) => Some(band),
            CommandOutput::Otsu(result) => Some(result.output),
            _ => None,
        }
    }
}

impl Command {
    /// Short operation name, matching the serialized `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Statistics => "statistics",
            Command::Histogram => "histogram",
            Command::CumulativeHistogram => "cumulative_histogram",
            Command::Equalize => "equalize",
            Command::Brightness { .. } => "brightness",
            Command::GlobalThreshold { .. } => "global_threshold",
            Command::AdaptiveThreshold { .. } => "adaptive_threshold",
            Command::Otsu { .. } => "otsu",
            Command::Edges { .. } => "edges",
            Command::Noise { .. } => "noise",
            Command::UnsharpMask(_) => "unsharp_mask",
            Command::Canny(_) => "canny",
        }
    }

    fn threshold_parameters(&self) -> Option<ThresholdParameters> {
        match *self {
            Command::AdaptiveThreshold {
                block_size,
                constant,
                max_value,
                ..
            } => Some(ThresholdParameters {
                block_size,
                constant: Some(constant),
                max_value,
                ..ThresholdParameters::default()
            }),
            Command::Otsu {
                blur_kernel_size,
                low,
                max_value,
            } => Some(ThresholdParameters {
                low,
                ..ThresholdParameters::otsu(blur_kernel_size, max_value)
            }),
            _ => None,
        }
    }

    /// Check parameters without touching pixel data.
    pub fn validate(&self) -> Result<()> {
        if let Some(params) = self.threshold_parameters() {
            params.validate()?;
        }
        match self {
            Command::Brightness { offset } if !offset.is_finite() => {
                Err(RasterError::InvalidParameter {
                    name: "offset",
                    value: *offset as f64,
                })
            }
            Command::AdaptiveThreshold { block_size: None, .. } => {
                Err(RasterError::KernelSizeUnset)
            }
            Command::Noise { noise, .. } => noise.validate(),
            Command::UnsharpMask(params) => params.validate(),
            Command::Canny(params) => params.validate(),
            _ => Ok(()),
        }
    }

    /// Run the operation on one band of `image`.
    ///
    /// # Arguments
    /// * `image` - Image with shape (height, width, bands)
    /// * `band_index` - Zero-based band to operate on
    pub fn apply(&self, image: ArrayView3<u8>, band_index: usize) -> Result<CommandOutput> {
        let band = select_band(image, band_index)?;
        log::debug!("{} on band {}", self.name(), band_index);
        self.apply_to_band(band)
    }

    /// Run the operation on a single band.
    pub fn apply_to_band(&self, band: ArrayView2<u8>) -> Result<CommandOutput> {
        self.validate()?;

        let output = match self {
            Command::Statistics => CommandOutput::Statistics(compute_statistics(band)?),
            Command::Histogram => CommandOutput::Histogram(compute_histogram(band)?),
            Command::CumulativeHistogram => {
                CommandOutput::CumulativeHistogram(compute_histogram(band)?.cumulative())
            }
            Command::Equalize => CommandOutput::Band(equalize(band)?),
            Command::Brightness { offset } => CommandOutput::Band(brightness(band, *offset)?),
            Command::GlobalThreshold {
                threshold,
                max_value,
            } => CommandOutput::Band(global_threshold(band, *threshold, *max_value)?),
            Command::AdaptiveThreshold { method, .. } => {
                let params = self.threshold_parameters().unwrap_or_default();
                CommandOutput::Band(adaptive_threshold(band, *method, &params)?)
            }
            Command::Otsu { .. } => {
                let params = self.threshold_parameters().unwrap_or_default();
                CommandOutput::Otsu(otsu_threshold(band, &params)?)
            }
            Command::Edges { filter } => CommandOutput::Band(detect_edges(band, *filter)?),
            Command::Noise { noise, seed } => CommandOutput::Band(add_noise(band, noise, *seed)?),
            Command::UnsharpMask(params) => CommandOutput::Band(unsharp_mask_with(band, params)?),
            Command::Canny(params) => CommandOutput::Band(canny_with(band, params)?),
        };
        Ok(output)
    }

    /// Run a band-producing operation on every band and recombine.
    ///
    /// Analysis commands (statistics, histograms) are rejected with
    /// [`RasterError::NotABandOperation`]. Noise on band `i` is seeded with
    /// `seed + i` (wrapping).
    pub fn apply_to_bands(&self, image: ArrayView3<u8>) -> Result<Array3<u8>> {
        let op = self.name();
        match self {
            Command::Statistics | Command::Histogram | Command::CumulativeHistogram => {
                return Err(RasterError::NotABandOperation { op });
            }
            _ => {}
        }
        self.validate()?;
        log::debug!("{} on all {} band(s)", op, image.dim().2);

        map_bands_indexed(image, |index, band| {
            let output = match self {
                // independent field per band, reproducible from one seed
                Command::Noise { noise, seed } => {
                    CommandOutput::Band(add_noise(band, noise, seed.wrapping_add(index as u64))?)
                }
                _ => self.apply_to_band(band)?,
            };
            output
                .into_band()
                .ok_or(RasterError::NotABandOperation { op })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    fn two_band_image() -> Array3<u8> {
        let mut img = Array3::<u8>::zeros((4, 4, 2));
        for ((y, x, c), v) in img.indexed_iter_mut() {
            *v = if c == 0 {
                if (1..3).contains(&y) && (1..3).contains(&x) {
                    200
                } else {
                    10
                }
            } else {
                (y * 40 + x * 10) as u8
            };
        }
        img
    }

    #[test]
    fn test_global_threshold_from_json() {
        let cmd: Command =
            serde_json::from_str(r#"{"op": "global_threshold", "threshold": 100}"#).unwrap();
        assert_eq!(
            cmd,
            Command::GlobalThreshold {
                threshold: 100,
                max_value: 255
            }
        );

        let img = two_band_image();
        let out = cmd.apply(img.view(), 0).unwrap().into_band().unwrap();
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
    fn test_band_index_checked() {
        let img = two_band_image();
        assert_eq!(
            Command::Equalize.apply(img.view(), 2).unwrap_err(),
            RasterError::BandIndexOutOfRange { index: 2, count: 2 }
        );
    }

    #[test]
    fn test_statistics_command() {
        let img = two_band_image();
        match Command::Statistics.apply(img.view(), 0).unwrap() {
            CommandOutput::Statistics(stats) => {
                assert_eq!(stats.min, 10);
                assert_eq!(stats.max, 200);
                assert_eq!(stats.sum, 4 * 200 + 12 * 10);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_adaptive_requires_block_size() {
        let cmd: Command =
            serde_json::from_str(r#"{"op": "adaptive_threshold", "constant": 2.0}"#).unwrap();
        assert_eq!(cmd.validate().unwrap_err(), RasterError::KernelSizeUnset);

        let cmd = Command::AdaptiveThreshold {
            method: AdaptiveMethod::Mean,
            block_size: Some(4),
            constant: 0.0,
            max_value: 255,
        };
        assert_eq!(
            cmd.validate().unwrap_err(),
            RasterError::InvalidKernelSize { size: 4 }
        );
    }

    #[test]
    fn test_otsu_command_reports_threshold() {
        let img = two_band_image();
        let cmd = Command::Otsu {
            blur_kernel_size: None,
            low: 0,
            max_value: 255,
        };
        match cmd.apply(img.view(), 0).unwrap() {
            CommandOutput::Otsu(result) => {
                assert!(result.threshold > 10 && result.threshold < 200);
                assert_eq!(result.output[[1, 1]], 255);
                assert_eq!(result.output[[0, 0]], 0);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_nested_parameter_commands_from_json() {
        let noise: Command = serde_json::from_str(
            r#"{"op": "noise", "noise": {"kind": "gaussian", "mean": 0.0, "sigma": 4.0}, "seed": 9}"#,
        )
        .unwrap();
        assert_eq!(noise.name(), "noise");

        let unsharp: Command =
            serde_json::from_str(r#"{"op": "unsharp_mask", "kernel_size": 3, "amount": 1.0}"#)
                .unwrap();
        assert_eq!(
            unsharp,
            Command::UnsharpMask(UnsharpParameters::new(3, 0.0, 0.0, 1.0))
        );

        let canny: Command =
            serde_json::from_str(r#"{"op": "canny", "low": 20, "high": 80}"#).unwrap();
        assert_eq!(canny, Command::Canny(CannyParameters { low: 20.0, high: 80.0 }));
    }

    #[test]
    fn test_apply_to_bands_matches_per_band() {
        let img = two_band_image();
        let cmd = Command::Edges {
            filter: EdgeFilter::SobelVertical,
        };
        let all = cmd.apply_to_bands(img.view()).unwrap();
        for c in 0..2 {
            let single = cmd.apply(img.view(), c).unwrap().into_band().unwrap();
            assert_eq!(all.index_axis(Axis(2), c), single);
        }
    }

    #[test]
    fn test_noise_on_all_bands_uses_band_seeds() {
        let img = Array3::<u8>::from_elem((16, 16, 3), 128);
        let noise = NoiseParameters::Gaussian {
            mean: 0.0,
            sigma: 20.0,
        };
        let cmd = Command::Noise { noise, seed: 7 };
        let all = cmd.apply_to_bands(img.view()).unwrap();

        for c in 0..3 {
            let expected = add_noise(img.index_axis(Axis(2), c), &noise, 7 + c as u64).unwrap();
            assert_eq!(all.index_axis(Axis(2), c), expected);
        }
        assert_ne!(all.index_axis(Axis(2), 0), all.index_axis(Axis(2), 1));
        let first = cmd.apply(img.view(), 0).unwrap().into_band().unwrap();
        assert_eq!(first, all.index_axis(Axis(2), 0));
    }

    #[test]
    fn test_apply_to_bands_rejects_analysis() {
        let img = two_band_image();
        assert_eq!(
            Command::Histogram.apply_to_bands(img.view()).unwrap_err(),
            RasterError::NotABandOperation { op: "histogram" }
        );
    }
}
