//! Error types for raster engine operations.
//!
//! Every engine entry point validates its inputs before touching pixel data
//! and reports problems through [`RasterError`]. Errors are raised
//! synchronously at the offending call and are never retried internally.

use thiserror::Error;

/// Errors raised by raster engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    /// The band or image has zero samples.
    #[error("raster buffer is empty (no samples to process)")]
    EmptyBuffer,

    /// Requested band does not exist in the image.
    #[error("band index {index} is out of range for an image with {count} band(s)")]
    BandIndexOutOfRange { index: usize, count: usize },

    /// Kernel or block size must be a positive odd integer.
    ///
    /// Adaptive thresholding additionally requires at least 3.
    #[error("invalid kernel size {size}: expected a positive odd integer")]
    InvalidKernelSize { size: usize },

    /// A kernel size was required but never committed.
    #[error("kernel size has not been set")]
    KernelSizeUnset,

    /// An ordered `(low, high)` pair was supplied with `low > high`.
    #[error("invalid threshold range: low {low} is greater than high {high}")]
    InvalidThresholdRange { low: f64, high: f64 },

    /// Bands being combined do not share one shape.
    #[error("band shape mismatch: expected {expected:?}, found {found:?}")]
    BandShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Correlation kernels must be square and non-empty.
    #[error("invalid kernel shape {rows}x{cols}: expected a non-empty square matrix")]
    InvalidKernelShape { rows: usize, cols: usize },

    /// A numeric parameter is outside its documented domain (NaN, negative sigma, ...).
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A filter name did not match any known filter.
    #[error("unknown filter `{name}`")]
    UnknownFilter { name: String },

    /// An analysis command was asked to produce a band.
    #[error("operation `{op}` does not produce a band")]
    NotABandOperation { op: &'static str },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RasterError>;

#[cfg(feature = "python")]
impl From<RasterError> for pyo3::PyErr {
    fn from(err: RasterError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = RasterError::BandIndexOutOfRange { index: 3, count: 3 };
        assert_eq!(
            err.to_string(),
            "band index 3 is out of range for an image with 3 band(s)"
        );

        let err = RasterError::InvalidKernelSize { size: 4 };
        assert!(err.to_string().contains("4"));
    }
}
