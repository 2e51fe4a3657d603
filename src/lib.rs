//! RasterScope
//!
//! Per-band raster inspection and enhancement engine, with Python bindings
//! via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! - **Band**: `(height, width)` grid of `u8` samples, row-major
//! - **Image**: `(height, width, bands)`, every band sharing one shape
//!
//! Only 8-bit unsigned samples are supported. Operations never modify their
//! input; each returns a new band, histogram or statistics value.
//!
//! ## Operations
//! - Statistics and 256-bin histograms ([`filters::statistics`], [`filters::histogram`])
//! - Histogram equalization and brightness ([`filters::equalize`], [`filters::color_adjust`])
//! - Global, adaptive and Otsu thresholding ([`filters::threshold`])
//! - Bordered correlation and the Roberts/Prewitt/Sobel bank ([`filters::convolve`], [`filters::edge`])
//! - Salt-and-pepper and Gaussian noise ([`filters::noise`])
//! - Unsharp masking and Canny segmentation ([`filters::sharpen`], [`filters::canny`])
//!
//! [`command::Command`] wraps any of these as a serializable request.

pub mod command;
pub mod error;
pub mod filters;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use command::{Command, CommandOutput};
pub use error::{RasterError, Result};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::Array2;
    use numpy::{IntoPyArray, PyArray1, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::prelude::*;

    use crate::filters::canny as canny_mod;
    use crate::filters::color_adjust;
    use crate::filters::convolve::{self, Kernel};
    use crate::filters::core::{self as core_mod, par_map_bands};
    use crate::filters::edge::{self as edge_mod, EdgeFilter};
    use crate::filters::equalize as equalize_mod;
    use crate::filters::histogram as histogram_mod;
    use crate::filters::noise as noise_mod;
    use crate::filters::sharpen;
    use crate::filters::statistics;
    use crate::filters::threshold::{self, AdaptiveMethod, ThresholdParameters};

    // ========================================================================
    // Statistics and Histograms
    // ========================================================================

    /// Band statistics as `(min, max, mean, std, sum)`.
    #[pyfunction]
    pub fn compute_statistics<'py>(
        band: PyReadonlyArray2<'py, u8>,
    ) -> PyResult<(u8, u8, f64, f64, u64)> {
        let s = statistics::compute_statistics(band.as_array())?;
        Ok((s.min, s.max, s.mean, s.std, s.sum))
    }

    /// Statistics over every sample of every band.
    #[pyfunction]
    pub fn compute_image_statistics<'py>(
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<(u8, u8, f64, f64, u64)> {
        let s = statistics::compute_image_statistics(image.as_array())?;
        Ok((s.min, s.max, s.mean, s.std, s.sum))
    }

    #[pyfunction]
    pub fn histogram<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray1<u64>>> {
        let hist = histogram_mod::compute_histogram(band.as_array())?;
        Ok(hist.counts().to_vec().into_pyarray(py))
    }

    #[pyfunction]
    pub fn cumulative_histogram<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray1<u64>>> {
        let hist = histogram_mod::compute_histogram(band.as_array())?;
        Ok(hist.cumulative().counts().to_vec().into_pyarray(py))
    }

    /// One histogram row per band, shape (bands, 256).
    #[pyfunction]
    pub fn band_histograms<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray2<u64>>> {
        let hists = histogram_mod::compute_band_histograms(image.as_array())?;
        let table = Array2::from_shape_fn((hists.len(), histogram_mod::BINS), |(b, i)| {
            hists[b].counts()[i]
        });
        Ok(table.into_pyarray(py))
    }

    // ========================================================================
    // Point Transforms
    // ========================================================================

    #[pyfunction]
    pub fn equalize<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = equalize_mod::equalize(band.as_array())?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn brightness<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        offset: f32,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = color_adjust::brightness(band.as_array(), offset)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (band, threshold, max_value=255))]
    pub fn global_threshold<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        threshold: u8,
        max_value: u8,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = threshold::global_threshold(band.as_array(), threshold, max_value)?;
        Ok(result.into_pyarray(py))
    }

    /// Adaptive threshold with a mean (default) or Gaussian local reference.
    #[pyfunction]
    #[pyo3(signature = (band, block_size, constant=0.0, max_value=255, gaussian=false))]
    pub fn adaptive_threshold<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        block_size: usize,
        constant: f64,
        max_value: u8,
        gaussian: bool,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let method = if gaussian {
            AdaptiveMethod::Gaussian
        } else {
            AdaptiveMethod::Mean
        };
        let params = ThresholdParameters::adaptive(block_size, constant, max_value);
        let result = threshold::adaptive_threshold(band.as_array(), method, &params)?;
        Ok(result.into_pyarray(py))
    }

    /// Otsu threshold. Returns `(threshold, band)`.
    #[pyfunction]
    #[pyo3(signature = (band, blur_kernel_size=None, max_value=255))]
    pub fn otsu_threshold<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        blur_kernel_size: Option<usize>,
        max_value: u8,
    ) -> PyResult<(u8, Bound<'py, PyArray2<u8>>)> {
        let params = ThresholdParameters::otsu(blur_kernel_size, max_value);
        let result = threshold::otsu_threshold(band.as_array(), &params)?;
        Ok((result.threshold, result.output.into_pyarray(py)))
    }

    // ========================================================================
    // Correlation and Edges
    // ========================================================================

    /// Correlate with a square integer kernel, replicated borders, saturated.
    #[pyfunction]
    pub fn correlate<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        kernel: PyReadonlyArray2<'py, i32>,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let kernel = Kernel::new(kernel.as_array().to_owned())?;
        let result = convolve::correlate(band.as_array(), &kernel)?;
        Ok(result.into_pyarray(py))
    }

    /// Edge filter by name, e.g. `"sobel_vertical"`.
    #[pyfunction]
    pub fn edges<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        filter: &str,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let filter: EdgeFilter = filter.parse()?;
        let result = edge_mod::detect_edges(band.as_array(), filter)?;
        Ok(result.into_pyarray(py))
    }

    /// Edge filter applied to every band of an image, bands run in parallel.
    #[pyfunction]
    pub fn edges_all_bands<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter: &str,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let filter: EdgeFilter = filter.parse()?;
        let kernel = filter.kernel();
        let result = par_map_bands(image.as_array(), |band| convolve::correlate(band, &kernel))?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Noise
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (band, salt_probability, seed=0))]
    pub fn salt_and_pepper<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        salt_probability: f64,
        seed: u64,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = noise_mod::salt_and_pepper(band.as_array(), salt_probability, seed)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (band, mean, sigma, seed=0))]
    pub fn gaussian_noise<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        mean: f64,
        sigma: f64,
        seed: u64,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = noise_mod::gaussian_noise(band.as_array(), mean, sigma, seed)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Blur, Sharpen, Canny
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (band, kernel_size, sigma_x=0.0, sigma_y=0.0))]
    pub fn gaussian_blur<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        kernel_size: usize,
        sigma_x: f32,
        sigma_y: f32,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = core_mod::gaussian_blur(band.as_array(), kernel_size, sigma_x, sigma_y)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (band, kernel_size, sigma_x=0.0, sigma_y=0.0, amount=1.0))]
    pub fn unsharp_mask<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        kernel_size: usize,
        sigma_x: f32,
        sigma_y: f32,
        amount: f32,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result =
            sharpen::unsharp_mask(band.as_array(), kernel_size, sigma_x, sigma_y, amount)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn canny<'py>(
        py: Python<'py>,
        band: PyReadonlyArray2<'py, u8>,
        low: f64,
        high: f64,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = canny_mod::canny(band.as_array(), low, high)?;
        Ok(result.into_pyarray(py))
    }

    /// RasterScope extension module
    #[pymodule]
    pub fn rasterscope(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Analysis
        m.add_function(wrap_pyfunction!(compute_statistics, m)?)?;
        m.add_function(wrap_pyfunction!(compute_image_statistics, m)?)?;
        m.add_function(wrap_pyfunction!(histogram, m)?)?;
        m.add_function(wrap_pyfunction!(cumulative_histogram, m)?)?;
        m.add_function(wrap_pyfunction!(band_histograms, m)?)?;

        // Point transforms
        m.add_function(wrap_pyfunction!(equalize, m)?)?;
        m.add_function(wrap_pyfunction!(brightness, m)?)?;
        m.add_function(wrap_pyfunction!(global_threshold, m)?)?;
        m.add_function(wrap_pyfunction!(adaptive_threshold, m)?)?;
        m.add_function(wrap_pyfunction!(otsu_threshold, m)?)?;

        // Correlation and edges
        m.add_function(wrap_pyfunction!(correlate, m)?)?;
        m.add_function(wrap_pyfunction!(edges, m)?)?;
        m.add_function(wrap_pyfunction!(edges_all_bands, m)?)?;

        // Noise
        m.add_function(wrap_pyfunction!(salt_and_pepper, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian_noise, m)?)?;

        // Blur, sharpen, canny
        m.add_function(wrap_pyfunction!(gaussian_blur, m)?)?;
        m.add_function(wrap_pyfunction!(unsharp_mask, m)?)?;
        m.add_function(wrap_pyfunction!(canny, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::rasterscope;
