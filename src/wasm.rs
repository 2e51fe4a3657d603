//! WebAssembly exports for the raster engine.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! Every export takes one band as a flat row-major byte slice plus its
//! `width` and `height`, and returns a new flat band. Engine errors surface
//! as rejected calls carrying the error message.

use ndarray::Array2;
use wasm_bindgen::prelude::*;

use crate::error::RasterError;
use crate::filters::canny::canny;
use crate::filters::color_adjust::brightness;
use crate::filters::edge::{detect_edges, EdgeFilter};
use crate::filters::equalize::equalize;
use crate::filters::histogram::compute_histogram;
use crate::filters::noise::{gaussian_noise, salt_and_pepper};
use crate::filters::sharpen::unsharp_mask;
use crate::filters::threshold::{
    adaptive_threshold, global_threshold, otsu_threshold, AdaptiveMethod, ThresholdParameters,
};

fn to_js(err: RasterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn band_from_slice(data: &[u8], width: usize, height: usize) -> Result<Array2<u8>, JsValue> {
    Array2::from_shape_vec((height, width), data.to_vec())
        .map_err(|e| JsValue::from_str(&format!("invalid dimensions {width}x{height}: {e}")))
}

fn into_flat(band: Array2<u8>) -> Vec<u8> {
    band.into_raw_vec_and_offset().0
}

// ============================================================================
// Analysis
// ============================================================================

/// 256-bin histogram of a band, as a `Float64Array`.
///
/// Counts are `f64` so they map onto JavaScript numbers; they stay exact up
/// to 2^53 samples per bin.
#[wasm_bindgen]
pub fn histogram_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<f64>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    let histogram = compute_histogram(band.view()).map_err(to_js)?;
    Ok(histogram.counts().iter().map(|&c| c as f64).collect())
}

// ============================================================================
// Point transforms
// ============================================================================

#[wasm_bindgen]
pub fn equalize_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    equalize(band.view()).map(into_flat).map_err(to_js)
}

#[wasm_bindgen]
pub fn brightness_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    offset: f32,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    brightness(band.view(), offset).map(into_flat).map_err(to_js)
}

#[wasm_bindgen]
pub fn global_threshold_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    threshold: u8,
    max_value: u8,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    global_threshold(band.view(), threshold, max_value)
        .map(into_flat)
        .map_err(to_js)
}

/// Adaptive threshold; `gaussian` selects the Gaussian-weighted reference.
#[wasm_bindgen]
pub fn adaptive_threshold_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    block_size: usize,
    constant: f64,
    max_value: u8,
    gaussian: bool,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    let method = if gaussian {
        AdaptiveMethod::Gaussian
    } else {
        AdaptiveMethod::Mean
    };
    let params = ThresholdParameters::adaptive(block_size, constant, max_value);
    adaptive_threshold(band.view(), method, &params)
        .map(into_flat)
        .map_err(to_js)
}

/// Otsu threshold; a `blur_kernel_size` of 0 disables pre-smoothing.
#[wasm_bindgen]
pub fn otsu_threshold_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    blur_kernel_size: usize,
    max_value: u8,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    let blur = (blur_kernel_size > 0).then_some(blur_kernel_size);
    let params = ThresholdParameters::otsu(blur, max_value);
    otsu_threshold(band.view(), &params)
        .map(|result| into_flat(result.output))
        .map_err(to_js)
}

// ============================================================================
// Filters
// ============================================================================

/// Edge filter by name, e.g. `"sobel_vertical"` or `"roberts_x"`.
#[wasm_bindgen]
pub fn edges_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    filter: &str,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    let filter: EdgeFilter = filter.parse().map_err(to_js)?;
    detect_edges(band.view(), filter).map(into_flat).map_err(to_js)
}

#[wasm_bindgen]
pub fn salt_and_pepper_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    salt_probability: f64,
    seed: u64,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    salt_and_pepper(band.view(), salt_probability, seed)
        .map(into_flat)
        .map_err(to_js)
}

#[wasm_bindgen]
pub fn gaussian_noise_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    mean: f64,
    sigma: f64,
    seed: u64,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    gaussian_noise(band.view(), mean, sigma, seed)
        .map(into_flat)
        .map_err(to_js)
}

#[wasm_bindgen]
pub fn unsharp_mask_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    kernel_size: usize,
    sigma_x: f32,
    sigma_y: f32,
    amount: f32,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    unsharp_mask(band.view(), kernel_size, sigma_x, sigma_y, amount)
        .map(into_flat)
        .map_err(to_js)
}

#[wasm_bindgen]
pub fn canny_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    low: f64,
    high: f64,
) -> Result<Vec<u8>, JsValue> {
    let band = band_from_slice(data, width, height)?;
    canny(band.view(), low, high).map(into_flat).map_err(to_js)
}
