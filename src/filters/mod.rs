//! Per-band raster operations.
//!
//! ## Data Layout
//!
//! | Kind | Type | Shape |
//! |------|------|-------|
//! | Band | `Array2<u8>` | (H, W) |
//! | Image | `Array3<u8>` | (H, W, bands) |
//!
//! Every operation takes a borrowed band (`ArrayView2<u8>`) and returns a new
//! owned one; inputs are never modified. Multi-band images are processed one
//! band at a time through [`core::map_bands`] or [`core::par_map_bands`].
//!
//! ## Filter Categories
//!
//! - **Analysis**: statistics, histogram, cumulative histogram
//! - **Pixel-wise**: brightness, equalization, global threshold
//! - **Neighborhood**: adaptive threshold, correlation, edge kernels, unsharp mask
//! - **Segmentation**: Otsu threshold, Canny
//! - **Noise**: salt-and-pepper, Gaussian

pub mod core;

pub mod statistics;
pub mod histogram;
pub mod equalize;
pub mod color_adjust;
pub mod threshold;
pub mod convolve;
pub mod edge;
pub mod noise;
pub mod sharpen;
pub mod canny;
