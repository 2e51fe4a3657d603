//! Edge detection filters: Roberts, Prewitt, Sobel.
//!
//! Each filter is a fixed kernel applied through [`correlate`], so the output
//! uses replicated borders and saturates to 0-255. Negative responses clip to
//! zero: a filter only shows edges whose gradient points along its kernel.
//!
//! ## Kernels
//!
//! | Filter | Kernel |
//! |--------|--------|
//! | Roberts X | `[[-1,0],[0,1]]` |
//! | Roberts Y | `[[0,-1],[1,0]]` |
//! | Prewitt horizontal | `[[1,1,1],[0,0,0],[-1,-1,-1]]` |
//! | Prewitt vertical | `[[-1,0,1],[-1,0,1],[-1,0,1]]` |
//! | Prewitt NE | `[[0,1,1],[-1,0,1],[-1,-1,0]]` |
//! | Prewitt NW | `[[-1,-1,0],[-1,0,1],[0,1,1]]` |
//! | Sobel horizontal | `[[-1,-2,-1],[0,0,0],[1,2,1]]` |
//! | Sobel vertical | `[[-1,0,1],[-2,0,2],[-1,0,1]]` |
//! | Sobel NE | `[[0,1,2],[-1,0,1],[-2,-1,0]]` |
//! | Sobel NW | `[[-2,-1,0],[-1,0,1],[0,1,2]]` |

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};

use super::convolve::{correlate, Kernel};
use super::core::map_bands;
use crate::error::{RasterError, Result};

/// The fixed edge kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeFilter {
    RobertsX,
    RobertsY,
    PrewittHorizontal,
    PrewittVertical,
    PrewittNortheast,
    PrewittNorthwest,
    SobelHorizontal,
    SobelVertical,
    SobelNortheast,
    SobelNorthwest,
}

impl EdgeFilter {
    pub const ALL: [EdgeFilter; 10] = [
        EdgeFilter::RobertsX,
        EdgeFilter::RobertsY,
        EdgeFilter::PrewittHorizontal,
        EdgeFilter::PrewittVertical,
        EdgeFilter::PrewittNortheast,
        EdgeFilter::PrewittNorthwest,
        EdgeFilter::SobelHorizontal,
        EdgeFilter::SobelVertical,
        EdgeFilter::SobelNortheast,
        EdgeFilter::SobelNorthwest,
    ];

    /// The correlation kernel for this filter.
    pub fn kernel(self) -> Kernel {
        match self {
            EdgeFilter::RobertsX => Kernel::from_2x2([[-1, 0], [0, 1]]),
            EdgeFilter::RobertsY => Kernel::from_2x2([[0, -1], [1, 0]]),
            EdgeFilter::PrewittHorizontal => {
                Kernel::from_3x3([[1, 1, 1], [0, 0, 0], [-1, -1, -1]])
            }
            EdgeFilter::PrewittVertical => Kernel::from_3x3([[-1, 0, 1], [-1, 0, 1], [-1, 0, 1]]),
            EdgeFilter::PrewittNortheast => {
                Kernel::from_3x3([[0, 1, 1], [-1, 0, 1], [-1, -1, 0]])
            }
            EdgeFilter::PrewittNorthwest => {
                Kernel::from_3x3([[-1, -1, 0], [-1, 0, 1], [0, 1, 1]])
            }
            EdgeFilter::SobelHorizontal => Kernel::from_3x3([[-1, -2, -1], [0, 0, 0], [1, 2, 1]]),
            EdgeFilter::SobelVertical => Kernel::from_3x3([[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]]),
            EdgeFilter::SobelNortheast => Kernel::from_3x3([[0, 1, 2], [-1, 0, 1], [-2, -1, 0]]),
            EdgeFilter::SobelNorthwest => Kernel::from_3x3([[-2, -1, 0], [-1, 0, 1], [0, 1, 2]]),
        }
    }
}

impl std::str::FromStr for EdgeFilter {
    type Err = RasterError;

    /// Parse the snake_case filter name, e.g. `sobel_vertical`.
    fn from_str(name: &str) -> Result<Self> {
        let filter = match name {
            "roberts_x" => EdgeFilter::RobertsX,
            "roberts_y" => EdgeFilter::RobertsY,
            "prewitt_horizontal" => EdgeFilter::PrewittHorizontal,
            "prewitt_vertical" => EdgeFilter::PrewittVertical,
            "prewitt_northeast" => EdgeFilter::PrewittNortheast,
            "prewitt_northwest" => EdgeFilter::PrewittNorthwest,
            "sobel_horizontal" => EdgeFilter::SobelHorizontal,
            "sobel_vertical" => EdgeFilter::SobelVertical,
            "sobel_northeast" => EdgeFilter::SobelNortheast,
            "sobel_northwest" => EdgeFilter::SobelNorthwest,
            _ => {
                return Err(RasterError::UnknownFilter {
                    name: name.to_string(),
                })
            }
        };
        Ok(filter)
    }
}

/// Apply an edge filter to one band.
pub fn detect_edges(band: ArrayView2<u8>, filter: EdgeFilter) -> Result<Array2<u8>> {
    correlate(band, &filter.kernel())
}

/// Apply an edge filter independently to every band and recombine.
pub fn detect_edges_all_bands(image: ArrayView3<u8>, filter: EdgeFilter) -> Result<Array3<u8>> {
    let kernel = filter.kernel();
    log::debug!("{:?} on {} band(s)", filter, image.dim().2);
    map_bands(image, |band| correlate(band, &kernel))
}
