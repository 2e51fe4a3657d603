//! Histogram and cumulative histogram computation.
//!
//! Histograms always have 256 bins, one per 8-bit intensity value.

use ndarray::{ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};

use super::core::{ensure_non_empty, split_bands};
use crate::error::Result;

/// Number of bins in every histogram.
pub const BINS: usize = 256;

/// Per-intensity sample counts of one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram([u64; BINS]);

/// Inclusive running sum of a [`Histogram`].
///
/// Non-decreasing; the last entry equals the pixel count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeHistogram([u64; BINS]);

impl Histogram {
    /// Build a histogram from raw counts (useful for synthetic distributions).
    pub fn from_counts(counts: [u64; BINS]) -> Self {
        Histogram(counts)
    }

    pub fn counts(&self) -> &[u64; BINS] {
        &self.0
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Largest bin count (for plot scaling).
    pub fn max_count(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Lowest intensity with a nonzero count.
    pub fn first_nonzero(&self) -> Option<u8> {
        self.0.iter().position(|&c| c > 0).map(|i| i as u8)
    }

    /// Highest intensity with a nonzero count.
    pub fn last_nonzero(&self) -> Option<u8> {
        self.0.iter().rposition(|&c| c > 0).map(|i| i as u8)
    }

    pub fn cumulative(&self) -> CumulativeHistogram {
        compute_cumulative(self)
    }
}

impl std::ops::Index<u8> for Histogram {
    type Output = u64;

    fn index(&self, value: u8) -> &u64 {
        &self.0[value as usize]
    }
}

impl Serialize for Histogram {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let counts = Vec::<u64>::deserialize(deserializer)?;
        let counts: [u64; BINS] = counts.try_into().map_err(|v: Vec<u64>| {
            serde::de::Error::invalid_length(v.len(), &"exactly 256 histogram bins")
        })?;
        Ok(Histogram(counts))
    }
}

impl CumulativeHistogram {
    pub fn counts(&self) -> &[u64; BINS] {
        &self.0
    }

    /// Smallest nonzero cumulative count, if any sample was counted.
    pub fn min_nonzero(&self) -> Option<u64> {
        self.0.iter().copied().find(|&c| c > 0)
    }

    /// Total number of samples (the last entry).
    pub fn total(&self) -> u64 {
        self.0[BINS - 1]
    }
}

impl std::ops::Index<u8> for CumulativeHistogram {
    type Output = u64;

    fn index(&self, value: u8) -> &u64 {
        &self.0[value as usize]
    }
}

/// Count occurrences of each intensity value in one band.
pub fn compute_histogram(band: ArrayView2<u8>) -> Result<Histogram> {
    ensure_non_empty(&band)?;
    let mut hist = [0u64; BINS];
    for &v in band.iter() {
        hist[v as usize] += 1;
    }
    Ok(Histogram(hist))
}

/// Inclusive prefix sum of a histogram.
pub fn compute_cumulative(histogram: &Histogram) -> CumulativeHistogram {
    let mut cumulative = [0u64; BINS];
    let mut running = 0u64;
    for (slot, &count) in cumulative.iter_mut().zip(histogram.0.iter()) {
        running += count;
        *slot = running;
    }
    CumulativeHistogram(cumulative)
}

/// Histogram of every band of a `(height, width, bands)` image.
pub fn compute_band_histograms(image: ArrayView3<u8>) -> Result<Vec<Histogram>> {
    ensure_non_empty(&image)?;
    split_bands(image).into_iter().map(compute_histogram).collect()
}
