//! Configuration knobs for extraction, padding and adjacency.
//!
//! Every struct has a `Default` carrying the reference detector setup
//! (51x51 images, 7x7 windows, 35 rows per sample, 4 graph nodes) and
//! deserializes with `#[serde(default)]`, so partial JSON configs are fine.

use serde::{Deserialize, Serialize};

use crate::error::{CaloError, Result};

/// Largest magnitude at which every integer is exactly representable in `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Candidate selection and crop geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    /// Side length of the square crop, must be odd.
    pub crop_size: usize,
    /// Cells with energy strictly above this value become candidates.
    pub threshold: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            crop_size: 7,
            threshold: 0.5,
        }
    }
}

impl WindowParams {
    pub fn new(crop_size: usize, threshold: f64) -> Result<Self> {
        let params = Self {
            crop_size,
            threshold,
        };
        params.validate()?;
        Ok(params)
    }

    /// Half-width of the crop on each side of the candidate.
    #[inline]
    pub fn half_width(&self) -> usize {
        self.crop_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.crop_size == 0 || self.crop_size % 2 == 0 {
            return Err(CaloError::InvalidCropSize(self.crop_size));
        }
        if self.threshold.is_nan() {
            return Err(CaloError::InvalidParams(
                "threshold must not be NaN".to_string(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for WindowParams {
    fn eq(&self, other: &Self) -> bool {
        self.crop_size == other.crop_size && approx::relative_eq!(self.threshold, other.threshold)
    }
}

/// Fixed-capacity padding of per-image window lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PadParams {
    /// Number of rows every sample is padded to.
    pub capacity: usize,
    /// Fill value for rows past the real window count.
    pub pad_value: f64,
}

impl Default for PadParams {
    fn default() -> Self {
        Self {
            capacity: 35,
            pad_value: -1.0,
        }
    }
}

impl PadParams {
    /// Pad value for integer fields (indices, seed flags).
    ///
    /// Exact once [`PadParams::validate`] has passed.
    #[inline]
    pub fn pad_value_i64(&self) -> i64 {
        self.pad_value as i64
    }

    /// The pad value is shared with the integer fields, so it must be a whole number.
    pub fn validate(&self) -> Result<()> {
        if !self.pad_value.is_finite()
            || self.pad_value.fract() != 0.0
            || self.pad_value.abs() > MAX_EXACT_INT
        {
            return Err(CaloError::InvalidParams(format!(
                "pad value must be an integer, got {}",
                self.pad_value
            )));
        }
        Ok(())
    }
}

impl PartialEq for PadParams {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity && approx::relative_eq!(self.pad_value, other.pad_value)
    }
}

/// Spatial graph over the selected windows of one sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencyParams {
    /// Grid distance above which two windows are unconnected.
    pub radius: f64,
    /// Number of nodes per sample.
    pub n: usize,
    /// Disconnect nodes whose coordinates carry the negative pad sentinel.
    pub mask_sentinels: bool,
}

impl Default for AdjacencyParams {
    fn default() -> Self {
        Self {
            radius: 3.0,
            n: 4,
            mask_sentinels: true,
        }
    }
}

impl AdjacencyParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(CaloError::InvalidParams(format!(
                "adjacency radius must be finite and positive, got {}",
                self.radius
            )));
        }
        if self.n == 0 {
            return Err(CaloError::InvalidParams(
                "adjacency needs at least one node".to_string(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for AdjacencyParams {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n
            && self.mask_sentinels == other.mask_sentinels
            && approx::relative_eq!(self.radius, other.radius)
    }
}
