//! Fixed-capacity padding along the leading axis.

use ndarray::{Array, Array1, Array2, Array3, ArrayView, Axis, Dimension, RemoveAxis, Slice};

use crate::error::{CaloError, Result};

/// Pad the leading axis of `array` up to `capacity` rows filled with `fill`.
///
/// Rows below the input length are copied unchanged. An input longer than
/// `capacity` is an error, it is never truncated.
pub fn pad_leading<A, D>(array: ArrayView<A, D>, capacity: usize, fill: A) -> Result<Array<A, D>>
where
    A: Clone,
    D: Dimension + RemoveAxis,
{
    let count = array.len_of(Axis(0));
    if count > capacity {
        return Err(CaloError::CapacityOverflow { count, capacity });
    }
    let mut shape = array.raw_dim();
    shape[0] = capacity;

    let mut out = Array::from_elem(shape, fill);
    out.slice_axis_mut(Axis(0), Slice::from(0..count))
        .assign(&array);
    Ok(out)
}

/// One image's windows padded to a fixed number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedSample {
    /// `[capacity, crop, crop]`
    pub windows: Array3<f64>,
    /// `[capacity, 2]`
    pub indices: Array2<i64>,
    /// `[capacity]`
    pub seeds: Array1<i64>,
    /// `[capacity, 2]`
    pub nearby: Array2<f64>,
    /// `[capacity, 1]`
    pub energies: Array2<f64>,
    /// Rows holding real windows; everything past it is padding.
    pub n_windows: usize,
    pub n_seeds: usize,
}

impl PaddedSample {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.seeds.len()
    }

    #[inline]
    pub fn crop_size(&self) -> usize {
        self.windows.shape()[1]
    }

    /// Mask with `true` on real rows and `false` on padding.
    pub fn mask(&self) -> Array1<bool> {
        Array1::from_shape_fn(self.capacity(), |i| i < self.n_windows)
    }
}
