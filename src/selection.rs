//! Top-n window selection by an external per-window score.
//!
//! A scorer (typically a seed classifier) assigns one score per padded row.
//! Every sample keeps its `n` highest scoring rows, ordered by descending score;
//! kept rows scoring below `threshold` are overwritten with the fill value so the
//! downstream graph only sees confident windows.

use std::cmp::Ordering;

use ndarray::{Array, ArrayView, ArrayView1, ArrayView2, Axis, Dimension, Slice};

use crate::error::{CaloError, Result};

use log::{debug, trace};

/// Row order of one sample by descending score. Ties keep their input order,
/// NaN scores rank last.
pub fn rank_rows(scores: ArrayView1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (scores[a], scores[b]);
        match (sa.is_nan(), sb.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => sb.total_cmp(&sa),
        }
    });
    order
}

/// Keep the `n` best rows of every sample in `values` `[samples, rows, ...]`.
///
/// Kept rows scoring below `threshold` or NaN are filled with `fill`.
///
/// Returns `[samples, n, ...]`.
pub fn select_top<A, D>(
    values: ArrayView<A, D>,
    scores: ArrayView2<f64>,
    n: usize,
    threshold: f64,
    fill: A,
) -> Result<Array<A, D>>
where
    A: Clone,
    D: Dimension,
{
    if values.ndim() < 2 {
        return Err(CaloError::ShapeMismatch(format!(
            "selection needs [samples, rows, ...] values, got {:?}",
            values.shape()
        )));
    }
    let (n_samples, n_rows) = (values.shape()[0], values.shape()[1]);
    if scores.dim() != (n_samples, n_rows) {
        return Err(CaloError::ShapeMismatch(format!(
            "scores {:?} do not match values {:?}",
            scores.shape(),
            values.shape()
        )));
    }
    if n > n_rows {
        return Err(CaloError::ShapeMismatch(format!(
            "cannot select {} rows out of {}",
            n, n_rows
        )));
    }

    debug!(
        "Selecting top {} of {} rows for {} samples (threshold {})",
        n, n_rows, n_samples, threshold
    );

    let mut shape = values.raw_dim();
    shape[1] = n;
    let mut out = Array::from_elem(shape, fill);

    let mut masked = 0usize;
    for (i, sample_scores) in scores.axis_iter(Axis(0)).enumerate() {
        let order = rank_rows(sample_scores);
        for (k, &j) in order.iter().take(n).enumerate() {
            // NaN scores never pass the threshold
            if !(sample_scores[j] >= threshold) {
                masked += 1;
                continue;
            }
            let src = values.slice_axis(Axis(0), Slice::from(i..i + 1));
            let mut dst = out.slice_axis_mut(Axis(0), Slice::from(i..i + 1));
            dst.slice_axis_mut(Axis(1), Slice::from(k..k + 1))
                .assign(&src.slice_axis(Axis(1), Slice::from(j..j + 1)));
        }
    }
    trace!("{} selected rows below threshold were masked", masked);

    Ok(out)
}
