//! # Spatial adjacency over selected windows
//!
//! For the `n` windows selected in a sample:
//!
//! 1. **Distances**: pairwise Euclidean distance between window cell indices
//! 2. **Cut**: pairs further apart than `radius` are unconnected
//! 3. **Weights**: `w = 1 - d / radius` for connected pairs, so weights decay linearly
//!    from 1 towards 0; coincident points (`d = 0`) stay unconnected
//! 4. **Self-loops**: `W + I`
//!
//! Two encodings are produced from `W + I`:
//!
//! - **adjacency**: `W + I - 2I`, i.e. off-diagonal weights with `-1` on the diagonal
//! - **cofactor**: row `i` lists node `i`'s self weight first, then its weights to every other
//!   node in increasing index order; a neighbour-relative layout for positional encodings
//!
//! Nodes carrying the negative pad sentinel are disconnected from everything when
//! `mask_sentinels` is set; they keep their self-loop so the diagonal contract holds.

use ndarray::{s, Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::{Array as _, Array2 as _};
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::error::{CaloError, Result};
use crate::params::AdjacencyParams;

use log::{debug, info, trace};

/// Weighted graph with self-loops (`W + I`) over one sample's windows.
#[derive(Debug, Clone)]
pub struct SpatialGraph {
    pub matrix: DenseMatrix<f64>,
    pub nnodes: usize,
    pub params: AdjacencyParams,
}

impl SpatialGraph {
    /// Build the graph over `points` given as `(row, col)` grid coordinates.
    ///
    /// Exactly `params.n` points are expected.
    pub fn from_points(points: &[[f64; 2]], params: &AdjacencyParams) -> Result<Self> {
        params.validate()?;
        let n = points.len();
        if n != params.n {
            return Err(CaloError::ShapeMismatch(format!(
                "spatial graph expects {} points, got {}",
                params.n, n
            )));
        }

        let is_sentinel: Vec<bool> = points
            .iter()
            .map(|p| params.mask_sentinels && (p[0] < 0.0 || p[1] < 0.0))
            .collect();

        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let w = if i == j {
                    1.0
                } else if is_sentinel[i] || is_sentinel[j] {
                    0.0
                } else {
                    let d = ((points[i][0] - points[j][0]).powi(2)
                        + (points[i][1] - points[j][1]).powi(2))
                    .sqrt();
                    distance_weight(d, params.radius)
                };
                data.push(w);
            }
        }

        let graph = Self {
            matrix: DenseMatrix::from_iterator(data.into_iter(), n, n, 0),
            nnodes: n,
            params: params.clone(),
        };
        trace!(
            "Spatial graph over {} nodes with {} edges ({} masked)",
            n,
            graph.n_edges(),
            is_sentinel.iter().filter(|&&m| m).count()
        );
        Ok(graph)
    }

    /// Weight of `(i, j)` including the self-loop.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.nnodes && j < self.nnodes,
            "Index out of bounds: ({}, {}) for {}x{} graph",
            i,
            j,
            self.nnodes,
            self.nnodes
        );
        *self.matrix.get((i, j))
    }

    /// Undirected edges with positive weight, self-loops excluded.
    pub fn n_edges(&self) -> usize {
        let mut count = 0;
        for i in 0..self.nnodes {
            for j in (i + 1)..self.nnodes {
                if self.get(i, j) > 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Anti-self-loop encoding: off-diagonal weights, `-1` on the diagonal.
    pub fn adjacency(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.nnodes, self.nnodes), |(i, j)| {
            if i == j {
                self.get(i, j) - 2.0
            } else {
                self.get(i, j)
            }
        })
    }

    /// Neighbour-ordered encoding: row `i` is `[w_ii, w_ij for j != i in index order]`.
    pub fn cofactor(&self) -> Array2<f64> {
        let n = self.nnodes;
        let mut out = Array2::zeros((n, n));
        for i in 0..n {
            let order = std::iter::once(i).chain((0..n).filter(|&j| j != i));
            for (k, j) in order.enumerate() {
                out[[i, k]] = self.get(i, j);
            }
        }
        out
    }

    /// Off-diagonal edges as a sparse CSR matrix.
    pub fn to_csr(&self) -> CsMat<f64> {
        let n = self.nnodes;
        let mut triplets = TriMat::new((n, n));
        for i in 0..n {
            for j in 0..n {
                let w = self.get(i, j);
                if i != j && w > 0.0 {
                    triplets.add_triplet(i, j, w);
                }
            }
        }
        triplets.to_csr()
    }
}

/// Linear distance kernel: `1 - d / radius` inside the radius, 0 outside or at `d = 0`.
#[inline]
pub fn distance_weight(d: f64, radius: f64) -> f64 {
    if d > 0.0 && d <= radius {
        1.0 - d / radius
    } else {
        0.0
    }
}

/// Build adjacency and cofactor matrices for every sample of `indices` `[samples, n, 2]`.
///
/// Returns `(adjacency, cofactor)`, both `[samples, n, n]`.
pub fn build_adjacency(
    indices: ArrayView3<i64>,
    params: &AdjacencyParams,
) -> Result<(Array3<f64>, Array3<f64>)> {
    params.validate()?;
    let (n_samples, n, dims) = indices.dim();
    if n != params.n || dims != 2 {
        return Err(CaloError::ShapeMismatch(format!(
            "adjacency expects [samples, {}, 2] indices, got {:?}",
            params.n,
            indices.shape()
        )));
    }

    info!(
        "Building adjacency for {} samples: n={}, radius={}, mask_sentinels={}",
        n_samples, n, params.radius, params.mask_sentinels
    );

    let graphs: Vec<SpatialGraph> = (0..n_samples)
        .into_par_iter()
        .map(|k| {
            let sample = indices.index_axis(Axis(0), k);
            let points: Vec<[f64; 2]> = sample
                .axis_iter(Axis(0))
                .map(|p| [p[0] as f64, p[1] as f64])
                .collect();
            SpatialGraph::from_points(&points, params)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut adj = Array3::zeros((n_samples, n, n));
    let mut cof = Array3::zeros((n_samples, n, n));
    for (k, graph) in graphs.iter().enumerate() {
        adj.slice_mut(s![k, .., ..]).assign(&graph.adjacency());
        cof.slice_mut(s![k, .., ..]).assign(&graph.cofactor());
    }

    debug!(
        "Adjacency built: {} edges over {} samples",
        graphs.iter().map(|g| g.n_edges()).sum::<usize>(),
        n_samples
    );
    Ok((adj, cof))
}
