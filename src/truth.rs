//! Ground-truth particle records for one detector image.

use ndarray::{s, Array2, ArrayView2, ArrayView3, Axis};

use crate::error::{CaloError, Result};

/// True particle coordinates `[n, 2]` (row, col) and energies `[n, 1]`,
/// index-aligned by particle.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthSet {
    coords: Array2<f64>,
    energies: Array2<f64>,
}

impl TruthSet {
    pub fn new(coords: Array2<f64>, energies: Array2<f64>) -> Result<Self> {
        if coords.ncols() != 2 {
            return Err(CaloError::ShapeMismatch(format!(
                "truth coordinates must be [n, 2], got {:?}",
                coords.shape()
            )));
        }
        if energies.ncols() != 1 || energies.nrows() != coords.nrows() {
            return Err(CaloError::ShapeMismatch(format!(
                "truth energies must be [{}, 1], got {:?}",
                coords.nrows(),
                energies.shape()
            )));
        }
        Ok(Self { coords, energies })
    }

    /// Build from `(row, col, energy)` triples.
    pub fn from_particles(particles: &[(f64, f64, f64)]) -> Self {
        let n = particles.len();
        let coords = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                particles[i].0
            } else {
                particles[i].1
            }
        });
        let energies = Array2::from_shape_fn((n, 1), |(i, _)| particles[i].2);
        Self { coords, energies }
    }

    pub fn empty() -> Self {
        Self {
            coords: Array2::zeros((0, 2)),
            energies: Array2::zeros((0, 1)),
        }
    }

    /// Split the dense per-event layout `[events, n, 2]` / `[events, n, 1]`
    /// into one set per event.
    pub fn from_batch(coords: ArrayView3<f64>, energies: ArrayView3<f64>) -> Result<Vec<Self>> {
        if coords.shape()[0] != energies.shape()[0] || coords.shape()[1] != energies.shape()[1] {
            return Err(CaloError::ShapeMismatch(format!(
                "truth batch coordinates {:?} and energies {:?} disagree",
                coords.shape(),
                energies.shape()
            )));
        }
        coords
            .axis_iter(Axis(0))
            .zip(energies.axis_iter(Axis(0)))
            .map(|(c, e)| Self::new(c.to_owned(), e.to_owned()))
            .collect()
    }

    #[inline]
    pub fn n_particles(&self) -> usize {
        self.coords.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.nrows() == 0
    }

    pub fn coords(&self) -> ArrayView2<'_, f64> {
        self.coords.view()
    }

    pub fn energies(&self) -> ArrayView2<'_, f64> {
        self.energies.view()
    }

    #[inline]
    pub fn coord(&self, i: usize) -> [f64; 2] {
        let row = self.coords.slice(s![i, ..]);
        [row[0], row[1]]
    }

    #[inline]
    pub fn energy(&self, i: usize) -> f64 {
        self.energies[[i, 0]]
    }

    /// First particle whose floored coordinate lands on `(row, col)`.
    pub fn first_in_cell(&self, row: usize, col: usize) -> Option<usize> {
        (0..self.n_particles()).find(|&i| {
            let [y0, y1] = self.coord(i);
            y0.floor() == row as f64 && y1.floor() == col as f64
        })
    }

    /// First particle within `max_dist` of the centre of cell `(row, col)`.
    pub fn first_near_cell(&self, row: usize, col: usize, max_dist: f64) -> Option<usize> {
        let (cy, cx) = (row as f64 + 0.5, col as f64 + 0.5);
        (0..self.n_particles()).find(|&i| {
            let [y0, y1] = self.coord(i);
            ((cy - y0).powi(2) + (cx - y1).powi(2)).sqrt() <= max_dist
        })
    }
}
