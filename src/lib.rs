//! # calowin
//!
//! Seed windows, padded batches and spatial adjacency for 2-D calorimeter images.
//!
//! Pipeline:
//!
//! 1. [`noise`]: optional smearing of the raw deposits
//! 2. [`window`]: crop a fixed-size window around every cell above threshold and label it
//!    against the truth particles
//! 3. [`batch`]: keep images whose seed count matches the particle count, pad their
//!    windows to a fixed capacity and stack them
//! 4. [`selection`]: keep the best scoring windows of every sample
//! 5. [`adjacency`]: distance-weighted graphs over the selected windows
//!
//! ```
//! use calowin::batch::BatchAssembler;
//! use calowin::truth::TruthSet;
//! use ndarray::Array3;
//!
//! let mut images = Array3::<f64>::zeros((1, 51, 51));
//! images[[0, 25, 25]] = 1.0;
//! let truths = vec![TruthSet::from_particles(&[(25.3, 25.4, 1.0)])];
//!
//! let batch = BatchAssembler::new().assemble(images.view(), &truths).unwrap();
//! assert_eq!(batch.windows.shape(), &[1, 35, 7, 7]);
//! assert_eq!(batch.seeds[[0, 0]], 1);
//! assert_eq!(batch.seeds[[0, 1]], -1);
//! ```

pub mod adjacency;
pub mod batch;
pub mod error;
pub mod noise;
pub mod padding;
pub mod params;
pub mod selection;
pub mod truth;
pub mod window;

pub use adjacency::{build_adjacency, SpatialGraph};
pub use batch::{AssemblyReport, Batch, BatchAssembler, BatchBuilder};
pub use error::{CaloError, Result};
pub use noise::NoiseModel;
pub use padding::{pad_leading, PaddedSample};
pub use params::{AdjacencyParams, PadParams, WindowParams};
pub use selection::select_top;
pub use truth::TruthSet;
pub use window::{extract_windows, Window, WindowSet};

#[cfg(test)]
mod tests;
