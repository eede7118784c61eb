//! # Batch assembly
//!
//! Runs window extraction over a collection of images and stacks the
//! per-image results into fixed-shape containers:
//!
//! - `windows`  `[rows, capacity, crop, crop]`
//! - `indices`  `[rows, capacity, 2]`
//! - `seeds`    `[rows, capacity]`
//! - `nearby`   `[rows, capacity, 2]`
//! - `energies` `[rows, capacity, 1]`
//!
//! An image is kept only when its seed count equals its truth particle count.
//! Kept images are padded to `capacity` rows with the pad value; row `k` is the
//! same image in every container.

use ndarray::{Array2, Array3, Array4, ArrayView3, Axis};
use rayon::prelude::*;

use crate::error::{CaloError, Result};
use crate::padding::PaddedSample;
use crate::params::{PadParams, WindowParams};
use crate::truth::TruthSet;
use crate::window::{extract_windows, WindowSet};

use log::{debug, info, trace, warn};

/// Stacked, padded samples. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub windows: Array4<f64>,
    pub indices: Array3<i64>,
    pub seeds: Array2<i64>,
    pub nearby: Array3<f64>,
    pub energies: Array3<f64>,
    /// Real window count of every row.
    pub n_windows: Vec<usize>,
    /// Position of every row's image in the input collection.
    pub source_rows: Vec<usize>,
}

impl Batch {
    #[inline]
    pub fn len(&self) -> usize {
        self.n_windows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_windows.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.seeds.ncols()
    }

    #[inline]
    pub fn crop_size(&self) -> usize {
        self.windows.shape()[2]
    }

    /// Number of seed flags equal to 1 in every row (padding excluded).
    pub fn seed_counts(&self) -> Vec<usize> {
        self.seeds
            .axis_iter(Axis(0))
            .map(|row| row.iter().filter(|&&s| s == 1).count())
            .collect()
    }
}

/// Appends fixed-schema sample rows and finalizes them into a [`Batch`].
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    capacity: usize,
    crop_size: usize,
    windows: Vec<f64>,
    indices: Vec<i64>,
    seeds: Vec<i64>,
    nearby: Vec<f64>,
    energies: Vec<f64>,
    n_windows: Vec<usize>,
    source_rows: Vec<usize>,
}

impl BatchBuilder {
    pub fn new(capacity: usize, crop_size: usize) -> Self {
        trace!(
            "New batch builder: capacity={}, crop_size={}",
            capacity,
            crop_size
        );
        Self {
            capacity,
            crop_size,
            windows: Vec::new(),
            indices: Vec::new(),
            seeds: Vec::new(),
            nearby: Vec::new(),
            energies: Vec::new(),
            n_windows: Vec::new(),
            source_rows: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n_windows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_windows.is_empty()
    }

    /// Append one padded sample taken from input position `source_row`.
    pub fn push(&mut self, sample: PaddedSample, source_row: usize) -> Result<()> {
        if sample.capacity() != self.capacity || sample.crop_size() != self.crop_size {
            return Err(CaloError::ShapeMismatch(format!(
                "sample with capacity {} and crop {} does not fit batch with capacity {} and crop {}",
                sample.capacity(),
                sample.crop_size(),
                self.capacity,
                self.crop_size
            )));
        }
        self.windows.extend(sample.windows.iter().copied());
        self.indices.extend(sample.indices.iter().copied());
        self.seeds.extend(sample.seeds.iter().copied());
        self.nearby.extend(sample.nearby.iter().copied());
        self.energies.extend(sample.energies.iter().copied());
        self.n_windows.push(sample.n_windows);
        self.source_rows.push(source_row);
        Ok(())
    }

    pub fn finish(self) -> Result<Batch> {
        let (rows, cap, c) = (self.len(), self.capacity, self.crop_size);
        debug!("Finalizing batch: {} rows x {} capacity", rows, cap);
        Ok(Batch {
            windows: Array4::from_shape_vec((rows, cap, c, c), self.windows)?,
            indices: Array3::from_shape_vec((rows, cap, 2), self.indices)?,
            seeds: Array2::from_shape_vec((rows, cap), self.seeds)?,
            nearby: Array3::from_shape_vec((rows, cap, 2), self.nearby)?,
            energies: Array3::from_shape_vec((rows, cap, 1), self.energies)?,
            n_windows: self.n_windows,
            source_rows: self.source_rows,
        })
    }
}

/// What happened to each image during assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub n_images: usize,
    pub retained: usize,
    /// Images dropped because the seed count differed from the particle count.
    pub inconsistent: Vec<usize>,
    /// Windows kept across all retained images.
    pub n_windows: usize,
}

/// Extracts, filters and pads windows for a collection of images.
#[derive(Debug, Clone, Default)]
pub struct BatchAssembler {
    window: WindowParams,
    pad: PadParams,
}

impl BatchAssembler {
    pub fn new() -> Self {
        info!("Initializing new BatchAssembler");
        Self::default()
    }

    pub fn with_params(mut self, window: WindowParams, pad: PadParams) -> Self {
        info!("Configuring assembler: {:?}, {:?}", window, pad);
        self.window = window;
        self.pad = pad;
        self
    }

    pub fn with_crop_size(mut self, crop_size: usize) -> Self {
        info!("Setting crop size: {}", crop_size);
        self.window.crop_size = crop_size;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        info!("Setting energy threshold: {}", threshold);
        self.window.threshold = threshold;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        info!("Setting pad capacity: {}", capacity);
        self.pad.capacity = capacity;
        self
    }

    pub fn with_pad_value(mut self, pad_value: f64) -> Self {
        info!("Setting pad value: {}", pad_value);
        self.pad.pad_value = pad_value;
        self
    }

    pub fn window_params(&self) -> &WindowParams {
        &self.window
    }

    pub fn pad_params(&self) -> &PadParams {
        &self.pad
    }

    /// Build the batch for `images` `[events, H, W]` and one truth set per event.
    pub fn assemble(&self, images: ArrayView3<f64>, truths: &[TruthSet]) -> Result<Batch> {
        self.assemble_report(images, truths).map(|(batch, _)| batch)
    }

    /// As [`assemble`](Self::assemble), also reporting which images were filtered.
    pub fn assemble_report(
        &self,
        images: ArrayView3<f64>,
        truths: &[TruthSet],
    ) -> Result<(Batch, AssemblyReport)> {
        self.window.validate()?;
        self.pad.validate()?;
        let n_images = images.len_of(Axis(0));
        if n_images != truths.len() {
            return Err(CaloError::ShapeMismatch(format!(
                "{} images but {} truth sets",
                n_images,
                truths.len()
            )));
        }

        info!(
            "Assembling batch from {} images: crop={}, threshold={}, capacity={}",
            n_images, self.window.crop_size, self.window.threshold, self.pad.capacity
        );

        // Images are independent; extraction runs in parallel, rows are appended in order.
        let extracted: Vec<Result<WindowSet>> = (0..n_images)
            .into_par_iter()
            .map(|i| extract_windows(images.index_axis(Axis(0), i), &truths[i], &self.window))
            .collect();

        let mut builder = BatchBuilder::new(self.pad.capacity, self.window.crop_size);
        let mut report = AssemblyReport {
            n_images,
            ..Default::default()
        };

        for (i, set) in extracted.into_iter().enumerate() {
            let set = set?;
            let n_particles = truths[i].n_particles();
            let n_seeds = set.n_seeds();
            if n_seeds != n_particles {
                debug!(
                    "Image {}: {} seeds for {} particles, skipping",
                    i, n_seeds, n_particles
                );
                report.inconsistent.push(i);
                continue;
            }

            let padded = set.pad(&self.pad).map_err(|e| {
                warn!("Image {}: {}", i, e);
                e
            })?;
            report.n_windows += padded.n_windows;
            builder.push(padded, i)?;
        }

        report.retained = builder.len();
        info!(
            "Batch assembled: {} of {} images retained, {} inconsistent",
            report.retained,
            n_images,
            report.inconsistent.len()
        );

        Ok((builder.finish()?, report))
    }
}
