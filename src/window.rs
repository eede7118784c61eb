//! # Seed window extraction
//!
//! For one detector image and its truth particles:
//!
//! 1. **Candidates**: every cell with energy strictly above `threshold`, in row-major order
//! 2. **Crop**: a `crop_size × crop_size` window centred on the candidate; windows that would
//!    cross the image border are dropped, never clipped
//! 3. **Labels**: seed flag, nearby truth coordinate and matched truth energy per window
//!
//! Candidates without any truth match still produce a window, labelled as a non-seed with
//! absent coordinate and energy.

use ndarray::{s, Array1, Array2, Array3, ArrayView2};

use crate::error::Result;
use crate::params::{PadParams, WindowParams};
use crate::padding::{pad_leading, PaddedSample};
use crate::truth::TruthSet;

use log::{debug, trace};

/// Maximum distance (in cells) between a cell centre and a truth coordinate
/// for the coordinate to count as nearby.
pub const NEARBY_RADIUS: f64 = 1.0;

/// One cropped window and its labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub crop: Array2<f64>,
    pub index: [usize; 2],
    pub is_seed: bool,
    pub nearby_truth: Option<[f64; 2]>,
    pub matched_energy: Option<f64>,
}

/// All windows of one image, in candidate discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    crop_size: usize,
    windows: Vec<Window>,
}

impl WindowSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    #[inline]
    pub fn crop_size(&self) -> usize {
        self.crop_size
    }

    pub fn n_seeds(&self) -> usize {
        self.windows.iter().filter(|w| w.is_seed).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Window> {
        self.windows.iter()
    }

    pub fn get(&self, i: usize) -> Option<&Window> {
        self.windows.get(i)
    }

    /// Crops stacked as `[k, crop, crop]`.
    pub fn crops(&self) -> Array3<f64> {
        let c = self.crop_size;
        let mut out = Array3::zeros((self.len(), c, c));
        for (i, w) in self.windows.iter().enumerate() {
            out.slice_mut(s![i, .., ..]).assign(&w.crop);
        }
        out
    }

    /// Candidate cell indices as `[k, 2]`.
    pub fn indices(&self) -> Array2<i64> {
        Array2::from_shape_fn((self.len(), 2), |(i, j)| self.windows[i].index[j] as i64)
    }

    /// Seed flags as `[k]`, 1 for seeds.
    pub fn seed_flags(&self) -> Array1<i64> {
        self.windows.iter().map(|w| w.is_seed as i64).collect()
    }

    /// Nearby truth coordinates as `[k, 2]`, zero where absent.
    pub fn nearby_coords(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 2), |(i, j)| {
            self.windows[i].nearby_truth.map_or(0.0, |c| c[j])
        })
    }

    /// Matched truth energies as `[k, 1]`, zero where absent.
    pub fn matched_energies(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 1), |(i, _)| {
            self.windows[i].matched_energy.unwrap_or(0.0)
        })
    }

    /// Pad every field to the fixed sample capacity.
    pub fn pad(&self, params: &PadParams) -> Result<PaddedSample> {
        params.validate()?;
        let fill = params.pad_value;
        let fill_i = params.pad_value_i64();
        Ok(PaddedSample {
            windows: pad_leading(self.crops().view(), params.capacity, fill)?,
            indices: pad_leading(self.indices().view(), params.capacity, fill_i)?,
            seeds: pad_leading(self.seed_flags().view(), params.capacity, fill_i)?,
            nearby: pad_leading(self.nearby_coords().view(), params.capacity, fill)?,
            energies: pad_leading(self.matched_energies().view(), params.capacity, fill)?,
            n_windows: self.len(),
            n_seeds: self.n_seeds(),
        })
    }
}

impl<'a> IntoIterator for &'a WindowSet {
    type Item = &'a Window;
    type IntoIter = std::slice::Iter<'a, Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}

/// Cells with energy strictly above `threshold`, in row-major order.
pub fn find_candidates(image: ArrayView2<f64>, threshold: f64) -> Vec<[usize; 2]> {
    image
        .indexed_iter()
        .filter(|&(_, &e)| e > threshold)
        .map(|((r, c), _)| [r, c])
        .collect()
}

/// Crop a window centred on `index`, or `None` when it would leave the image.
pub fn crop_window(image: ArrayView2<f64>, index: [usize; 2], crop_size: usize) -> Option<Array2<f64>> {
    let half = crop_size / 2;
    let (h, w) = image.dim();
    let [r, c] = index;
    if r < half || c < half || r + half >= h || c + half >= w {
        return None;
    }
    Some(
        image
            .slice(s![r - half..=r + half, c - half..=c + half])
            .to_owned(),
    )
}

/// Extract and label every in-bounds candidate window of one image.
pub fn extract_windows(
    image: ArrayView2<f64>,
    truth: &TruthSet,
    params: &WindowParams,
) -> Result<WindowSet> {
    params.validate()?;

    let candidates = find_candidates(image, params.threshold);
    trace!(
        "{} candidates above {} in {:?} image",
        candidates.len(),
        params.threshold,
        image.dim()
    );

    let mut windows = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;
    for index in candidates {
        let crop = match crop_window(image, index, params.crop_size) {
            Some(crop) => crop,
            None => {
                dropped += 1;
                continue;
            }
        };

        let [r, c] = index;
        let seed = truth.first_in_cell(r, c);
        let nearby = truth.first_near_cell(r, c, NEARBY_RADIUS);

        windows.push(Window {
            crop,
            index,
            is_seed: seed.is_some(),
            nearby_truth: nearby.map(|i| truth.coord(i)),
            matched_energy: seed.map(|i| truth.energy(i)),
        });
    }

    if dropped > 0 {
        debug!("Dropped {} border candidates, kept {}", dropped, windows.len());
    }

    Ok(WindowSet {
        crop_size: params.crop_size,
        windows,
    })
}
