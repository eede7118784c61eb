//! Calorimeter noise model.
//!
//! Every cell gets an independent Gaussian perturbation with resolution
//! `sigma(E) = sqrt(E * s^2 + n^2 + E^2 * c^2)` (stochastic, noise and constant
//! terms, GeV). Cells ending below the low-energy `cut` are zeroed.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use log::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseModel {
    /// Electronic noise term (GeV).
    pub noise: f64,
    /// Stochastic term (GeV).
    pub stochastic: f64,
    /// Constant term (GeV).
    pub constant: f64,
    /// Cells below this energy after smearing are set to zero.
    pub cut: f64,
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self {
            noise: 0.167,
            stochastic: 0.03,
            constant: 0.7 * 0.005,
            cut: 0.05,
        }
    }
}

impl PartialEq for NoiseModel {
    fn eq(&self, other: &Self) -> bool {
        approx::relative_eq!(self.noise, other.noise)
            && approx::relative_eq!(self.stochastic, other.stochastic)
            && approx::relative_eq!(self.constant, other.constant)
            && approx::relative_eq!(self.cut, other.cut)
    }
}

impl NoiseModel {
    /// Energy resolution for a deposit of `energy`.
    #[inline]
    pub fn sigma(&self, energy: f64) -> f64 {
        (energy * self.stochastic.powi(2)
            + self.noise.powi(2)
            + energy.powi(2) * self.constant.powi(2))
        .max(0.0)
        .sqrt()
    }

    /// Smear one image and apply the low-energy cut.
    pub fn apply<R: Rng + ?Sized>(&self, image: ArrayView2<f64>, rng: &mut R) -> Array2<f64> {
        image.mapv(|e| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            let smeared = e + self.sigma(e) * z;
            if smeared < self.cut {
                0.0
            } else {
                smeared
            }
        })
    }

    /// Smear every image of `[events, H, W]`.
    ///
    /// Event `i` draws from its own stream seeded with `seed + i`, so the
    /// result does not depend on thread scheduling.
    pub fn apply_batch(&self, images: ArrayView3<f64>, seed: u64) -> Array3<f64> {
        info!(
            "Applying noise to {} images: n={}, s={}, c={}, cut={}",
            images.len_of(Axis(0)),
            self.noise,
            self.stochastic,
            self.constant,
            self.cut
        );
        let mut out = Array3::<f64>::zeros(images.raw_dim());
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut dst)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                dst.assign(&self.apply(images.index_axis(Axis(0), i), &mut rng));
            });
        debug!(
            "Noise applied, {} cells above cut",
            out.iter().filter(|&&e| e > 0.0).count()
        );
        out
    }
}
