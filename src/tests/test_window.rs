use approx::assert_relative_eq;

use crate::error::CaloError;
use crate::params::WindowParams;
use crate::tests::test_data::{image_with_deposits, make_event, make_random_events};
use crate::truth::TruthSet;
use crate::window::{crop_window, extract_windows, find_candidates};

use log::info;

#[test]
fn test_single_deposit_window() {
    crate::tests::init();
    let image = image_with_deposits(&[(25, 25, 1.0)]);
    let truth = TruthSet::from_particles(&[(25.3, 25.4, 1.0)]);

    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();

    assert_eq!(set.len(), 1);
    let w = set.get(0).unwrap();
    assert_eq!(w.index, [25, 25]);
    assert!(w.is_seed);
    assert_relative_eq!(w.matched_energy.unwrap(), 1.0);
    let nearby = w.nearby_truth.unwrap();
    assert_relative_eq!(nearby[0], 25.3);
    assert_relative_eq!(nearby[1], 25.4);
    assert_eq!(w.crop.dim(), (7, 7));
    assert_relative_eq!(w.crop[[3, 3]], 1.0);
    assert_relative_eq!(w.crop.sum(), 1.0);
}

#[test]
fn test_border_candidates_dropped() {
    let image = image_with_deposits(&[(0, 0, 1.0)]);
    let truth = TruthSet::from_particles(&[(0.3, 0.4, 1.0)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.crops().shape(), &[0, 7, 7]);
    assert_eq!(set.indices().shape(), &[0, 2]);
}

#[test]
fn test_border_margin_is_half_width() {
    let image = image_with_deposits(&[(2, 20, 1.0), (3, 20, 1.0), (47, 20, 1.0), (48, 20, 1.0)]);
    let set = extract_windows(image.view(), &TruthSet::empty(), &WindowParams::default()).unwrap();
    let kept: Vec<[usize; 2]> = set.iter().map(|w| w.index).collect();
    assert_eq!(kept, vec![[3, 20], [47, 20]]);

    assert!(crop_window(image.view(), [20, 2], 7).is_none());
    assert!(crop_window(image.view(), [20, 48], 7).is_none());
    assert_eq!(crop_window(image.view(), [20, 3], 7).unwrap().dim(), (7, 7));
}

#[test]
fn test_no_candidates_gives_empty_outputs() {
    let image = image_with_deposits(&[(10, 10, 0.5), (20, 20, 0.2)]);
    let truth = TruthSet::from_particles(&[(10.5, 10.5, 0.5)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.n_seeds(), 0);
    assert_eq!(set.seed_flags().len(), 0);
    assert_eq!(set.matched_energies().shape(), &[0, 1]);
}

#[test]
fn test_threshold_is_strict() {
    let image = image_with_deposits(&[(10, 10, 0.5), (20, 20, 0.5000001)]);
    assert_eq!(find_candidates(image.view(), 0.5), vec![[20, 20]]);
}

#[test]
fn test_candidates_follow_row_major_order() {
    let image = image_with_deposits(&[(30, 10, 1.0), (10, 30, 1.0), (10, 20, 1.0)]);
    let set = extract_windows(image.view(), &TruthSet::empty(), &WindowParams::default()).unwrap();
    let order: Vec<[usize; 2]> = set.iter().map(|w| w.index).collect();
    assert_eq!(order, vec![[10, 20], [10, 30], [30, 10]]);

    let indices = set.indices();
    assert_eq!(indices[[0, 0]], 10);
    assert_eq!(indices[[0, 1]], 20);
    assert_eq!(indices[[2, 0]], 30);
}

#[test]
fn test_unmatched_candidate_keeps_window() {
    let image = image_with_deposits(&[(20, 20, 2.0)]);
    let truth = TruthSet::from_particles(&[(30.2, 30.2, 2.0)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();

    assert_eq!(set.len(), 1);
    let w = set.get(0).unwrap();
    assert!(!w.is_seed);
    assert!(w.nearby_truth.is_none());
    assert!(w.matched_energy.is_none());

    assert_eq!(set.seed_flags()[0], 0);
    assert_relative_eq!(set.nearby_coords()[[0, 0]], 0.0);
    assert_relative_eq!(set.nearby_coords()[[0, 1]], 0.0);
    assert_relative_eq!(set.matched_energies()[[0, 0]], 0.0);
}

#[test]
fn test_nearby_truth_without_seed() {
    // (26.2, 25.5) floors to (26, 25) but sits 0.7 from the centre of (25, 25)
    let image = image_with_deposits(&[(25, 25, 1.0)]);
    let truth = TruthSet::from_particles(&[(26.2, 25.5, 1.5)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();

    let w = set.get(0).unwrap();
    assert!(!w.is_seed);
    assert!(w.matched_energy.is_none());
    let nearby = w.nearby_truth.unwrap();
    assert_relative_eq!(nearby[0], 26.2);
    assert_relative_eq!(nearby[1], 25.5);
}

#[test]
fn test_nearby_picks_first_in_truth_order() {
    let image = image_with_deposits(&[(25, 25, 1.0)]);
    let truth = TruthSet::from_particles(&[(40.0, 40.0, 1.0), (25.9, 25.1, 1.0), (25.5, 25.5, 3.0)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();

    let w = set.get(0).unwrap();
    let nearby = w.nearby_truth.unwrap();
    assert_relative_eq!(nearby[0], 25.9);
    assert_relative_eq!(nearby[1], 25.1);
    // both of the last two floor onto the cell, the first one wins
    assert_relative_eq!(w.matched_energy.unwrap(), 1.0);
}

#[test]
fn test_two_particles_in_one_cell_count_as_one_seed() {
    let image = image_with_deposits(&[(25, 25, 3.0)]);
    let truth = TruthSet::from_particles(&[(25.2, 25.2, 1.0), (25.8, 25.8, 2.0)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();

    assert_eq!(set.n_seeds(), 1);
    assert_relative_eq!(set.get(0).unwrap().matched_energy.unwrap(), 1.0);
}

#[test]
fn test_extraction_is_idempotent() {
    let (images, truths) = make_random_events(3, 4, 7);
    let params = WindowParams::default();
    for (i, truth) in truths.iter().enumerate() {
        let image = images.index_axis(ndarray::Axis(0), i);
        let a = extract_windows(image, truth, &params).unwrap();
        let b = extract_windows(image, truth, &params).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_every_window_has_crop_shape() {
    crate::tests::init();
    let (images, truths) = make_random_events(5, 6, 11);
    for crop_size in [3usize, 5, 7, 9] {
        let params = WindowParams::new(crop_size, 0.5).unwrap();
        for (i, truth) in truths.iter().enumerate() {
            let set = extract_windows(images.index_axis(ndarray::Axis(0), i), truth, &params).unwrap();
            assert_eq!(set.crop_size(), crop_size);
            for w in &set {
                assert_eq!(w.crop.dim(), (crop_size, crop_size));
                let half = crop_size / 2;
                assert!(w.index[0] >= half && w.index[0] + half < 51);
                assert!(w.index[1] >= half && w.index[1] + half < 51);
            }
        }
    }
    info!("All windows carry the requested crop shape");
}

#[test]
fn test_consistent_event_has_one_seed_per_particle() {
    let (image, truth) = make_event(&[(10.5, 10.5, 2.0), (30.1, 20.9, 3.0)]);
    let set = extract_windows(image.view(), &truth, &WindowParams::default()).unwrap();
    // halos are 10% of the deposit, below threshold
    assert_eq!(set.len(), 2);
    assert_eq!(set.n_seeds(), 2);
    assert_relative_eq!(set.matched_energies()[[1, 0]], 3.0);
}

#[test]
fn test_even_crop_size_rejected() {
    let image = image_with_deposits(&[(25, 25, 1.0)]);
    let params = WindowParams {
        crop_size: 6,
        threshold: 0.5,
    };
    let err = extract_windows(image.view(), &TruthSet::empty(), &params).unwrap_err();
    assert!(matches!(err, CaloError::InvalidCropSize(6)));
    assert!(WindowParams::new(0, 0.5).is_err());
}
