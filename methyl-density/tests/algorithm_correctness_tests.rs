//! Algorithm correctness tests
//!
//! These tests verify the statistics, density estimate and minima detector
//! against hand-checked scenarios and against properties that must hold for
//! any input in the methylation range.

use methyl_density::error::ErrorCategory;
use methyl_density::stats::density::Grid;
use methyl_density::{
    DensityAnalysisConfig, MethylDensityError, SampleSet, analyze, compute_summary,
    estimate_density, find_local_minima, format_report,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_samples(rng: &mut StdRng, n: usize) -> SampleSet {
    let values = (0..n).map(|_| rng.random_range(0.0..=1.0)).collect();
    SampleSet::new(values).unwrap()
}

/// Two tight clusters give two peaks and one threshold between them
#[test]
fn test_bimodal_clusters_have_single_minimum() {
    let samples = SampleSet::new(vec![0.1, 0.1, 0.1, 0.9, 0.9, 0.9]).unwrap();
    let curve = estimate_density(&samples, 0.05, 0.0, 1.0, 0.01).unwrap();

    assert_eq!(curve.len(), 101);

    // Peaks sit on the cluster centres
    let peak_left = curve.y()[10];
    let peak_right = curve.y()[90];
    assert!(peak_left > curve.y()[9] && peak_left > curve.y()[11]);
    assert!(peak_right > curve.y()[89] && peak_right > curve.y()[91]);

    let minima = find_local_minima(&curve);
    assert_eq!(minima.len(), 1, "expected exactly one minimum, got {:?}", minima);
    assert!((minima.as_slice()[0] - 0.5).abs() < 1e-12);
    assert_eq!(format!("{:.2}", minima.as_slice()[0]), "0.50");
}

/// Identical samples give a unimodal curve and no threshold
#[test]
fn test_identical_samples_have_no_minima() {
    let samples = SampleSet::new(vec![0.5, 0.5, 0.5, 0.5]).unwrap();
    let analysis = analyze(&samples, &DensityAnalysisConfig::default()).unwrap();

    assert!(analysis.minima.is_empty());
    assert_eq!(analysis.modes, vec![0.5]);
    assert!(format_report(&analysis).contains("None detected."));
}

/// A column with only missing values is a data error
#[test]
fn test_all_missing_is_data_error() {
    let err = SampleSet::from_optional(vec![None, None, Some(f64::NAN)]).unwrap_err();
    assert!(matches!(err, MethylDensityError::EmptySamples));
    assert_eq!(err.category(), ErrorCategory::Data);
}

/// Zero bandwidth is an estimation error
#[test]
fn test_zero_bandwidth_is_estimation_error() {
    let samples = SampleSet::new(vec![0.2, 0.4, 0.6]).unwrap();

    let err = estimate_density(&samples, 0.0, 0.0, 1.0, 0.01).unwrap_err();
    assert!(matches!(err, MethylDensityError::InvalidBandwidth(_)));
    assert_eq!(err.category(), ErrorCategory::Estimation);

    let config = DensityAnalysisConfig {
        bandwidth: 0.0,
        ..Default::default()
    };
    let err = analyze(&samples, &config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Estimation);
}

/// A half step over the unit interval gives exactly three grid points
#[test]
fn test_grid_boundary_inclusion() {
    let samples = SampleSet::new(vec![0.0, 1.0]).unwrap();
    let curve = estimate_density(&samples, 0.05, 0.0, 1.0, 0.5).unwrap();

    assert_eq!(curve.x(), &[0.0, 0.5, 1.0]);
    assert_eq!(curve.y().len(), 3);
}

#[test]
fn test_grid_length_formula() {
    let cases = [
        (0.0, 1.0, 0.01, 101),
        (0.0, 1.0, 0.5, 3),
        (0.0, 1.0, 0.3, 4),
        (0.0, 1.0, 0.25, 5),
        (0.2, 0.8, 0.1, 7),
        (0.0, 1.0, 2.0, 1),
    ];
    for (low, high, step, expected) in cases {
        let grid = Grid::new(low, high, step).unwrap();
        assert_eq!(grid.len(), expected, "grid [{}, {}] step {}", low, high, step);
        assert_eq!(grid.low(), low);
        assert!(grid.high() <= high);
        assert!(grid.points().windows(2).all(|w| w[1] > w[0]));
    }
}

#[test]
fn test_summary_ordering_properties() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [1usize, 2, 3, 10, 250, 1000] {
        let samples = random_samples(&mut rng, n);
        let s = compute_summary(&samples);

        assert_eq!(s.count, n);
        assert!(s.min <= s.median && s.median <= s.max);
        assert!(s.min <= s.mean + 1e-12 && s.mean <= s.max + 1e-12);
        if n >= 2 {
            assert!(s.stddev >= 0.0);
        } else {
            assert!(s.stddev.is_nan());
        }
    }
}

#[test]
fn test_density_shape_properties() {
    let mut rng = StdRng::seed_from_u64(7);
    for (n, step) in [(2usize, 0.01), (50, 0.02), (500, 0.005), (1500, 0.01)] {
        let samples = random_samples(&mut rng, n);
        let curve = estimate_density(&samples, 0.05, 0.0, 1.0, step).unwrap();

        let expected_len = ((1.0 / step) + 1e-9).floor() as usize + 1;
        assert_eq!(curve.len(), expected_len);
        assert!(curve.y().iter().all(|&v| v >= 0.0 && v.is_finite()));
        // Truncation loses at most about half the mass at each boundary
        let area = curve.integral();
        assert!(area > 0.4 && area <= 1.0 + 1e-6, "area {}", area);
    }
}

#[test]
fn test_minima_are_strict_valleys() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..20 {
        let samples = random_samples(&mut rng, 40);
        let curve = estimate_density(&samples, 0.03, 0.0, 1.0, 0.01).unwrap();
        let minima = find_local_minima(&curve);

        let xs = minima.as_slice();
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "not ascending: {:?}", xs);

        for &m in xs {
            let i = curve.x().iter().position(|&x| x == m).unwrap();
            assert!(i > 0 && i < curve.len() - 1);
            assert!(curve.y()[i - 1] > curve.y()[i]);
            assert!(curve.y()[i + 1] > curve.y()[i]);
        }
    }
}

/// Equally spaced clusters put both valleys exactly on grid points
#[test]
fn test_three_populations_give_two_minima() {
    let mut values = Vec::new();
    for center in [0.1, 0.5, 0.9] {
        for k in 0..20 {
            values.push(center + (k as f64 - 9.5) * 0.002);
        }
    }
    let samples = SampleSet::new(values).unwrap();
    let analysis = analyze(&samples, &DensityAnalysisConfig::default()).unwrap();

    assert_eq!(analysis.minima.len(), 2);
    let xs = analysis.minima.as_slice();
    assert!((xs[0] - 0.3).abs() < 0.015, "first minimum at {}", xs[0]);
    assert!((xs[1] - 0.7).abs() < 0.015, "second minimum at {}", xs[1]);
    assert_eq!(analysis.modes.len(), 3);
}
