use crate::MethylationData;
use crate::error::Result;
use crate::samples::{SampleSet, load_samples};
use crate::stats::density::{
    DensityCurve, KdeMethod, estimate_density_with, grid_len, validate_bandwidth, validate_method,
};
use crate::stats::extrema::{LocalMinima, find_local_maxima, find_local_minima};
use crate::stats::summary::{Summary, compute_summary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters of a density analysis run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityAnalysisConfig {
    /// Gaussian kernel bandwidth (smoothing width)
    pub bandwidth: f64,

    /// Spacing of the evaluation grid
    pub grid_step: f64,

    /// Lower bound of the analysis domain
    pub domain_low: f64,

    /// Upper bound of the analysis domain
    pub domain_high: f64,

    /// Density evaluation method
    pub method: KdeMethod,
}

impl Default for DensityAnalysisConfig {
    fn default() -> Self {
        Self {
            bandwidth: 0.05,
            grid_step: 0.01,
            domain_low: 0.0,
            domain_high: 1.0,
            method: KdeMethod::Exact,
        }
    }
}

impl DensityAnalysisConfig {
    /// Check the numeric parameters before any data is touched
    ///
    /// Also bounds the grid and binned sizes so nothing oversized is allocated.
    pub fn validate(&self) -> Result<()> {
        validate_bandwidth(self.bandwidth)?;
        grid_len(self.domain_low, self.domain_high, self.grid_step)?;
        validate_method(self.method)?;
        Ok(())
    }
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityAnalysis {
    pub summary: Summary,
    pub curve: DensityCurve,
    pub minima: LocalMinima,
    /// Local maxima of the density, ascending
    pub modes: Vec<f64>,
    pub config: DensityAnalysisConfig,
}

/// Run summary statistics, density estimation and minima detection
///
/// Deterministic: identical samples and configuration give identical output.
///
/// # Errors
/// Returns an estimation error for invalid parameters or fewer than two samples.
pub fn analyze(samples: &SampleSet, config: &DensityAnalysisConfig) -> Result<DensityAnalysis> {
    config.validate()?;

    let summary = compute_summary(samples);
    debug!(
        "Summary: n={}, mean={:.4}, median={:.4}, sd={:.4}",
        summary.count, summary.mean, summary.median, summary.stddev
    );

    let curve = estimate_density_with(
        samples,
        config.bandwidth,
        config.domain_low,
        config.domain_high,
        config.grid_step,
        config.method,
    )?;

    let minima = find_local_minima(&curve);
    let modes = find_local_maxima(&curve);
    info!(
        "Density over {} grid points: {} local minima, {} modes",
        curve.len(),
        minima.len(),
        modes.len()
    );

    Ok(DensityAnalysis {
        summary,
        curve,
        minima,
        modes,
        config: *config,
    })
}

/// Load a column from a tabular source and analyze it
pub fn run_from_source<T: MethylationData + ?Sized>(
    source: &T,
    column: &str,
    config: &DensityAnalysisConfig,
) -> Result<(SampleSet, DensityAnalysis)> {
    let samples = load_samples(source, column)?;
    let analysis = analyze(&samples, config)?;
    Ok((samples, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MethylDensityError;

    #[test]
    fn test_default_config() {
        let config = DensityAnalysisConfig::default();
        assert_eq!(config.bandwidth, 0.05);
        assert_eq!(config.grid_step, 0.01);
        assert_eq!(config.domain_low, 0.0);
        assert_eq!(config.domain_high, 1.0);
        assert_eq!(config.method, KdeMethod::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_bandwidth() {
        let config = DensityAnalysisConfig {
            bandwidth: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MethylDensityError::InvalidBandwidth(_))
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_grids() {
        let config = DensityAnalysisConfig {
            grid_step: 1e-300,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MethylDensityError::GridTooLarge { .. })
        ));

        let config = DensityAnalysisConfig {
            domain_low: -1e308,
            domain_high: 1e308,
            grid_step: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MethylDensityError::InvalidDomain { .. })
        ));

        let config = DensityAnalysisConfig {
            method: KdeMethod::Binned { n_points: usize::MAX },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MethylDensityError::InvalidBinnedPoints { .. })
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: DensityAnalysisConfig =
            serde_json::from_str(r#"{"bandwidth": 0.1, "method": {"kind": "binned", "n_points": 1024}}"#)
                .unwrap();
        assert_eq!(config.bandwidth, 0.1);
        assert_eq!(config.grid_step, 0.01);
        assert_eq!(config.method, KdeMethod::Binned { n_points: 1024 });
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let samples = SampleSet::new(vec![0.05, 0.1, 0.12, 0.5, 0.85, 0.9, 0.93]).unwrap();
        let config = DensityAnalysisConfig::default();
        let first = analyze(&samples, &config).unwrap();
        let second = analyze(&samples, &config).unwrap();
        assert_eq!(first, second);
    }
}
