//! Density plots for a methylation analysis
//!
//! Produces:
//! - a histogram of the raw samples (normalised to density) overlaid with the KDE curve
//! - the same chart annotated with every detected local minimum, only when minima exist
//!
//! Each renderer draws into its own bitmap and returns a [`PlotArtifact`]; there
//! is no shared "current figure".

use crate::analysis::pipeline::DensityAnalysis;
use crate::error::{MethylDensityError, Result};
use crate::samples::SampleSet;
use crate::stats::density::interpolate_linear;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::{BLACK, RGBColor, WHITE};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// File name of the histogram + density chart
pub const DENSITY_PLOT_FILE: &str = "density.png";

/// File name of the chart annotated with local minima
pub const MINIMA_PLOT_FILE: &str = "density_minima.png";

/// Configuration for density plots
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Output image width in pixels
    pub width: u32,

    /// Output image height in pixels
    pub height: u32,

    /// Number of histogram bins across the domain
    pub histogram_bins: usize,

    /// Fill color of the histogram bars (drawn half transparent)
    pub histogram_color: RGBColor,

    /// Color of the density curve
    pub curve_color: RGBColor,

    /// Color of minima markers, guides and labels
    pub minima_color: RGBColor,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            histogram_bins: 30,
            histogram_color: RGBColor(100, 149, 237), // Cornflower blue
            curve_color: RGBColor(0, 0, 0),           // Black
            minima_color: RGBColor(220, 20, 60),      // Crimson
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Density,
    DensityWithMinima,
}

/// Handle to a rendered image
#[derive(Debug, Clone, PartialEq)]
pub struct PlotArtifact {
    pub path: PathBuf,
    pub kind: PlotKind,
}

/// One histogram bar: `(left edge, right edge, density)`
pub type HistogramBar = (f64, f64, f64);

/// Histogram of the samples inside `[low, high]`, normalised so the bars integrate to 1
///
/// Samples outside the domain are ignored. The last bin is closed on the right
/// so a value equal to `high` is counted.
pub fn histogram_density(samples: &[f64], bins: usize, low: f64, high: f64) -> Vec<HistogramBar> {
    if bins == 0 || high <= low {
        return Vec::new();
    }

    let width = (high - low) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in samples {
        if v < low || v > high {
            continue;
        }
        let idx = (((v - low) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total: usize = counts.iter().sum();
    let norm = if total == 0 { 0.0 } else { 1.0 / (total as f64 * width) };

    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let left = low + i as f64 * width;
            (left, left + width, c as f64 * norm)
        })
        .collect()
}

/// Draw the histogram with the density curve overlaid
pub fn render_density_plot(
    samples: &SampleSet,
    analysis: &DensityAnalysis,
    output_path: impl AsRef<Path>,
    config: &PlotConfig,
) -> Result<PlotArtifact> {
    let output_path = output_path.as_ref();
    draw_density_chart(samples, analysis, output_path, config, false)?;
    info!("Saved density plot to: {}", output_path.display());
    Ok(PlotArtifact {
        path: output_path.to_path_buf(),
        kind: PlotKind::Density,
    })
}

/// Draw the density chart with each local minimum marked and labelled
///
/// Returns `Ok(None)` without touching the filesystem when there are no minima.
pub fn render_minima_plot(
    samples: &SampleSet,
    analysis: &DensityAnalysis,
    output_path: impl AsRef<Path>,
    config: &PlotConfig,
) -> Result<Option<PlotArtifact>> {
    if analysis.minima.is_empty() {
        return Ok(None);
    }

    let output_path = output_path.as_ref();
    draw_density_chart(samples, analysis, output_path, config, true)?;
    info!("Saved minima plot to: {}", output_path.display());
    Ok(Some(PlotArtifact {
        path: output_path.to_path_buf(),
        kind: PlotKind::DensityWithMinima,
    }))
}

/// Render every applicable plot into `output_dir`
///
/// Each plot is attempted even when an earlier one fails; the first failure
/// is returned after all attempts, and every failure is logged.
pub fn render_plots(
    samples: &SampleSet,
    analysis: &DensityAnalysis,
    output_dir: impl AsRef<Path>,
    config: &PlotConfig,
) -> Result<Vec<PlotArtifact>> {
    let output_dir = output_dir.as_ref();
    let mut artifacts = Vec::new();
    let mut first_error = None;

    match render_density_plot(samples, analysis, output_dir.join(DENSITY_PLOT_FILE), config) {
        Ok(artifact) => artifacts.push(artifact),
        Err(e) => {
            error!("Density plot failed: {}", e);
            first_error = Some(e);
        }
    }

    match render_minima_plot(samples, analysis, output_dir.join(MINIMA_PLOT_FILE), config) {
        Ok(Some(artifact)) => artifacts.push(artifact),
        Ok(None) => {}
        Err(e) => {
            error!("Minima plot failed: {}", e);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(artifacts),
    }
}

fn plot_error<E: std::fmt::Debug>(context: &'static str) -> impl FnOnce(E) -> MethylDensityError {
    move |e| MethylDensityError::PlotError(format!("{}: {:?}", context, e))
}

fn draw_density_chart(
    samples: &SampleSet,
    analysis: &DensityAnalysis,
    output_path: &Path,
    config: &PlotConfig,
    annotate_minima: bool,
) -> Result<()> {
    let low = analysis.config.domain_low;
    let high = analysis.config.domain_high;
    let bars = histogram_density(samples.values(), config.histogram_bins, low, high);

    let tallest_bar = bars.iter().map(|b| b.2).fold(0.0, f64::max);
    let y_top = tallest_bar.max(analysis.curve.max_density()) * 1.1;
    let y_top = if y_top > 0.0 { y_top } else { 1.0 };

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(plot_error("Failed to fill background"))?;

    let title = if annotate_minima {
        "Methylation density with local minima"
    } else {
        "Methylation density"
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(low..high, 0.0..y_top)
        .map_err(plot_error("Failed to build chart"))?;

    chart
        .configure_mesh()
        .x_desc("Methylation fraction")
        .y_desc("Density")
        .draw()
        .map_err(plot_error("Failed to draw mesh"))?;

    let bar_style = config.histogram_color.mix(0.5).filled();
    chart
        .draw_series(
            bars.iter()
                .map(|&(left, right, d)| Rectangle::new([(left, 0.0), (right, d)], bar_style)),
        )
        .map_err(plot_error("Failed to draw histogram"))?;

    let curve_color = config.curve_color;
    chart
        .draw_series(LineSeries::new(
            analysis.curve.points(),
            curve_color.stroke_width(2),
        ))
        .map_err(plot_error("Failed to draw density curve"))?
        .label("Kernel density")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], curve_color.stroke_width(2)));

    if annotate_minima {
        let color = config.minima_color;
        let curve = &analysis.curve;
        for x in analysis.minima.iter() {
            let y = interpolate_linear(curve.x(), curve.y(), x);

            chart
                .draw_series(DashedLineSeries::new(
                    vec![(x, 0.0), (x, y_top)],
                    6,
                    4,
                    color.stroke_width(1),
                ))
                .map_err(plot_error("Failed to draw minimum guide"))?;

            chart
                .draw_series(std::iter::once(Circle::new((x, y), 5, color.filled())))
                .map_err(plot_error("Failed to draw minimum marker"))?;

            chart
                .draw_series(std::iter::once(Text::new(
                    format!("x={:.2}", x),
                    (x, y + 0.05 * y_top),
                    ("sans-serif", 16).into_font().color(&color),
                )))
                .map_err(plot_error("Failed to draw minimum label"))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error("Failed to draw legend"))?;

    root.present()
        .map_err(plot_error("Failed to write plot"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::{DensityAnalysisConfig, analyze};
    use approx::assert_relative_eq;

    #[test]
    fn test_histogram_density_integrates_to_one() {
        let data = [0.05, 0.1, 0.15, 0.5, 0.51, 0.95, 1.0];
        let bars = histogram_density(&data, 10, 0.0, 1.0);

        assert_eq!(bars.len(), 10);
        let area: f64 = bars.iter().map(|(l, r, d)| (r - l) * d).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_histogram_counts_upper_bound_in_last_bin() {
        let bars = histogram_density(&[1.0, 1.0], 4, 0.0, 1.0);
        assert_relative_eq!(bars[3].2, 4.0, epsilon = 1e-12);
        assert!(bars[..3].iter().all(|b| b.2 == 0.0));
    }

    #[test]
    fn test_histogram_ignores_out_of_domain() {
        let bars = histogram_density(&[-0.5, 0.25, 3.0], 2, 0.0, 1.0);
        assert_relative_eq!(bars[0].2, 2.0, epsilon = 1e-12);
        assert_relative_eq!(bars[1].2, 0.0);
    }

    #[test]
    fn test_histogram_zero_bins() {
        assert!(histogram_density(&[0.5], 0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_minima_plot_skipped_without_minima() {
        let samples = SampleSet::new(vec![0.5; 4]).unwrap();
        let analysis = analyze(&samples, &DensityAnalysisConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MINIMA_PLOT_FILE);
        let artifact =
            render_minima_plot(&samples, &analysis, &path, &PlotConfig::default()).unwrap();

        assert!(artifact.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_density_plot_still_renders_minima_plot() {
        let samples = SampleSet::new(vec![0.1, 0.1, 0.1, 0.9, 0.9, 0.9]).unwrap();
        let analysis = analyze(&samples, &DensityAnalysisConfig::default()).unwrap();
        let config = PlotConfig {
            width: 300,
            height: 200,
            ..Default::default()
        };

        // Text rendering needs system fonts; skip on machines without them
        let scratch = tempfile::tempdir().unwrap();
        if render_minima_plot(&samples, &analysis, scratch.path().join("x.png"), &config).is_err() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        // A directory where the density image should go makes that write fail
        std::fs::create_dir(dir.path().join(DENSITY_PLOT_FILE)).unwrap();

        let err = render_plots(&samples, &analysis, dir.path(), &config).unwrap_err();
        assert!(matches!(err, MethylDensityError::PlotError(_)));
        assert!(dir.path().join(MINIMA_PLOT_FILE).is_file());
    }

    #[test]
    fn test_render_into_missing_directory_fails() {
        let samples = SampleSet::new(vec![0.2, 0.8]).unwrap();
        let analysis = analyze(&samples, &DensityAnalysisConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(DENSITY_PLOT_FILE);
        let err =
            render_density_plot(&samples, &analysis, &path, &PlotConfig::default()).unwrap_err();
        assert!(matches!(err, MethylDensityError::PlotError(_)));
    }
}
