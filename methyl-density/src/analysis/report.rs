//! Text and JSON reports for a density analysis

use crate::analysis::pipeline::{DensityAnalysis, DensityAnalysisConfig};
use crate::error::Result;
use crate::stats::summary::Summary;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Render the human-readable summary
///
/// ```text
/// Methylation density summary
/// Samples: 6
/// Mean: 0.50
/// Median: 0.50
/// Standard deviation: 0.44
///
/// Local minima in density:
///   1. 0.50
/// ```
pub fn format_report(analysis: &DensityAnalysis) -> String {
    let s = &analysis.summary;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Methylation density summary");
    let _ = writeln!(out, "Samples: {}", s.count);
    let _ = writeln!(out, "Mean: {:.2}", s.mean);
    let _ = writeln!(out, "Median: {:.2}", s.median);
    let _ = writeln!(out, "Standard deviation: {:.2}", s.stddev);
    let _ = writeln!(out);
    let _ = writeln!(out, "Local minima in density:");

    if analysis.minima.is_empty() {
        let _ = writeln!(out, "None detected.");
    } else {
        for (i, x) in analysis.minima.iter().enumerate() {
            let _ = writeln!(out, "  {}. {:.2}", i + 1, x);
        }
    }

    out
}

/// Write the text report to `path`
pub fn write_report(path: impl AsRef<Path>, analysis: &DensityAnalysis) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_report(analysis))?;
    info!("Wrote summary report to: {}", path.display());
    Ok(())
}

/// Machine-readable export of one analysis run
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub summary: &'a Summary,
    pub local_minima: &'a [f64],
    pub modes: &'a [f64],
    pub parameters: &'a DensityAnalysisConfig,
    pub grid: &'a [f64],
    pub density: &'a [f64],
    pub density_integral: f64,
}

impl<'a> From<&'a DensityAnalysis> for JsonReport<'a> {
    fn from(analysis: &'a DensityAnalysis) -> Self {
        JsonReport {
            summary: &analysis.summary,
            local_minima: analysis.minima.as_slice(),
            modes: &analysis.modes,
            parameters: &analysis.config,
            grid: analysis.curve.x(),
            density: analysis.curve.y(),
            density_integral: analysis.curve.integral(),
        }
    }
}

/// Write the analysis as pretty-printed JSON
///
/// A single-sample standard deviation (`NaN`) is written as `null`.
pub fn write_json_report(path: impl AsRef<Path>, analysis: &DensityAnalysis) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&JsonReport::from(analysis))?;
    std::fs::write(path, json)?;
    info!("Exported JSON report to: {}", path.display());
    Ok(())
}
