//! Kernel density analysis of DNA methylation fractions
//!
//! This crate computes descriptive statistics over a column of methylation
//! fractions, estimates a Gaussian kernel density on a fixed grid over `[0, 1]`,
//! and reports the local minima of that density. The minima are candidate
//! thresholds separating sub-populations, e.g. unmethylated and methylated loci.
//!
//! # Quick Start
//!
//! ```
//! use methyl_density::{DensityAnalysisConfig, SampleSet, analyze, format_report};
//!
//! let samples = SampleSet::new(vec![0.1, 0.1, 0.1, 0.9, 0.9, 0.9])?;
//! let analysis = analyze(&samples, &DensityAnalysisConfig::default())?;
//!
//! assert_eq!(analysis.minima.as_slice(), &[0.5]);
//! println!("{}", format_report(&analysis));
//! # Ok::<(), methyl_density::MethylDensityError>(())
//! ```
//!
//! # Reading a table
//!
//! ```rust,no_run
//! use methyl_density::{DensityAnalysisConfig, PlotConfig, read_table, render_plots, run_from_source};
//!
//! let table = read_table("methylation.tsv", None)?;
//! let (samples, analysis) =
//!     run_from_source(&table, "average_methylation", &DensityAnalysisConfig::default())?;
//! render_plots(&samples, &analysis, "results", &PlotConfig::default())?;
//! # Ok::<(), methyl_density::MethylDensityError>(())
//! ```

pub mod analysis;
pub mod error;
pub mod samples;
pub mod stats;

pub use analysis::{
    DensityAnalysis, DensityAnalysisConfig, PlotArtifact, PlotConfig, PlotKind, analyze,
    format_report, render_density_plot, render_minima_plot, render_plots, run_from_source,
    write_json_report, write_report,
};
pub use error::{ErrorCategory, MethylDensityError, Result};
pub use samples::{SampleSet, load_samples};
pub use stats::{
    DensityCurve, Grid, KdeMethod, LocalMinima, Summary, compute_summary, estimate_density,
    estimate_density_with, find_local_maxima, find_local_minima,
};

#[cfg(feature = "polars")]
pub use crate::polars_impl::{MISSING_TOKENS, read_table};

use std::collections::HashMap;

/// Trait for tabular sources that hold a methylation column
///
/// Implement this trait on your table type to feed it to [`load_samples`].
/// An implementation for `polars::DataFrame` is provided with the `polars`
/// feature (enabled by default).
///
/// # Example Implementation
///
/// ```rust
/// use methyl_density::{MethylDensityError, MethylationData, Result};
///
/// struct Rows {
///     names: Vec<String>,
///     rows: Vec<Vec<Option<f64>>>,
/// }
///
/// impl MethylationData for Rows {
///     fn n_rows(&self) -> usize {
///         self.rows.len()
///     }
///
///     fn column_names(&self) -> Vec<String> {
///         self.names.clone()
///     }
///
///     fn get_column_f64(&self, column: &str) -> Result<Vec<Option<f64>>> {
///         let idx = self
///             .names
///             .iter()
///             .position(|n| n == column)
///             .ok_or_else(|| MethylDensityError::ColumnNotFound(column.to_string()))?;
///         Ok(self.rows.iter().map(|r| r.get(idx).copied().flatten()).collect())
///     }
/// }
/// ```
pub trait MethylationData {
    fn n_rows(&self) -> usize;
    fn column_names(&self) -> Vec<String>;

    /// Get a numeric column as f64 values, `None` marking a missing entry
    ///
    /// # Errors
    /// - [`MethylDensityError::ColumnNotFound`] if the column does not exist
    /// - [`MethylDensityError::InvalidColumn`] if it is not numeric
    fn get_column_f64(&self, column: &str) -> Result<Vec<Option<f64>>>;
}

/// In-memory columns, mainly for tests and small scripts
impl MethylationData for HashMap<String, Vec<Option<f64>>> {
    fn n_rows(&self) -> usize {
        self.values().map(Vec::len).max().unwrap_or(0)
    }

    fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keys().cloned().collect();
        names.sort();
        names
    }

    fn get_column_f64(&self, column: &str) -> Result<Vec<Option<f64>>> {
        self.get(column)
            .cloned()
            .ok_or_else(|| MethylDensityError::ColumnNotFound(column.to_string()))
    }
}

#[cfg(feature = "polars")]
mod polars_impl {
    use super::*;
    use polars::prelude::*;
    use std::path::Path;
    use tracing::debug;

    impl MethylationData for DataFrame {
        fn n_rows(&self) -> usize {
            self.height()
        }

        fn column_names(&self) -> Vec<String> {
            self.get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect()
        }

        fn get_column_f64(&self, column: &str) -> Result<Vec<Option<f64>>> {
            let series = self
                .column(column)
                .map_err(|_| MethylDensityError::ColumnNotFound(column.to_string()))?;

            // An all-missing column may be inferred as text or null; it simply has no samples
            if series.null_count() == series.len() {
                return Ok(vec![None; series.len()]);
            }

            let numeric = matches!(
                series.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::Int16
                    | DataType::Int8
                    | DataType::UInt64
                    | DataType::UInt32
                    | DataType::UInt16
                    | DataType::UInt8
            );
            if !numeric {
                return Err(MethylDensityError::InvalidColumn(format!(
                    "Column {} is not numeric (dtype: {:?})",
                    column,
                    series.dtype()
                )));
            }

            let values = series.cast(&DataType::Float64)?;
            Ok(values.f64()?.into_iter().collect())
        }
    }

    /// Field values read as missing, in addition to empty fields
    pub const MISSING_TOKENS: &[&str] = &["NA", "N/A", "NaN", "NULL", "null", "."];

    /// Read a delimited text table with a header row
    ///
    /// When `delimiter` is `None` it is inferred from the extension: `.tsv`,
    /// `.bed` and `.txt` are tab separated, anything else comma separated.
    /// Empty fields and any of [`MISSING_TOKENS`] are read as missing.
    pub fn read_table(path: impl AsRef<Path>, delimiter: Option<u8>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MethylDensityError::InputNotFound(path.to_path_buf()));
        }

        let separator = delimiter.unwrap_or_else(|| default_delimiter(path));
        debug!(
            "Reading {} with separator {:?}",
            path.display(),
            separator as char
        );

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(separator)
                    .with_null_values(Some(NullValues::AllColumns(
                        MISSING_TOKENS.iter().map(|&t| t.into()).collect(),
                    ))),
            )
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        debug!("Read {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    pub(crate) fn default_delimiter(path: &Path) -> u8 {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("bed") | Some("txt") => b'\t',
            _ => b',',
        }
    }

}
