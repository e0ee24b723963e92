//! Sample loading and validation
//!
//! A [`SampleSet`] is the only input the statistics and density code accept.
//! It is guaranteed to be non-empty and to contain finite values only, so
//! downstream code never re-checks for missing entries.

use crate::MethylationData;
use crate::error::{MethylDensityError, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Validated, non-empty sequence of finite methylation fractions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSet {
    values: Vec<f64>,
}

impl SampleSet {
    /// Build a sample set from already-clean values
    ///
    /// # Errors
    /// - [`MethylDensityError::EmptySamples`] if `values` is empty
    /// - [`MethylDensityError::NonFiniteSample`] if any value is NaN or infinite
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(MethylDensityError::EmptySamples);
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(MethylDensityError::NonFiniteSample { index, value });
        }
        Ok(Self { values })
    }

    /// Build a sample set from a column that may contain missing entries
    ///
    /// `None` and NaN are both treated as missing and dropped. Infinite values
    /// are not missing and still fail validation.
    pub fn from_optional<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let clean: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        Self::new(clean)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Number of samples outside the closed interval `[low, high]`
    pub fn count_outside(&self, low: f64, high: f64) -> usize {
        self.values.iter().filter(|&&v| v < low || v > high).count()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for SampleSet {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// Read a named column from a tabular source into a [`SampleSet`]
///
/// Missing entries are dropped. Values outside `[0, 1]` are kept but logged,
/// since they usually mean the column holds percentages instead of fractions.
///
/// # Errors
/// - [`MethylDensityError::ColumnNotFound`] / [`MethylDensityError::InvalidColumn`]
///   from the source accessor
/// - [`MethylDensityError::EmptySamples`] if nothing is left after dropping missing values
pub fn load_samples<T: MethylationData + ?Sized>(source: &T, column: &str) -> Result<SampleSet> {
    let raw = source.get_column_f64(column)?;
    let n_raw = raw.len();

    let samples = SampleSet::from_optional(raw)?;
    let n_missing = n_raw - samples.len();
    if n_missing > 0 {
        warn!(
            "Dropped {} missing value(s) from column '{}' ({} of {} rows kept)",
            n_missing,
            column,
            samples.len(),
            n_raw
        );
    }

    let n_outside = samples.count_outside(0.0, 1.0);
    if n_outside > 0 {
        warn!(
            "{} sample(s) in column '{}' lie outside [0, 1]; methylation fractions expected",
            n_outside, column
        );
    }

    debug!("Loaded {} samples from column '{}'", samples.len(), column);
    Ok(samples)
}
