use crate::error::{MethylDensityError, Result};
use crate::samples::SampleSet;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of a sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator); `NaN` when `count < 2`
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Compute count, mean, median, sample standard deviation, min and max
///
/// A [`SampleSet`] is never empty, so every field except `stddev` is always
/// finite. With a single sample the (n - 1) standard deviation is undefined
/// and reported as `NaN`, the same convention R's `sd()` follows.
pub fn compute_summary(samples: &SampleSet) -> Summary {
    let data = samples.values();
    let n = data.len();

    let mean = data.iter().sum::<f64>() / n as f64;
    let stddev = if n < 2 {
        f64::NAN
    } else {
        let ss = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>();
        (ss / (n - 1) as f64).sqrt()
    };

    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });

    // Non-empty by construction of SampleSet
    let median = sorted_median(data);

    Summary {
        count: n,
        mean,
        median,
        stddev,
        min,
        max,
    }
}

/// Calculate median of a slice of f64 values
pub fn median(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(MethylDensityError::StatsError("Empty data".to_string()));
    }
    Ok(sorted_median(data))
}

fn sorted_median(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}
