use thiserror::Error;

/// Broad failure class of a [`MethylDensityError`]
///
/// - `Data`: the input could not be turned into a usable sample set
/// - `Estimation`: numeric parameters or sample count make the density undefined
/// - `Io`: results could not be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Estimation,
    Io,
}

#[derive(Error, Debug)]
pub enum MethylDensityError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(std::path::PathBuf),

    #[error("Column not found in input table: {0}")]
    ColumnNotFound(String),

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("No valid samples remain after removing missing values")]
    EmptySamples,

    #[error("Sample {index} is not a finite number: {value}")]
    NonFiniteSample { index: usize, value: f64 },

    #[cfg(feature = "polars")]
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("Invalid bandwidth: {0} (must be a finite value > 0)")]
    InvalidBandwidth(f64),

    #[error("Invalid grid step: {0} (must be a finite value > 0)")]
    InvalidGridStep(f64),

    #[error("Invalid domain: [{low}, {high}] (upper bound must exceed lower bound)")]
    InvalidDomain { low: f64, high: f64 },

    #[error("Grid too large: {points} points requested, at most {max} allowed")]
    GridTooLarge { points: f64, max: usize },

    #[error("Invalid binned grid size: {requested} (must be at most {max})")]
    InvalidBinnedPoints { requested: usize, max: usize },

    #[error("Insufficient data: need at least {min} samples, got {actual}")]
    InsufficientData { min: usize, actual: usize },

    #[error("Statistical computation failed: {0}")]
    StatsError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plot generation error: {0}")]
    PlotError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl MethylDensityError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InputNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::InvalidColumn(_)
            | Self::EmptySamples
            | Self::NonFiniteSample { .. } => ErrorCategory::Data,
            #[cfg(feature = "polars")]
            Self::PolarsError(_) => ErrorCategory::Data,
            Self::InvalidBandwidth(_)
            | Self::InvalidGridStep(_)
            | Self::InvalidDomain { .. }
            | Self::GridTooLarge { .. }
            | Self::InvalidBinnedPoints { .. }
            | Self::InsufficientData { .. }
            | Self::StatsError(_) => ErrorCategory::Estimation,
            Self::Io(_) | Self::PlotError(_) | Self::SerializationError(_) => ErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, MethylDensityError>;
