pub mod density;
pub mod extrema;
pub mod summary;

pub use density::{
    DensityCurve, Grid, KdeMethod, estimate_density, estimate_density_with, interpolate_linear,
};
pub use extrema::{LocalMinima, find_local_maxima, find_local_minima};
pub use summary::{Summary, compute_summary, median};
