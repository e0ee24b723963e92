pub mod pipeline;
pub mod plots;
pub mod report;

pub use pipeline::{DensityAnalysis, DensityAnalysisConfig, analyze, run_from_source};
pub use plots::{
    DENSITY_PLOT_FILE, MINIMA_PLOT_FILE, PlotArtifact, PlotConfig, PlotKind, histogram_density,
    render_density_plot, render_minima_plot, render_plots,
};
pub use report::{JsonReport, format_report, write_json_report, write_report};
