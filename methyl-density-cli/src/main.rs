use anyhow::{Context, Result};
use clap::Parser;
use methyl_density::analysis::{DENSITY_PLOT_FILE, MINIMA_PLOT_FILE};
use methyl_density::{
    DensityAnalysis, DensityAnalysisConfig, KdeMethod, PlotConfig, SampleSet, format_report,
    read_table, render_density_plot, render_minima_plot, run_from_source, write_json_report,
    write_report,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// File name of the text summary inside the output directory
const REPORT_FILE: &str = "summary.txt";

/// methyl-density - kernel density thresholds for DNA methylation fractions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "methyl-density")]
#[command(about = "Summary statistics, density curve and local minima of methylation fractions", long_about = None)]
struct Cli {
    /// Path to the input table (CSV or TSV with a header row)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Column holding the per-locus average methylation fraction
    #[arg(short, long, default_value = "average_methylation")]
    column: String,

    /// Directory for the summary and plots (created if missing)
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = "results")]
    output_dir: PathBuf,

    /// Gaussian kernel bandwidth (default: 0.05) - Higher = smoother
    #[arg(long, default_value = "0.05")]
    bandwidth: f64,

    /// Spacing of the density evaluation grid (default: 0.01)
    #[arg(long, default_value = "0.01")]
    grid_step: f64,

    /// Lower bound of the analysis domain
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    domain_low: f64,

    /// Upper bound of the analysis domain
    #[arg(long, default_value = "1.0", allow_negative_numbers = true)]
    domain_high: f64,

    /// Density evaluation method
    #[arg(short = 'm', long, value_enum, default_value = "exact")]
    method: MethodArg,

    /// Native grid size for the binned method (rounded up to a power of two, min 512)
    #[arg(long, default_value = "512")]
    binned_points: usize,

    /// Number of histogram bins in the plots
    #[arg(long, default_value = "30")]
    histogram_bins: usize,

    /// Skip plot generation
    #[arg(long)]
    no_plots: bool,

    /// Also export the full analysis as JSON
    #[arg(long, value_name = "JSON_PATH")]
    export_json: Option<PathBuf>,

    /// Field delimiter of the input table (default: inferred from the extension)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum MethodArg {
    /// Direct Gaussian sum at every grid point
    Exact,
    /// Linear binning + FFT convolution, interpolated onto the grid
    Binned,
}

impl Cli {
    fn analysis_config(&self) -> DensityAnalysisConfig {
        let method = match self.method {
            MethodArg::Exact => KdeMethod::Exact,
            MethodArg::Binned => KdeMethod::Binned {
                n_points: self.binned_points,
            },
        };
        DensityAnalysisConfig {
            bandwidth: self.bandwidth,
            grid_step: self.grid_step,
            domain_low: self.domain_low,
            domain_high: self.domain_high,
            method,
        }
    }

    fn plot_config(&self) -> PlotConfig {
        PlotConfig {
            histogram_bins: self.histogram_bins,
            ..Default::default()
        }
    }

    fn delimiter_byte(&self) -> Result<Option<u8>> {
        match self.delimiter {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => Err(anyhow::anyhow!(
                "Delimiter must be a single ASCII character, got {:?}",
                c
            )),
        }
    }
}

/// Load, analyze and validate; nothing is written to disk here
fn load_and_analyze(args: &Cli) -> Result<(SampleSet, DensityAnalysis)> {
    let config = args.analysis_config();
    config
        .validate()
        .context("Invalid density parameters")?;

    info!("Reading input table: {}", args.input.display());
    let table = read_table(&args.input, args.delimiter_byte()?)
        .with_context(|| format!("Failed to read input table {}", args.input.display()))?;

    let (samples, analysis) = run_from_source(&table, &args.column, &config)
        .with_context(|| format!("Analysis of column '{}' failed", args.column))?;

    Ok((samples, analysis))
}

/// Write every artifact, continuing past individual failures
///
/// Returns the number of artifacts that could not be written.
fn write_artifacts(
    args: &Cli,
    samples: &SampleSet,
    analysis: &DensityAnalysis,
    output_dir: &Path,
) -> usize {
    let mut failures = 0;

    if let Err(e) = write_report(output_dir.join(REPORT_FILE), analysis) {
        error!("Failed to write summary report: {}", e);
        failures += 1;
    }

    if args.no_plots {
        debug!("Plot generation disabled");
    } else {
        let plot_config = args.plot_config();

        match render_density_plot(
            samples,
            analysis,
            output_dir.join(DENSITY_PLOT_FILE),
            &plot_config,
        ) {
            Ok(artifact) => debug!("Plot artifact: {}", artifact.path.display()),
            Err(e) => {
                error!("Failed to render density plot: {}", e);
                failures += 1;
            }
        }

        match render_minima_plot(
            samples,
            analysis,
            output_dir.join(MINIMA_PLOT_FILE),
            &plot_config,
        ) {
            Ok(Some(artifact)) => debug!("Plot artifact: {}", artifact.path.display()),
            Ok(None) => info!("No local minima; skipping {}", MINIMA_PLOT_FILE),
            Err(e) => {
                error!("Failed to render minima plot: {}", e);
                failures += 1;
            }
        }
    }

    if let Some(ref json_path) = args.export_json {
        if let Err(e) = write_json_report(json_path, analysis) {
            error!("Failed to export JSON to {}: {}", json_path.display(), e);
            failures += 1;
        }
    }

    failures
}

fn run(args: &Cli) -> Result<()> {
    let start_time = Instant::now();

    let (samples, analysis) = load_and_analyze(args)?;

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    // The analysis is complete; print it before any write can fail
    println!("{}", format_report(&analysis));

    let failures = write_artifacts(args, &samples, &analysis, &args.output_dir);
    if failures > 0 {
        return Err(anyhow::anyhow!(
            "{} artifact(s) could not be written to {}",
            failures,
            args.output_dir.display()
        ));
    }

    println!("Results saved to: {}", args.output_dir.display());
    info!(
        "Finished in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing subscriber with environment filter
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
