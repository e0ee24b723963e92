use methyl_density::{
    DensityAnalysisConfig, KdeMethod, PlotConfig, SampleSet, analyze, error::Result,
    format_report, render_plots,
};

/// Example demonstrating how to use the methyl-density library
fn main() -> Result<()> {
    println!("=== Methylation density example ===\n");

    // 1. Synthetic bimodal methylation fractions
    let samples = create_synthetic_samples()?;
    println!("Loaded {} samples\n", samples.len());

    // 2. Analyze with the default parameters
    let config = DensityAnalysisConfig::default();
    let analysis = analyze(&samples, &config)?;
    println!("{}", format_report(&analysis));

    // 3. Same data through the binned (FFT) estimator
    let binned_config = DensityAnalysisConfig {
        method: KdeMethod::Binned { n_points: 1024 },
        ..config
    };
    let binned = analyze(&samples, &binned_config)?;
    println!("Binned estimator minima: {:?}", binned.minima.as_slice());
    println!("Density modes: {:?}\n", analysis.modes);

    // 4. Render plots into a temporary directory
    let out_dir = std::env::temp_dir().join("methyl_density_example");
    std::fs::create_dir_all(&out_dir)?;
    for artifact in render_plots(&samples, &analysis, &out_dir, &PlotConfig::default())? {
        println!("Wrote {:?} plot to {}", artifact.kind, artifact.path.display());
    }

    Ok(())
}

fn create_synthetic_samples() -> Result<SampleSet> {
    let mut values = Vec::new();
    for i in 0..300 {
        // Unmethylated loci clustered near 0.1
        values.push(0.1 + ((i * 37) % 100) as f64 / 1000.0 - 0.05);
    }
    for i in 0..500 {
        // Methylated loci clustered near 0.85
        values.push(0.85 + ((i * 53) % 100) as f64 / 1000.0 - 0.05);
    }
    SampleSet::new(values)
}
