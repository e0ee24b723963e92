use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use methyl_density::stats::density::{KdeMethod, estimate_density_with};
use methyl_density::{SampleSet, find_local_minima};
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

/// Generate bimodal methylation fractions (unmethylated + methylated loci)
fn generate_test_data(n_points: usize) -> SampleSet {
    let mut rng = StdRng::seed_from_u64(17);
    let values = (0..n_points)
        .map(|_| {
            let center = if rng.random_bool(0.4) { 0.1 } else { 0.85 };
            (center + rng.random_range(-0.08..0.08f64)).clamp(0.0, 1.0)
        })
        .collect();
    SampleSet::new(values).unwrap()
}

fn benchmark_kde_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("kde_estimate");

    // Typical inputs hold hundreds to a few thousand loci
    let data_sizes = vec![100, 1000, 5000, 20000];

    for &n_data in &data_sizes {
        let data = generate_test_data(n_data);

        group.bench_with_input(BenchmarkId::new("exact", n_data), &data, |b, data| {
            b.iter(|| {
                estimate_density_with(
                    black_box(data),
                    black_box(0.05),
                    0.0,
                    1.0,
                    black_box(0.01),
                    KdeMethod::Exact,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("binned", n_data), &data, |b, data| {
            b.iter(|| {
                estimate_density_with(
                    black_box(data),
                    black_box(0.05),
                    0.0,
                    1.0,
                    black_box(0.01),
                    KdeMethod::Binned { n_points: 512 },
                )
            })
        });
    }

    group.finish();
}

fn benchmark_find_minima(c: &mut Criterion) {
    let data = generate_test_data(2000);
    let curve = estimate_density_with(&data, 0.05, 0.0, 1.0, 0.001, KdeMethod::Exact).unwrap();

    c.bench_function("find_local_minima_1001_points", |b| {
        b.iter(|| find_local_minima(black_box(&curve)))
    });
}

criterion_group!(benches, benchmark_kde_estimate, benchmark_find_minima);
criterion_main!(benches);
