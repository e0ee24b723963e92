use crate::error::{MethylDensityError, Result};
use crate::samples::SampleSet;
use realfft::RealFftPlanner;
use realfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fewest samples for which a Gaussian KDE is computed
pub const MIN_KDE_SAMPLES: usize = 2;

/// Smallest native grid used by the binned estimator
pub const MIN_BINNED_POINTS: usize = 512;

/// Largest native grid accepted by the binned estimator
pub const MAX_BINNED_POINTS: usize = 1 << 24;

/// Largest evaluation grid accepted (80 MB of `f64` per curve axis)
pub const MAX_GRID_POINTS: usize = 10_000_000;

/// Relative slack when counting grid steps, so `0.3 / 0.1` yields 3 steps, not 2
const GRID_TOLERANCE: f64 = 1e-9;

/// How the kernel density is evaluated on the target grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum KdeMethod {
    /// Direct Gaussian sum at every grid point
    #[default]
    Exact,
    /// Linear binning onto `n_points` (rounded up to a power of two, at least 512),
    /// FFT convolution, then linear interpolation onto the target grid
    Binned { n_points: usize },
}

/// Evenly spaced evaluation points over a closed domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    points: Vec<f64>,
    step: f64,
}

impl Grid {
    /// Build `floor((high - low) / step) + 1` points starting at `low`
    ///
    /// Point `i` is `low + i * step`; the last point is clamped to `high` so
    /// floating-point accumulation never pushes it past the domain.
    ///
    /// # Errors
    /// Besides invalid bounds or step, fails with
    /// [`MethylDensityError::GridTooLarge`] above [`MAX_GRID_POINTS`] points.
    pub fn new(low: f64, high: f64, step: f64) -> Result<Self> {
        let len = grid_len(low, high, step)?;
        let points = (0..len)
            .map(|i| (low + i as f64 * step).min(high))
            .collect();

        Ok(Grid { points, step })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`: a grid holds at least the lower bound
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn low(&self) -> f64 {
        self.points[0]
    }

    /// Last grid point (the upper bound or the nearest point below it)
    pub fn high(&self) -> f64 {
        self.points[self.points.len() - 1]
    }
}

/// Density values paired with the grid they were evaluated on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl DensityCurve {
    /// Pair grid coordinates with density values
    ///
    /// # Errors
    /// Returns [`MethylDensityError::StatsError`] if the lengths differ or any
    /// density is negative or non-finite.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MethylDensityError::StatsError(format!(
                "Grid has {} points but density has {} values",
                x.len(),
                y.len()
            )));
        }
        if let Some(bad) = y.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(MethylDensityError::StatsError(format!(
                "Density values must be finite and non-negative, found {}",
                bad
            )));
        }
        Ok(DensityCurve { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    pub fn max_density(&self) -> f64 {
        self.y.iter().copied().fold(0.0, f64::max)
    }

    /// Area under the curve (trapezoid rule)
    ///
    /// Close to 1 when the domain covers the data; less near the boundaries
    /// because the support is truncated without reflection.
    pub fn integral(&self) -> f64 {
        self.x
            .windows(2)
            .zip(self.y.windows(2))
            .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
            .sum()
    }

    /// Linearly interpolate this curve onto another grid, clamping outside its range
    pub fn resample(&self, grid: &Grid) -> DensityCurve {
        let y = grid
            .points()
            .iter()
            .map(|&xi| interpolate_linear(&self.x, &self.y, xi))
            .collect();
        DensityCurve {
            x: grid.points().to_vec(),
            y,
        }
    }
}

/// Gaussian kernel density estimate evaluated exactly on the grid
///
/// The support is truncated to `[domain_low, domain_high]` with no boundary
/// correction, so mass close to the bounds is underestimated.
///
/// # Errors
/// Fails with an estimation error if `bandwidth <= 0`, `grid_step <= 0`,
/// `domain_high <= domain_low`, or fewer than two samples are given.
pub fn estimate_density(
    samples: &SampleSet,
    bandwidth: f64,
    domain_low: f64,
    domain_high: f64,
    grid_step: f64,
) -> Result<DensityCurve> {
    estimate_density_with(
        samples,
        bandwidth,
        domain_low,
        domain_high,
        grid_step,
        KdeMethod::Exact,
    )
}

/// [`estimate_density`] with an explicit evaluation method
pub fn estimate_density_with(
    samples: &SampleSet,
    bandwidth: f64,
    domain_low: f64,
    domain_high: f64,
    grid_step: f64,
    method: KdeMethod,
) -> Result<DensityCurve> {
    validate_bandwidth(bandwidth)?;
    validate_method(method)?;
    let grid = Grid::new(domain_low, domain_high, grid_step)?;

    if samples.len() < MIN_KDE_SAMPLES {
        return Err(MethylDensityError::InsufficientData {
            min: MIN_KDE_SAMPLES,
            actual: samples.len(),
        });
    }

    debug!(
        "KDE: n={}, bw={}, grid=[{}, {}] step {} ({} points), method={:?}",
        samples.len(),
        bandwidth,
        grid.low(),
        grid.high(),
        grid.step(),
        grid.len(),
        method
    );

    match method {
        KdeMethod::Exact => Ok(exact_kde(samples.values(), bandwidth, &grid)),
        KdeMethod::Binned { n_points } => binned_kde(samples.values(), bandwidth, &grid, n_points),
    }
}

fn exact_kde(data: &[f64], bandwidth: f64, grid: &Grid) -> DensityCurve {
    let norm = data.len() as f64 * bandwidth;

    let y = grid
        .points()
        .iter()
        .map(|&xi| {
            let sum: f64 = data
                .iter()
                .map(|&xj| gaussian_kernel((xi - xj) / bandwidth))
                .sum();
            sum / norm
        })
        .collect();

    DensityCurve {
        x: grid.points().to_vec(),
        y,
    }
}

/// Binned KDE in the manner of R's `density()`
///
/// The native grid spans the domain padded by four bandwidths on each side,
/// so the target grid always lies inside it. Samples outside the padded
/// range are dropped.
fn binned_kde(data: &[f64], bandwidth: f64, grid: &Grid, n_points: usize) -> Result<DensityCurve> {
    let n = n_points.max(MIN_BINNED_POINTS).next_power_of_two();
    let lo = grid.low() - 4.0 * bandwidth;
    let up = grid.high() + 4.0 * bandwidth;

    let mut binned = linear_binning(data, lo, up, n);

    // Kernel ordinates on the doubled, wrapped grid, same spacing as the bins
    let m = 2 * n;
    let kstep = (up - lo) / (n - 1) as f64;
    let mut kernel: Vec<f64> = (0..m)
        .map(|k| {
            let dist = if k > n { (m - k) as f64 * kstep } else { k as f64 * kstep };
            gaussian_kernel(dist / bandwidth) / bandwidth
        })
        .collect();

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(m);
    let c2r = planner.plan_fft_inverse(m);

    let mut data_spectrum = r2c.make_output_vec();
    let mut kernel_spectrum = r2c.make_output_vec();
    r2c.process(&mut binned, &mut data_spectrum)
        .map_err(|e| MethylDensityError::StatsError(format!("Forward FFT failed: {}", e)))?;
    r2c.process(&mut kernel, &mut kernel_spectrum)
        .map_err(|e| MethylDensityError::StatsError(format!("Forward FFT failed: {}", e)))?;

    let mut product: Vec<Complex<f64>> = data_spectrum
        .iter()
        .zip(kernel_spectrum.iter())
        .map(|(a, b)| a * b.conj())
        .collect();
    // DC and Nyquist bins of a real signal are real; drop round-off so c2r accepts them
    let last = product.len() - 1;
    product[0].im = 0.0;
    product[last].im = 0.0;

    let mut convolved = c2r.make_output_vec();
    c2r.process(&mut product, &mut convolved)
        .map_err(|e| MethylDensityError::StatsError(format!("Inverse FFT failed: {}", e)))?;

    let native_y: Vec<f64> = convolved[..n]
        .iter()
        .map(|v| (v / m as f64).max(0.0))
        .collect();
    let native_x: Vec<f64> = (0..n)
        .map(|i| lo + (up - lo) * i as f64 / (n - 1) as f64)
        .collect();

    debug!("Binned KDE: native grid of {} points over [{:.4}, {:.4}]", n, lo, up);

    let native = DensityCurve {
        x: native_x,
        y: native_y,
    };
    Ok(native.resample(grid))
}

/// Spread unit-mass-per-sample weights linearly onto `n` bins over `[lo, hi]`
///
/// Returns a zero-padded vector of length `2n` ready for circular convolution.
fn linear_binning(data: &[f64], lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let mut y = vec![0.0; 2 * n];
    let weight = 1.0 / data.len() as f64;
    let delta = (hi - lo) / (n - 1) as f64;
    let ix_max = n as i64 - 2;

    for &x in data {
        let pos = (x - lo) / delta;
        let ix = pos.floor() as i64;
        let frac = pos - ix as f64;

        if (0..=ix_max).contains(&ix) {
            let ix = ix as usize;
            y[ix] += weight * (1.0 - frac);
            y[ix + 1] += weight * frac;
        } else if ix == -1 {
            y[0] += weight * frac;
        } else if ix == ix_max + 1 {
            y[ix as usize] += weight * (1.0 - frac);
        }
    }

    y
}

/// Linear interpolation of `(xs, ys)` at `x`, clamped to the end values
///
/// `xs` must be ascending and non-empty.
pub fn interpolate_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }

    let i = xs.partition_point(|&v| v <= x);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}

/// Gaussian kernel function
#[inline]
fn gaussian_kernel(u: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.3989422804014327; // 1/sqrt(2*pi)
    INV_SQRT_2PI * (-0.5 * u * u).exp()
}

pub(crate) fn validate_bandwidth(bandwidth: f64) -> Result<()> {
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(MethylDensityError::InvalidBandwidth(bandwidth));
    }
    Ok(())
}

pub(crate) fn validate_grid_step(step: f64) -> Result<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err(MethylDensityError::InvalidGridStep(step));
    }
    Ok(())
}

/// Number of grid points over `[low, high]`, checked before anything is allocated
pub(crate) fn grid_len(low: f64, high: f64, step: f64) -> Result<usize> {
    validate_domain(low, high)?;
    validate_grid_step(step)?;

    // Finite bounds can still overflow when subtracted
    let span = high - low;
    if !span.is_finite() {
        return Err(MethylDensityError::InvalidDomain { low, high });
    }

    let n_steps = (span / step + GRID_TOLERANCE).floor();
    if !n_steps.is_finite() || n_steps >= MAX_GRID_POINTS as f64 {
        return Err(MethylDensityError::GridTooLarge {
            points: n_steps + 1.0,
            max: MAX_GRID_POINTS,
        });
    }
    Ok(n_steps as usize + 1)
}

pub(crate) fn validate_method(method: KdeMethod) -> Result<()> {
    if let KdeMethod::Binned { n_points } = method {
        if n_points > MAX_BINNED_POINTS {
            return Err(MethylDensityError::InvalidBinnedPoints {
                requested: n_points,
                max: MAX_BINNED_POINTS,
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_domain(low: f64, high: f64) -> Result<()> {
    if !low.is_finite() || !high.is_finite() || high <= low {
        return Err(MethylDensityError::InvalidDomain { low, high });
    }
    Ok(())
}
