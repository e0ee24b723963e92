//! Local extrema of a gridded density via sign changes of the first difference
//!
//! With `d[i] = y[i+1] - y[i]`, `s[i] = sign(d[i])` and `t[i] = s[i+1] - s[i]`,
//! grid index `i + 1` is a local minimum when `t[i] == 2` (falling then rising)
//! and a local maximum when `t[i] == -2`. Flat stretches produce `t` values of
//! ±1 and are never reported, so a minimum sitting on a plateau is missed.

use crate::stats::density::DensityCurve;
use serde::Serialize;

/// Ascending, duplicate-free x-coordinates of strict local density minima
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LocalMinima(Vec<f64>);

impl LocalMinima {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

impl AsRef<[f64]> for LocalMinima {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Find local minima (candidate thresholds between sub-populations)
///
/// Only strict down-then-up transitions count. The result is restricted to
/// the curve's own x-range, sorted and deduplicated.
pub fn find_local_minima(curve: &DensityCurve) -> LocalMinima {
    LocalMinima(extrema_positions(curve, 2))
}

/// Find local maxima (density modes) with the same sign-change rule
pub fn find_local_maxima(curve: &DensityCurve) -> Vec<f64> {
    extrema_positions(curve, -2)
}

fn extrema_positions(curve: &DensityCurve, target: i8) -> Vec<f64> {
    let x = curve.x();
    if x.len() < 3 {
        return Vec::new();
    }
    let (low, high) = (x[0], x[x.len() - 1]);

    let signs: Vec<i8> = curve.y().windows(2).map(|w| sign(w[1] - w[0])).collect();

    let mut positions: Vec<f64> = signs
        .windows(2)
        .enumerate()
        .filter(|(_, s)| s[1] - s[0] == target)
        .map(|(i, _)| x[i + 1])
        .filter(|&xi| (low..=high).contains(&xi))
        .collect();

    positions.sort_by(f64::total_cmp);
    positions.dedup();
    positions
}

/// Three-valued sign; unlike `f64::signum`, zero maps to zero
#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
