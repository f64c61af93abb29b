//! Pure numerical helpers shared by the passive-property estimators
//!
//! All functions are stateless and take plain slices/views.

use ndarray::{Array1, ArrayView1};

// ============================================================================
// Summary statistics
// ============================================================================

/// Arithmetic mean, `None` for an empty input
pub fn mean(values: ArrayView1<f64>) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.sum() / values.len() as f64)
    }
}

/// Population standard deviation (ddof = 0)
pub fn std_dev(values: ArrayView1<f64>) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// `|a - b| <= atol + rtol·|b|` with rtol = 1e-5, atol = 1e-8
#[inline]
pub fn is_close(a: f64, b: f64) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-8;
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is in percent and clamped to `[0, 100]`.
pub fn percentile(values: ArrayView1<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// ============================================================================
// Signal conditioning
// ============================================================================

/// Centered moving average of `width` samples
///
/// Near the edges the average runs over the samples that exist, so a flat
/// signal stays flat. Widths of one or less return the input unchanged.
pub fn moving_average(values: ArrayView1<f64>, width: usize) -> Array1<f64> {
    let n = values.len();
    if width <= 1 || n == 0 {
        return values.to_owned();
    }

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in values.iter() {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    let before = (width - 1) / 2;
    let after = width - 1 - before;
    Array1::from_iter((0..n).map(|i| {
        let lo = i.saturating_sub(before);
        let hi = (i + after + 1).min(n);
        (prefix[hi] - prefix[lo]) / (hi - lo) as f64
    }))
}

/// First difference, `out[i] = values[i + 1] - values[i]`
pub fn diff(values: ArrayView1<f64>) -> Array1<f64> {
    if values.len() < 2 {
        return Array1::zeros(0);
    }
    Array1::from_iter(values.windows(2).into_iter().map(|w| w[1] - w[0]))
}

/// Index of the first minimum
pub fn argmin(values: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() && best.map_or(true, |(_, b)| v < b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first maximum
pub fn argmax(values: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() && best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

// ============================================================================
// Regression
// ============================================================================

/// Simple linear regression: y = a + b*x
/// Returns (slope, intercept, r_squared)
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64, f64)> {
    let n = x.len() as f64;
    if n < 2.0 || x.len() != y.len() {
        return None;
    }

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum();
    let sum_x2: f64 = x.iter().map(|xi| xi * xi).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < 1e-15 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    let ss_res: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();

    Some((slope, intercept, coefficient_of_determination(y, ss_res)))
}

/// R² = 1 - SS_res / SS_tot; a constant signal that is fitted counts as 1
pub fn coefficient_of_determination(y: &[f64], ss_res: f64) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    let mean_y = y.iter().sum::<f64>() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    if ss_tot.abs() < 1e-15 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    }
}
