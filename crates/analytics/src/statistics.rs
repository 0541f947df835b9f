//! Moment and dependence estimators for monthly return series.
//!
//! Skewness and kurtosis use the bias-adjusted sample estimators that common
//! statistics packages report by default, so results line up with a
//! spreadsheet or dataframe computed over the same series.

pub const MONTHS_PER_YEAR: f64 = 12.0;
/// Percentage points per year from a fractional monthly mean.
pub const ANNUALIZED_MEAN_SCALE: f64 = 100.0 * MONTHS_PER_YEAR;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator). Exactly zero for a series
/// whose spread is only rounding noise.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if is_negligible_spread(sum_sq, m, n) {
        return Some(0.0);
    }
    Some((sum_sq / (n - 1) as f64).sqrt())
}

/// Adjusted Fisher–Pearson skewness, `sqrt(n(n−1))/(n−2) · m3 / m2^1.5`.
/// Undefined below three observations or for a constant series.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m2_sum, m3_sum, _) = central_sums(values)?;
    if is_negligible_spread(m2_sum, mean(values)?, n) {
        return None;
    }
    let n = n as f64;
    let m2 = m2_sum / n;
    let m3 = m3_sum / n;
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5))
}

/// Unbiased excess kurtosis. Undefined below four observations or for a
/// constant series.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m2_sum, _, m4_sum) = central_sums(values)?;
    if is_negligible_spread(m2_sum, mean(values)?, n) {
        return None;
    }
    let n = n as f64;
    let numerator = n * (n + 1.0) * (n - 1.0) * m4_sum;
    let denominator = (n - 2.0) * (n - 3.0) * m2_sum * m2_sum;
    let adjustment = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    Some(numerator / denominator - adjustment)
}

/// Pearson correlation of two equally long series.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if is_negligible_spread(var_a, mean_a, a.len()) || is_negligible_spread(var_b, mean_b, b.len())
    {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Largest pointwise `|a_i − b_i|`.
pub fn max_abs_difference(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .reduce(f64::max)
}

/// True when the summed squared deviations are within floating-point noise of
/// zero for a series of `n` values around `mean`.
fn is_negligible_spread(squared_deviations: f64, mean: f64, n: usize) -> bool {
    squared_deviations <= f64::EPSILON * mean * mean * n as f64
}

/// Sums of 2nd, 3rd and 4th powers of deviations from the mean.
fn central_sums(values: &[f64]) -> Option<(f64, f64, f64)> {
    let m = mean(values)?;
    Some(values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), v| {
        let d = v - m;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    }))
}
