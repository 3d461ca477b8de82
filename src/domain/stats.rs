//! Descriptive statistics over plain `f64` samples.
//!
//! Dispersion measures use the sample estimator (n - 1 denominator).
//! Every function returns `None` when the sample cannot support the statistic.

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

pub fn variance(xs: &[f64]) -> Option<f64> {
    covariance(xs, xs)
}

pub fn std_dev(xs: &[f64]) -> Option<f64> {
    variance(xs).map(f64::sqrt)
}

pub fn covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mean_x = mean(x)?;
    let mean_y = mean(y)?;

    let sum: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();

    Some(sum / (x.len() - 1) as f64)
}

/// Pearson correlation; `None` if either side has zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = covariance(x, y)?;
    let std_x = std_dev(x)?;
    let std_y = std_dev(y)?;

    if std_x == 0.0 || std_y == 0.0 {
        return None;
    }

    Some((cov / (std_x * std_y)).clamp(-1.0, 1.0))
}

/// Linear-interpolation percentile of an ascending sample, `pct` in [0, 1].
pub fn percentile(sorted_values: &[f64], pct: f64) -> Option<f64> {
    if sorted_values.is_empty() || !(0.0..=1.0).contains(&pct) {
        return None;
    }

    let n = sorted_values.len();
    let idx = pct * (n - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = (idx.ceil() as usize).min(n - 1);
    let frac = idx - lower as f64;

    let lo = sorted_values[lower];
    let hi = sorted_values[upper];
    Some(lo + (hi - lo) * frac)
}

/// Ascending copy of a sample.
pub fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}
