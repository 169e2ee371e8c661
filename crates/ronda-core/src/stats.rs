//! Statistical primitives shared across the workspace.
//!
//! All functions filter non-finite inputs before computing and report
//! degenerate results (too few observations, zero variance) as NaN rather
//! than coercing them to zero. Sample statistics use the N−1 denominator.

use crate::config::CorrelationMethod;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Minimum threshold for a variance denominator to be considered non-zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Mean and sample standard deviation of the finite values in `values`.
///
/// Returns `(NaN, NaN)` for an empty input and a NaN std for fewer than two
/// finite observations.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let n = finite.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let mean = finite.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, f64::NAN);
    }

    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, variance.sqrt())
}

/// Mean of the finite values, NaN if there are none.
pub fn mean(values: &[f64]) -> f64 {
    mean_std(values).0
}

/// Compute ranks of values, assigning tied values their average rank.
pub fn compute_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();

    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;

    while i < n {
        let mut j = i;
        while j < n && (indexed[j].1 - indexed[i].1).abs() < f64::EPSILON {
            j += 1;
        }

        // Average rank for ties
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }

        i = j;
    }

    ranks
}

/// Pearson correlation between paired values.
///
/// Pairs with a non-finite member are excluded; NaN if fewer than two pairs
/// remain or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs = finite_pairs(xs, ys);
    if pairs.len() < 2 {
        return f64::NAN;
    }
    pearson_raw(
        &pairs.iter().map(|(x, _)| *x).collect::<Vec<_>>(),
        &pairs.iter().map(|(_, y)| *y).collect::<Vec<_>>(),
    )
}

/// Spearman rank correlation between paired values.
pub fn spearman(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs = finite_pairs(xs, ys);
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let x_ranks = compute_ranks(&pairs.iter().map(|(x, _)| *x).collect::<Vec<_>>());
    let y_ranks = compute_ranks(&pairs.iter().map(|(_, y)| *y).collect::<Vec<_>>());
    pearson_raw(&x_ranks, &y_ranks)
}

/// Correlation between paired values using the configured method.
pub fn correlation(method: CorrelationMethod, xs: &[f64], ys: &[f64]) -> f64 {
    match method {
        CorrelationMethod::Spearman => spearman(xs, ys),
        CorrelationMethod::Pearson => pearson(xs, ys),
    }
}

/// Ordinary-least-squares fit of `y = alpha + beta * x`.
#[derive(Debug, Clone, Copy)]
pub struct OlsFit {
    /// Intercept.
    pub alpha: f64,
    /// Slope.
    pub beta: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Number of pairs used in the fit.
    pub n_obs: usize,
}

/// Fit `y = alpha + beta * x` by OLS over the finite pairs.
///
/// Returns `None` when fewer than two pairs remain or `x` has (near) zero
/// variance, in which case the fit is undefined.
pub fn ols(ys: &[f64], xs: &[f64]) -> Option<OlsFit> {
    let pairs = finite_pairs(xs, ys);
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let cov: f64 = pairs
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / (nf - 1.0);
    let var_x: f64 = pairs.iter().map(|(x, _)| (x - mean_x).powi(2)).sum::<f64>() / (nf - 1.0);

    if var_x < MIN_STD_THRESHOLD {
        return None;
    }

    let beta = cov / var_x;
    let alpha = mean_y - beta * mean_x;

    let ss_res: f64 = pairs
        .iter()
        .map(|(x, y)| (y - (alpha + beta * x)).powi(2))
        .sum();
    let ss_tot: f64 = pairs.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();

    let r_squared = if ss_tot > MIN_STD_THRESHOLD {
        1.0 - ss_res / ss_tot
    } else {
        f64::NAN
    };

    Some(OlsFit {
        alpha,
        beta,
        r_squared,
        n_obs: n,
    })
}

/// One-sample t-test result.
#[derive(Debug, Clone, Copy)]
pub struct TTest {
    /// The t statistic.
    pub t_stat: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// One-sample t-test of the finite values against `popmean`.
///
/// Both fields are NaN when fewer than two finite observations exist or the
/// sample has zero variance.
pub fn t_test_one_sample(values: &[f64], popmean: f64) -> TTest {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return TTest {
            t_stat: f64::NAN,
            p_value: f64::NAN,
        };
    }

    let (sample_mean, sample_std) = mean_std(&finite);
    if !(sample_std > MIN_STD_THRESHOLD) {
        return TTest {
            t_stat: f64::NAN,
            p_value: f64::NAN,
        };
    }

    let t_stat = (sample_mean - popmean) / (sample_std / (n as f64).sqrt());
    let df = (n - 1) as f64;

    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t_stat.abs())),
        Err(_) => f64::NAN,
    };

    TTest { t_stat, p_value }
}

/// Pearson correlation assuming both slices are finite and equal length.
fn pearson_raw(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x: f64 = xs.iter().sum::<f64>() / n;
    let mean_y: f64 = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

fn finite_pairs(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect()
}
