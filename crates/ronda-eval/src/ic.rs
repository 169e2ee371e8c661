//! Information Coefficient calculations.
//!
//! The headline IC for a horizon is the arithmetic mean of per-date rank
//! correlations between signal score and forward return. The pooled IC
//! (correlation over all observations at once) is reported separately and is
//! what cohort summaries fall back to when their per-date cross-sections are
//! too thin to rank. Monthly and rolling views provide stability series.

use ndarray::Array1;
use ronda_core::stats;
use ronda_core::{CorrelationMethod, Date, Horizon, MonthKey, ObservationStore};

/// Correlation between signal scores and forward returns for one slice.
///
/// Pairs with a non-finite member are excluded; NaN on length mismatch or
/// fewer than two usable pairs.
pub fn calculate_ic(
    signal_scores: &Array1<f64>,
    forward_returns: &Array1<f64>,
    method: CorrelationMethod,
) -> f64 {
    if signal_scores.len() != forward_returns.len() {
        return f64::NAN;
    }
    stats::correlation(
        method,
        signal_scores.as_slice().unwrap_or(&[]),
        forward_returns.as_slice().unwrap_or(&[]),
    )
}

/// Per-date IC series across the store's cross-sections.
///
/// Each date's IC is computed over the entities active that date with a
/// present return for `horizon`; dates with fewer than two such entities
/// yield NaN.
pub fn daily_ic_series(
    store: &ObservationStore,
    horizon: Horizon,
    method: CorrelationMethod,
) -> Vec<(Date, f64)> {
    store
        .by_date()
        .map(|(date, cross_section)| {
            let mut scores = Vec::with_capacity(cross_section.len());
            let mut rets = Vec::with_capacity(cross_section.len());
            for obs in cross_section {
                if let Some(r) = obs.ret(horizon) {
                    scores.push(obs.score);
                    rets.push(r);
                }
            }
            let ic = calculate_ic(&Array1::from_vec(scores), &Array1::from_vec(rets), method);
            (date, ic)
        })
        .collect()
}

/// Headline IC for a horizon: the mean of the finite daily ICs.
///
/// NaN when no date produced a defined IC.
pub fn information_coefficient(
    store: &ObservationStore,
    horizon: Horizon,
    method: CorrelationMethod,
) -> f64 {
    let daily: Vec<f64> = daily_ic_series(store, horizon, method)
        .into_iter()
        .map(|(_, ic)| ic)
        .collect();
    stats::mean(&daily)
}

/// Pooled IC: one correlation over every observation with a present return,
/// ignoring date structure.
pub fn pooled_ic(store: &ObservationStore, horizon: Horizon, method: CorrelationMethod) -> f64 {
    let mut scores = Vec::with_capacity(store.len());
    let mut rets = Vec::with_capacity(store.len());
    for obs in store.observations() {
        if let Some(r) = obs.ret(horizon) {
            scores.push(obs.score);
            rets.push(r);
        }
    }
    stats::correlation(method, &scores, &rets)
}

/// Calendar-month IC series over (date, score, forward return) points.
///
/// A month's IC is defined only when it holds at least `min_samples` points;
/// otherwise it is reported as NaN and excluded from the stability mean.
pub fn monthly_ic(
    points: &[(Date, f64, f64)],
    method: CorrelationMethod,
    min_samples: usize,
) -> Vec<(MonthKey, f64)> {
    use std::collections::BTreeMap;

    let mut buckets: BTreeMap<MonthKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for &(date, score, ret) in points {
        let bucket = buckets.entry(MonthKey::of(date)).or_default();
        bucket.0.push(score);
        bucket.1.push(ret);
    }

    buckets
        .into_iter()
        .map(|(month, (scores, rets))| {
            let ic = if scores.len() >= min_samples {
                stats::correlation(method, &scores, &rets)
            } else {
                f64::NAN
            };
            (month, ic)
        })
        .collect()
}

/// Mean of the finite values of a stability series; NaN when none exist.
pub fn stability_mean(series: &[(MonthKey, f64)]) -> f64 {
    let values: Vec<f64> = series.iter().map(|(_, ic)| *ic).collect();
    stats::mean(&values)
}

/// Rolling mean/std ratio over a daily-resampled, forward-filled series.
///
/// Multiple points on one date are averaged, the series is resampled to the
/// calendar-day grid with forward fill, and the ratio is emitted for every
/// position with a full trailing `window`. The ratio is unannualized.
pub fn rolling_sharpe(points: &[(Date, f64)], window: usize) -> Vec<(Date, f64)> {
    use std::collections::BTreeMap;

    let mut by_date: BTreeMap<Date, (f64, usize)> = BTreeMap::new();
    for &(date, value) in points {
        if value.is_finite() {
            let entry = by_date.entry(date).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    let (Some(first), Some(last)) = (
        by_date.keys().next().copied(),
        by_date.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    // Daily resample with forward fill
    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut current = first;
    let mut filled = f64::NAN;
    loop {
        if let Some(&(sum, n)) = by_date.get(&current) {
            filled = sum / n as f64;
        }
        dates.push(current);
        values.push(filled);
        if current >= last {
            break;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    if values.len() < window || window < 2 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - window + 1);
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        let (mean, std) = stats::mean_std(slice);
        let ratio = if std.is_finite() && std > stats::MIN_STD_THRESHOLD {
            mean / std
        } else {
            f64::NAN
        };
        out.push((dates[end - 1], ratio));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use ronda_core::Observation;
    use std::collections::HashMap;

    fn obs(date: &str, entity: &str, score: f64, ret1: f64) -> Observation {
        let mut returns = HashMap::new();
        returns.insert(Horizon::D1, ret1);
        Observation {
            date: date.parse().unwrap(),
            entity: entity.to_string(),
            score,
            labels: vec![],
            returns,
        }
    }

    #[test]
    fn test_calculate_ic_perfect_correlation() {
        let scores = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let returns = array![0.01, 0.02, 0.03, 0.04, 0.05];
        let ic = calculate_ic(&scores, &returns, CorrelationMethod::Spearman);
        assert_relative_eq!(ic, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_calculate_ic_length_mismatch() {
        let scores = array![1.0, 2.0];
        let returns = array![0.01];
        assert!(calculate_ic(&scores, &returns, CorrelationMethod::Spearman).is_nan());
    }

    #[test]
    fn test_ic_is_one_when_score_equals_return() {
        // score == forward return on every entity of every date
        let mut observations = Vec::new();
        for (d, date) in ["2017-01-02", "2017-01-03", "2017-01-04"].iter().enumerate() {
            for (e, entity) in ["A", "B", "C", "D"].iter().enumerate() {
                let v = (d + 1) as f64 * 0.01 + e as f64 * 0.001;
                observations.push(obs(date, entity, v, v));
            }
        }
        let store = ObservationStore::new(observations).unwrap();

        let ic = information_coefficient(&store, Horizon::D1, CorrelationMethod::Spearman);
        assert_relative_eq!(ic, 1.0, epsilon = 1e-10);

        let pooled = pooled_ic(&store, Horizon::D1, CorrelationMethod::Pearson);
        assert_relative_eq!(pooled, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_daily_series_thin_date_is_nan() {
        let store = ObservationStore::new(vec![
            obs("2017-01-02", "A", 0.5, 0.01),
            obs("2017-01-03", "A", 0.5, 0.01),
            obs("2017-01-03", "B", -0.5, -0.01),
        ])
        .unwrap();

        let series = daily_ic_series(&store, Horizon::D1, CorrelationMethod::Spearman);
        assert_eq!(series.len(), 2);
        assert!(series[0].1.is_nan()); // single entity, undefined
        assert_relative_eq!(series[1].1, 1.0, epsilon = 1e-10);

        // Headline IC averages only the finite days
        let ic = information_coefficient(&store, Horizon::D1, CorrelationMethod::Spearman);
        assert_relative_eq!(ic, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_monthly_ic_respects_min_samples() {
        let mut points = Vec::new();
        // January: 4 points, perfectly correlated
        for i in 0..4 {
            let date: Date = format!("2017-01-{:02}", i + 2).parse().unwrap();
            points.push((date, i as f64, i as f64 * 0.01));
        }
        // February: only 2 points, below threshold
        points.push(("2017-02-01".parse().unwrap(), 1.0, 0.01));
        points.push(("2017-02-02".parse().unwrap(), 2.0, 0.02));

        let series = monthly_ic(&points, CorrelationMethod::Spearman, 3);
        assert_eq!(series.len(), 2);
        assert_relative_eq!(series[0].1, 1.0, epsilon = 1e-10);
        assert!(series[1].1.is_nan());

        // Stability mean excludes the NaN month
        assert_relative_eq!(stability_mean(&series), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rolling_sharpe_forward_fills_gaps() {
        // Values on day 1 and day 4; days 2-3 forward-filled
        let points = vec![
            ("2017-01-02".parse().unwrap(), 0.01),
            ("2017-01-05".parse().unwrap(), 0.03),
        ];
        let out = rolling_sharpe(&points, 2);
        // Grid is 4 days, so 3 full windows
        assert_eq!(out.len(), 3);
        // First window covers two filled 0.01 values: zero variance, NaN
        assert!(out[0].1.is_nan());
        // Last window covers [0.01, 0.03]
        let (mean, std) = stats::mean_std(&[0.01, 0.03]);
        assert_relative_eq!(out[2].1, mean / std, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_sharpe_short_series_empty() {
        let points = vec![("2017-01-02".parse().unwrap(), 0.01)];
        assert!(rolling_sharpe(&points, 5).is_empty());
    }
}
