//! Single-factor market attribution for cohort and portfolio returns.

use crate::explode::explode;
use ronda_core::{stats, Date, EvalConfig, Horizon, ObservationStore, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// OLS decomposition of a return series against a market proxy.
#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    /// Cohort label or series name.
    pub label: String,
    /// Regression intercept: mean return unexplained by the market.
    pub alpha: f64,
    /// Market sensitivity.
    pub beta: f64,
    /// Fraction of return variance explained by the market.
    pub r_squared: f64,
    /// Number of matched (return, market) pairs.
    pub n_obs: usize,
}

/// Regress each label cohort's forward returns against the market proxy.
///
/// Cohort records are matched to the market series by date; records on
/// dates with no market observation are dropped. Labels with fewer than
/// `min_samples` matched pairs, or with a degenerate regression, are
/// omitted. Output is sorted by descending alpha.
pub fn attribute_cohorts(
    store: &ObservationStore,
    horizon: Horizon,
    market: &[(Date, f64)],
    config: &EvalConfig,
) -> Result<Vec<Attribution>> {
    config.validate()?;
    let by_date: BTreeMap<Date, f64> = market.iter().copied().collect();

    let mut groups: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in explode(store, horizon) {
        let Some(&mkt) = by_date.get(&record.date) else {
            continue;
        };
        let (ys, xs) = groups.entry(record.label).or_default();
        ys.push(record.fwd_ret);
        xs.push(mkt);
    }

    let mut rows = Vec::new();
    for (label, (ys, xs)) in groups {
        if ys.len() < config.min_samples {
            debug!(%label, n_obs = ys.len(), "cohort below attribution threshold");
            continue;
        }
        let Some(fit) = stats::ols(&ys, &xs) else {
            debug!(%label, "degenerate market regression");
            continue;
        };
        rows.push(Attribution {
            label,
            alpha: fit.alpha,
            beta: fit.beta,
            r_squared: fit.r_squared,
            n_obs: fit.n_obs,
        });
    }

    rows.sort_by(|a, b| {
        b.alpha
            .partial_cmp(&a.alpha)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(rows)
}

/// Regress one dated return series (e.g. a long-short portfolio) against
/// the market proxy. Returns `None` when fewer than `min_samples` dates
/// match or the regression is degenerate.
pub fn attribute_series(
    name: &str,
    series: &[(Date, f64)],
    market: &[(Date, f64)],
    min_samples: usize,
) -> Option<Attribution> {
    let by_date: BTreeMap<Date, f64> = market.iter().copied().collect();

    let mut ys = Vec::new();
    let mut xs = Vec::new();
    for &(date, ret) in series {
        if let Some(&mkt) = by_date.get(&date) {
            ys.push(ret);
            xs.push(mkt);
        }
    }
    if ys.len() < min_samples {
        return None;
    }
    let fit = stats::ols(&ys, &xs)?;
    Some(Attribution {
        label: name.to_string(),
        alpha: fit.alpha,
        beta: fit.beta,
        r_squared: fit.r_squared,
        n_obs: fit.n_obs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_core::Observation;
    use std::collections::HashMap;

    fn obs(date: &str, entity: &str, labels: &[&str], ret1: f64) -> Observation {
        let mut returns = HashMap::new();
        returns.insert(Horizon::D1, ret1);
        Observation {
            date: date.parse().unwrap(),
            entity: entity.to_string(),
            score: 0.5,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            returns,
        }
    }

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn test_config(min_samples: usize) -> EvalConfig {
        EvalConfig {
            min_samples,
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_linear_relationship_recovered() {
        // ret = 0.001 + 1.5 * market, noise-free
        let mut observations = Vec::new();
        let mut market = Vec::new();
        for i in 0..20 {
            let d = format!("2017-01-{:02}", i + 2);
            let mkt = (i as f64 - 10.0) * 0.001;
            observations.push(obs(&d, &format!("E{i}"), &["Earnings"], 0.001 + 1.5 * mkt));
            market.push((date(&d), mkt));
        }
        let store = ObservationStore::new(observations).unwrap();

        let rows = attribute_cohorts(&store, Horizon::D1, &market, &test_config(5)).unwrap();
        assert_eq!(rows.len(), 1);
        let a = &rows[0];
        assert_eq!(a.label, "Earnings");
        assert_eq!(a.n_obs, 20);
        assert_relative_eq!(a.alpha, 0.001, epsilon = 1e-10);
        assert_relative_eq!(a.beta, 1.5, epsilon = 1e-10);
        assert_relative_eq!(a.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_unmatched_dates_dropped() {
        let observations = vec![
            obs("2017-01-02", "A", &["Earnings"], 0.01),
            obs("2017-01-03", "B", &["Earnings"], 0.02),
            obs("2017-01-04", "C", &["Earnings"], 0.03),
        ];
        let store = ObservationStore::new(observations).unwrap();
        // Market covers only two of the three dates
        let market = vec![(date("2017-01-02"), 0.005), (date("2017-01-03"), -0.002)];

        let rows = attribute_cohorts(&store, Horizon::D1, &market, &test_config(2)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].n_obs, 2);
    }

    #[test]
    fn test_small_cohort_omitted() {
        let observations = vec![obs("2017-01-02", "A", &["Rare"], 0.01)];
        let store = ObservationStore::new(observations).unwrap();
        let market = vec![(date("2017-01-02"), 0.005)];

        let rows = attribute_cohorts(&store, Horizon::D1, &market, &test_config(5)).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_constant_market_is_degenerate() {
        let series: Vec<(Date, f64)> = (0..10)
            .map(|i| (date(&format!("2017-01-{:02}", i + 2)), i as f64 * 0.001))
            .collect();
        let market: Vec<(Date, f64)> = series.iter().map(|&(d, _)| (d, 0.004)).collect();

        assert!(attribute_series("ls", &series, &market, 5).is_none());
    }

    #[test]
    fn test_attribute_series_matches_by_date() {
        let series = vec![
            (date("2017-01-02"), 0.01),
            (date("2017-01-03"), 0.02),
            (date("2017-01-04"), 0.03),
        ];
        let market = vec![
            (date("2017-01-02"), 0.001),
            (date("2017-01-03"), 0.002),
            (date("2017-01-04"), 0.003),
        ];

        let a = attribute_series("ls", &series, &market, 3).unwrap();
        assert_eq!(a.label, "ls");
        assert_eq!(a.n_obs, 3);
        assert_relative_eq!(a.beta, 10.0, epsilon = 1e-10);
        assert_relative_eq!(a.alpha, 0.0, epsilon = 1e-10);
    }
}
