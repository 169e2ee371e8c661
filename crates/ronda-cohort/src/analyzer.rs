//! Per-label cohort statistics and significance testing.

use crate::explode::{explode, CohortRecord};
use ronda_core::{stats, Date, EvalConfig, Horizon, ObservationStore, Result};
use ronda_eval::ic::{monthly_ic, rolling_sharpe, stability_mean};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Metrics for one (label, horizon) cohort.
#[derive(Debug, Clone, Serialize)]
pub struct CohortMetrics {
    /// Cohort label.
    pub label: String,
    /// Analyzed horizon.
    pub horizon: Horizon,
    /// Number of exploded records in the cohort.
    pub n_obs: usize,
    /// Mean forward return.
    pub mean_ret: f64,
    /// Sample std of forward returns.
    pub std_ret: f64,
    /// Sharpe-like ratio `mean/std`, unannualized at this layer.
    pub sharpe: f64,
    /// Pooled IC between score and forward return (configured method).
    pub ic: f64,
    /// One-sample t statistic of the mean return against zero.
    pub t_stat: f64,
    /// Two-sided p-value of the t-test.
    pub p_value: f64,
    /// Significance stars derived from the p-value.
    pub stars: String,
    /// Mean of the defined monthly ICs (stability view).
    pub avg_monthly_ic: f64,
    /// Mean forward return per signal-intensity tercile `[low, med, high]`.
    pub tercile_returns: [f64; 3],
}

/// Counts of cohorts excluded from the final output.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CohortDiagnostics {
    /// Distinct labels seen before filtering.
    pub labels_total: usize,
    /// Labels dropped for fewer than `min_samples` records.
    pub dropped_low_samples: usize,
    /// Labels dropped for a NaN among the required statistics.
    pub dropped_nan: usize,
}

/// Kept cohort metrics plus exclusion counts for one analysis pass.
#[derive(Debug, Clone, Serialize)]
pub struct CohortReport {
    /// Metrics per surviving label, sorted by descending Sharpe.
    pub metrics: Vec<CohortMetrics>,
    /// Exclusion counts.
    pub diagnostics: CohortDiagnostics,
}

/// Explodes labels into cohorts and computes per-cohort statistics.
#[derive(Debug)]
pub struct CohortAnalyzer<'a> {
    store: &'a ObservationStore,
    config: EvalConfig,
}

impl<'a> CohortAnalyzer<'a> {
    /// Create an analyzer, validating the configuration up front.
    pub fn new(store: &'a ObservationStore, config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Analyze every label cohort for one horizon.
    ///
    /// Cohorts with fewer than `min_samples` records, or with a NaN among
    /// mean/std/Sharpe/IC, are dropped from the output and counted — never
    /// defaulted to zero.
    pub fn analyze(&self, horizon: Horizon) -> CohortReport {
        let records = explode(self.store, horizon);
        let groups = group_by_label(&records);

        let mut diagnostics = CohortDiagnostics {
            labels_total: groups.len(),
            ..Default::default()
        };
        let mut metrics = Vec::new();

        for (label, cohort) in groups {
            if cohort.len() < self.config.min_samples {
                debug!(label, n_obs = cohort.len(), "cohort below sample threshold");
                diagnostics.dropped_low_samples += 1;
                continue;
            }

            let row = self.cohort_metrics(label, horizon, &cohort);
            let required = [row.mean_ret, row.std_ret, row.sharpe, row.ic];
            if required.iter().any(|v| !v.is_finite()) {
                debug!(label = %row.label, "cohort has undefined required statistics");
                diagnostics.dropped_nan += 1;
                continue;
            }
            metrics.push(row);
        }

        // Sharpe is finite for every kept row
        metrics.sort_by(|a, b| {
            b.sharpe
                .partial_cmp(&a.sharpe)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if diagnostics.dropped_low_samples + diagnostics.dropped_nan > 0 {
            info!(
                labels_total = diagnostics.labels_total,
                dropped_low_samples = diagnostics.dropped_low_samples,
                dropped_nan = diagnostics.dropped_nan,
                %horizon,
                "dropped cohorts from output"
            );
        }

        CohortReport {
            metrics,
            diagnostics,
        }
    }

    /// Rolling mean/std ratio of one label's return series, over a
    /// daily-resampled forward-filled grid of `rolling_window` days.
    ///
    /// Empty when the cohort has fewer records than the window.
    pub fn rolling_sharpe(&self, horizon: Horizon, label: &str) -> Vec<(Date, f64)> {
        let records = explode(self.store, horizon);
        let points: Vec<(Date, f64)> = records
            .iter()
            .filter(|r| r.label == label)
            .map(|r| (r.date, r.fwd_ret))
            .collect();
        if points.len() < self.config.rolling_window {
            return Vec::new();
        }
        rolling_sharpe(&points, self.config.rolling_window)
    }

    fn cohort_metrics(
        &self,
        label: &str,
        horizon: Horizon,
        cohort: &[&CohortRecord],
    ) -> CohortMetrics {
        let rets: Vec<f64> = cohort.iter().map(|r| r.fwd_ret).collect();
        let scores: Vec<f64> = cohort.iter().map(|r| r.score).collect();

        let (mean_ret, std_ret) = stats::mean_std(&rets);
        let sharpe = if std_ret.is_finite() && std_ret > stats::MIN_STD_THRESHOLD {
            mean_ret / std_ret
        } else {
            f64::NAN
        };
        let ic = stats::correlation(self.config.ranking_metric, &scores, &rets);

        let t_test = stats::t_test_one_sample(&rets, 0.0);
        let stars = self.config.thresholds.stars(t_test.p_value).to_string();

        let points: Vec<(Date, f64, f64)> =
            cohort.iter().map(|r| (r.date, r.score, r.fwd_ret)).collect();
        let monthly = monthly_ic(&points, self.config.ranking_metric, self.config.min_samples);
        let avg_monthly_ic = stability_mean(&monthly);

        CohortMetrics {
            label: label.to_string(),
            horizon,
            n_obs: cohort.len(),
            mean_ret,
            std_ret,
            sharpe,
            ic,
            t_stat: t_test.t_stat,
            p_value: t_test.p_value,
            stars,
            avg_monthly_ic,
            tercile_returns: tercile_returns(&scores, &rets),
        }
    }
}

/// Mean forward return per signal-intensity tercile of the cohort's own
/// score distribution. Empty buckets (degenerate score spread) are NaN.
fn tercile_returns(scores: &[f64], rets: &[f64]) -> [f64; 3] {
    let mut sorted: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.is_empty() {
        return [f64::NAN; 3];
    }

    let q1 = quantile(&sorted, 1.0 / 3.0);
    let q2 = quantile(&sorted, 2.0 / 3.0);

    let mut buckets: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (&score, &ret) in scores.iter().zip(rets.iter()) {
        if !score.is_finite() {
            continue;
        }
        let idx = if score <= q1 {
            0
        } else if score <= q2 {
            1
        } else {
            2
        };
        buckets[idx].push(ret);
    }

    [
        stats::mean(&buckets[0]),
        stats::mean(&buckets[1]),
        stats::mean(&buckets[2]),
    ]
}

/// Linear-interpolation quantile of a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

fn group_by_label<'r>(records: &'r [CohortRecord]) -> BTreeMap<&'r str, Vec<&'r CohortRecord>> {
    let mut groups: BTreeMap<&str, Vec<&CohortRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.label.as_str()).or_default().push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_core::Observation;
    use std::collections::HashMap;

    fn obs(date: &str, entity: &str, score: f64, labels: &[&str], ret1: f64) -> Observation {
        let mut returns = HashMap::new();
        returns.insert(Horizon::D1, ret1);
        Observation {
            date: date.parse().unwrap(),
            entity: entity.to_string(),
            score,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            returns,
        }
    }

    fn test_config(min_samples: usize) -> EvalConfig {
        EvalConfig {
            min_samples,
            ..Default::default()
        }
    }

    /// A cohort of `n` observations with a clearly positive mean return.
    fn positive_cohort(label: &str, n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                obs(
                    &format!("2017-01-{:02}", (i % 20) + 2),
                    &format!("E{i}"),
                    0.1 + i as f64 * 0.01,
                    &[label],
                    0.01 + (i % 5) as f64 * 0.002,
                )
            })
            .collect()
    }

    #[test]
    fn test_small_cohort_never_in_output() {
        let mut observations = positive_cohort("Big", 20);
        observations.extend(positive_cohort("Small", 3));
        let store = ObservationStore::new(observations).unwrap();

        let analyzer = CohortAnalyzer::new(&store, test_config(5)).unwrap();
        let report = analyzer.analyze(Horizon::D1);

        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].label, "Big");
        assert_eq!(report.diagnostics.labels_total, 2);
        assert_eq!(report.diagnostics.dropped_low_samples, 1);
    }

    #[test]
    fn test_degenerate_cohort_dropped_as_nan() {
        // Constant returns: zero variance makes sharpe undefined
        let observations: Vec<Observation> = (0..10)
            .map(|i| obs("2017-01-02", &format!("E{i}"), i as f64, &["Flat"], 0.01))
            .collect();
        let store = ObservationStore::new(observations).unwrap();

        let analyzer = CohortAnalyzer::new(&store, test_config(5)).unwrap();
        let report = analyzer.analyze(Horizon::D1);

        assert!(report.metrics.is_empty());
        assert_eq!(report.diagnostics.dropped_nan, 1);
    }

    #[test]
    fn test_cohort_statistics() {
        let store = ObservationStore::new(positive_cohort("Earnings", 30)).unwrap();
        let analyzer = CohortAnalyzer::new(&store, test_config(15)).unwrap();
        let report = analyzer.analyze(Horizon::D1);

        assert_eq!(report.metrics.len(), 1);
        let m = &report.metrics[0];
        assert_eq!(m.n_obs, 30);
        assert!(m.mean_ret > 0.0);
        assert_relative_eq!(m.sharpe, m.mean_ret / m.std_ret, epsilon = 1e-12);
        // Every return is positive, so the mean is strongly significant
        assert!(m.p_value < 0.001);
        assert_eq!(m.stars, "***");
        assert!(m.t_stat > 0.0);
    }

    #[test]
    fn test_output_sorted_by_sharpe_descending() {
        let mut observations = Vec::new();
        // "Weak" has the same std but a smaller mean than "Strong"
        for i in 0..20 {
            let noise = (i % 4) as f64 * 0.001;
            observations.push(obs(
                &format!("2017-01-{:02}", i + 2),
                &format!("S{i}"),
                0.5,
                &["Strong"],
                0.02 + noise,
            ));
            observations.push(obs(
                &format!("2017-01-{:02}", i + 2),
                &format!("W{i}"),
                0.5,
                &["Weak"],
                0.002 + noise,
            ));
        }
        // Give scores some spread so IC is defined
        for (i, o) in observations.iter_mut().enumerate() {
            o.score = (i % 7) as f64 * 0.1;
        }
        let store = ObservationStore::new(observations).unwrap();
        let analyzer = CohortAnalyzer::new(&store, test_config(5)).unwrap();
        let report = analyzer.analyze(Horizon::D1);

        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metrics[0].label, "Strong");
        assert!(report.metrics[0].sharpe > report.metrics[1].sharpe);
    }

    #[test]
    fn test_tercile_returns_dose_response() {
        // Return increases with score: tercile means must be ordered
        let scores: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let rets: Vec<f64> = scores.iter().map(|s| s * 0.001).collect();
        let terciles = tercile_returns(&scores, &rets);
        assert!(terciles[0] < terciles[1]);
        assert!(terciles[1] < terciles[2]);
    }

    #[test]
    fn test_tercile_degenerate_scores() {
        // All scores identical: everything lands in the low bucket
        let scores = vec![1.0; 10];
        let rets: Vec<f64> = (0..10).map(|i| i as f64 * 0.01).collect();
        let terciles = tercile_returns(&scores, &rets);
        assert!(terciles[0].is_finite());
        assert!(terciles[1].is_nan());
        assert!(terciles[2].is_nan());
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = vec![0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(quantile(&sorted, 0.0), 0.0);
        assert_relative_eq!(quantile(&sorted, 1.0), 3.0);
        assert_relative_eq!(quantile(&sorted, 0.5), 1.5);
    }

    #[test]
    fn test_rolling_sharpe_requires_window() {
        let store = ObservationStore::new(positive_cohort("Earnings", 30)).unwrap();
        let config = EvalConfig {
            min_samples: 5,
            rolling_window: 100,
            ..Default::default()
        };
        let analyzer = CohortAnalyzer::new(&store, config).unwrap();
        assert!(analyzer.rolling_sharpe(Horizon::D1, "Earnings").is_empty());
    }
}
