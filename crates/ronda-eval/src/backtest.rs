//! Batch backtest driver.
//!
//! Walks the store date by date, forms baskets, folds realized returns into
//! the [`PortfolioAccumulator`], and emits one [`PerformanceSummary`] per
//! (basket size × horizon) configuration. Per-date failures (no tradable
//! basket) are recovered by exclusion and counted; only configuration errors
//! abort the run.

use crate::ic;
use crate::portfolio::{DailyPnl, MonthlyPerf, PerformanceSummary, PortfolioAccumulator};
use crate::ranker::{basket_return, select_baskets};
use ronda_core::{Date, EvalConfig, Horizon, ObservationStore, Result, RondaError};
use serde::Serialize;
use tracing::debug;

/// Counts of units excluded during one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunDiagnostics {
    /// Dates with no tradable basket, excluded from all statistics.
    pub dates_skipped: usize,
    /// Dates that entered the accumulator.
    pub dates_traded: usize,
}

impl RunDiagnostics {
    fn merge(&mut self, other: Self) {
        self.dates_skipped += other.dates_skipped;
        self.dates_traded += other.dates_traded;
    }
}

/// Summaries plus drop diagnostics for one backtest invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    /// One row per (basket size × horizon).
    pub summaries: Vec<PerformanceSummary>,
    /// Aggregate exclusion counts across all configurations.
    pub diagnostics: RunDiagnostics,
}

/// Long-short backtest over an observation store.
#[derive(Debug)]
pub struct Backtest<'a> {
    store: &'a ObservationStore,
    config: EvalConfig,
}

impl<'a> Backtest<'a> {
    /// Create a backtest, validating the configuration up front.
    pub fn new(store: &'a ObservationStore, config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Run the configured basket size across every configured horizon.
    pub fn run(&self) -> BacktestReport {
        self.run_sizes(&[self.config.basket_size])
    }

    /// Run a grid of basket sizes across every configured horizon
    /// (top-N sensitivity comparison).
    pub fn run_grid(&self, basket_sizes: &[usize]) -> Result<BacktestReport> {
        if basket_sizes.is_empty() || basket_sizes.iter().any(|&k| k == 0) {
            return Err(RondaError::Config(
                "basket size grid must be non-empty and positive".to_string(),
            ));
        }
        Ok(self.run_sizes(basket_sizes))
    }

    fn run_sizes(&self, basket_sizes: &[usize]) -> BacktestReport {
        let mut summaries = Vec::with_capacity(basket_sizes.len() * self.config.horizons.len());
        let mut diagnostics = RunDiagnostics::default();

        for &k in basket_sizes {
            for &horizon in &self.config.horizons {
                let (summary, run_diag) = self.run_one(horizon, k);
                diagnostics.merge(run_diag);
                summaries.push(summary);
            }
        }

        BacktestReport {
            summaries,
            diagnostics,
        }
    }

    /// Run one (horizon, basket size) configuration.
    pub fn run_one(&self, horizon: Horizon, k: usize) -> (PerformanceSummary, RunDiagnostics) {
        let (acc, skipped) = self.accumulate(horizon, k);

        let ic = ic::information_coefficient(self.store, horizon, self.config.ranking_metric);
        let win_rate = self.win_rate(horizon);

        let diagnostics = RunDiagnostics {
            dates_skipped: skipped,
            dates_traded: acc.len(),
        };
        (acc.summarize(horizon, k, ic, win_rate), diagnostics)
    }

    /// Monthly LS performance for one (horizon, basket size) configuration.
    pub fn monthly_performance(&self, horizon: Horizon, k: usize) -> Vec<MonthlyPerf> {
        self.accumulate(horizon, k).0.monthly_performance()
    }

    /// Dated long-short return series for one (horizon, basket size)
    /// configuration, for downstream regression or plotting.
    pub fn ls_series(&self, horizon: Horizon, k: usize) -> Vec<(Date, f64)> {
        self.accumulate(horizon, k)
            .0
            .days()
            .iter()
            .map(|pnl| (pnl.date, pnl.ls()))
            .collect()
    }

    /// Walk the store once, folding tradable dates into an accumulator.
    /// Returns the accumulator and the number of skipped dates.
    fn accumulate(&self, horizon: Horizon, k: usize) -> (PortfolioAccumulator, usize) {
        let mut acc = PortfolioAccumulator::new();
        let mut skipped = 0usize;

        for (date, cross_section) in self.store.by_date() {
            let basket = select_baskets(date, cross_section, horizon, k);
            if basket.is_empty() {
                debug!(%date, %horizon, "no tradable basket, skipping date");
                skipped += 1;
                continue;
            }

            let long_ret = basket_return(cross_section, &basket.long, horizon);
            let short_ret = basket_return(cross_section, &basket.short, horizon);
            if !long_ret.is_finite() || !short_ret.is_finite() {
                debug!(%date, %horizon, "basket return undefined, skipping date");
                skipped += 1;
                continue;
            }

            acc.push(DailyPnl {
                date,
                long_ret,
                short_ret,
                members: basket.members().cloned().collect(),
            });
        }
        (acc, skipped)
    }

    /// Directional hit rate for a horizon: per date, the fraction of
    /// observations where `score > 0` matches `return > 0`, averaged over
    /// dates with at least one observation carrying that horizon's return.
    pub fn win_rate(&self, horizon: Horizon) -> f64 {
        let mut daily_rates = Vec::new();
        for (_, cross_section) in self.store.by_date() {
            let mut hits = 0usize;
            let mut total = 0usize;
            for obs in cross_section {
                if let Some(r) = obs.ret(horizon) {
                    total += 1;
                    if obs.predicted_up() == (r > 0.0) {
                        hits += 1;
                    }
                }
            }
            if total > 0 {
                daily_rates.push(hits as f64 / total as f64);
            }
        }
        ronda_core::stats::mean(&daily_rates)
    }

    /// Per-date signal coverage: cross-section size and score dispersion.
    ///
    /// Dispersion is signal-only and independent of return availability.
    pub fn signal_coverage(&self) -> Vec<(Date, usize, f64)> {
        self.store
            .by_date()
            .map(|(date, cross_section)| {
                (
                    date,
                    cross_section.len(),
                    crate::ranker::score_dispersion(cross_section),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
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

    /// 3 dates x 4 entities with fixed extreme scores, K=1.
    fn scenario_store() -> ObservationStore {
        let mut observations = Vec::new();
        for date in ["2017-01-02", "2017-01-03", "2017-01-04"] {
            observations.push(obs(date, "A", 0.9, 0.02));
            observations.push(obs(date, "B", 0.5, 0.005));
            observations.push(obs(date, "C", -0.5, -0.003));
            observations.push(obs(date, "D", -0.9, -0.01));
        }
        ObservationStore::new(observations).unwrap()
    }

    fn scenario_config() -> EvalConfig {
        EvalConfig {
            basket_size: 1,
            horizons: vec![Horizon::D1],
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let store = scenario_store();
        let backtest = Backtest::new(&store, scenario_config()).unwrap();
        let report = backtest.run();

        assert_eq!(report.summaries.len(), 1);
        let summary = &report.summaries[0];

        // Long always A (+0.02), short always D (-0.01): LS = 0.03 per date
        assert_eq!(summary.n_days, 3);
        assert_relative_eq!(summary.mean_return, 0.03, epsilon = 1e-12);
        assert_relative_eq!(
            summary.cumulative_return,
            1.03_f64.powi(3) - 1.0,
            epsilon = 1e-12
        );
        // Identical membership every date: turnover == basket size * 2 sides
        assert_relative_eq!(summary.avg_turnover, 2.0);
        // Constant LS series: zero variance, Sharpe undefined
        assert!(summary.sharpe.is_nan());
        // Score ordering matches return ordering exactly
        assert_relative_eq!(summary.ic, 1.0, epsilon = 1e-10);
        // All four entities predicted correctly every date
        assert_relative_eq!(summary.win_rate, 1.0);
        assert_eq!(report.diagnostics.dates_skipped, 0);
        assert_eq!(report.diagnostics.dates_traded, 3);
    }

    #[test]
    fn test_dates_without_returns_are_skipped() {
        let mut observations = vec![
            obs("2017-01-02", "A", 0.9, 0.02),
            obs("2017-01-02", "B", -0.9, -0.01),
        ];
        // 2017-01-03 has scores but no returns for the horizon
        for entity in ["A", "B"] {
            observations.push(Observation {
                date: "2017-01-03".parse().unwrap(),
                entity: entity.to_string(),
                score: 0.5,
                labels: vec![],
                returns: HashMap::new(),
            });
        }
        let store = ObservationStore::new(observations).unwrap();
        let backtest = Backtest::new(&store, scenario_config()).unwrap();
        let (summary, diagnostics) = backtest.run_one(Horizon::D1, 1);

        assert_eq!(summary.n_days, 1);
        assert_eq!(diagnostics.dates_skipped, 1);
        assert_relative_eq!(summary.mean_return, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_config_rejected_before_computation() {
        let store = scenario_store();
        let config = EvalConfig {
            basket_size: 0,
            ..Default::default()
        };
        assert!(Backtest::new(&store, config).is_err());
    }

    #[test]
    fn test_run_grid_sweeps_basket_sizes() {
        let store = scenario_store();
        let backtest = Backtest::new(&store, scenario_config()).unwrap();
        let report = backtest.run_grid(&[1, 2]).unwrap();
        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.summaries[0].basket_size, 1);
        assert_eq!(report.summaries[1].basket_size, 2);
        // K=2 long is {A,B}, short is {C,D}
        let k2 = &report.summaries[1];
        assert_relative_eq!(
            k2.mean_return,
            (0.02 + 0.005) / 2.0 - (-0.003 - 0.01) / 2.0,
            epsilon = 1e-12
        );

        assert!(backtest.run_grid(&[]).is_err());
        assert!(backtest.run_grid(&[0]).is_err());
    }

    #[test]
    fn test_monthly_performance() {
        let store = scenario_store();
        let backtest = Backtest::new(&store, scenario_config()).unwrap();
        let monthly = backtest.monthly_performance(Horizon::D1, 1);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].count, 3);
        assert_relative_eq!(monthly[0].mean, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_win_rate_counts_direction() {
        let store = ObservationStore::new(vec![
            obs("2017-01-02", "A", 0.9, 0.02),   // up predicted, up realized
            obs("2017-01-02", "B", 0.5, -0.01),  // up predicted, down realized
            obs("2017-01-02", "C", -0.5, -0.01), // down predicted, down realized
            obs("2017-01-02", "D", -0.9, 0.01),  // down predicted, up realized
        ])
        .unwrap();
        let backtest = Backtest::new(&store, scenario_config()).unwrap();
        assert_relative_eq!(backtest.win_rate(Horizon::D1), 0.5);
    }

    #[test]
    fn test_signal_coverage() {
        let store = scenario_store();
        let backtest = Backtest::new(&store, scenario_config()).unwrap();
        let coverage = backtest.signal_coverage();
        assert_eq!(coverage.len(), 3);
        assert_eq!(coverage[0].1, 4);
        assert!(coverage[0].2 > 0.0);
    }
}
