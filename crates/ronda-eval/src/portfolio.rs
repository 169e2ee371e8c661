//! Long-short return accumulation and derived risk metrics.
//!
//! The accumulator consumes one [`DailyPnl`] per tradable date, in date
//! order, and derives the compounded curve, Sharpe ratio, max drawdown, and
//! turnover. Dates with no tradable basket are simply never pushed; they are
//! excluded from every aggregate, not imputed as zero.

use ronda_core::stats;
use ronda_core::{Date, EntityId, Horizon, MonthKey};
use serde::Serialize;
use std::collections::BTreeSet;

/// Trading days per year used for Sharpe annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One date's realized long/short basket returns.
#[derive(Debug, Clone, Serialize)]
pub struct DailyPnl {
    /// Basket date.
    pub date: Date,
    /// Mean forward return of the long basket.
    pub long_ret: f64,
    /// Mean forward return of the short basket.
    pub short_ret: f64,
    /// Entities held that date (long ∪ short), for turnover.
    pub members: BTreeSet<EntityId>,
}

impl DailyPnl {
    /// The long-short return for this date.
    pub fn ls(&self) -> f64 {
        self.long_ret - self.short_ret
    }
}

/// Aggregate performance of one (basket size × horizon) configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    /// Forward-return horizon.
    pub horizon: Horizon,
    /// Configured basket size K.
    pub basket_size: usize,
    /// Number of tradable dates that entered the statistics.
    pub n_days: usize,
    /// Mean daily long-short return.
    pub mean_return: f64,
    /// Sample std of the daily long-short return.
    pub std_return: f64,
    /// Annualized Sharpe ratio (`mean/std × √252`), NaN when undefined.
    pub sharpe: f64,
    /// Headline information coefficient (mean of daily ICs).
    pub ic: f64,
    /// Directional hit rate.
    pub win_rate: f64,
    /// Average entity-count turnover between consecutive dates.
    pub avg_turnover: f64,
    /// Maximum drawdown of the compounded curve, always ≤ 0.
    pub max_drawdown: f64,
    /// Final compounded return minus one.
    pub cumulative_return: f64,
}

/// Per-calendar-month performance row.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPerf {
    /// Calendar month.
    pub month: MonthKey,
    /// Mean daily LS return within the month.
    pub mean: f64,
    /// Sample std of the daily LS return within the month.
    pub std: f64,
    /// Number of tradable dates in the month.
    pub count: usize,
    /// Annualized Sharpe for the month, NaN when undefined.
    pub sharpe: f64,
}

/// Accumulates per-date long/short returns into series and risk metrics.
#[derive(Debug, Clone, Default)]
pub struct PortfolioAccumulator {
    pnl: Vec<DailyPnl>,
}

impl PortfolioAccumulator {
    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self { pnl: Vec::new() }
    }

    /// Append one date's realized basket returns. Must be called in date
    /// order; the compounding fold below depends on it.
    pub fn push(&mut self, pnl: DailyPnl) {
        debug_assert!(
            self.pnl.last().map(|prev| prev.date < pnl.date).unwrap_or(true),
            "daily pnl must be pushed in ascending date order"
        );
        self.pnl.push(pnl);
    }

    /// Number of accumulated dates.
    pub fn len(&self) -> usize {
        self.pnl.len()
    }

    /// True when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.pnl.is_empty()
    }

    /// The accumulated per-date pnl rows.
    pub fn days(&self) -> &[DailyPnl] {
        &self.pnl
    }

    /// Daily long-short return series, in date order.
    pub fn ls_series(&self) -> Vec<f64> {
        self.pnl.iter().map(DailyPnl::ls).collect()
    }

    /// Compounded cumulative-return curve.
    ///
    /// The curve starts at `C_0 = 1` and has one further point per date:
    /// `C_t = C_{t-1} × (1 + LS_t)`. An all-zero return series therefore
    /// yields a constant curve of ones.
    pub fn cumulative_curve(&self) -> Vec<f64> {
        let mut curve = Vec::with_capacity(self.pnl.len() + 1);
        let mut value = 1.0;
        curve.push(value);
        for pnl in &self.pnl {
            value *= 1.0 + pnl.ls();
            curve.push(value);
        }
        curve
    }

    /// Final compounded return minus one.
    pub fn cumulative_return(&self) -> f64 {
        self.cumulative_curve().last().copied().unwrap_or(1.0) - 1.0
    }

    /// Annualized Sharpe ratio of the LS series.
    ///
    /// NaN (never zero) with fewer than two observations or zero variance.
    pub fn sharpe(&self) -> f64 {
        annualized_sharpe(&self.ls_series())
    }

    /// Maximum drawdown of the compounded curve relative to its running
    /// peak. Non-positive by construction; exactly zero for a monotonically
    /// increasing curve.
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = f64::MIN;
        let mut max_dd = 0.0;
        for value in self.cumulative_curve() {
            if value > peak {
                peak = value;
            }
            let dd = value / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
        max_dd
    }

    /// Per-date turnover: the size of the union of today's and the prior
    /// date's held entities. Defined from the second date onward.
    pub fn turnover_series(&self) -> Vec<usize> {
        self.pnl
            .windows(2)
            .map(|w| w[0].members.union(&w[1].members).count())
            .collect()
    }

    /// Arithmetic mean of the turnover series; NaN when no date has a
    /// defined predecessor.
    pub fn avg_turnover(&self) -> f64 {
        let series = self.turnover_series();
        if series.is_empty() {
            f64::NAN
        } else {
            series.iter().sum::<usize>() as f64 / series.len() as f64
        }
    }

    /// Per-calendar-month mean/std/count/Sharpe of the LS series.
    pub fn monthly_performance(&self) -> Vec<MonthlyPerf> {
        let mut months: Vec<(MonthKey, Vec<f64>)> = Vec::new();
        for pnl in &self.pnl {
            let key = MonthKey::of(pnl.date);
            match months.last_mut() {
                Some((last, values)) if *last == key => values.push(pnl.ls()),
                _ => months.push((key, vec![pnl.ls()])),
            }
        }

        months
            .into_iter()
            .map(|(month, values)| {
                let (mean, std) = stats::mean_std(&values);
                MonthlyPerf {
                    month,
                    mean,
                    std,
                    count: values.len(),
                    sharpe: annualized_sharpe(&values),
                }
            })
            .collect()
    }

    /// Assemble the summary row, attaching the externally computed IC and
    /// win rate.
    pub fn summarize(
        &self,
        horizon: Horizon,
        basket_size: usize,
        ic: f64,
        win_rate: f64,
    ) -> PerformanceSummary {
        let ls = self.ls_series();
        let (mean_return, std_return) = stats::mean_std(&ls);

        PerformanceSummary {
            horizon,
            basket_size,
            n_days: self.pnl.len(),
            mean_return,
            std_return,
            sharpe: self.sharpe(),
            ic,
            win_rate,
            avg_turnover: self.avg_turnover(),
            max_drawdown: self.max_drawdown(),
            cumulative_return: self.cumulative_return(),
        }
    }
}

/// `mean/std × √252`; NaN with fewer than two observations or zero variance.
pub fn annualized_sharpe(returns: &[f64]) -> f64 {
    let (mean, std) = stats::mean_std(returns);
    if !std.is_finite() || std < stats::MIN_STD_THRESHOLD {
        f64::NAN
    } else {
        mean / std * TRADING_DAYS_PER_YEAR.sqrt()
    }
}
