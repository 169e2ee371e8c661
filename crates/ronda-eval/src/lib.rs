#![forbid(unsafe_code)]

//! Long-short backtesting and signal evaluation for ronda.
//!
//! This crate turns a per-observation predictive score into strategy
//! diagnostics:
//! - per-date top-K/bottom-K basket construction ([`ranker`])
//! - daily long-short return accumulation with Sharpe, drawdown, and
//!   turnover ([`portfolio`])
//! - daily/pooled/monthly/rolling information coefficients ([`ic`])
//! - a batch driver that produces one [`PerformanceSummary`] per
//!   (basket size × horizon) configuration ([`backtest`])
//!
//! # Example
//!
//! ```rust,ignore
//! use ronda_core::{EvalConfig, ObservationStore};
//! use ronda_eval::Backtest;
//!
//! let store = ObservationStore::from_frames(&signal_df, &returns_df, ',')?;
//! let backtest = Backtest::new(&store, EvalConfig::default())?;
//! for summary in backtest.run().summaries {
//!     println!("{} sharpe={:.2}", summary.horizon, summary.sharpe);
//! }
//! ```

pub mod backtest;
pub mod ic;
pub mod portfolio;
pub mod ranker;

// Re-export main types
pub use backtest::{Backtest, BacktestReport, RunDiagnostics};
pub use ic::{calculate_ic, daily_ic_series, information_coefficient, monthly_ic, pooled_ic};
pub use portfolio::{DailyPnl, MonthlyPerf, PerformanceSummary, PortfolioAccumulator};
pub use ranker::{select_baskets, DailyBasket};
