#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

//! # ronda
//!
//! ronda is an umbrella crate that re-exports all ronda sub-crates for
//! convenience. It provides a unified API for ingesting scored observations,
//! backtesting long-short baskets, measuring information coefficients, and
//! analyzing event-label cohorts.
//!
//! ## Crate Organization
//!
//! - [`core`] - Observation store, configuration, statistics primitives
//! - [`eval`] - Basket ranking, portfolio accumulation, IC engines, backtest driver
//! - [`cohort`] - Label-cohort significance analysis and market attribution

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core data model and statistics.
///
/// Re-exports the [`ronda_core`] crate: the [`ObservationStore`], the
/// [`EvalConfig`] shared by all engines, and the scalar statistics
/// (correlations, OLS, one-sample t-test) everything else is built on.
pub mod core {
    pub use ronda_core::*;
}

/// Backtesting and IC evaluation.
///
/// Re-exports the [`ronda_eval`] crate: per-date basket selection, the
/// long-short [`PortfolioAccumulator`], daily/pooled/monthly information
/// coefficients, and the [`Backtest`] driver that ties them together.
pub mod eval {
    pub use ronda_eval::*;
}

/// Label-cohort analysis.
///
/// Re-exports the [`ronda_cohort`] crate: multi-label explosion, the
/// [`CohortAnalyzer`] with per-cohort significance testing, and market
/// attribution via single-factor regression.
pub mod cohort {
    pub use ronda_cohort::*;
}

// Re-export error types
pub use ronda_core::{Result, RondaError};

// Re-export common types
pub use ronda_core::{
    CorrelationMethod, Date, EntityId, EvalConfig, Horizon, MonthKey, Observation,
    ObservationStore, SignificanceThresholds,
};

// Re-export the main engines at top level
pub use ronda_cohort::{attribute_cohorts, attribute_series, Attribution, CohortAnalyzer};
pub use ronda_eval::{Backtest, BacktestReport, PerformanceSummary, PortfolioAccumulator};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use ronda::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Backtest, CohortAnalyzer, EvalConfig, ObservationStore};
    pub use crate::{CorrelationMethod, Date, EntityId, Horizon};
    pub use crate::{Result, RondaError};
}
