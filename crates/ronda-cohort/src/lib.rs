#![forbid(unsafe_code)]

//! Label-cohort analysis for ronda.
//!
//! Observations carry zero or more categorical event labels. This crate
//! explodes multi-label observations into per-label cohorts, computes
//! per-cohort return statistics with one-sample significance testing, and
//! attributes cohort or portfolio returns to a market proxy via
//! single-factor regression.

pub mod analyzer;
pub mod attribution;
pub mod explode;

// Re-export main types
pub use analyzer::{CohortAnalyzer, CohortDiagnostics, CohortMetrics, CohortReport};
pub use attribution::{attribute_cohorts, attribute_series, Attribution};
pub use explode::{explode, CohortRecord};
