#![forbid(unsafe_code)]

//! Core types for the ronda signal evaluation toolkit.
//!
//! This crate provides the shared foundation for the ronda workspace:
//!
//! - [`ObservationStore`] — a typed, date-partitioned table of
//!   (date, entity, score, labels, forward returns) rows, validated once at
//!   ingestion
//! - [`EvalConfig`] — the configuration surface shared by every analysis
//! - [`RondaError`] — the workspace error taxonomy
//! - [`stats`] — the numeric primitives (ranks, correlations, OLS, t-test)
//!   that the evaluation and cohort crates build on

/// The version of the ronda-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod stats;
pub mod store;
pub mod types;

pub use config::{CorrelationMethod, EvalConfig, SignificanceThresholds};
pub use error::{Result, RondaError};
pub use store::{IngestDiagnostics, Observation, ObservationStore};
pub use types::{Date, EntityId, Horizon, MonthKey};
