//! Error types for the ronda workspace.
//!
//! Only configuration and schema problems are fatal; sparse-data conditions
//! (missing returns, thin cohorts) are handled locally by the component that
//! encounters them and surface as counts in the run diagnostics.

use thiserror::Error;

/// The main error type for ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Invalid caller-supplied configuration: zero basket size, unknown
    /// horizon, empty input table. Always aborts the run before computation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A required column is missing from an input table.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// An input table has an unusable shape or dtype.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// A specialized Result type for ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;
