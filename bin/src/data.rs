//! Input loading for the ronda CLI.

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda::{EvalConfig, ObservationStore};
use std::path::Path;

/// Read a CSV file into a DataFrame, parsing date-looking columns.
pub(crate) fn load_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(df)
}

/// Load and join the signal and returns tables into an observation store.
pub(crate) fn load_store(
    signal_path: &Path,
    returns_path: &Path,
    delimiter: char,
) -> Result<ObservationStore> {
    let signal = load_csv(signal_path)?;
    let returns = load_csv(returns_path)?;
    let store = ObservationStore::from_frames(&signal, &returns, delimiter)
        .context("failed to build observation store")?;
    Ok(store)
}

/// Load the `date, market_return` proxy series for attribution.
pub(crate) fn load_market(path: &Path) -> Result<Vec<(ronda::Date, f64)>> {
    let df = load_csv(path)?;
    let series =
        ronda::core::store::market_series_from_frame(&df).context("failed to parse market series")?;
    Ok(series)
}

/// Assemble an [`EvalConfig`] from the shared CLI options.
pub(crate) fn build_config(
    basket_size: usize,
    horizons: &[ronda::Horizon],
    min_samples: usize,
    rolling_window: usize,
    method: &str,
) -> Result<EvalConfig> {
    let config = EvalConfig {
        basket_size,
        horizons: horizons.to_vec(),
        min_samples,
        rolling_window,
        ranking_metric: method.parse()?,
        ..Default::default()
    };
    config.validate()?;
    Ok(config)
}
