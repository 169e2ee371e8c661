//! Typed in-memory observation table.
//!
//! The store is the single input surface for every analysis: one row per
//! (date, entity) carrying the signal score, optional category labels, and
//! the forward return per horizon. Rows are validated once at ingestion;
//! malformed rows are counted and logged, never failed per-access.

use crate::error::{Result, RondaError};
use crate::types::{Date, EntityId, Horizon};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tracing::{debug, warn};

/// Offset between days-since-CE (chrono) and days-since-unix-epoch (polars).
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// One (date, entity) row of the aligned signal/returns table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Observation date.
    pub date: Date,
    /// Entity identifier.
    pub entity: EntityId,
    /// Signal score. Always finite; non-finite scores are dropped at ingestion.
    pub score: f64,
    /// Category label tokens, possibly empty. Trimmed and non-empty.
    pub labels: Vec<String>,
    /// Forward return per horizon. Absent key means missing.
    pub returns: HashMap<Horizon, f64>,
}

impl Observation {
    /// The forward return for `horizon`, if present.
    pub fn ret(&self, horizon: Horizon) -> Option<f64> {
        self.returns.get(&horizon).copied()
    }

    /// The direction the signal predicts: positive score means up.
    pub fn predicted_up(&self) -> bool {
        self.score > 0.0
    }
}

/// Counts of rows dropped during ingestion, surfaced for auditability.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IngestDiagnostics {
    /// Rows in the joined input.
    pub rows_in: usize,
    /// Rows kept in the store.
    pub rows_kept: usize,
    /// Rows dropped for a null or unparseable date/entity key.
    pub dropped_missing_key: usize,
    /// Rows dropped for a null or non-finite score.
    pub dropped_bad_score: usize,
    /// Rows dropped for repeating an earlier `(date, entity)` key.
    pub dropped_duplicate_key: usize,
}

/// Immutable table of observations, partitioned by date.
///
/// Dates are sorted ascending; within a date, rows keep their input order
/// (basket ties are broken by this order). Each `(date, entity)` key appears
/// at most once: the first occurrence wins, later ones are dropped and
/// counted in [`IngestDiagnostics`].
#[derive(Debug, Clone)]
pub struct ObservationStore {
    observations: Vec<Observation>,
    // (date, range into `observations`) per distinct date, ascending
    partitions: Vec<(Date, Range<usize>)>,
    diagnostics: IngestDiagnostics,
}

impl ObservationStore {
    /// Build a store from already-validated observations.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Config`] when `observations` is empty — an empty
    /// input table is caller misuse, not data sparsity.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        Self::with_diagnostics(observations, IngestDiagnostics::default())
    }

    fn with_diagnostics(
        mut observations: Vec<Observation>,
        mut diagnostics: IngestDiagnostics,
    ) -> Result<Self> {
        if observations.is_empty() {
            return Err(RondaError::Config(
                "input table contains no usable observations".to_string(),
            ));
        }

        // Stable sort: input order within a date is part of the contract
        observations.sort_by_key(|obs| obs.date);

        // At most one observation per (date, entity); first occurrence wins
        let mut seen: HashSet<(Date, EntityId)> = HashSet::with_capacity(observations.len());
        observations.retain(|obs| {
            if seen.insert((obs.date, obs.entity.clone())) {
                true
            } else {
                diagnostics.dropped_duplicate_key += 1;
                false
            }
        });
        if diagnostics.dropped_duplicate_key > 0 {
            warn!(
                dropped_duplicate_key = diagnostics.dropped_duplicate_key,
                "dropped observations repeating a (date, entity) key"
            );
        }

        let mut partitions: Vec<(Date, Range<usize>)> = Vec::new();
        let mut start = 0;
        for i in 1..=observations.len() {
            if i == observations.len() || observations[i].date != observations[start].date {
                partitions.push((observations[start].date, start..i));
                start = i;
            }
        }

        diagnostics.rows_kept = observations.len();

        Ok(Self {
            observations,
            partitions,
            diagnostics,
        })
    }

    /// Build a store by inner-joining a signal table and a returns table on
    /// `(date, entity_id)`.
    ///
    /// Expected signal columns: `date`, `entity_id`, `score`, and optionally
    /// `label` (a `delimiter`-separated token list). Expected returns columns:
    /// `date`, `entity_id`, and any of `return_1`/`return_2`/`return_3`/
    /// `return_7`. Date columns may be a native date dtype or `YYYY-MM-DD`
    /// strings.
    ///
    /// Rows with a null key or a non-finite score are dropped and counted in
    /// [`IngestDiagnostics`]; missing individual returns stay missing. A
    /// duplicated key in either input fans out through the inner join; only
    /// the first joined row per `(date, entity)` is kept.
    pub fn from_frames(
        signal: &DataFrame,
        returns: &DataFrame,
        delimiter: char,
    ) -> Result<Self> {
        for name in ["date", "entity_id", "score"] {
            if signal.column(name).is_err() {
                return Err(RondaError::MissingColumn(format!("signal.{name}")));
            }
        }
        for name in ["date", "entity_id"] {
            if returns.column(name).is_err() {
                return Err(RondaError::MissingColumn(format!("returns.{name}")));
            }
        }
        if !Horizon::ALL
            .iter()
            .any(|h| returns.column(h.column_name()).is_ok())
        {
            return Err(RondaError::MissingColumn(
                "returns table has no return_* column".to_string(),
            ));
        }

        let joined = signal
            .clone()
            .lazy()
            .join(
                returns.clone().lazy(),
                [col("date"), col("entity_id")],
                [col("date"), col("entity_id")],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;

        let n_rows = joined.height();
        let dates = date_values(&joined, "date")?;
        let entities = string_values(&joined, "entity_id")?;
        let scores = f64_values(&joined, "score")?;
        let labels = if joined.column("label").is_ok() {
            Some(string_values(&joined, "label")?)
        } else {
            None
        };

        let mut horizon_columns: Vec<(Horizon, Vec<Option<f64>>)> = Vec::new();
        for horizon in Horizon::ALL {
            if joined.column(horizon.column_name()).is_ok() {
                horizon_columns.push((horizon, f64_values(&joined, horizon.column_name())?));
            }
        }

        let mut diagnostics = IngestDiagnostics {
            rows_in: n_rows,
            ..Default::default()
        };
        let mut observations = Vec::with_capacity(n_rows);

        for i in 0..n_rows {
            let (Some(date), Some(entity)) = (dates[i], entities[i].as_ref()) else {
                diagnostics.dropped_missing_key += 1;
                continue;
            };
            let score = match scores[i] {
                Some(s) if s.is_finite() => s,
                _ => {
                    diagnostics.dropped_bad_score += 1;
                    continue;
                }
            };

            let row_labels = labels
                .as_ref()
                .and_then(|col| col[i].as_deref())
                .map(|raw| split_labels(raw, delimiter))
                .unwrap_or_default();

            let mut row_returns = HashMap::new();
            for (horizon, column) in &horizon_columns {
                if let Some(r) = column[i] {
                    if r.is_finite() {
                        row_returns.insert(*horizon, r);
                    }
                }
            }

            observations.push(Observation {
                date,
                entity: entity.clone(),
                score,
                labels: row_labels,
                returns: row_returns,
            });
        }

        if diagnostics.dropped_missing_key + diagnostics.dropped_bad_score > 0 {
            warn!(
                rows_in = diagnostics.rows_in,
                dropped_missing_key = diagnostics.dropped_missing_key,
                dropped_bad_score = diagnostics.dropped_bad_score,
                "dropped malformed rows during ingestion"
            );
        }
        debug!(rows = observations.len(), "ingested observation table");

        Self::with_diagnostics(observations, diagnostics)
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the store is empty. Always false for a constructed store.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All observations, sorted by date.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.partitions.iter().map(|(date, _)| *date)
    }

    /// Number of distinct dates.
    pub fn n_dates(&self) -> usize {
        self.partitions.len()
    }

    /// Iterate over per-date cross-sections in ascending date order.
    pub fn by_date(&self) -> impl Iterator<Item = (Date, &[Observation])> {
        self.partitions
            .iter()
            .map(move |(date, range)| (*date, &self.observations[range.clone()]))
    }

    /// The cross-section for one date, if it exists.
    pub fn cross_section(&self, date: Date) -> Option<&[Observation]> {
        self.partitions
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| &self.observations[self.partitions[idx].1.clone()])
    }

    /// Ingestion drop counts.
    pub const fn diagnostics(&self) -> &IngestDiagnostics {
        &self.diagnostics
    }
}

/// Parse a `date, market_return` frame into a date-indexed series.
///
/// Used for the market-proxy input of the attribution engine. Rows with a
/// null key or value are skipped.
pub fn market_series_from_frame(df: &DataFrame) -> Result<Vec<(Date, f64)>> {
    for name in ["date", "market_return"] {
        if df.column(name).is_err() {
            return Err(RondaError::MissingColumn(format!("market.{name}")));
        }
    }

    let dates = date_values(df, "date")?;
    let rets = f64_values(df, "market_return")?;

    let mut series: Vec<(Date, f64)> = dates
        .into_iter()
        .zip(rets)
        .filter_map(|(date, ret)| match (date, ret) {
            (Some(d), Some(r)) if r.is_finite() => Some((d, r)),
            _ => None,
        })
        .collect();
    series.sort_by_key(|(d, _)| *d);

    if series.is_empty() {
        return Err(RondaError::InvalidData(
            "market series contains no usable rows".to_string(),
        ));
    }
    Ok(series)
}

fn split_labels(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>> {
    let series = df.column(name)?.as_materialized_series();
    match series.dtype() {
        DataType::Date => Ok(series
            .date()?
            .into_iter()
            .map(|d: Option<i32>| {
                d.and_then(|d| Date::from_num_days_from_ce_opt(d + CE_TO_UNIX_EPOCH_DAYS))
            })
            .collect()),
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|s| s.and_then(|s| Date::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
            .collect()),
        other => Err(RondaError::InvalidData(format!(
            "column {name} has dtype {other}, expected date or string"
        ))),
    }
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|s| s.map(str::to_string))
        .collect())
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect())
}
