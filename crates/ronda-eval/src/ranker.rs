//! Per-date cross-sectional ranking and basket selection.

use ronda_core::{Date, EntityId, Horizon, Observation};
use serde::Serialize;

/// The long and short baskets selected for one date.
///
/// Produced and consumed within one backtest run; not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DailyBasket {
    /// Basket date.
    pub date: Date,
    /// Top-K entities by score, highest first.
    pub long: Vec<EntityId>,
    /// Bottom-K entities by score, lowest first.
    pub short: Vec<EntityId>,
}

impl DailyBasket {
    /// True when no entities were selectable on this date.
    pub fn is_empty(&self) -> bool {
        self.long.is_empty() && self.short.is_empty()
    }

    /// All selected entities (long ∪ short).
    pub fn members(&self) -> impl Iterator<Item = &EntityId> {
        self.long.iter().chain(self.short.iter())
    }
}

/// Select the long/short baskets for one date's cross-section.
///
/// Eligible observations have a finite score and a present return for
/// `horizon`. Entities are ordered by score descending with ties broken by
/// stable input order; the long basket is the top `K` of that ordering and
/// the short basket the bottom `K`, so the two never overlap. `K` is capped
/// at `floor(n/2)` when the cross-section is thinner than `2K`; an empty
/// cross-section yields empty baskets and the caller skips the date.
pub fn select_baskets(
    date: Date,
    cross_section: &[Observation],
    horizon: Horizon,
    k: usize,
) -> DailyBasket {
    let mut eligible: Vec<&Observation> = cross_section
        .iter()
        .filter(|obs| obs.score.is_finite() && obs.ret(horizon).is_some())
        .collect();

    // Stable: equal scores keep input order
    eligible.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let effective_k = k.min(eligible.len() / 2);

    let long = eligible
        .iter()
        .take(effective_k)
        .map(|obs| obs.entity.clone())
        .collect();
    let short = eligible
        .iter()
        .rev()
        .take(effective_k)
        .map(|obs| obs.entity.clone())
        .collect();

    DailyBasket { date, long, short }
}

/// Mean forward return of the named entities on this cross-section.
///
/// NaN when `entities` is empty.
pub fn basket_return(
    cross_section: &[Observation],
    entities: &[EntityId],
    horizon: Horizon,
) -> f64 {
    let rets: Vec<f64> = cross_section
        .iter()
        .filter(|obs| entities.contains(&obs.entity))
        .filter_map(|obs| obs.ret(horizon))
        .collect();

    if rets.is_empty() {
        f64::NAN
    } else {
        rets.iter().sum::<f64>() / rets.len() as f64
    }
}

/// Cross-sectional score dispersion (sample std over all finite scores).
///
/// Signal-only: uses every finite score regardless of return availability.
pub fn score_dispersion(cross_section: &[Observation]) -> f64 {
    let scores: Vec<f64> = cross_section.iter().map(|obs| obs.score).collect();
    ronda_core::stats::mean_std(&scores).1
}
