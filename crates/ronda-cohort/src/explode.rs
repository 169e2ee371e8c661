//! Multi-label explosion into per-label cohort records.

use ronda_core::{Date, Horizon, ObservationStore};
use serde::Serialize;

/// One exploded (date, label) row carrying its source observation's score
/// and forward return. Derived, read-only, owned by one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRecord {
    /// Source observation date.
    pub date: Date,
    /// A single trimmed label token.
    pub label: String,
    /// Source observation score.
    pub score: f64,
    /// Source observation forward return for the analyzed horizon.
    pub fwd_ret: f64,
}

/// Explode each labeled observation into one record per label token.
///
/// An observation with labels `{"A", "B"}` yields two records, each carrying
/// the full score and return. Observations without a present return for
/// `horizon` or with no labels contribute nothing, so the output count equals
/// the sum of label-set sizes over the eligible observations.
pub fn explode(store: &ObservationStore, horizon: Horizon) -> Vec<CohortRecord> {
    let mut records = Vec::new();
    for obs in store.observations() {
        let Some(fwd_ret) = obs.ret(horizon) else {
            continue;
        };
        for label in &obs.labels {
            records.push(CohortRecord {
                date: obs.date,
                label: label.clone(),
                score: obs.score,
                fwd_ret,
            });
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda_core::Observation;
    use std::collections::HashMap;

    fn obs(date: &str, entity: &str, labels: &[&str], ret1: Option<f64>) -> Observation {
        let mut returns = HashMap::new();
        if let Some(r) = ret1 {
            returns.insert(Horizon::D1, r);
        }
        Observation {
            date: date.parse().unwrap(),
            entity: entity.to_string(),
            score: 0.5,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            returns,
        }
    }

    #[test]
    fn test_explosion_is_lossless_in_count() {
        let store = ObservationStore::new(vec![
            obs("2017-01-02", "A", &["Earnings", "Guidance"], Some(0.01)),
            obs("2017-01-02", "B", &["M&A"], Some(0.02)),
            obs("2017-01-03", "C", &[], Some(0.03)),
        ])
        .unwrap();

        let records = explode(&store, Horizon::D1);
        // 2 + 1 + 0 labels
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].label, "Earnings");
        assert_eq!(records[1].label, "Guidance");
        assert!((records[0].fwd_ret - 0.01).abs() < 1e-12);
        // Both records of the multi-label observation carry the full return
        assert_eq!(records[0].fwd_ret, records[1].fwd_ret);
    }

    #[test]
    fn test_missing_return_contributes_nothing() {
        let store = ObservationStore::new(vec![
            obs("2017-01-02", "A", &["Earnings"], None),
            obs("2017-01-02", "B", &["Earnings"], Some(0.02)),
        ])
        .unwrap();

        let records = explode(&store, Horizon::D1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_explode_unlabeled_store_is_empty() {
        let store =
            ObservationStore::new(vec![obs("2017-01-02", "A", &[], Some(0.01))]).unwrap();
        assert!(explode(&store, Horizon::D1).is_empty());
    }
}
