//! Common types used throughout the ronda workspace.

use crate::error::{Result, RondaError};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// An entity identifier (typically a ticker symbol like "AAPL").
pub type EntityId = String;

/// A forward-return horizon.
///
/// Horizons are fixed and known in advance; each maps to one column of the
/// returns table (`return_1` .. `return_7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    /// One period ahead.
    D1,
    /// Two periods ahead.
    D2,
    /// Three periods ahead.
    D3,
    /// Seven periods ahead.
    D7,
}

impl Horizon {
    /// All supported horizons, in ascending order.
    pub const ALL: [Self; 4] = [Self::D1, Self::D2, Self::D3, Self::D7];

    /// The number of periods this horizon looks ahead.
    pub const fn days(self) -> u32 {
        match self {
            Self::D1 => 1,
            Self::D2 => 2,
            Self::D3 => 3,
            Self::D7 => 7,
        }
    }

    /// The returns-table column holding this horizon's forward return.
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::D1 => "return_1",
            Self::D2 => "return_2",
            Self::D3 => "return_3",
            Self::D7 => "return_7",
        }
    }

    /// Look up a horizon by its period count.
    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.days() == days)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

impl FromStr for Horizon {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_end_matches(['d', 'D']);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::from_days)
            .ok_or_else(|| RondaError::Config(format!("unknown horizon: {s}")))
    }
}

/// A calendar-month bucket, used for monthly stability views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1..=12).
    pub month: u32,
}

impl MonthKey {
    /// The month bucket containing `date`.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_days_and_columns() {
        assert_eq!(Horizon::D1.days(), 1);
        assert_eq!(Horizon::D7.days(), 7);
        assert_eq!(Horizon::D2.column_name(), "return_2");
        assert_eq!(Horizon::ALL.len(), 4);
    }

    #[test]
    fn test_horizon_from_str() {
        assert_eq!("1".parse::<Horizon>().unwrap(), Horizon::D1);
        assert_eq!("3d".parse::<Horizon>().unwrap(), Horizon::D3);
        assert_eq!("7D".parse::<Horizon>().unwrap(), Horizon::D7);
        assert!("5".parse::<Horizon>().is_err());
        assert!("abc".parse::<Horizon>().is_err());
    }

    #[test]
    fn test_month_key() {
        let date = Date::from_ymd_opt(2017, 3, 15).unwrap();
        let key = MonthKey::of(date);
        assert_eq!(key.year, 2017);
        assert_eq!(key.month, 3);
        assert_eq!(key.to_string(), "2017-03");
    }

    #[test]
    fn test_month_key_ordering() {
        let a = MonthKey { year: 2017, month: 12 };
        let b = MonthKey { year: 2018, month: 1 };
        assert!(a < b);
    }
}
