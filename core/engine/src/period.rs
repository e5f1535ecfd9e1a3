//! FILENAME: core/engine/src/period.rs
//! PURPOSE: Period keys, period granularity and the comparison-period options.
//! CONTEXT: Every resolved value and every computed row amount is keyed by a
//! PeriodKey. The statement compares two of those periods (A and B) to
//! produce the variance columns.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::movement::Record;

/// Values per period, ordered chronologically.
pub type PeriodValues = BTreeMap<PeriodKey, f64>;

/// How movements are bucketed into periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Year,
    Month,
}

// ============================================================================
// PERIOD KEY
// ============================================================================

/// A year (`2025`) or a month within a year (`2025-03`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Option<u32>,
}

impl PeriodKey {
    pub fn year(year: i32) -> Self {
        PeriodKey { year, month: None }
    }

    pub fn month(year: i32, month: u32) -> Self {
        PeriodKey {
            year,
            month: Some(month),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{:02}", self.year, month),
            None => write!(f, "{}", self.year),
        }
    }
}

impl FromStr for PeriodKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_year = |y: &str| {
            y.trim()
                .parse::<i32>()
                .map_err(|_| format!("Invalid period year: {}", s))
        };

        match s.split_once('-') {
            Some((year, month)) => {
                let month = month
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid period month: {}", s))?;
                if !(1..=12).contains(&month) {
                    return Err(format!("Period month out of range: {}", s));
                }
                Ok(PeriodKey::month(parse_year(year)?, month))
            }
            None => Ok(PeriodKey::year(parse_year(s)?)),
        }
    }
}

// Period keys are map keys in the JSON output, so they travel as strings.
impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// PERIOD OPTIONS
// ============================================================================

/// Which periods a render covers and which two are compared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodOptions {
    pub granularity: Granularity,
    /// The base period of the comparison (column A).
    pub period_a: Option<PeriodKey>,
    /// The compared period (column B).
    pub period_b: Option<PeriodKey>,
    /// Extra periods to report even when no movement falls in them.
    pub include: Vec<PeriodKey>,
}

impl PeriodOptions {
    pub fn yearly() -> Self {
        PeriodOptions::default()
    }

    pub fn monthly() -> Self {
        PeriodOptions {
            granularity: Granularity::Month,
            ..Default::default()
        }
    }

    pub fn comparing(mut self, period_a: PeriodKey, period_b: PeriodKey) -> Self {
        self.period_a = Some(period_a);
        self.period_b = Some(period_b);
        self
    }

    /// Every period present in the unfiltered rows plus the explicitly
    /// included ones, in chronological order.
    pub fn collect_periods<R: Record>(&self, rows: &[R]) -> Vec<PeriodKey> {
        let mut periods: BTreeSet<PeriodKey> = rows
            .iter()
            .map(|row| row.period_key(self.granularity))
            .collect();
        periods.extend(self.include.iter().copied());
        periods.into_iter().collect()
    }

    /// The (A, B) comparison pair. Explicit choices win; otherwise B is the
    /// latest period and A the one before it.
    pub fn comparison_pair(&self, periods: &[PeriodKey]) -> Option<(PeriodKey, PeriodKey)> {
        let latest = periods.last().copied();
        let previous = if periods.len() >= 2 {
            periods.get(periods.len() - 2).copied()
        } else {
            latest
        };

        let b = self.period_b.or(latest)?;
        let a = self.period_a.or(previous).unwrap_or(b);
        Some((a, b))
    }
}
