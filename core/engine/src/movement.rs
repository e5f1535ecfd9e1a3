//! FILENAME: core/engine/src/movement.rs
//! PURPOSE: The accounting movement row and the record abstraction filters run against.
//! CONTEXT: Movements are supplied by the data-loading layer, one per posted
//! ledger line. They are read-only inputs; nothing in the engine mutates them.
//! Filters and aggregations only see rows through the `Record` trait so they
//! stay independent of any particular table representation.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;
use crate::period::{Granularity, PeriodKey};

// ============================================================================
// FILTERABLE FIELDS
// ============================================================================

/// The whitelist of movement fields a filter may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Code1,
    Code2,
    Code3,
    Name1,
    Name2,
    Name3,
    StatementType,
    AccountCode,
}

impl FilterField {
    pub const ALL: [FilterField; 8] = [
        FilterField::Code1,
        FilterField::Code2,
        FilterField::Code3,
        FilterField::Name1,
        FilterField::Name2,
        FilterField::Name3,
        FilterField::StatementType,
        FilterField::AccountCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Code1 => "code1",
            FilterField::Code2 => "code2",
            FilterField::Code3 => "code3",
            FilterField::Name1 => "name1",
            FilterField::Name2 => "name2",
            FilterField::Name3 => "name3",
            FilterField::StatementType => "statement_type",
            FilterField::AccountCode => "account_code",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| FilterError::UnknownField(s.to_string()))
    }
}

// ============================================================================
// RECORD ABSTRACTION
// ============================================================================

/// Read access to one tabular row, as needed by filters and aggregation.
pub trait Record {
    /// The string value of a filterable field, `None` when absent.
    fn field(&self, field: FilterField) -> Option<&str>;

    /// The numeric amount; `None` counts as zero when summing.
    fn amount(&self) -> Option<f64>;

    /// The period this row is posted to, at the requested granularity.
    fn period_key(&self, granularity: Granularity) -> PeriodKey;
}

// ============================================================================
// MOVEMENT
// ============================================================================

/// One posted accounting line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Movement {
    #[serde(default)]
    pub code1: String,
    #[serde(default)]
    pub code2: String,
    #[serde(default)]
    pub code3: String,
    #[serde(default)]
    pub name1: String,
    #[serde(default)]
    pub name2: String,
    #[serde(default)]
    pub name3: String,
    #[serde(default)]
    pub account_code: String,
    #[serde(default)]
    pub account_description: String,
    #[serde(default)]
    pub statement_type: String,
    pub year: i32,
    /// Month within the year (1-12).
    #[serde(default = "default_period", deserialize_with = "deserialize_period")]
    pub period: u32,
    #[serde(default)]
    pub amount: Option<f64>,
}

fn default_period() -> u32 {
    1
}

// Month keys are emitted as "YYYY-MM" and must parse back, so only 1-12 is accepted.
fn deserialize_period<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let period = u32::deserialize(deserializer)?;
    if (1..=12).contains(&period) {
        Ok(period)
    } else {
        Err(serde::de::Error::custom(format!(
            "Movement period out of range: {} (expected 1-12)",
            period
        )))
    }
}

impl Movement {
    pub fn new(year: i32, period: u32, amount: f64) -> Self {
        Movement {
            year,
            period,
            amount: Some(amount),
            ..Default::default()
        }
    }

    /// Builder-style setter for any whitelisted field.
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            FilterField::Code1 => self.code1 = value,
            FilterField::Code2 => self.code2 = value,
            FilterField::Code3 => self.code3 = value,
            FilterField::Name1 => self.name1 = value,
            FilterField::Name2 => self.name2 = value,
            FilterField::Name3 => self.name3 = value,
            FilterField::StatementType => self.statement_type = value,
            FilterField::AccountCode => self.account_code = value,
        }
        self
    }
}

impl Record for Movement {
    fn field(&self, field: FilterField) -> Option<&str> {
        let value = match field {
            FilterField::Code1 => &self.code1,
            FilterField::Code2 => &self.code2,
            FilterField::Code3 => &self.code3,
            FilterField::Name1 => &self.name1,
            FilterField::Name2 => &self.name2,
            FilterField::Name3 => &self.name3,
            FilterField::StatementType => &self.statement_type,
            FilterField::AccountCode => &self.account_code,
        };
        if value.is_empty() {
            None
        } else {
            Some(value.as_str())
        }
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn period_key(&self, granularity: Granularity) -> PeriodKey {
        match granularity {
            Granularity::Year => PeriodKey::year(self.year),
            Granularity::Month => PeriodKey::month(self.year, self.period),
        }
    }
}
