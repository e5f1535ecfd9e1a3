//! FILENAME: core/report-engine/src/view.rs
//! Statement View - Renderable output for downstream renderers.
//!
//! One ComputedRow per layout item, in sorted order, plus a metadata
//! envelope. Numeric amounts are kept next to their display strings so a
//! renderer never has to re-format, and an undefined cell is `None` with an
//! empty display string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use ledger_engine::{FilterSpec, PeriodKey, ResolvedFormat};

use crate::definition::RowType;

/// Amount per period; `None` marks an undefined cell.
pub type RowAmounts = BTreeMap<PeriodKey, Option<f64>>;

// ============================================================================
// PROVENANCE
// ============================================================================

/// What produced a row's numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
    Variable { name: String },
    Expression { expression: String },
    Filter { filter: FilterSpec },
    Range { from: u32, to: u32 },
    None,
}

// ============================================================================
// ROW
// ============================================================================

/// Display strings for a row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedValues {
    pub amounts: BTreeMap<PeriodKey, String>,
    pub amount_a: String,
    pub amount_b: String,
    pub variance_amount: String,
    pub variance_percent: String,
}

/// One computed statement line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedRow {
    pub order: u32,
    pub label: String,
    #[serde(rename = "type")]
    pub row_type: RowType,
    pub style: Option<String>,
    pub indent: u8,
    /// `None` for spacers.
    pub format: Option<ResolvedFormat>,
    /// Empty for spacers.
    pub amounts: RowAmounts,
    pub amount_a: Option<f64>,
    pub amount_b: Option<f64>,
    pub variance_amount: Option<f64>,
    pub variance_percent: Option<f64>,
    pub formatted: FormattedValues,
    pub source: Source,
}

impl ComputedRow {
    pub fn amount(&self, period: &PeriodKey) -> Option<f64> {
        self.amounts.get(period).copied().flatten()
    }

    pub fn is_spacer(&self) -> bool {
        self.row_type == RowType::Spacer
    }
}

// ============================================================================
// STATEMENT
// ============================================================================

/// Report identity and render facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementMetadata {
    pub report_id: String,
    pub name: String,
    pub version: String,
    pub statement_type: String,
    pub generated_at: DateTime<Utc>,
    pub render_id: Uuid,
    pub row_count: usize,
    pub variable_count: usize,
    pub movement_count: usize,
    pub periods: Vec<PeriodKey>,
    pub period_a: Option<PeriodKey>,
    pub period_b: Option<PeriodKey>,
}

/// A fully computed statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementView {
    pub rows: Vec<ComputedRow>,
    pub metadata: StatementMetadata,
}

impl StatementView {
    /// The last row with the given order.
    pub fn row(&self, order: u32) -> Option<&ComputedRow> {
        self.rows.iter().rev().find(|row| row.order == order)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
