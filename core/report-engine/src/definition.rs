//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a financial statement.
//! These structures are designed to be:
//! - Deserialized from the report JSON produced upstream
//! - Already structurally validated by the caller
//! - Immutable snapshots of the report author's intent
//!
//! A layout item is a closed tagged union on its `type` field, so every row
//! kind carries exactly the fields it needs and the row processor handles
//! each kind in one exhaustive match.

use serde::{Deserialize, Serialize};
use std::fmt;

use ledger_engine::{FilterSpec, FormatKind, FormatSpec, FormattingDefaults, VariableDefinitions};

use crate::error::ReportError;

// ============================================================================
// REPORT
// ============================================================================

/// A complete report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub report_id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub statement_type: String,
    #[serde(default)]
    pub variables: VariableDefinitions,
    #[serde(default)]
    pub layout: Vec<LayoutItem>,
    #[serde(default)]
    pub formatting: FormattingDefaults,
}

impl ReportDefinition {
    pub fn new(report_id: impl Into<String>, name: impl Into<String>) -> Self {
        ReportDefinition {
            report_id: report_id.into(),
            name: name.into(),
            version: String::new(),
            statement_type: String::new(),
            variables: VariableDefinitions::new(),
            layout: Vec::new(),
            formatting: FormattingDefaults::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        serde_json::from_str(json).map_err(ReportError::Definition)
    }

    /// Layout items sorted by order. Equal orders keep their input order.
    pub fn sorted_layout(&self) -> Vec<&LayoutItem> {
        let mut items: Vec<&LayoutItem> = self.layout.iter().collect();
        items.sort_by_key(|item| item.order);
        items
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

/// One line of the statement layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Sort key and `@order` identity.
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: LayoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<RowFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub indent: u8,
}

impl LayoutItem {
    pub fn new(order: u32, kind: LayoutKind) -> Self {
        LayoutItem {
            order,
            label: None,
            kind,
            format: None,
            style: None,
            indent: 0,
        }
    }

    pub fn variable(order: u32, name: impl Into<String>) -> Self {
        LayoutItem::new(order, LayoutKind::Variable { variable: name.into() })
    }

    pub fn calculated(order: u32, expression: impl Into<String>) -> Self {
        LayoutItem::new(
            order,
            LayoutKind::Calculated {
                expression: expression.into(),
            },
        )
    }

    pub fn category(order: u32, filter: FilterSpec) -> Self {
        LayoutItem::new(order, LayoutKind::Category { filter })
    }

    pub fn subtotal(order: u32, from: u32, to: u32) -> Self {
        LayoutItem::new(order, LayoutKind::Subtotal { from, to })
    }

    pub fn spacer(order: u32) -> Self {
        LayoutItem::new(order, LayoutKind::Spacer)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_format(mut self, format: RowFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn row_type(&self) -> RowType {
        self.kind.row_type()
    }
}

/// The type-specific part of a layout item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutKind {
    /// Shows a resolved variable.
    Variable { variable: String },
    /// Evaluates an expression over variables and earlier rows.
    Calculated { expression: String },
    /// Sums raw movements matching its own filter; no filter matches every movement.
    Category {
        #[serde(default)]
        filter: FilterSpec,
    },
    /// Sums earlier non-subtotal rows with order in `[from, to]`.
    Subtotal { from: u32, to: u32 },
    /// Blank separator line.
    Spacer,
}

impl LayoutKind {
    pub fn row_type(&self) -> RowType {
        match self {
            LayoutKind::Variable { .. } => RowType::Variable,
            LayoutKind::Calculated { .. } => RowType::Calculated,
            LayoutKind::Category { .. } => RowType::Category,
            LayoutKind::Subtotal { .. } => RowType::Subtotal,
            LayoutKind::Spacer => RowType::Spacer,
        }
    }
}

/// The row type tag, as echoed in computed rows and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Variable,
    Calculated,
    Category,
    Subtotal,
    Spacer,
}

impl RowType {
    /// Rows a subtotal range adds up.
    pub fn is_summable(&self) -> bool {
        matches!(self, RowType::Variable | RowType::Calculated | RowType::Category)
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowType::Variable => "variable",
            RowType::Calculated => "calculated",
            RowType::Category => "category",
            RowType::Subtotal => "subtotal",
            RowType::Spacer => "spacer",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ROW FORMAT
// ============================================================================

/// A row's declared format: just a kind (`"percent"`), or a kind with
/// overrides (`{"type": "currency", "decimals": 2}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowFormat {
    Kind(FormatKind),
    Detailed {
        #[serde(rename = "type")]
        kind: FormatKind,
        #[serde(flatten)]
        spec: FormatSpec,
    },
}

impl RowFormat {
    pub fn kind(&self) -> FormatKind {
        match self {
            RowFormat::Kind(kind) => *kind,
            RowFormat::Detailed { kind, .. } => *kind,
        }
    }

    pub fn spec(&self) -> Option<&FormatSpec> {
        match self {
            RowFormat::Kind(_) => None,
            RowFormat::Detailed { spec, .. } => Some(spec),
        }
    }
}

impl From<FormatKind> for RowFormat {
    fn from(kind: FormatKind) -> Self {
        RowFormat::Kind(kind)
    }
}
