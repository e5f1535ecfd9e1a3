//! FILENAME: core/report-engine/src/lib.rs
//! Report Engine - Financial statement computation.
//!
//! Architecture:
//! - definition: Serializable report configuration (variables, layout, formatting)
//! - engine: Row processor that computes a statement from movements
//! - view: Computed rows and metadata handed to renderers
//! - references: Static check for broken references in a definition
//! - config: Per-render options
//!
//! Data flow:
//! ReportDefinition + Movements --> RowProcessor --> StatementView --> renderer

pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod references;
pub mod view;

pub use config::{MissingReferencePolicy, RenderOptions};
pub use definition::{LayoutItem, LayoutKind, ReportDefinition, RowFormat, RowType};
pub use engine::{compute_variance, render_statement, RowProcessor};
pub use error::ReportError;
pub use references::{check_references, IssueKind, ReferenceIssue};
pub use view::{ComputedRow, FormattedValues, RowAmounts, Source, StatementMetadata, StatementView};

// The data model callers need to build inputs.
pub use ledger_engine::{
    AggregateFunction, FilterField, FilterSpec, FormatKind, FormatSpec, FormattingDefaults,
    Granularity, Movement, PeriodKey, PeriodOptions, VariableDefinition,
};

/// Renders a statement from JSON inputs: a report definition and an array
/// of movements. Returns the statement view as JSON.
pub fn render_statement_json(
    definition_json: &str,
    movements_json: &str,
    period_options: &PeriodOptions,
    options: &RenderOptions,
) -> Result<String, ReportError> {
    let definition = ReportDefinition::from_json(definition_json)?;
    let movements: Vec<Movement> =
        serde_json::from_str(movements_json).map_err(ReportError::Movements)?;
    let view = render_statement(&definition, &movements, period_options, options)?;
    view.to_json().map_err(ReportError::Output)
}
