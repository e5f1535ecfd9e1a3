//! FILENAME: core/report-engine/src/error.rs

use ledger_engine::{EvalError, FilterError, ResolveError};
use thiserror::Error;

use crate::definition::RowType;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report definition: {0}")]
    Definition(#[source] serde_json::Error),

    #[error("Invalid movements: {0}")]
    Movements(#[source] serde_json::Error),

    #[error("Failed to serialize statement: {0}")]
    Output(#[source] serde_json::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Layout item {order} ({item_type}) failed: {source}")]
    LayoutItem {
        order: u32,
        item_type: RowType,
        #[source]
        source: Box<ReportError>,
    },

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error(transparent)]
    Expression(#[from] EvalError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Invalid subtotal range: from {from} is greater than to {to}")]
    SubtotalRange { from: u32, to: u32 },
}

impl ReportError {
    /// The innermost error, looking through layout item wrappers.
    pub fn root(&self) -> &ReportError {
        match self {
            ReportError::LayoutItem { source, .. } => source.root(),
            other => other,
        }
    }
}
