//! FILENAME: core/report-engine/src/config.rs
//! PURPOSE: Render options that tune how a statement is computed and displayed.

use serde::{Deserialize, Serialize};

use ledger_engine::FormattingDefaults;

/// What a calculated row reads for an `@order` that has no computed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReferencePolicy {
    /// Substitute 0 and log a warning.
    #[default]
    Zero,
    /// Fail the item with an undefined reference error.
    Error,
}

/// Per-render configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub missing_reference: MissingReferencePolicy,
    /// Layered over the report's own `formatting` block.
    pub formatting: Option<FormattingDefaults>,
}

impl RenderOptions {
    pub fn strict() -> Self {
        RenderOptions {
            missing_reference: MissingReferencePolicy::Error,
            ..Default::default()
        }
    }
}
