//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the ledger calculation engine.
//! CONTEXT: Re-exports public types and modules for use by the report engine.
//!
//! PIPELINE: Movements --> Filter --> Aggregate per period --> Resolved variables
//!           Expression --> Parser (cached) --> Evaluator(context) --> EvalResult

pub mod aggregate;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod movement;
pub mod number_format;
pub mod period;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use aggregate::AggregateFunction;
pub use error::{EvalError, FilterError, ResolveError, VariableError};
pub use evaluator::{
    collect_dependencies, evaluate_ast, Dependency, EvalContext, EvalResult, ExpressionEvaluator,
};
pub use expr_parser::{Expression, ParseError};
pub use filter::{apply_filter, CompiledFilter, Condition, FilterSpec, RangeOp};
pub use movement::{FilterField, Movement, Record};
pub use number_format::{
    format_number, format_value, FormatKind, FormatSpec, FormattingDefaults, ResolvedFormat,
};
pub use period::{Granularity, PeriodKey, PeriodOptions, PeriodValues};
pub use resolver::{
    resolve_variable, resolve_variables, ResolutionScope, ResolvedVariables, ValidatedVariable,
    VariableDefinition, VariableDefinitions,
};
