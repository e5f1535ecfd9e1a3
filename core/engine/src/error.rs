//! FILENAME: core/engine/src/error.rs
//! PURPOSE: Error types for expression evaluation, filters and variable resolution.

use expr_parser::ParseError;
use thiserror::Error;

/// Failure while evaluating an expression.
/// Division by zero is not an error; see `EvalResult::Undefined`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("Undefined reference: {0}")]
    UndefinedReference(String),
}

/// A filter specification that does not have an accepted shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid filter: unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid filter: value for '{field}' must be a string, an array of strings or a range object")]
    InvalidValue { field: String },

    #[error("Invalid filter: array for '{0}' must not be empty")]
    EmptyArray(String),

    #[error("Invalid filter: array for '{field}' contains a {found} element")]
    InvalidArrayElement { field: String, found: String },

    #[error("Invalid filter: range for '{0}' has no bounds")]
    EmptyRange(String),

    #[error("Invalid filter: unknown range operator '{operator}' for '{field}'")]
    UnknownRangeOperator { field: String, operator: String },

    #[error("Invalid filter: range bound '{operator}' for '{field}' must be a string")]
    InvalidRangeBound { field: String, operator: String },

    #[error("Invalid filter: expected an object, found {0}")]
    NotAnObject(String),
}

/// A variable definition that cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariableError {
    #[error("Invalid variable definition: missing filter")]
    MissingFilter,

    #[error("Invalid variable definition: missing aggregate")]
    MissingAggregate,

    #[error("Invalid variable definition: unknown aggregate '{0}'")]
    UnknownAggregate(String),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Failure while resolving the declared variables of a report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("Variable '{name}' is not defined")]
    UnknownVariable { name: String },

    #[error("Failed to resolve variable '{name}': {source}")]
    Variable {
        name: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error(transparent)]
    Definition(#[from] VariableError),
}
