//! FILENAME: core/engine/src/filter.rs
//! PURPOSE: Compiles declarative filter specifications into row predicates.
//! CONTEXT: Variables and category rows select movements with a JSON filter:
//!
//!   { "code1": "40" }                      exact match
//!   { "code1": ["40", "41"] }              any of (OR)
//!   { "code2": { "gte": "400", "lt": "500" } }   range (AND of bounds)
//!
//! Several fields combine with AND. The specification is kept as raw JSON
//! until compilation so every shape problem is reported here, with the
//! offending field named. Range bounds compare strings lexicographically,
//! so "9" sorts after "10"; codes must be zero-padded to the same width for
//! numeric-looking ranges to behave.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::error::FilterError;
use crate::movement::{FilterField, Record};

// ============================================================================
// FILTER SPECIFICATION
// ============================================================================

/// A filter as written in a report definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(pub Map<String, Value>);

impl FilterSpec {
    pub fn new() -> Self {
        FilterSpec(Map::new())
    }

    /// Wraps an arbitrary JSON value, rejecting anything but an object.
    pub fn from_value(value: Value) -> Result<Self, FilterError> {
        match value {
            Value::Object(map) => Ok(FilterSpec(map)),
            other => Err(FilterError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates the specification and builds its predicate.
    pub fn compile(&self) -> Result<CompiledFilter, FilterError> {
        let mut clauses = Vec::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            let field: FilterField = name.parse()?;
            let condition = compile_condition(name, value)?;
            clauses.push(Clause { field, condition });
        }
        Ok(CompiledFilter { clauses })
    }
}

// ============================================================================
// COMPILED FORM
// ============================================================================

/// Range comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gte,
    Lte,
    Gt,
    Lt,
}

impl RangeOp {
    fn parse(key: &str) -> Option<RangeOp> {
        match key {
            "gte" => Some(RangeOp::Gte),
            "lte" => Some(RangeOp::Lte),
            "gt" => Some(RangeOp::Gt),
            "lt" => Some(RangeOp::Lt),
            _ => None,
        }
    }

    fn holds(&self, value: &str, bound: &str) -> bool {
        match self {
            RangeOp::Gte => value >= bound,
            RangeOp::Lte => value <= bound,
            RangeOp::Gt => value > bound,
            RangeOp::Lt => value < bound,
        }
    }
}

/// The test applied to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Exact(String),
    AnyOf(SmallVec<[String; 4]>),
    Range(SmallVec<[(RangeOp, String); 2]>),
}

impl Condition {
    fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Condition::Exact(expected) => value.unwrap_or("") == expected,
            Condition::AnyOf(options) => {
                let actual = value.unwrap_or("");
                options.iter().any(|option| option == actual)
            }
            // An absent field never satisfies a bound.
            Condition::Range(bounds) => match value {
                Some(actual) => bounds.iter().all(|(op, bound)| op.holds(actual, bound)),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    field: FilterField,
    condition: Condition,
}

/// A validated filter, ready to test rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFilter {
    clauses: Vec<Clause>,
}

impl CompiledFilter {
    /// True when every field clause accepts the row.
    pub fn matches<R: Record + ?Sized>(&self, row: &R) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.condition.matches(row.field(clause.field)))
    }

    /// The matching rows, in their original order.
    pub fn apply<'a, R: Record>(&self, rows: &'a [R]) -> Vec<&'a R> {
        rows.iter().filter(|row| self.matches(*row)).collect()
    }

    pub fn condition(&self, field: FilterField) -> Option<&Condition> {
        self.clauses
            .iter()
            .find(|clause| clause.field == field)
            .map(|clause| &clause.condition)
    }
}

/// Compiles `spec` and returns the rows it accepts. An empty spec keeps all rows.
pub fn apply_filter<'a, R: Record>(
    rows: &'a [R],
    spec: &FilterSpec,
) -> Result<Vec<&'a R>, FilterError> {
    let compiled = spec.compile()?;
    Ok(compiled.apply(rows))
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

fn compile_condition(field: &str, value: &Value) -> Result<Condition, FilterError> {
    match value {
        Value::String(s) => Ok(Condition::Exact(s.clone())),
        Value::Array(items) => compile_any_of(field, items),
        Value::Object(bounds) => compile_range(field, bounds),
        _ => Err(FilterError::InvalidValue {
            field: field.to_string(),
        }),
    }
}

fn compile_any_of(field: &str, items: &[Value]) -> Result<Condition, FilterError> {
    if items.is_empty() {
        return Err(FilterError::EmptyArray(field.to_string()));
    }

    let mut options = SmallVec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => options.push(s.clone()),
            other => {
                return Err(FilterError::InvalidArrayElement {
                    field: field.to_string(),
                    found: json_kind(other).to_string(),
                })
            }
        }
    }
    Ok(Condition::AnyOf(options))
}

fn compile_range(field: &str, bounds: &Map<String, Value>) -> Result<Condition, FilterError> {
    if bounds.is_empty() {
        return Err(FilterError::EmptyRange(field.to_string()));
    }

    let mut compiled = SmallVec::new();
    for (key, bound) in bounds {
        let op = RangeOp::parse(key).ok_or_else(|| FilterError::UnknownRangeOperator {
            field: field.to_string(),
            operator: key.clone(),
        })?;
        match bound {
            Value::String(s) => compiled.push((op, s.clone())),
            _ => {
                return Err(FilterError::InvalidRangeBound {
                    field: field.to_string(),
                    operator: key.clone(),
                })
            }
        }
    }
    Ok(Condition::Range(compiled))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
