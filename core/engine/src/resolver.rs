//! FILENAME: core/engine/src/resolver.rs
//! PURPOSE: Resolves declared report variables into per-period values.
//! CONTEXT: A variable is `{filter, aggregate}`: select movements with the
//! filter, then reduce their amounts per period. Every period of the
//! unfiltered data appears in the result, zero-match periods as 0.
//!
//! All mutable resolution state (result cache and in-progress stack) lives in
//! a ResolutionScope created per `resolve_variables` call, so independent
//! calls never share state. The stack turns a re-entrant resolution of the
//! same name into a CircularDependency error naming the whole chain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::aggregate::AggregateFunction;
use crate::error::{ResolveError, VariableError};
use crate::filter::{CompiledFilter, FilterSpec};
use crate::movement::Record;
use crate::period::{PeriodKey, PeriodOptions, PeriodValues};

/// Variable definitions keyed by name.
pub type VariableDefinitions = BTreeMap<String, VariableDefinition>;

/// Resolved values keyed by variable name.
pub type ResolvedVariables = BTreeMap<String, PeriodValues>;

// ============================================================================
// DEFINITION
// ============================================================================

/// A variable as declared in a report definition.
/// Both fields are optional on the wire so that a missing one is reported
/// as an invalid definition rather than a deserialization failure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
}

/// A definition whose filter compiled and whose aggregate is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedVariable {
    pub filter: CompiledFilter,
    pub aggregate: AggregateFunction,
}

impl VariableDefinition {
    pub fn new(filter: FilterSpec, aggregate: AggregateFunction) -> Self {
        VariableDefinition {
            filter: Some(filter),
            aggregate: Some(aggregate.as_str().to_string()),
        }
    }

    pub fn validate(&self) -> Result<ValidatedVariable, VariableError> {
        let filter = self.filter.as_ref().ok_or(VariableError::MissingFilter)?;
        let aggregate = self
            .aggregate
            .as_deref()
            .ok_or(VariableError::MissingAggregate)?
            .parse::<AggregateFunction>()?;
        Ok(ValidatedVariable {
            filter: filter.compile()?,
            aggregate,
        })
    }
}

// ============================================================================
// SINGLE VARIABLE
// ============================================================================

/// Resolves one definition over `rows` for every period in the data.
pub fn resolve_variable<R: Record>(
    definition: &VariableDefinition,
    rows: &[R],
    options: &PeriodOptions,
) -> Result<PeriodValues, VariableError> {
    let periods = options.collect_periods(rows);
    let validated = definition.validate()?;
    Ok(reduce_by_period(&validated, rows, &periods, options))
}

fn reduce_by_period<R: Record>(
    variable: &ValidatedVariable,
    rows: &[R],
    periods: &[PeriodKey],
    options: &PeriodOptions,
) -> PeriodValues {
    let mut grouped: FxHashMap<PeriodKey, Vec<Option<f64>>> = FxHashMap::default();
    for row in rows.iter().filter(|row| variable.filter.matches(*row)) {
        grouped
            .entry(row.period_key(options.granularity))
            .or_default()
            .push(row.amount());
    }

    periods
        .iter()
        .map(|period| {
            let amounts = grouped.get(period).map(Vec::as_slice).unwrap_or(&[]);
            (*period, variable.aggregate.reduce(amounts.iter().copied()))
        })
        .collect()
}

// ============================================================================
// RESOLUTION SCOPE
// ============================================================================

/// Per-call resolution state: definitions, data, cache and the in-progress stack.
pub struct ResolutionScope<'a, R: Record> {
    definitions: &'a VariableDefinitions,
    rows: &'a [R],
    options: &'a PeriodOptions,
    periods: Vec<PeriodKey>,
    cache: FxHashMap<String, PeriodValues>,
    stack: Vec<String>,
}

impl<'a, R: Record> ResolutionScope<'a, R> {
    pub fn new(
        definitions: &'a VariableDefinitions,
        rows: &'a [R],
        options: &'a PeriodOptions,
    ) -> Self {
        ResolutionScope {
            definitions,
            rows,
            options,
            periods: options.collect_periods(rows),
            cache: FxHashMap::default(),
            stack: Vec::new(),
        }
    }

    /// Resolves `name`, reusing a previous result from this scope.
    pub fn resolve(&mut self, name: &str) -> Result<PeriodValues, ResolveError> {
        if let Some(values) = self.cache.get(name) {
            log::trace!("variable '{}' served from cache", name);
            return Ok(values.clone());
        }

        let values = self.enter(name, |scope| {
            let definition = scope
                .definitions
                .get(name)
                .ok_or_else(|| ResolveError::UnknownVariable {
                    name: name.to_string(),
                })?;
            let validated = definition.validate()?;
            Ok(reduce_by_period(
                &validated,
                scope.rows,
                &scope.periods,
                scope.options,
            ))
        })?;

        self.cache.insert(name.to_string(), values.clone());
        Ok(values)
    }

    /// Runs `work` with `name` pushed on the resolution stack.
    /// Fails without running it if `name` is already being resolved.
    /// The stack entry is popped whether `work` succeeds or not.
    pub fn enter<T, F>(&mut self, name: &str, work: F) -> Result<T, ResolveError>
    where
        F: FnOnce(&mut Self) -> Result<T, ResolveError>,
    {
        if self.stack.iter().any(|entry| entry == name) {
            let mut path = self.stack.clone();
            path.push(name.to_string());
            return Err(ResolveError::CircularDependency { path });
        }

        self.stack.push(name.to_string());
        let result = work(self);
        self.stack.pop();
        result
    }

    /// Names currently being resolved, outermost first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn periods(&self) -> &[PeriodKey] {
        &self.periods
    }
}

/// Resolves every definition. The first failure aborts the batch and is
/// reported under the failing variable's name.
pub fn resolve_variables<R: Record>(
    definitions: &VariableDefinitions,
    rows: &[R],
    options: &PeriodOptions,
) -> Result<ResolvedVariables, ResolveError> {
    let mut scope = ResolutionScope::new(definitions, rows, options);
    log::debug!(
        "resolving {} variables over {} movements and {} periods",
        definitions.len(),
        rows.len(),
        scope.periods().len()
    );

    let mut resolved = ResolvedVariables::new();
    for name in definitions.keys() {
        let values = scope.resolve(name).map_err(|source| ResolveError::Variable {
            name: name.clone(),
            source: Box::new(source),
        })?;
        resolved.insert(name.clone(), values);
    }
    Ok(resolved)
}
