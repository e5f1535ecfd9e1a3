//! FILENAME: core/report-engine/src/engine.rs
//! Statement Engine - computes a StatementView from a definition and movements.
//!
//! The render is one linear pass:
//! 1. Resolve every declared variable once.
//! 2. Sort the layout by order (stable for duplicates).
//! 3. Compute each item in that order, appending to an order -> row index.
//!    Calculated rows see every resolved variable plus "@order" for each row
//!    already computed; subtotals sum earlier summable rows in their range.
//! 4. Derive the A/B comparison amounts and the variance.
//! 5. Produce display strings.
//!
//! Any item failure is wrapped with the item's order and type and aborts the
//! whole render; no partial statement is returned.

use chrono::Utc;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use ledger_engine::{
    resolve_variables, Dependency, EvalContext, EvalError, EvalResult, ExpressionEvaluator,
    FilterSpec, FormatKind, FormattingDefaults, Movement, PeriodKey, PeriodOptions, Record,
    ResolvedVariables,
};

use crate::config::{MissingReferencePolicy, RenderOptions};
use crate::definition::{LayoutItem, LayoutKind, ReportDefinition};
use crate::error::ReportError;
use crate::view::{ComputedRow, FormattedValues, RowAmounts, Source, StatementMetadata, StatementView};

// ============================================================================
// VARIANCE
// ============================================================================

/// `(B - A, (B - A) / |A| * 100)`, with a 0% change when A is zero.
/// Either side undefined leaves both results undefined.
pub fn compute_variance(amount_a: Option<f64>, amount_b: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (amount_a, amount_b) {
        (Some(a), Some(b)) => {
            let amount = b - a;
            let percent = if a == 0.0 { 0.0 } else { amount / a.abs() * 100.0 };
            (Some(amount), Some(percent))
        }
        _ => (None, None),
    }
}

// ============================================================================
// ROW PROCESSOR
// ============================================================================

/// Renders statements. Holds the expression cache across renders, so one
/// processor reused for many renders of the same report parses each
/// expression once.
#[derive(Debug, Default)]
pub struct RowProcessor {
    evaluator: ExpressionEvaluator,
    options: RenderOptions,
}

/// Read-only inputs shared by every item of one render.
struct RenderInputs<'a> {
    movements: &'a [Movement],
    variables: &'a ResolvedVariables,
    periods: &'a [PeriodKey],
    period_options: &'a PeriodOptions,
}

impl RowProcessor {
    pub fn new(options: RenderOptions) -> Self {
        RowProcessor {
            evaluator: ExpressionEvaluator::new(),
            options,
        }
    }

    pub fn evaluator(&self) -> &ExpressionEvaluator {
        &self.evaluator
    }

    pub fn clear_cache(&mut self) {
        self.evaluator.clear_cache();
    }

    /// Computes the full statement.
    pub fn render(
        &mut self,
        definition: &ReportDefinition,
        movements: &[Movement],
        period_options: &PeriodOptions,
    ) -> Result<StatementView, ReportError> {
        log::debug!(
            "rendering report '{}' ({} layout items, {} movements)",
            definition.report_id,
            definition.layout.len(),
            movements.len()
        );

        let variables = resolve_variables(&definition.variables, movements, period_options)?;
        let periods = period_options.collect_periods(movements);
        let comparison = period_options.comparison_pair(&periods);

        let inputs = RenderInputs {
            movements,
            variables: &variables,
            periods: &periods,
            period_options,
        };

        let formatting = match &self.options.formatting {
            Some(overrides) => definition.formatting.overlay(overrides),
            None => definition.formatting.clone(),
        };

        let mut rows: Vec<ComputedRow> = Vec::with_capacity(definition.layout.len());
        let mut index: FxHashMap<u32, usize> = FxHashMap::default();

        for item in definition.sorted_layout() {
            log::trace!("processing layout item {} ({})", item.order, item.row_type());
            let amounts = self
                .compute_amounts(item, &inputs, &rows, &index)
                .map_err(|source| ReportError::LayoutItem {
                    order: item.order,
                    item_type: item.row_type(),
                    source: Box::new(source),
                })?;

            let row = build_row(item, amounts, comparison, &formatting);
            index.insert(row.order, rows.len());
            rows.push(row);
        }

        let metadata = StatementMetadata {
            report_id: definition.report_id.clone(),
            name: definition.name.clone(),
            version: definition.version.clone(),
            statement_type: definition.statement_type.clone(),
            generated_at: Utc::now(),
            render_id: Uuid::new_v4(),
            row_count: rows.len(),
            variable_count: variables.len(),
            movement_count: movements.len(),
            periods: periods.clone(),
            period_a: comparison.map(|(a, _)| a),
            period_b: comparison.map(|(_, b)| b),
        };

        log::debug!(
            "rendered report '{}': {} rows over {} periods",
            definition.report_id,
            rows.len(),
            periods.len()
        );

        Ok(StatementView { rows, metadata })
    }

    /// Per-period amounts for one item; `None` for spacers.
    fn compute_amounts(
        &mut self,
        item: &LayoutItem,
        inputs: &RenderInputs<'_>,
        rows: &[ComputedRow],
        index: &FxHashMap<u32, usize>,
    ) -> Result<Option<RowAmounts>, ReportError> {
        let amounts = match &item.kind {
            LayoutKind::Variable { variable } => {
                let values = inputs
                    .variables
                    .get(variable)
                    .ok_or_else(|| ReportError::UnknownVariable(variable.clone()))?;
                inputs
                    .periods
                    .iter()
                    .map(|period| (*period, Some(values.get(period).copied().unwrap_or(0.0))))
                    .collect()
            }

            LayoutKind::Calculated { expression } => {
                self.evaluate_calculated(expression, inputs, rows, index)?
            }

            LayoutKind::Category { filter } => sum_category(filter, inputs)?,

            LayoutKind::Subtotal { from, to } => {
                if from > to {
                    return Err(ReportError::SubtotalRange { from: *from, to: *to });
                }
                sum_range(*from, *to, inputs.periods, rows)
            }

            LayoutKind::Spacer => return Ok(None),
        };
        Ok(Some(amounts))
    }

    fn evaluate_calculated(
        &mut self,
        expression: &str,
        inputs: &RenderInputs<'_>,
        rows: &[ComputedRow],
        index: &FxHashMap<u32, usize>,
    ) -> Result<RowAmounts, ReportError> {
        let ast = self.evaluator.parse(expression).map_err(EvalError::from)?;

        // Orders the expression names that have no computed row with amounts.
        let mut missing = Vec::new();
        for dependency in ledger_engine::collect_dependencies(&ast) {
            if let Dependency::Order(order) = dependency {
                let computed = index
                    .get(&order)
                    .map(|&i| !rows[i].is_spacer())
                    .unwrap_or(false);
                if !computed {
                    match self.options.missing_reference {
                        MissingReferencePolicy::Zero => {
                            log::warn!(
                                "expression '{}' references @{} which has no computed row; using 0",
                                expression,
                                order
                            );
                            missing.push(order);
                        }
                        MissingReferencePolicy::Error => {
                            return Err(EvalError::UndefinedReference(format!("@{}", order)).into());
                        }
                    }
                }
            }
        }

        let mut amounts = RowAmounts::new();
        for period in inputs.periods {
            let mut context = EvalContext::with_capacity(inputs.variables.len() + rows.len());
            for (name, values) in inputs.variables {
                context.insert(name.as_str(), values.get(period).copied().unwrap_or(0.0));
            }
            for &i in index.values() {
                let row = &rows[i];
                if !row.is_spacer() {
                    context.insert_order(row.order, row.amount(period));
                }
            }
            for &order in &missing {
                context.insert_order(order, Some(0.0));
            }

            let value = match ledger_engine::evaluate_ast(&ast, &context)? {
                EvalResult::Number(n) => Some(n),
                EvalResult::Undefined => None,
            };
            amounts.insert(*period, value);
        }
        Ok(amounts)
    }
}

/// Sums raw movements matching the item's own filter, per period.
fn sum_category(filter: &FilterSpec, inputs: &RenderInputs<'_>) -> Result<RowAmounts, ReportError> {
    let compiled = filter.compile()?;
    let mut amounts: RowAmounts = inputs.periods.iter().map(|p| (*p, Some(0.0))).collect();

    for movement in inputs.movements.iter().filter(|m| compiled.matches(*m)) {
        let period = movement.period_key(inputs.period_options.granularity);
        if let Some(Some(total)) = amounts.get_mut(&period) {
            *total += movement.amount().unwrap_or(0.0);
        }
    }
    Ok(amounts)
}

/// Sums earlier summable rows with order in `[from, to]`. Undefined cells add nothing.
fn sum_range(from: u32, to: u32, periods: &[PeriodKey], rows: &[ComputedRow]) -> RowAmounts {
    let members: Vec<&ComputedRow> = rows
        .iter()
        .filter(|row| row.order >= from && row.order <= to && row.row_type.is_summable())
        .collect();

    periods
        .iter()
        .map(|period| {
            let total: f64 = members.iter().filter_map(|row| row.amount(period)).sum();
            (*period, Some(total))
        })
        .collect()
}

// ============================================================================
// ROW ASSEMBLY
// ============================================================================

fn build_row(
    item: &LayoutItem,
    amounts: Option<RowAmounts>,
    comparison: Option<(PeriodKey, PeriodKey)>,
    formatting: &FormattingDefaults,
) -> ComputedRow {
    let row_type = item.row_type();
    let source = match &item.kind {
        LayoutKind::Variable { variable } => Source::Variable {
            name: variable.clone(),
        },
        LayoutKind::Calculated { expression } => Source::Expression {
            expression: expression.clone(),
        },
        LayoutKind::Category { filter } => Source::Filter {
            filter: filter.clone(),
        },
        LayoutKind::Subtotal { from, to } => Source::Range { from: *from, to: *to },
        LayoutKind::Spacer => Source::None,
    };

    let mut row = ComputedRow {
        order: item.order,
        label: item.label.clone().unwrap_or_default(),
        row_type,
        style: item.style.clone(),
        indent: item.indent,
        format: None,
        amounts: RowAmounts::new(),
        amount_a: None,
        amount_b: None,
        variance_amount: None,
        variance_percent: None,
        formatted: FormattedValues::default(),
        source,
    };

    let Some(amounts) = amounts else {
        return row;
    };

    let (amount_a, amount_b) = match comparison {
        Some((a, b)) => (
            amounts.get(&a).copied().flatten(),
            amounts.get(&b).copied().flatten(),
        ),
        None => (None, None),
    };
    let (variance_amount, variance_percent) = compute_variance(amount_a, amount_b);

    let kind = item.format.as_ref().map(|f| f.kind()).unwrap_or_default();
    let format = formatting.resolve(kind, item.format.as_ref().and_then(|f| f.spec()));
    let percent = formatting.resolve(FormatKind::Percent, None);

    row.formatted = FormattedValues {
        amounts: amounts
            .iter()
            .map(|(period, value)| (*period, ledger_engine::format_value(*value, &format)))
            .collect(),
        amount_a: ledger_engine::format_value(amount_a, &format),
        amount_b: ledger_engine::format_value(amount_b, &format),
        variance_amount: ledger_engine::format_value(variance_amount, &format),
        variance_percent: ledger_engine::format_value(variance_percent, &percent),
    };
    row.format = Some(format);
    row.amounts = amounts;
    row.amount_a = amount_a;
    row.amount_b = amount_b;
    row.variance_amount = variance_amount;
    row.variance_percent = variance_percent;
    row
}

/// Convenience wrapper: renders with a fresh processor.
pub fn render_statement(
    definition: &ReportDefinition,
    movements: &[Movement],
    period_options: &PeriodOptions,
    options: &RenderOptions,
) -> Result<StatementView, ReportError> {
    RowProcessor::new(options.clone()).render(definition, movements, period_options)
}
