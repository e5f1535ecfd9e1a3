//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: Evaluates expression ASTs against a flat name -> number context.
//! CONTEXT: Calculated layout rows carry expressions such as
//! `revenue - cost_of_sales` or `@30 / @10 * 100`. The row processor builds
//! one EvalContext per row and period, holding every resolved variable and
//! every already computed row (keyed "@<order>"), and asks the evaluator for
//! the result.
//!
//! SUPPORTED FEATURES:
//! - Parse memoization keyed by the exact source text
//! - IEEE-754 double arithmetic: +, -, *, / and unary sign
//! - Division by zero yields EvalResult::Undefined instead of an error
//! - Undefined operands propagate; non-finite results become Undefined
//! - References missing from the context are hard errors
//! - Dependency listing for external reference checks

use expr_parser::{parse, BinaryOperator, Expression, ParseError, UnaryOperator};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::error::EvalError;

// ============================================================================
// RESULT AND CONTEXT
// ============================================================================

/// The result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalResult {
    Number(f64),
    /// No meaningful number, e.g. a ratio against a zero base.
    Undefined,
}

impl EvalResult {
    /// Wraps a raw number, treating NaN and infinities as undefined.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            EvalResult::Number(value)
        } else {
            EvalResult::Undefined
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalResult::Number(n) => Some(*n),
            EvalResult::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, EvalResult::Undefined)
    }
}

/// Values visible to one evaluation: variable names and order tokens ("@10").
/// A NaN value stands for an undefined cell and evaluates as Undefined.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    values: FxHashMap<String, f64>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        EvalContext {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Registers the amount of the row with the given order.
    pub fn insert_order(&mut self, order: u32, value: Option<f64>) {
        self.values
            .insert(Expression::order_token(order), value.unwrap_or(f64::NAN));
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for EvalContext {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut context = EvalContext::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

/// A name an expression depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    Variable(String),
    Order(u32),
}

impl Dependency {
    /// The context key this dependency is looked up under.
    pub fn token(&self) -> String {
        match self {
            Dependency::Variable(name) => name.clone(),
            Dependency::Order(order) => Expression::order_token(*order),
        }
    }
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// Parses, caches and evaluates expressions.
/// The AST cache lives as long as the evaluator and is never invalidated
/// implicitly; call `clear_cache` to drop it.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    cache: FxHashMap<String, Arc<Expression>>,
    parse_count: usize,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        ExpressionEvaluator::default()
    }

    /// Returns the AST for `source`, parsing it only on the first request.
    pub fn parse(&mut self, source: &str) -> Result<Arc<Expression>, ParseError> {
        if let Some(ast) = self.cache.get(source) {
            return Ok(Arc::clone(ast));
        }

        self.parse_count += 1;
        let ast = Arc::new(parse(source)?);
        self.cache.insert(source.to_string(), Arc::clone(&ast));
        Ok(ast)
    }

    /// Parses (or fetches) `source` and evaluates it against `context`.
    pub fn evaluate(&mut self, source: &str, context: &EvalContext) -> Result<EvalResult, EvalError> {
        let ast = self.parse(source)?;
        evaluate_ast(&ast, context)
    }

    /// The de-duplicated variables and order references of `source`, in
    /// order of first appearance.
    pub fn dependencies(&mut self, source: &str) -> Result<Vec<Dependency>, ParseError> {
        let ast = self.parse(source)?;
        Ok(collect_dependencies(&ast))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// How many times source text has actually been tokenized and parsed.
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }
}

/// Post-order evaluation of an already parsed expression.
pub fn evaluate_ast(expr: &Expression, context: &EvalContext) -> Result<EvalResult, EvalError> {
    match expr {
        Expression::Number(n) => Ok(EvalResult::from_f64(*n)),

        Expression::Variable(name) => lookup(name, context),

        Expression::OrderRef(order) => lookup(&Expression::order_token(*order), context),

        Expression::UnaryOp { op, operand } => {
            let value = evaluate_ast(operand, context)?;
            Ok(match (op, value) {
                (_, EvalResult::Undefined) => EvalResult::Undefined,
                (UnaryOperator::Plus, v) => v,
                (UnaryOperator::Negate, EvalResult::Number(n)) => EvalResult::Number(-n),
            })
        }

        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate_ast(left, context)?;
            let right_val = evaluate_ast(right, context)?;
            Ok(apply_binary(*op, left_val, right_val))
        }
    }
}

fn lookup(key: &str, context: &EvalContext) -> Result<EvalResult, EvalError> {
    context
        .get(key)
        .map(EvalResult::from_f64)
        .ok_or_else(|| EvalError::UndefinedReference(key.to_string()))
}

fn apply_binary(op: BinaryOperator, left: EvalResult, right: EvalResult) -> EvalResult {
    let (l, r) = match (left, right) {
        (EvalResult::Number(l), EvalResult::Number(r)) => (l, r),
        _ => return EvalResult::Undefined,
    };

    match op {
        BinaryOperator::Add => EvalResult::from_f64(l + r),
        BinaryOperator::Subtract => EvalResult::from_f64(l - r),
        BinaryOperator::Multiply => EvalResult::from_f64(l * r),
        BinaryOperator::Divide => {
            if r == 0.0 {
                EvalResult::Undefined
            } else {
                EvalResult::from_f64(l / r)
            }
        }
    }
}

/// Walks the tree collecting variable names and order references.
pub fn collect_dependencies(expr: &Expression) -> Vec<Dependency> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    collect_into(expr, &mut seen, &mut result);
    result
}

fn collect_into(expr: &Expression, seen: &mut FxHashSet<Dependency>, out: &mut Vec<Dependency>) {
    let dependency = match expr {
        Expression::Number(_) => return,
        Expression::Variable(name) => Dependency::Variable(name.clone()),
        Expression::OrderRef(order) => Dependency::Order(*order),
        Expression::UnaryOp { operand, .. } => return collect_into(operand, seen, out),
        Expression::BinaryOp { left, right, .. } => {
            collect_into(left, seen, out);
            collect_into(right, seen, out);
            return;
        }
    };

    if seen.insert(dependency.clone()) {
        out.push(dependency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, context: &EvalContext) -> Result<EvalResult, EvalError> {
        ExpressionEvaluator::new().evaluate(source, context)
    }

    #[test]
    fn test_precedence() {
        let ctx = EvalContext::new();
        assert_eq!(eval("2 + 3 * 4", &ctx).unwrap(), EvalResult::Number(14.0));
        assert_eq!(eval("(2 + 3) * 4", &ctx).unwrap(), EvalResult::Number(20.0));
        assert_eq!(eval("10 - 4 - 3", &ctx).unwrap(), EvalResult::Number(3.0));
        assert_eq!(eval("-2 * -3", &ctx).unwrap(), EvalResult::Number(6.0));
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        let ctx = EvalContext::new();
        assert_eq!(eval("10 / 0", &ctx).unwrap(), EvalResult::Undefined);
        assert_eq!(eval("(10 / 0) + 1", &ctx).unwrap(), EvalResult::Undefined);
        assert_eq!(eval("-(1 / 0)", &ctx).unwrap(), EvalResult::Undefined);
    }

    #[test]
    fn test_undefined_reference_names_the_token() {
        let ctx = EvalContext::new();
        let err = eval("revenue + 1", &ctx).unwrap_err();
        assert_eq!(err, EvalError::UndefinedReference("revenue".to_string()));
        assert!(err.to_string().contains("revenue"));

        let err = eval("@40 * 2", &ctx).unwrap_err();
        assert_eq!(err, EvalError::UndefinedReference("@40".to_string()));
    }

    #[test]
    fn test_undefined_reference_beats_division_by_zero() {
        // Both operands are evaluated before the operator applies.
        let ctx = EvalContext::new();
        assert!(eval("(1 / 0) + missing", &ctx).is_err());
    }

    #[test]
    fn test_context_lookup() {
        let mut ctx = EvalContext::new();
        ctx.insert("revenue", 1000.0);
        ctx.insert_order(10, Some(250.0));
        assert_eq!(
            eval("revenue - @10", &ctx).unwrap(),
            EvalResult::Number(750.0)
        );
    }

    #[test]
    fn test_undefined_cells_propagate() {
        let mut ctx = EvalContext::new();
        ctx.insert_order(10, None);
        assert_eq!(eval("@10 + 5", &ctx).unwrap(), EvalResult::Undefined);
    }

    #[test]
    fn test_syntax_errors_surface() {
        let ctx = EvalContext::new();
        assert!(matches!(eval("2 +", &ctx), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn test_cache_reuses_ast() {
        let mut evaluator = ExpressionEvaluator::new();
        let first = evaluator.parse("revenue * 0.2").unwrap();
        let second = evaluator.parse("revenue * 0.2").unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(evaluator.parse_count(), 1);
        assert_eq!(evaluator.cache_len(), 1);

        // Exact text is the key; whitespace differences parse again.
        evaluator.parse("revenue*0.2").unwrap();
        assert_eq!(evaluator.parse_count(), 2);

        evaluator.clear_cache();
        assert_eq!(evaluator.cache_len(), 0);
        evaluator.parse("revenue * 0.2").unwrap();
        assert_eq!(evaluator.parse_count(), 3);
    }

    #[test]
    fn test_failed_parse_is_not_cached() {
        let mut evaluator = ExpressionEvaluator::new();
        assert!(evaluator.parse("(1").is_err());
        assert_eq!(evaluator.cache_len(), 0);
    }

    #[test]
    fn test_dependencies_are_deduplicated() {
        let mut evaluator = ExpressionEvaluator::new();
        let deps = evaluator
            .dependencies("(revenue - cogs) / revenue + @10 - @10 * 2")
            .unwrap();
        assert_eq!(
            deps,
            vec![
                Dependency::Variable("revenue".to_string()),
                Dependency::Variable("cogs".to_string()),
                Dependency::Order(10),
            ]
        );
        assert_eq!(deps[2].token(), "@10");
    }

    #[test]
    fn test_context_from_iterator() {
        let ctx: EvalContext = vec![("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert_eq!(ctx.len(), 2);
        assert_eq!(eval("a + b", &ctx).unwrap(), EvalResult::Number(3.0));
    }
}
