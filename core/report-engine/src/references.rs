//! FILENAME: core/report-engine/src/references.rs
//! PURPOSE: Static reference check over a report definition.
//! CONTEXT: Finds broken references without touching any movement data, so a
//! report editor can flag them before a render. The renderer does not call
//! this; a clean check does not guarantee a successful render (filters are
//! only compiled at render time) and a render under the default options can
//! succeed despite reported issues (missing orders read as zero).

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use ledger_engine::{Dependency, ExpressionEvaluator};

use crate::definition::{LayoutKind, ReportDefinition};

/// A single problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceIssue {
    /// Order of the offending layout item.
    pub order: u32,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum IssueKind {
    /// The expression does not parse.
    Syntax { message: String },
    /// An expression names a variable the report does not declare.
    UnknownVariable { name: String },
    /// A variable row shows a variable the report does not declare.
    UnknownLayoutVariable { name: String },
    /// `@N` where no layout item has order N.
    UnknownOrder { target: u32 },
    /// `@N` where item N exists but is computed later (or is this item).
    ForwardReference { target: u32 },
    /// `@N` where item N is a spacer.
    SpacerReference { target: u32 },
    /// A subtotal with `from` greater than `to`.
    InvertedRange { from: u32, to: u32 },
    /// Another layout item already uses this order.
    DuplicateOrder,
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layout item {}: ", self.order)?;
        match &self.kind {
            IssueKind::Syntax { message } => write!(f, "{}", message),
            IssueKind::UnknownVariable { name } => {
                write!(f, "expression references unknown variable '{}'", name)
            }
            IssueKind::UnknownLayoutVariable { name } => write!(f, "unknown variable '{}'", name),
            IssueKind::UnknownOrder { target } => write!(f, "@{} does not exist", target),
            IssueKind::ForwardReference { target } => {
                write!(f, "@{} is not computed before this row", target)
            }
            IssueKind::SpacerReference { target } => write!(f, "@{} is a spacer", target),
            IssueKind::InvertedRange { from, to } => {
                write!(f, "subtotal range {}..{} is inverted", from, to)
            }
            IssueKind::DuplicateOrder => write!(f, "duplicate order"),
        }
    }
}

/// Checks every layout item's references, in processing order.
pub fn check_references(definition: &ReportDefinition) -> Vec<ReferenceIssue> {
    let layout = definition.sorted_layout();
    let mut evaluator = ExpressionEvaluator::new();
    let mut issues = Vec::new();
    let mut seen: FxHashSet<u32> = FxHashSet::default();
    let mut spacers: FxHashSet<u32> = FxHashSet::default();
    let all_orders: FxHashSet<u32> = layout.iter().map(|item| item.order).collect();

    for item in &layout {
        let mut report = |kind: IssueKind| issues.push(ReferenceIssue { order: item.order, kind });

        if seen.contains(&item.order) {
            report(IssueKind::DuplicateOrder);
        }

        match &item.kind {
            LayoutKind::Variable { variable } => {
                if !definition.variables.contains_key(variable) {
                    report(IssueKind::UnknownLayoutVariable {
                        name: variable.clone(),
                    });
                }
            }
            LayoutKind::Calculated { expression } => match evaluator.dependencies(expression) {
                Ok(dependencies) => {
                    for dependency in dependencies {
                        match dependency {
                            Dependency::Variable(name) => {
                                if !definition.variables.contains_key(&name) {
                                    report(IssueKind::UnknownVariable { name });
                                }
                            }
                            Dependency::Order(target) => {
                                if !all_orders.contains(&target) {
                                    report(IssueKind::UnknownOrder { target });
                                } else if !seen.contains(&target) {
                                    report(IssueKind::ForwardReference { target });
                                } else if spacers.contains(&target) {
                                    report(IssueKind::SpacerReference { target });
                                }
                            }
                        }
                    }
                }
                Err(err) => report(IssueKind::Syntax {
                    message: err.to_string(),
                }),
            },
            LayoutKind::Subtotal { from, to } => {
                if from > to {
                    report(IssueKind::InvertedRange { from: *from, to: *to });
                }
            }
            LayoutKind::Category { .. } => {}
            LayoutKind::Spacer => {
                spacers.insert(item.order);
            }
        }

        seen.insert(item.order);
    }

    if !issues.is_empty() {
        log::debug!(
            "report '{}' has {} reference issues",
            definition.report_id,
            issues.len()
        );
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::LayoutItem;
    use ledger_engine::{AggregateFunction, FilterSpec, VariableDefinition};

    fn report(layout: Vec<LayoutItem>) -> ReportDefinition {
        let mut def = ReportDefinition::new("r", "R");
        def.variables.insert(
            "revenue".to_string(),
            VariableDefinition::new(FilterSpec::new(), AggregateFunction::Sum),
        );
        def.layout = layout;
        def
    }

    #[test]
    fn test_clean_report_has_no_issues() {
        let def = report(vec![
            LayoutItem::variable(10, "revenue"),
            LayoutItem::calculated(20, "@10 * 2 + revenue"),
            LayoutItem::subtotal(30, 10, 20),
        ]);
        assert!(check_references(&def).is_empty());
    }

    #[test]
    fn test_unknown_names() {
        let def = report(vec![
            LayoutItem::variable(10, "ghost"),
            LayoutItem::calculated(20, "cogs + @99"),
        ]);
        let kinds: Vec<IssueKind> = check_references(&def).into_iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::UnknownLayoutVariable { name: "ghost".into() },
                IssueKind::UnknownVariable { name: "cogs".into() },
                IssueKind::UnknownOrder { target: 99 },
            ]
        );
    }

    #[test]
    fn test_forward_and_self_references() {
        let def = report(vec![
            LayoutItem::calculated(10, "@20 + @10"),
            LayoutItem::variable(20, "revenue"),
        ]);
        let issues = check_references(&def);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::ForwardReference { target: 20 });
        assert_eq!(issues[1].kind, IssueKind::ForwardReference { target: 10 });
    }

    #[test]
    fn test_spacer_reference() {
        let def = report(vec![LayoutItem::spacer(10), LayoutItem::calculated(20, "@10")]);
        let issues = check_references(&def);
        assert_eq!(issues[0].kind, IssueKind::SpacerReference { target: 10 });
        assert_eq!(issues[0].to_string(), "Layout item 20: @10 is a spacer");
    }

    #[test]
    fn test_syntax_inverted_range_and_duplicates() {
        let def = report(vec![
            LayoutItem::calculated(10, "1 +"),
            LayoutItem::subtotal(20, 30, 10),
            LayoutItem::spacer(20),
        ]);
        let issues = check_references(&def);
        assert_eq!(issues.len(), 3);
        assert!(matches!(&issues[0].kind, IssueKind::Syntax { message } if message.contains("position 3")));
        assert_eq!(issues[1].kind, IssueKind::InvertedRange { from: 30, to: 10 });
        assert_eq!(
            issues[2],
            ReferenceIssue {
                order: 20,
                kind: IssueKind::DuplicateOrder
            }
        );
    }
}
