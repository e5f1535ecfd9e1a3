//! FILENAME: tests/test_references.rs
//! Integration tests for the static reference check.

mod common;

use common::{income_statement, render};
use report_engine::{check_references, IssueKind, LayoutItem, ReferenceIssue};

#[test]
fn test_fixture_is_clean() {
    assert!(check_references(&income_statement()).is_empty());
}

#[test]
fn test_issues_are_reported_in_processing_order() {
    let mut def = income_statement();
    def.layout.push(LayoutItem::calculated(5, "@10 + ebitda"));
    def.layout.push(LayoutItem::calculated(85, "@35"));

    let issues = check_references(&def);
    assert_eq!(
        issues,
        vec![
            ReferenceIssue {
                order: 5,
                kind: IssueKind::ForwardReference { target: 10 },
            },
            ReferenceIssue {
                order: 5,
                kind: IssueKind::UnknownVariable {
                    name: "ebitda".into()
                },
            },
            ReferenceIssue {
                order: 85,
                kind: IssueKind::SpacerReference { target: 35 },
            },
        ]
    );
}

#[test]
fn test_forward_reference_still_renders_as_zero() {
    let mut def = income_statement();
    def.layout.push(LayoutItem::calculated(5, "@10 + 1"));
    assert_eq!(check_references(&def).len(), 1);

    let view = render(&def).unwrap();
    assert_eq!(view.row(5).unwrap().amount(&common::y2025()), Some(1.0));
}

#[test]
fn test_issues_serialize_for_editors() {
    let mut def = income_statement();
    def.layout.push(LayoutItem::subtotal(90, 70, 10));
    let issues = check_references(&def);
    let json = serde_json::to_value(&issues).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{"order": 90, "kind": {"issue": "invertedRange", "from": 70, "to": 10}}])
    );
}
