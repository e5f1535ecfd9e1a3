//! FILENAME: tests/common/mod.rs
//! Fixtures for report engine integration tests.

#![allow(dead_code)]

use report_engine::{
    render_statement, FilterField, Movement, PeriodKey, PeriodOptions, RenderOptions,
    ReportDefinition, ReportError, StatementView,
};

/// A small income statement over two years.
///
/// Orders:
/// 10 revenue, 20 cost of sales, 30 gross profit (10..20), 35 spacer,
/// 40 personnel, 50 housing, 60 operating expenses (40..50),
/// 70 operating result (10..60), 80 gross margin %.
pub const INCOME_STATEMENT: &str = r#"{
    "reportId": "pl-basic",
    "name": "Profit and loss",
    "version": "1.0.0",
    "statementType": "income_statement",
    "variables": {
        "revenue": {"filter": {"code1": "40"}, "aggregate": "sum"},
        "cogs": {"filter": {"code1": "50"}, "aggregate": "sum"}
    },
    "layout": [
        {"order": 10, "type": "variable", "variable": "revenue", "label": "Revenue"},
        {"order": 20, "type": "variable", "variable": "cogs", "label": "Cost of sales"},
        {"order": 30, "type": "subtotal", "from": 10, "to": 20, "label": "Gross profit", "style": "bold"},
        {"order": 35, "type": "spacer"},
        {"order": 40, "type": "category", "filter": {"code1": "60", "code2": "600"}, "label": "Personnel", "indent": 1},
        {"order": 50, "type": "category", "filter": {"code1": "60", "code2": "610"}, "label": "Housing", "indent": 1},
        {"order": 60, "type": "subtotal", "from": 40, "to": 50, "label": "Operating expenses"},
        {"order": 70, "type": "subtotal", "from": 10, "to": 60, "label": "Operating result", "style": "bold"},
        {"order": 80, "type": "calculated", "expression": "@30 / revenue * 100", "label": "Gross margin", "format": "percent"}
    ],
    "formatting": {
        "currency": {"decimals": 0, "thousands": true, "symbol": "€"}
    }
}"#;

pub fn income_statement() -> ReportDefinition {
    ReportDefinition::from_json(INCOME_STATEMENT).unwrap()
}

fn line(year: i32, period: u32, code1: &str, code2: &str, amount: f64) -> Movement {
    Movement::new(year, period, amount)
        .with(FilterField::Code1, code1)
        .with(FilterField::Code2, code2)
        .with(FilterField::StatementType, "income_statement")
}

/// 2024: revenue 100,000, cogs -40,000, personnel -10,000, housing -5,000.
/// 2025: revenue 120,000, cogs -50,000, personnel -12,000, housing -6,000.
pub fn movements() -> Vec<Movement> {
    vec![
        line(2024, 3, "40", "400", 60_000.0),
        line(2024, 9, "40", "410", 40_000.0),
        line(2024, 6, "50", "500", -40_000.0),
        line(2024, 6, "60", "600", -10_000.0),
        line(2024, 6, "60", "610", -5_000.0),
        line(2025, 3, "40", "400", 70_000.0),
        line(2025, 9, "40", "410", 50_000.0),
        line(2025, 6, "50", "500", -50_000.0),
        line(2025, 6, "60", "600", -12_000.0),
        line(2025, 6, "60", "610", -6_000.0),
    ]
}

pub fn render(definition: &ReportDefinition) -> Result<StatementView, ReportError> {
    render_statement(
        definition,
        &movements(),
        &PeriodOptions::yearly(),
        &RenderOptions::default(),
    )
}

pub fn y2024() -> PeriodKey {
    PeriodKey::year(2024)
}

pub fn y2025() -> PeriodKey {
    PeriodKey::year(2025)
}
