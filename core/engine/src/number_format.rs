//! FILENAME: core/engine/src/number_format.rs
//! PURPOSE: Number formatting for statement display strings.
//! CONTEXT: A report declares defaults per format kind in its `formatting`
//! block; individual layout rows may override them. Formatting never
//! touches the numeric amount, it only produces the string shown next to it.
//! A blank (undefined) amount formats to the empty string.

use serde::{Deserialize, Serialize};

/// The display kinds a row can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Currency,
    Percent,
    Integer,
    Decimal,
}

/// Optional formatting knobs; unset fields fall through to the next layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thousands: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl FormatSpec {
    /// Fills unset fields of `self` from `fallback`.
    pub fn or(&self, fallback: &FormatSpec) -> FormatSpec {
        FormatSpec {
            decimals: self.decimals.or(fallback.decimals),
            thousands: self.thousands.or(fallback.thousands),
            symbol: self.symbol.clone().or_else(|| fallback.symbol.clone()),
        }
    }
}

/// The report-level `formatting` block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<FormatSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<FormatSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer: Option<FormatSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal: Option<FormatSpec>,
}

impl FormattingDefaults {
    pub fn spec_for(&self, kind: FormatKind) -> Option<&FormatSpec> {
        match kind {
            FormatKind::Currency => self.currency.as_ref(),
            FormatKind::Percent => self.percent.as_ref(),
            FormatKind::Integer => self.integer.as_ref(),
            FormatKind::Decimal => self.decimal.as_ref(),
        }
    }

    /// Merges, field by field: row override, then this block, then built-ins.
    pub fn resolve(&self, kind: FormatKind, row_override: Option<&FormatSpec>) -> ResolvedFormat {
        let empty = FormatSpec::default();
        let merged = row_override
            .unwrap_or(&empty)
            .or(self.spec_for(kind).unwrap_or(&empty))
            .or(&builtin(kind));

        ResolvedFormat {
            kind,
            decimals: if kind == FormatKind::Integer {
                0
            } else {
                merged.decimals.unwrap_or(0)
            },
            thousands: merged.thousands.unwrap_or(false),
            symbol: merged.symbol.filter(|s| !s.is_empty()),
        }
    }

    /// Layers `overrides` on top of this block.
    pub fn overlay(&self, overrides: &FormattingDefaults) -> FormattingDefaults {
        let layer = |top: &Option<FormatSpec>, bottom: &Option<FormatSpec>| match (top, bottom) {
            (Some(t), Some(b)) => Some(t.or(b)),
            (Some(t), None) => Some(t.clone()),
            (None, b) => b.clone(),
        };
        FormattingDefaults {
            currency: layer(&overrides.currency, &self.currency),
            percent: layer(&overrides.percent, &self.percent),
            integer: layer(&overrides.integer, &self.integer),
            decimal: layer(&overrides.decimal, &self.decimal),
        }
    }
}

fn builtin(kind: FormatKind) -> FormatSpec {
    let (decimals, thousands) = match kind {
        FormatKind::Currency => (0, true),
        FormatKind::Percent => (1, false),
        FormatKind::Integer => (0, true),
        FormatKind::Decimal => (2, true),
    };
    FormatSpec {
        decimals: Some(decimals),
        thousands: Some(thousands),
        symbol: None,
    }
}

/// A fully specified format, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFormat {
    pub kind: FormatKind,
    pub decimals: u8,
    pub thousands: bool,
    pub symbol: Option<String>,
}

/// Formats a value; `None` (an undefined cell) yields an empty string.
pub fn format_value(value: Option<f64>, format: &ResolvedFormat) -> String {
    match value {
        Some(v) if v.is_finite() => format_number(v, format),
        _ => String::new(),
    }
}

/// Format a finite number according to the resolved format.
pub fn format_number(value: f64, format: &ResolvedFormat) -> String {
    match format.kind {
        FormatKind::Currency => format_currency(value, format),
        FormatKind::Percent => format!("{}%", format_decimal(value, format.decimals, format.thousands)),
        FormatKind::Integer | FormatKind::Decimal => {
            format_decimal(value, format.decimals, format.thousands)
        }
    }
}

/// Negative currency amounts are shown in parentheses.
fn format_currency(value: f64, format: &ResolvedFormat) -> String {
    let rounded = round_half_away(value, format.decimals);
    let digits = format_decimal(rounded.abs(), format.decimals, format.thousands);
    let body = match &format.symbol {
        Some(symbol) => format!("{} {}", symbol, digits),
        None => digits,
    };

    if rounded < 0.0 {
        format!("({})", body)
    } else {
        body
    }
}

/// Fixed decimals with optional thousands separator; never prints "-0".
fn format_decimal(value: f64, decimal_places: u8, use_thousands_separator: bool) -> String {
    let rounded = round_half_away(value, decimal_places);
    // Adding 0.0 turns -0.0 into 0.0.
    let text = format!("{:.prec$}", rounded + 0.0, prec = decimal_places as usize);

    if use_thousands_separator {
        add_thousands_separator(&text)
    } else {
        text
    }
}

/// Rounds halves away from zero. The result is what gets printed, so the
/// sign and zero checks agree with the digits.
fn round_half_away(value: f64, decimal_places: u8) -> f64 {
    let scale = 10f64.powi(decimal_places as i32);
    (value * scale).round() / scale
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (s, None),
    };

    let negative = integer_part.starts_with('-');
    let digits: Vec<char> = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::with_capacity(s.len() + digits.len() / 3 + 1);
    if negative {
        result.push('-');
    }
    let len = digits.len();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(decimals: u8, thousands: bool, symbol: &str) -> ResolvedFormat {
        ResolvedFormat {
            kind: FormatKind::Currency,
            decimals,
            thousands,
            symbol: Some(symbol.to_string()),
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_number(100000.0, &currency(0, true, "€")), "€ 100,000");
        assert_eq!(format_number(-1500.0, &currency(0, true, "€")), "(€ 1,500)");
        assert_eq!(format_number(1234.5, &currency(2, false, "$")), "$ 1234.50");
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let format = currency(0, true, "€");
        assert_eq!(
            format_number(100000.0, &format),
            format_number(100000.0, &format)
        );
    }

    #[test]
    fn test_format_percent() {
        let format = FormattingDefaults::default().resolve(FormatKind::Percent, None);
        assert_eq!(format_number(12.345, &format), "12.3%");
        assert_eq!(format_number(-20.0, &format), "-20.0%");
    }

    #[test]
    fn test_integer_ignores_decimals() {
        let override_spec = FormatSpec {
            decimals: Some(3),
            ..Default::default()
        };
        let format = FormattingDefaults::default().resolve(FormatKind::Integer, Some(&override_spec));
        assert_eq!(format.decimals, 0);
        assert_eq!(format_number(1234567.6, &format), "1,234,568");
    }

    #[test]
    fn test_negative_zero_is_not_printed() {
        let format = FormattingDefaults::default().resolve(FormatKind::Decimal, None);
        assert_eq!(format_number(-0.001, &format), "0.00");
        assert_eq!(format_number(-0.4, &currency(0, true, "€")), "€ 0");
        assert_eq!(format_number(-0.004, &currency(2, false, "€")), "€ 0.00");
    }

    #[test]
    fn test_halves_round_away_from_zero() {
        let whole = FormatSpec {
            decimals: Some(0),
            ..Default::default()
        };
        let integer = FormattingDefaults::default().resolve(FormatKind::Decimal, Some(&whole));
        assert_eq!(format_number(-0.5, &integer), "-1");
        assert_eq!(format_number(2.5, &integer), "3");
        assert_eq!(format_number(1234.5, &integer), "1,235");
        assert_eq!(format_number(-0.5, &currency(0, true, "€")), "(€ 1)");
        assert_eq!(format_number(1234.5, &currency(0, true, "€")), "€ 1,235");
        assert_eq!(format_number(0.125, &currency(2, false, "$")), "$ 0.13");
    }

    #[test]
    fn test_blank_values() {
        let format = FormattingDefaults::default().resolve(FormatKind::Decimal, None);
        assert_eq!(format_value(None, &format), "");
        assert_eq!(format_value(Some(f64::NAN), &format), "");
        assert_eq!(format_value(Some(2.0), &format), "2.00");
    }

    #[test]
    fn test_merge_order() {
        let defaults = FormattingDefaults {
            currency: Some(FormatSpec {
                decimals: Some(2),
                thousands: None,
                symbol: Some("€".to_string()),
            }),
            ..Default::default()
        };

        let plain = defaults.resolve(FormatKind::Currency, None);
        assert_eq!(plain.decimals, 2);
        assert!(plain.thousands);
        assert_eq!(plain.symbol.as_deref(), Some("€"));

        let row = FormatSpec {
            decimals: Some(0),
            ..Default::default()
        };
        let overridden = defaults.resolve(FormatKind::Currency, Some(&row));
        assert_eq!(overridden.decimals, 0);
        assert_eq!(overridden.symbol.as_deref(), Some("€"));
    }

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let base = FormattingDefaults {
            currency: Some(FormatSpec {
                decimals: Some(2),
                thousands: Some(true),
                symbol: Some("€".to_string()),
            }),
            ..Default::default()
        };
        let overrides = FormattingDefaults {
            currency: Some(FormatSpec {
                symbol: Some("kr".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = base.overlay(&overrides);
        let currency = merged.currency.unwrap();
        assert_eq!(currency.symbol.as_deref(), Some("kr"));
        assert_eq!(currency.decimals, Some(2));
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(add_thousands_separator("1234567"), "1,234,567");
        assert_eq!(add_thousands_separator("123"), "123");
        assert_eq!(add_thousands_separator("-1234.56"), "-1,234.56");
    }
}
