//! Value coercion for operand comparison
//!
//! Literals in a clause always arrive as text. Record values are JSON values.
//! These helpers decide when a pair compares as numbers and when as text.

use std::borrow::Cow;
use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NUMERIC_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$")
        .expect("numeric text pattern is a valid regex")
});

/// Parse text as a finite number, after trimming. Empty text is not a number.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !NUMERIC_TEXT.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric view of a record value: numbers, and strings holding numeric text
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Text view of a scalar record value; `None` for null, arrays and objects
pub fn text_value(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(number_text(n))),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Canonical text of a number; integral floats drop their fraction (30.0 -> "30")
pub fn number_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

/// Loose equality between a record value and a literal.
///
/// - number vs numeric literal: numeric equality (`30 = '30'`, `30 = 30.0`)
/// - number vs other literal: canonical number text vs literal
/// - string: exact text equality, no numeric coercion between two texts
/// - bool: `"true"` / `"false"` text equality
/// - null, array, object: never equal
pub fn loose_equals(value: &Value, literal: &str) -> bool {
    match value {
        Value::Number(n) => match (n.as_f64(), parse_number(literal)) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => number_text(n) == literal,
        },
        Value::String(s) => s == literal,
        Value::Bool(_) => text_value(value).is_some_and(|text| text == literal),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Ordering of a record value against a literal for relational comparators.
///
/// Numeric when both sides are numeric, lexicographic on text otherwise.
/// `None` when the value has no scalar form.
pub fn relational_order(value: &Value, literal: &str) -> Option<Ordering> {
    if let (Some(lhs), Some(rhs)) = (numeric_value(value), parse_number(literal)) {
        return lhs.partial_cmp(&rhs);
    }
    text_value(value).map(|text| (*text).cmp(literal))
}
