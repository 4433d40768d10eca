//! Tolerant numeric and text extraction from provider values

use crate::field::Field;
use crate::model::{FormatKind, StatValue};
use serde_json::Value;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// Text the provider uses to mean "no value"
const MISSING_TOKENS: &[&str] = &["", "n/a", "na", "-", "--", "\u{2014}", "none", "null", "nan"];

fn is_missing(text: &str) -> bool {
    MISSING_TOKENS
        .iter()
        .any(|token| text.eq_ignore_ascii_case(token))
}

/// Parse a human-formatted number
///
/// Accepts thousands separators, currency symbols, parenthesised negatives,
/// a trailing `%` (result is a fraction) and K/M/B/T suffixes. Anything that
/// is not a finite number is `Unavailable`, never zero.
pub fn parse_number(raw: &str) -> Field<f64> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return Field::Unavailable;
    }

    let (parenthesised, body) = match trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let mut cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}') && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    let mut scale = 1.0;
    let mut divisor = 1.0;
    if cleaned.ends_with('%') {
        cleaned.pop();
        divisor = 100.0;
    } else if let Some(last) = cleaned.chars().last() {
        let multiplier = match last.to_ascii_uppercase() {
            'K' => 1e3,
            'M' => 1e6,
            'B' => 1e9,
            'T' => 1e12,
            _ => 1.0,
        };
        if multiplier > 1.0 {
            cleaned.pop();
            scale = multiplier;
        }
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let value = if parenthesised { -value.abs() } else { value };
            Field::Present(value * scale / divisor)
        }
        _ => Field::Unavailable,
    }
}

/// Numeric value of a provider field
///
/// Provider values arrive as numbers, strings, or `{ "raw": .., "fmt": .. }`
/// objects; `raw` wins over `fmt`.
pub fn number_from_value(value: Option<&Value>) -> Field<f64> {
    match value {
        Some(Value::Number(number)) => number.as_f64().filter(|v| v.is_finite()).into(),
        Some(Value::String(text)) => parse_number(text),
        Some(Value::Object(map)) => {
            number_from_value(map.get("raw")).or_else(|| number_from_value(map.get("fmt")))
        }
        None | Some(Value::Null | Value::Bool(_) | Value::Array(_)) => Field::Unavailable,
    }
}

/// Textual value of a provider field, whitespace-trimmed
pub fn text_from_value(value: Option<&Value>) -> Field<String> {
    match value {
        Some(Value::String(text)) => {
            let text = text.trim();
            if is_missing(text) {
                Field::Unavailable
            } else {
                Field::Present(text.to_string())
            }
        }
        Some(Value::Number(number)) => Field::Present(number.to_string()),
        Some(Value::Object(map)) => text_from_value(map.get("fmt"))
            .or_else(|| text_from_value(map.get("longFmt")))
            .or_else(|| text_from_value(map.get("raw"))),
        None | Some(Value::Null | Value::Bool(_) | Value::Array(_)) => Field::Unavailable,
    }
}

/// Statistic value for a field of the given kind
///
/// Only `Raw` statistics may fall back to text; every other kind must be
/// numeric or it is unavailable.
pub fn statistic_value(value: Option<&Value>, kind: FormatKind) -> Field<StatValue> {
    let number = number_from_value(value).map(StatValue::Number);
    match kind {
        FormatKind::Raw => number.or_else(|| text_from_value(value).map(StatValue::Text)),
        _ => number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_number("42"), Field::Present(42.0));
        assert_eq!(parse_number(" -3.5 "), Field::Present(-3.5));
        assert_eq!(parse_number("0"), Field::Present(0.0));
        assert_eq!(parse_number("1e3"), Field::Present(1000.0));
    }

    #[test]
    fn test_separators_and_symbols() {
        assert_eq!(parse_number("$1,234.50"), Field::Present(1234.5));
        assert_eq!(parse_number("€ 2 500"), Field::Present(2500.0));
        assert_eq!(parse_number("(1,000)"), Field::Present(-1000.0));
        assert_eq!(parse_number("-$12.00"), Field::Present(-12.0));
    }

    #[test]
    fn test_percent_and_suffixes() {
        assert_eq!(parse_number("12.4%"), Field::Present(0.124));
        assert_eq!(parse_number("0%"), Field::Present(0.0));
        assert_eq!(parse_number("2.5B"), Field::Present(2.5e9));
        assert_eq!(parse_number("3.1t"), Field::Present(3.1e12));
        assert_eq!(parse_number("45.6K"), Field::Present(45_600.0));
    }

    #[test]
    fn test_garbage_is_unavailable_not_zero() {
        for raw in ["N/A", "n/a", "", "  ", "-", "--", "NaN", "inf", "abc", "12abc", "%", "B"] {
            assert_eq!(parse_number(raw), Field::Unavailable, "{raw:?}");
        }
    }

    #[test]
    fn test_number_from_provider_shapes() {
        assert_eq!(number_from_value(Some(&json!(1.5))), Field::Present(1.5));
        assert_eq!(number_from_value(Some(&json!("1,500"))), Field::Present(1500.0));
        assert_eq!(
            number_from_value(Some(&json!({"raw": 0.25, "fmt": "25.00%"}))),
            Field::Present(0.25)
        );
        assert_eq!(
            number_from_value(Some(&json!({"fmt": "25.00%"}))),
            Field::Present(0.25)
        );
        assert_eq!(number_from_value(Some(&json!({}))), Field::Unavailable);
        assert_eq!(number_from_value(Some(&Value::Null)), Field::Unavailable);
        assert_eq!(number_from_value(Some(&json!(true))), Field::Unavailable);
        assert_eq!(number_from_value(None), Field::Unavailable);
    }

    #[test]
    fn test_text_from_provider_shapes() {
        assert_eq!(
            text_from_value(Some(&json!(" NVIDIA Corporation "))),
            Field::Present("NVIDIA Corporation".to_string())
        );
        assert_eq!(text_from_value(Some(&json!("N/A"))), Field::Unavailable);
        assert_eq!(
            text_from_value(Some(&json!({"raw": 1, "fmt": "1.00"}))),
            Field::Present("1.00".to_string())
        );
    }

    #[test]
    fn test_only_raw_kind_falls_back_to_text() {
        let text = json!("Strong Buy");
        assert_eq!(
            statistic_value(Some(&text), FormatKind::Raw),
            Field::Present(StatValue::Text("Strong Buy".to_string()))
        );
        assert_eq!(statistic_value(Some(&text), FormatKind::Ratio), Field::Unavailable);
        assert_eq!(
            statistic_value(Some(&json!("N/A")), FormatKind::Ratio),
            Field::Unavailable
        );
    }
}
