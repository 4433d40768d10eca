//! Publication timestamp parsing into UTC

use crate::field::Field;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:about\s+)?(\d+|an?|one)\s+(sec|second|min|minute|hr|hour|day|week|month|mo|year|yr)s?\s+ago$",
    )
    .expect("relative timestamp pattern is valid")
});

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a timestamp as found on a page or in a feed
///
/// Relative forms ("2 hours ago", "yesterday") are resolved against
/// `reference`, the time of the fetch, so that parsing is repeatable.
/// Anything unrecognised is `Unavailable`; the current time is never used.
pub fn parse_timestamp(raw: &str, reference: DateTime<Utc>) -> Field<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return Field::Unavailable;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Field::Present(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Field::Present(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Field::Present(parsed.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).into();
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return parse_epoch(text);
    }

    parse_relative(text, reference)
}

fn parse_epoch(digits: &str) -> Field<DateTime<Utc>> {
    let Ok(value) = digits.parse::<i64>() else {
        return Field::Unavailable;
    };
    // 13 digits and up are milliseconds
    let parsed = if digits.len() >= 13 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };
    parsed.into()
}

fn parse_relative(text: &str, reference: DateTime<Utc>) -> Field<DateTime<Utc>> {
    let lowered = text.to_ascii_lowercase();
    match lowered.as_str() {
        "now" | "just now" => return Field::Present(reference),
        "yesterday" => return Field::Present(reference - Duration::days(1)),
        _ => {}
    }

    let Some(captures) = RELATIVE.captures(&lowered) else {
        return Field::Unavailable;
    };

    let amount = match &captures[1] {
        "a" | "an" | "one" => 1,
        digits => match digits.parse::<i64>() {
            Ok(n) => n,
            Err(_) => return Field::Unavailable,
        },
    };

    let unit = match &captures[2] {
        "sec" | "second" => Duration::try_seconds(amount),
        "min" | "minute" => Duration::try_minutes(amount),
        "hr" | "hour" => Duration::try_hours(amount),
        "day" => Duration::try_days(amount),
        "week" => Duration::try_weeks(amount),
        "mo" | "month" => Duration::try_days(amount.saturating_mul(30)),
        _ => Duration::try_days(amount.saturating_mul(365)),
    };

    unit.and_then(|offset| reference.checked_sub_signed(offset))
        .into()
}
