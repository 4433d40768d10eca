//! Canonical data model produced by normalization

use crate::field::Field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest price snapshot for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Field<f64>,
    pub previous_close: Field<f64>,
    pub currency: Field<String>,
    /// When the refresh that produced this quote started
    pub as_of: DateTime<Utc>,
}

impl Quote {
    /// A quote with every value unavailable
    pub fn unavailable(as_of: DateTime<Utc>) -> Self {
        Self {
            price: Field::Unavailable,
            previous_close: Field::Unavailable,
            currency: Field::Unavailable,
            as_of,
        }
    }

    /// Absolute change against the previous close
    pub fn change(&self) -> Field<f64> {
        match (self.price, self.previous_close) {
            (Field::Present(price), Field::Present(prev)) => Field::Present(price - prev),
            _ => Field::Unavailable,
        }
    }

    /// Change as a fraction of the previous close
    pub fn change_fraction(&self) -> Field<f64> {
        match (self.price, self.previous_close) {
            (Field::Present(price), Field::Present(prev)) if prev != 0.0 => {
                Field::Present((price - prev) / prev)
            }
            _ => Field::Unavailable,
        }
    }
}

/// Semantic bucket a statistic is displayed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Valuation,
    Financial,
    Dividends,
    Trading,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Valuation,
        Category::Financial,
        Category::Dividends,
        Category::Trading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valuation => "Valuation",
            Self::Financial => "Financial",
            Self::Dividends => "Dividends",
            Self::Trading => "Trading",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a statistic is rendered for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Currency,
    /// Stored as a fraction, displayed ×100 with a `%` suffix
    Percentage,
    Ratio,
    Raw,
    /// Counts such as volume, displayed with K/M/B/T suffixes
    LargeNumber,
}

/// Concrete statistic value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

/// A named metric as reported by the fundamentals provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    /// Provider field name, e.g. `trailingPE`
    pub name: String,
    pub kind: FormatKind,
    pub value: Field<StatValue>,
}

impl Statistic {
    pub fn new(name: impl Into<String>, kind: FormatKind, value: Field<StatValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn number(name: impl Into<String>, kind: FormatKind, value: f64) -> Self {
        Self::new(name, kind, Field::Present(StatValue::Number(value)))
    }

    pub fn unavailable(name: impl Into<String>, kind: FormatKind) -> Self {
        Self::new(name, kind, Field::Unavailable)
    }
}

/// One article scraped from the quote page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: Field<String>,
    pub published_at: Field<DateTime<Utc>>,
    pub headline: String,
    /// Possibly truncated, never longer than the configured cap
    pub summary: String,
    /// Absolute URL of the article
    pub link: Field<String>,
}
