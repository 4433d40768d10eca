//! Grouping of statistics into display categories, with locale-aware formatting

use crate::config::Locale;
use crate::field::{Field, UNAVAILABLE};
use crate::model::{Category, FormatKind, StatValue, Statistic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Static description of one known statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticSpec {
    /// Provider field name
    pub name: &'static str,
    /// Human-readable label
    pub label: &'static str,
    pub category: Category,
    pub kind: FormatKind,
}

const fn spec(
    name: &'static str,
    label: &'static str,
    category: Category,
    kind: FormatKind,
) -> StatisticSpec {
    StatisticSpec {
        name,
        label,
        category,
        kind,
    }
}

use Category::{Dividends, Financial, Trading, Valuation};
use FormatKind::{Currency, LargeNumber, Percentage, Ratio};

/// Every statistic the report knows how to display, in display order
pub static STATISTIC_TABLE: &[StatisticSpec] = &[
    spec("marketCap", "Market Cap", Valuation, Currency),
    spec("enterpriseValue", "Enterprise Value", Valuation, Currency),
    spec("trailingPE", "P/E Ratio", Valuation, Ratio),
    spec("forwardPE", "Forward P/E", Valuation, Ratio),
    spec("pegRatio", "PEG Ratio", Valuation, Ratio),
    spec("priceToSalesTrailing12Months", "Price/Sales", Valuation, Ratio),
    spec("priceToBook", "Price/Book", Valuation, Ratio),
    spec("totalRevenue", "Revenue", Financial, Currency),
    spec("revenuePerShare", "Revenue/Share", Financial, Currency),
    spec("revenueGrowth", "Revenue Growth", Financial, Percentage),
    spec("profitMargins", "Profit Margin", Financial, Percentage),
    spec("operatingMargins", "Operating Margin", Financial, Percentage),
    spec("ebitda", "EBITDA", Financial, Currency),
    spec("totalDebt", "Total Debt", Financial, Currency),
    spec("debtToEquity", "Debt/Equity", Financial, Ratio),
    spec("dividendYield", "Dividend Yield", Dividends, Percentage),
    spec("dividendRate", "Dividend Rate", Dividends, Currency),
    spec("payoutRatio", "Payout Ratio", Dividends, Percentage),
    spec("fiveYearAvgDividendYield", "5Y Avg Yield", Dividends, Percentage),
    spec("beta", "Beta", Trading, Ratio),
    spec("fiftyTwoWeekHigh", "52W High", Trading, Currency),
    spec("fiftyTwoWeekLow", "52W Low", Trading, Currency),
    spec("fiftyDayAverage", "50D Avg", Trading, Currency),
    spec("twoHundredDayAverage", "200D Avg", Trading, Currency),
    spec("volume", "Volume", Trading, LargeNumber),
    spec("averageVolume", "Avg Volume", Trading, LargeNumber),
    spec("shortRatio", "Short Ratio", Trading, Ratio),
];

/// Find the table entry for a provider field name
pub fn lookup(name: &str) -> Option<&'static StatisticSpec> {
    STATISTIC_TABLE.iter().find(|spec| spec.name == name)
}

/// Provider fields that have no table entry and would be silently dropped
pub fn check_coverage(provider_fields: &[&str]) -> Vec<String> {
    provider_fields
        .iter()
        .filter(|name| lookup(name).is_none())
        .map(|name| (*name).to_string())
        .collect()
}

/// A statistic with its label and display string resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedStatistic {
    pub name: String,
    pub label: String,
    pub kind: FormatKind,
    pub value: Field<StatValue>,
    pub display: String,
}

/// Statistics grouped by category, plus an account of what was dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedStatistics {
    groups: BTreeMap<Category, Vec<FormattedStatistic>>,
    dropped: Vec<String>,
}

impl Default for CategorizedStatistics {
    fn default() -> Self {
        Self {
            groups: Category::ALL.iter().map(|c| (*c, Vec::new())).collect(),
            dropped: Vec::new(),
        }
    }
}

impl CategorizedStatistics {
    /// Statistics in one category, in table order
    pub fn get(&self, category: Category) -> &[FormattedStatistic] {
        self.groups.get(&category).map_or(&[], Vec::as_slice)
    }

    /// All categories in display order, including empty ones
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[FormattedStatistic])> {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Find a statistic by provider field name
    pub fn find(&self, name: &str) -> Option<&FormattedStatistic> {
        self.groups.values().flatten().find(|stat| stat.name == name)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of statistics dropped for having no category
    pub fn dropped(&self) -> usize {
        self.dropped.len()
    }

    pub fn dropped_names(&self) -> &[String] {
        &self.dropped
    }
}

/// Group statistics by their fixed category and format their values
///
/// Unknown names never fail the step; they are dropped and counted.
pub fn categorize(statistics: &[Statistic], locale: &Locale) -> CategorizedStatistics {
    let mut categorized = CategorizedStatistics::default();

    for stat in statistics {
        let Some(spec) = lookup(&stat.name) else {
            debug!("Dropping uncategorized statistic {}", stat.name);
            categorized.dropped.push(stat.name.clone());
            continue;
        };

        let formatted = FormattedStatistic {
            name: stat.name.clone(),
            label: spec.label.to_string(),
            kind: stat.kind,
            value: stat.value.clone(),
            display: format_value(&stat.value, stat.kind, locale),
        };

        categorized
            .groups
            .entry(spec.category)
            .or_default()
            .push(formatted);
    }

    categorized
}

/// Render a value for display; unavailable values always render as `N/A`
pub fn format_value(value: &Field<StatValue>, kind: FormatKind, locale: &Locale) -> String {
    match value {
        Field::Unavailable => UNAVAILABLE.to_string(),
        Field::Present(StatValue::Text(text)) => text.clone(),
        Field::Present(StatValue::Number(number)) => format_number(*number, kind, locale),
    }
}

/// Render a number according to its kind
pub fn format_number(value: f64, kind: FormatKind, locale: &Locale) -> String {
    match kind {
        FormatKind::Currency => format_currency(value, locale),
        FormatKind::Percentage => format!("{}%", format_fixed(value * 100.0, locale)),
        FormatKind::LargeNumber => format_large_number(value, locale),
        FormatKind::Ratio | FormatKind::Raw => format!("{value}"),
    }
}

/// `$1,234.57`, negatives as `-$1,234.57`
pub fn format_currency(value: f64, locale: &Locale) -> String {
    let body = format_fixed(value.abs(), locale);
    if value < 0.0 && !is_zero_at_two_places(value) {
        format!("-{}{}", locale.currency_symbol, body)
    } else {
        format!("{}{}", locale.currency_symbol, body)
    }
}

fn format_large_number(value: f64, locale: &Locale) -> String {
    const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in SUFFIXES {
        if value.abs() >= scale {
            return format!("{}{}", format_fixed(value / scale, locale), suffix);
        }
    }
    format_fixed(value, locale)
}

/// Two decimals with grouped thousands
fn format_fixed(value: f64, locale: &Locale) -> String {
    let negative = value < 0.0 && !is_zero_at_two_places(value);
    let rendered = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(locale.thousands_separator);
        }
        grouped.push(digit);
    }

    format!(
        "{}{}{}{}",
        if negative { "-" } else { "" },
        grouped,
        locale.decimal_separator,
        frac_part
    )
}

fn is_zero_at_two_places(value: f64) -> bool {
    (value * 100.0).round() == 0.0
}
