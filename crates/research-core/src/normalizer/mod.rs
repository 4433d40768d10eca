//! Conversion of raw fetch outcomes into the canonical model
//!
//! Normalization is total: every missing or malformed input becomes an
//! explicit [`Field::Unavailable`] and partial results are always preferred
//! to none.

pub mod numeric;
pub mod scrape;
pub mod timestamp;

pub use numeric::parse_number;
pub use scrape::{ScrapeLayout, ScrapedFields, clean_text, truncate_summary};
pub use timestamp::parse_timestamp;

use crate::categorizer::STATISTIC_TABLE;
use crate::config::ResearchConfig;
use crate::fetcher::{FetchResult, ProviderRecord};
use crate::field::Field;
use crate::model::{NewsItem, Quote, Statistic};
use numeric::{number_from_value, statistic_value, text_from_value};
use scrape::ExtractOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Provider fields holding the current price, most authoritative first
const PRICE_FIELDS: &[&str] = &["regularMarketPrice", "currentPrice"];
const PREVIOUS_CLOSE_FIELDS: &[&str] = &["regularMarketPreviousClose", "previousClose"];
const NAME_FIELDS: &[&str] = &["shortName", "longName"];
const CURRENCY_FIELDS: &[&str] = &["currency", "financialCurrency"];

/// Settings that shape normalization output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub summary_cap: usize,
    pub max_news_items: usize,
    /// Base for relative article links
    pub base_url: String,
    pub layout: ScrapeLayout,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::from(&ResearchConfig::default())
    }
}

impl From<&ResearchConfig> for NormalizeConfig {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            summary_cap: config.summary_cap,
            max_news_items: config.max_news_items,
            base_url: config.scrape_base_url.clone(),
            layout: ScrapeLayout::default(),
        }
    }
}

/// Canonical values produced from one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub company_name: Field<String>,
    pub quote: Quote,
    /// One entry per known statistic, in table order
    pub statistics: Vec<Statistic>,
    /// In page order; sorting happens at assembly
    pub news: Vec<NewsItem>,
}

/// Normalize both retrieval outcomes; never fails
pub fn normalize(fetch: &FetchResult, config: &NormalizeConfig) -> Normalized {
    let record = fetch.provider.as_ref().ok();

    let scraped = match &fetch.scrape {
        Ok(page) => scrape::extract(
            page,
            &ExtractOptions {
                layout: &config.layout,
                base_url: &config.base_url,
                summary_cap: config.summary_cap,
                max_news_items: config.max_news_items,
                reference: fetch.fetched_at,
            },
        ),
        Err(_) => ScrapedFields::default(),
    };

    let quote = Quote {
        price: first_number(record, PRICE_FIELDS).or(scraped.price),
        previous_close: first_number(record, PREVIOUS_CLOSE_FIELDS).or(scraped.previous_close),
        currency: first_text(record, CURRENCY_FIELDS),
        as_of: fetch.fetched_at,
    };

    let statistics: Vec<Statistic> = STATISTIC_TABLE
        .iter()
        .map(|spec| {
            let raw = record.and_then(|r| r.get(spec.name));
            Statistic::new(spec.name, spec.kind, statistic_value(raw, spec.kind))
        })
        .collect();

    debug!(
        "Normalized {}: {}/{} statistics present, {} articles",
        fetch.ticker,
        statistics.iter().filter(|s| s.value.is_present()).count(),
        statistics.len(),
        scraped.news.len()
    );

    Normalized {
        company_name: first_text(record, NAME_FIELDS).or(scraped.company_name),
        quote,
        statistics,
        news: scraped.news,
    }
}

fn first_number(record: Option<&ProviderRecord>, names: &[&str]) -> Field<f64> {
    let Some(record) = record else {
        return Field::Unavailable;
    };
    names
        .iter()
        .map(|name| number_from_value(record.get(name)))
        .find(Field::is_present)
        .unwrap_or(Field::Unavailable)
}

fn first_text(record: Option<&ProviderRecord>, names: &[&str]) -> Field<String> {
    let Some(record) = record else {
        return Field::Unavailable;
    };
    names
        .iter()
        .map(|name| text_from_value(record.get(name)))
        .find(Field::is_present)
        .unwrap_or(Field::Unavailable)
}
