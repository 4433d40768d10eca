//! Immutable research report assembled from normalized parts

use crate::categorizer::{CategorizedStatistics, FormattedStatistic};
use crate::error::ErrorKind;
use crate::field::Field;
use crate::model::{Category, NewsItem, Quote};
use crate::ticker::Ticker;
use serde::Serialize;
use std::cmp::Ordering;

/// Which retrieval paths failed during the refresh, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceHealth {
    pub provider: Option<ErrorKind>,
    pub scrape: Option<ErrorKind>,
}

impl SourceHealth {
    pub fn is_healthy(&self) -> bool {
        self.provider.is_none() && self.scrape.is_none()
    }
}

/// Everything known about one ticker after a refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReport {
    ticker: Ticker,
    company_name: Field<String>,
    quote: Quote,
    statistics: CategorizedStatistics,
    news: Vec<NewsItem>,
    sources: SourceHealth,
}

impl StockReport {
    /// Combine the normalized parts into a report
    ///
    /// News is ordered newest first. Undated items follow all dated ones and
    /// keep their relative order.
    pub fn assemble(
        ticker: Ticker,
        quote: Quote,
        statistics: CategorizedStatistics,
        mut news: Vec<NewsItem>,
    ) -> Self {
        news.sort_by(newest_first);
        Self {
            ticker,
            company_name: Field::Unavailable,
            quote,
            statistics,
            news,
            sources: SourceHealth::default(),
        }
    }

    pub fn with_company_name(mut self, name: Field<String>) -> Self {
        self.company_name = name;
        self
    }

    pub fn with_source_health(mut self, sources: SourceHealth) -> Self {
        self.sources = sources;
        self
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn company_name(&self) -> &Field<String> {
        &self.company_name
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn categorized(&self) -> &CategorizedStatistics {
        &self.statistics
    }

    pub fn statistics(&self, category: Category) -> &[FormattedStatistic] {
        self.statistics.get(category)
    }

    pub fn news(&self) -> &[NewsItem] {
        &self.news
    }

    pub fn sources(&self) -> SourceHealth {
        self.sources
    }

    /// True when at least one retrieval path failed
    pub fn is_degraded(&self) -> bool {
        !self.sources.is_healthy()
    }
}

fn newest_first(a: &NewsItem, b: &NewsItem) -> Ordering {
    match (&a.published_at, &b.published_at) {
        (Field::Present(a), Field::Present(b)) => b.cmp(a),
        (Field::Present(_), Field::Unavailable) => Ordering::Less,
        (Field::Unavailable, Field::Present(_)) => Ordering::Greater,
        (Field::Unavailable, Field::Unavailable) => Ordering::Equal,
    }
}
