//! Concurrent retrieval from the fundamentals provider and the quote page

use crate::error::FetchError;
use crate::ticker::Ticker;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Flat record of named fields returned by a fundamentals provider
///
/// The field set is provider-defined and partial: any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub fields: BTreeMap<String, Value>,
}

impl ProviderRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ProviderRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Raw markup of a scraped page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub html: String,
}

/// Structured fundamentals and price data for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Result<ProviderRecord, FetchError>;

    /// Every field name this provider may return
    fn supported_fields(&self) -> &'static [&'static str];
}

/// Raw quote page markup for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, ticker: &Ticker) -> Result<ScrapedPage, FetchError>;
}

/// Independent outcomes of both retrieval paths for one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub ticker: Ticker,
    /// Reference time of the refresh, used to resolve relative timestamps
    pub fetched_at: DateTime<Utc>,
    pub provider: Result<ProviderRecord, FetchError>,
    pub scrape: Result<ScrapedPage, FetchError>,
}

/// Issues both retrievals concurrently under one shared deadline
pub struct Fetcher<F, P> {
    fundamentals: F,
    pages: P,
    timeout: Duration,
}

impl<F: FundamentalsSource, P: PageSource> Fetcher<F, P> {
    pub fn new(fundamentals: F, pages: P, timeout: Duration) -> Self {
        Self {
            fundamentals,
            pages,
            timeout,
        }
    }

    pub fn fundamentals(&self) -> &F {
        &self.fundamentals
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch both paths, stamping the result with the current time
    pub async fn fetch(&self, ticker: &Ticker) -> FetchResult {
        self.fetch_at(ticker, Utc::now()).await
    }

    /// Fetch both paths; returns once both settled or the deadline passed
    ///
    /// A path still pending at the deadline is dropped and reported as
    /// `Timeout`. A settled path keeps its outcome either way.
    #[instrument(skip(self), fields(ticker = %ticker))]
    pub async fn fetch_at(&self, ticker: &Ticker, fetched_at: DateTime<Utc>) -> FetchResult {
        let deadline = Instant::now() + self.timeout;

        let (provider, scrape) = tokio::join!(
            settle(deadline, "fundamentals", self.fundamentals.fetch_fundamentals(ticker)),
            settle(deadline, "quote page", self.pages.fetch_page(ticker)),
        );

        match (&provider, &scrape) {
            (Ok(_), Ok(_)) => info!("Both sources settled for {}", ticker),
            _ => {
                if let Err(e) = &provider {
                    warn!("Fundamentals unavailable for {}: {}", ticker, e);
                }
                if let Err(e) = &scrape {
                    warn!("Quote page unavailable for {}: {}", ticker, e);
                }
            }
        }

        FetchResult {
            ticker: ticker.clone(),
            fetched_at,
            provider,
            scrape,
        }
    }
}

async fn settle<T>(
    deadline: Instant,
    path: &'static str,
    retrieval: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match tokio::time::timeout_at(deadline, retrieval).await {
        Ok(outcome) => outcome,
        Err(_) => Err(FetchError::timeout(format!(
            "{path} did not settle before the deadline"
        ))),
    }
}
