//! Yahoo Finance fundamentals provider

use crate::config::ResearchConfig;
use crate::error::{ErrorKind, FetchError, Result, StockError};
use crate::fetcher::{FundamentalsSource, ProviderRecord};
use crate::ticker::Ticker;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde_json::{Value, json};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;
type RecordOutcome = std::result::Result<ProviderRecord, FetchError>;

/// Statistic fields the quoteSummary modules can return
const STATISTIC_FIELDS: &[&str] = &[
    "marketCap",
    "enterpriseValue",
    "trailingPE",
    "forwardPE",
    "priceToSalesTrailing12Months",
    "priceToBook",
    "totalRevenue",
    "revenuePerShare",
    "revenueGrowth",
    "profitMargins",
    "operatingMargins",
    "ebitda",
    "totalDebt",
    "debtToEquity",
    "dividendYield",
    "dividendRate",
    "payoutRatio",
    "fiveYearAvgDividendYield",
    "beta",
    "fiftyTwoWeekHigh",
    "fiftyTwoWeekLow",
    "fiftyDayAverage",
    "twoHundredDayAverage",
    "volume",
    "averageVolume",
    "shortRatio",
];

/// Fundamentals from the Yahoo chart and quoteSummary endpoints
///
/// The latest daily quote and the statistics are fetched independently; the
/// record is returned as long as either of them succeeded. The summary
/// connector is kept behind a lock so its crumb and cookie are reused.
#[derive(Clone)]
pub struct YahooFundamentals {
    quotes: Arc<yahoo::YahooConnector>,
    summary: Arc<Mutex<yahoo::YahooConnector>>,
    rate_limiter: SharedRateLimiter,
}

impl fmt::Debug for YahooFundamentals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YahooFundamentals").finish_non_exhaustive()
    }
}

impl YahooFundamentals {
    /// Create a provider from the research configuration
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.rate_limit_per_minute).ok_or_else(|| {
            StockError::ConfigError("rate_limit_per_minute must be greater than 0".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            quotes: Arc::new(connector(config)?),
            summary: Arc::new(Mutex::new(connector(config)?)),
            rate_limiter,
        })
    }

    /// Latest daily quote as provider fields
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn latest_quote(&self, ticker: &Ticker) -> RecordOutcome {
        self.rate_limiter.until_ready().await;

        let response = self
            .quotes
            .get_latest_quotes(ticker.as_str(), "1d")
            .await
            .map_err(classify_yahoo_error)?;
        let quote = response.last_quote().map_err(classify_yahoo_error)?;

        let mut record = ProviderRecord::new();
        record.insert("regularMarketPrice", json!(quote.close));
        record.insert("regularMarketTime", json!(quote.timestamp));
        record.insert("regularMarketVolume", json!(quote.volume));
        Ok(record)
    }

    /// Statistics from the quoteSummary modules
    ///
    /// The connector performs the crumb and cookie handshake and retries once
    /// when Yahoo rejects a stale crumb.
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn quote_summary(&self, ticker: &Ticker) -> RecordOutcome {
        self.rate_limiter.until_ready().await;

        let summary = self
            .summary
            .lock()
            .await
            .get_ticker_info(ticker.as_str())
            .await
            .map_err(classify_yahoo_error)?;

        let body = serde_json::to_value(&summary)
            .map_err(|e| FetchError::parse(format!("quoteSummary body: {e}")))?;
        flatten_quote_summary(&body)
    }
}

fn connector(config: &ResearchConfig) -> Result<yahoo::YahooConnector> {
    yahoo::YahooConnector::builder()
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| StockError::ConfigError(format!("yahoo connector: {e}")))
}

#[async_trait]
impl FundamentalsSource for YahooFundamentals {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> RecordOutcome {
        let (quote, summary) = tokio::join!(self.latest_quote(ticker), self.quote_summary(ticker));
        merge_records(quote, summary)
    }

    fn supported_fields(&self) -> &'static [&'static str] {
        STATISTIC_FIELDS
    }
}

/// Combine the two partial lookups; the live quote wins on shared fields
fn merge_records(quote: RecordOutcome, summary: RecordOutcome) -> RecordOutcome {
    match (quote, summary) {
        (Ok(quote), Ok(mut summary)) => {
            summary.fields.extend(quote.fields);
            Ok(summary)
        }
        (Ok(quote), Err(e)) => {
            debug!("quoteSummary failed, keeping quote only: {}", e);
            Ok(quote)
        }
        (Err(e), Ok(summary)) => {
            debug!("Latest quote failed, keeping statistics only: {}", e);
            Ok(summary)
        }
        // the statistics failure says more about the ticker than the chart one
        (Err(_), Err(e)) => Err(e),
    }
}

/// Flatten `quoteSummary.result[0]` modules into one record
///
/// Modules are visited in name order and the first non-null occurrence of a
/// field wins. `maxAge` bookkeeping entries are skipped.
pub fn flatten_quote_summary(body: &Value) -> RecordOutcome {
    let Some(summary) = body.get("quoteSummary").filter(|s| !s.is_null()) else {
        return Err(match body.pointer("/finance/error").filter(|e| !e.is_null()) {
            Some(error) => FetchError::new(ErrorKind::Unreachable, describe(error)),
            None => FetchError::parse("missing quoteSummary"),
        });
    };

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
        return Err(if code.eq_ignore_ascii_case("Not Found") {
            FetchError::not_found(describe(error))
        } else {
            FetchError::new(ErrorKind::Unreachable, describe(error))
        });
    }

    let modules = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::not_found("quoteSummary returned no result"))?;

    let mut record = ProviderRecord::new();
    for module in modules.values().filter_map(Value::as_object) {
        for (name, value) in module {
            if name == "maxAge" || value.is_null() {
                continue;
            }
            record
                .fields
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
    Ok(record)
}

fn describe(error: &Value) -> String {
    error
        .get("description")
        .or_else(|| error.get("code"))
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string()
}

fn classify_yahoo_error(err: yahoo::YahooError) -> FetchError {
    use yahoo::YahooError;

    let message = err.to_string();
    let kind = match &err {
        YahooError::TooManyRequests(_) => ErrorKind::RateLimited,
        // the connector already refreshed the crumb once; Yahoo is refusing us
        YahooError::InvalidCrumb | YahooError::Unauthorized => ErrorKind::RateLimited,
        YahooError::NoResult | YahooError::NoQuotes => ErrorKind::NotFound,
        YahooError::DeserializeFailed(_)
        | YahooError::DeserializeFailedDebug(_)
        | YahooError::DataInconsistency
        | YahooError::MissingField(_) => ErrorKind::ParseFailure,
        YahooError::ConnectionFailed(e) if e.is_timeout() => ErrorKind::Timeout,
        _ => {
            let lowered = message.to_ascii_lowercase();
            if ["404", "not found", "no data"].iter().any(|m| lowered.contains(m)) {
                ErrorKind::NotFound
            } else if lowered.contains("429") || lowered.contains("too many") {
                ErrorKind::RateLimited
            } else {
                ErrorKind::Unreachable
            }
        }
    };
    FetchError::new(kind, message)
}
