//! Refresh pipeline: validate, fetch, normalize, categorize, assemble

use crate::api::{YahooFundamentals, YahooQuotePage};
use crate::categorizer::{categorize, check_coverage};
use crate::config::{Locale, ResearchConfig};
use crate::error::{Result, StockError};
use crate::fetcher::{Fetcher, FundamentalsSource, PageSource};
use crate::normalizer::{NormalizeConfig, normalize};
use crate::report::{SourceHealth, StockReport};
use crate::ticker::Ticker;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// One refresh from raw ticker input to finished report
///
/// Once the ticker is valid a refresh always produces a report; source
/// failures show up as unavailable fields and in [`SourceHealth`].
pub struct Pipeline<F, P> {
    fetcher: Fetcher<F, P>,
    normalize: NormalizeConfig,
    locale: Locale,
}

impl Pipeline<YahooFundamentals, YahooQuotePage> {
    /// Pipeline backed by the Yahoo provider and quote page
    pub fn yahoo(config: &ResearchConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(
            YahooFundamentals::new(config)?,
            YahooQuotePage::new(config)?,
            config.fetch_timeout,
        );
        Ok(Self::new(fetcher, config))
    }
}

impl<F: FundamentalsSource, P: PageSource> Pipeline<F, P> {
    pub fn new(fetcher: Fetcher<F, P>, config: &ResearchConfig) -> Self {
        let uncovered = check_coverage(fetcher.fundamentals().supported_fields());
        if !uncovered.is_empty() {
            warn!(
                "Provider fields without a category will be dropped: {}",
                uncovered.join(", ")
            );
        }

        Self {
            fetcher,
            normalize: NormalizeConfig::from(config),
            locale: config.locale.clone(),
        }
    }

    /// Replace the normalization settings, e.g. to use another page layout
    pub fn with_normalize_config(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    /// Validate `raw` and refresh it
    ///
    /// Invalid input is rejected before any fetch is issued.
    pub async fn refresh(&self, raw: &str) -> Result<StockReport> {
        let ticker = Ticker::parse(raw)?;
        Ok(self.refresh_ticker(&ticker, Utc::now()).await)
    }

    /// Refresh an already validated ticker, stamping the quote with `as_of`
    pub async fn refresh_ticker(&self, ticker: &Ticker, as_of: DateTime<Utc>) -> StockReport {
        let fetch = self.fetcher.fetch_at(ticker, as_of).await;

        let sources = SourceHealth {
            provider: fetch.provider.as_ref().err().map(|e| e.kind),
            scrape: fetch.scrape.as_ref().err().map(|e| e.kind),
        };

        let normalized = normalize(&fetch, &self.normalize);
        let statistics = categorize(&normalized.statistics, &self.locale);

        info!(
            "Refreshed {}: {} statistics, {} articles{}",
            ticker,
            statistics.len(),
            normalized.news.len(),
            if sources.is_healthy() { "" } else { " (degraded)" }
        );

        StockReport::assemble(fetch.ticker, normalized.quote, statistics, normalized.news)
            .with_company_name(normalized.company_name)
            .with_source_health(sources)
    }
}

/// Refreshes issued by one presentation session
///
/// At most one refresh per ticker is in flight: a new request aborts the
/// previous one. Quote timestamps never go backwards for a ticker.
pub struct Session<F, P> {
    pipeline: Arc<Pipeline<F, P>>,
    in_flight: HashMap<Ticker, AbortHandle>,
    last_as_of: HashMap<Ticker, DateTime<Utc>>,
}

impl<F, P> Session<F, P>
where
    F: FundamentalsSource + 'static,
    P: PageSource + 'static,
{
    pub fn new(pipeline: Pipeline<F, P>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            in_flight: HashMap::new(),
            last_as_of: HashMap::new(),
        }
    }

    /// Start a refresh on the runtime
    pub fn refresh(&mut self, raw: &str) -> Result<RefreshHandle> {
        self.refresh_at(raw, Utc::now())
    }

    /// Start a refresh with `now` as the wall clock reading
    pub fn refresh_at(&mut self, raw: &str, now: DateTime<Utc>) -> Result<RefreshHandle> {
        let ticker = Ticker::parse(raw)?;

        // last_as_of is kept for the whole session; it backs the as_of ordering
        self.in_flight.retain(|_, handle| !handle.is_finished());

        if let Some(previous) = self.in_flight.remove(&ticker) {
            if !previous.is_finished() {
                debug!("Superseding in-flight refresh for {}", ticker);
            }
            previous.abort();
        }

        let as_of = self
            .last_as_of
            .get(&ticker)
            .map_or(now, |last| now.max(*last));
        self.last_as_of.insert(ticker.clone(), as_of);

        let pipeline = Arc::clone(&self.pipeline);
        let task_ticker = ticker.clone();
        let handle =
            tokio::spawn(async move { pipeline.refresh_ticker(&task_ticker, as_of).await });
        self.in_flight.insert(ticker.clone(), handle.abort_handle());

        Ok(RefreshHandle {
            ticker,
            as_of,
            handle,
        })
    }

    /// Number of tickers with a refresh still running
    pub fn in_flight(&self) -> usize {
        self.in_flight.values().filter(|h| !h.is_finished()).count()
    }
}

/// A refresh running in the background
pub struct RefreshHandle {
    ticker: Ticker,
    as_of: DateTime<Utc>,
    handle: JoinHandle<StockReport>,
}

impl RefreshHandle {
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Wait for the report
    ///
    /// Returns [`StockError::Superseded`] if a newer refresh for the same
    /// ticker aborted this one.
    pub async fn report(self) -> Result<StockReport> {
        match self.handle.await {
            Ok(report) => Ok(report),
            Err(e) if e.is_cancelled() => Err(StockError::Superseded(self.ticker.to_string())),
            Err(e) => Err(StockError::Other(format!(
                "Refresh for {} failed: {}",
                self.ticker, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FetchError};
    use crate::fetcher::{
        MockFundamentalsSource, MockPageSource, ProviderRecord, ScrapedPage,
    };
    use crate::field::Field;
    use crate::model::Category;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::time::Duration;

    const KNOWN_FIELDS: &[&str] = &["trailingPE", "revenueGrowth"];

    fn mock_fundamentals() -> MockFundamentalsSource {
        let mut fundamentals = MockFundamentalsSource::new();
        fundamentals
            .expect_supported_fields()
            .returning(|| KNOWN_FIELDS);
        fundamentals
    }

    fn config() -> ResearchConfig {
        ResearchConfig::default()
    }

    #[tokio::test]
    async fn test_invalid_ticker_issues_no_fetch() {
        let mut fundamentals = mock_fundamentals();
        fundamentals.expect_fetch_fundamentals().times(0);
        let mut pages = MockPageSource::new();
        pages.expect_fetch_page().times(0);

        let pipeline = Pipeline::new(
            Fetcher::new(fundamentals, pages, Duration::from_secs(1)),
            &config(),
        );

        for raw in ["", "   ", "A$PL", "TOOLONGTICKERSYMBOL"] {
            let err = pipeline.refresh(raw).await.unwrap_err();
            assert!(matches!(err, StockError::InvalidTicker { .. }), "{raw:?}");
        }
    }

    #[tokio::test]
    async fn test_refresh_produces_formatted_report() {
        let mut fundamentals = mock_fundamentals();
        fundamentals.expect_fetch_fundamentals().returning(|_| {
            Ok([
                ("trailingPE", json!("N/A")),
                ("revenueGrowth", json!("12.4%")),
                ("regularMarketPrice", json!(875.28)),
                ("shortName", json!("NVIDIA Corporation")),
            ]
            .into_iter()
            .collect())
        });
        let mut pages = MockPageSource::new();
        pages
            .expect_fetch_page()
            .returning(|_| Err(FetchError::timeout("page did not settle")));

        let pipeline = Pipeline::new(
            Fetcher::new(fundamentals, pages, Duration::from_secs(1)),
            &config(),
        );
        let report = pipeline.refresh(" nvda").await.unwrap();

        assert_eq!(report.ticker().as_str(), "NVDA");
        assert_eq!(report.quote().price, Field::Present(875.28));
        assert_eq!(
            report.company_name(),
            &Field::Present("NVIDIA Corporation".to_string())
        );

        let pe = report.categorized().find("trailingPE").unwrap();
        assert_eq!(pe.display, "N/A");
        let growth = report
            .statistics(Category::Financial)
            .iter()
            .find(|s| s.name == "revenueGrowth")
            .unwrap();
        assert_eq!(growth.display, "12.40%");

        assert!(report.news().is_empty());
        assert!(report.is_degraded());
        assert_eq!(report.sources().scrape, Some(ErrorKind::Timeout));
        assert_eq!(report.sources().provider, None);
    }

    #[tokio::test]
    async fn test_total_failure_still_yields_report() {
        let mut fundamentals = mock_fundamentals();
        fundamentals
            .expect_fetch_fundamentals()
            .returning(|_| Err(FetchError::not_found("unknown symbol")));
        let mut pages = MockPageSource::new();
        pages
            .expect_fetch_page()
            .returning(|_| Err(FetchError::not_found("404")));

        let pipeline = Pipeline::new(
            Fetcher::new(fundamentals, pages, Duration::from_secs(1)),
            &config(),
        );
        let report = pipeline.refresh("ZZZZ").await.unwrap();

        assert_eq!(report.quote().price, Field::Unavailable);
        assert!(
            report
                .categorized()
                .iter()
                .flat_map(|(_, stats)| stats)
                .all(|s| s.display == "N/A")
        );
        assert_eq!(report.sources().provider, Some(ErrorKind::NotFound));
    }

    struct StaticFundamentals;

    #[async_trait]
    impl FundamentalsSource for StaticFundamentals {
        async fn fetch_fundamentals(
            &self,
            _ticker: &Ticker,
        ) -> std::result::Result<ProviderRecord, FetchError> {
            Ok([("regularMarketPrice", json!(10.0))].into_iter().collect())
        }

        fn supported_fields(&self) -> &'static [&'static str] {
            KNOWN_FIELDS
        }
    }

    /// Page source that never settles before the fetch deadline
    struct StalledPage;

    #[async_trait]
    impl PageSource for StalledPage {
        async fn fetch_page(
            &self,
            ticker: &Ticker,
        ) -> std::result::Result<ScrapedPage, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ScrapedPage {
                url: format!("https://example.test/quote/{ticker}"),
                html: String::new(),
            })
        }
    }

    fn session() -> Session<StaticFundamentals, StalledPage> {
        Session::new(Pipeline::new(
            Fetcher::new(StaticFundamentals, StalledPage, Duration::from_secs(5)),
            &config(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_refresh_supersedes_in_flight_one() {
        let mut session = session();

        let first = session.refresh("NVDA").unwrap();
        let second = session.refresh("nvda").unwrap();

        assert!(matches!(
            first.report().await,
            Err(StockError::Superseded(ticker)) if ticker == "NVDA"
        ));

        let report = second.report().await.unwrap();
        assert_eq!(report.quote().price, Field::Present(10.0));
        assert_eq!(report.sources().scrape, Some(ErrorKind::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_tickers_do_not_interfere() {
        let mut session = session();

        let nvda = session.refresh("NVDA").unwrap();
        let aapl = session.refresh("AAPL").unwrap();
        assert_eq!(session.in_flight(), 2);

        assert_eq!(nvda.report().await.unwrap().ticker().as_str(), "NVDA");
        assert_eq!(aapl.report().await.unwrap().ticker().as_str(), "AAPL");
    }

    #[tokio::test(start_paused = true)]
    async fn test_as_of_never_decreases() {
        let mut session = session();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 11, 59, 0).unwrap();

        let first = session.refresh_at("NVDA", later).unwrap();
        assert_eq!(first.as_of(), later);

        // wall clock stepped backwards
        let second = session.refresh_at("NVDA", earlier).unwrap();
        assert_eq!(second.as_of(), later);
        assert_eq!(second.report().await.unwrap().quote().as_of, later);

        // other tickers keep their own history
        let other = session.refresh_at("AAPL", earlier).unwrap();
        assert_eq!(other.as_of(), earlier);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_refreshes_are_pruned() {
        let mut session = session();

        for raw in ["NVDA", "AAPL", "MSFT"] {
            session.refresh(raw).unwrap().report().await.unwrap();
        }
        assert_eq!(session.in_flight(), 0);

        let amzn = session.refresh("AMZN").unwrap();
        assert_eq!(session.in_flight.len(), 1);
        amzn.report().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_rejects_invalid_input() {
        let mut session = session();
        assert!(matches!(
            session.refresh("not a ticker"),
            Err(StockError::InvalidTicker { .. })
        ));
        assert_eq!(session.in_flight(), 0);
    }
}
