//! End-to-end refresh behaviour with in-process sources

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use research_core::categorizer::STATISTIC_TABLE;
use research_core::fetcher::{ProviderRecord, ScrapedPage};
use research_core::{
    Category, ErrorKind, FetchError, FetchResult, Fetcher, Field, FundamentalsSource,
    NormalizeConfig, PageSource, Pipeline, ResearchConfig, Statistic, StockReport, Ticker,
    categorize, normalize,
};
use serde_json::{Value, json};
use std::time::Duration;

const PAGE: &str = r#"
<html><body>
  <h1>NVIDIA Corporation (NVDA)</h1>
  <fin-streamer data-field="regularMarketPrice" value="875.28">875.28</fin-streamer>
  <ul>
    <li class="js-stream-content">
      <div class="C(#959595)">Reuters</div>
      <span class="C(#959595)">3 hours ago</span>
      <a href="/news/older.html"><h3>Older story</h3></a>
      <p>Chipmaker shares slipped in early trading.</p>
    </li>
    <li class="js-stream-content">
      <a href="/news/undated.html"><h3>Undated story</h3></a>
    </li>
    <li class="js-stream-content">
      <time datetime="2024-05-01T11:30:00Z">30 minutes ago</time>
      <a href="https://example.test/fresh"><h3>Fresh story</h3></a>
      <p>Quarterly revenue rose sharply on data center demand.</p>
    </li>
  </ul>
</body></html>
"#;

struct StubFundamentals {
    outcome: Result<ProviderRecord, FetchError>,
}

#[async_trait]
impl FundamentalsSource for StubFundamentals {
    async fn fetch_fundamentals(&self, _ticker: &Ticker) -> Result<ProviderRecord, FetchError> {
        self.outcome.clone()
    }

    fn supported_fields(&self) -> &'static [&'static str] {
        &[]
    }
}

struct StubPage {
    delay: Duration,
    html: &'static str,
}

#[async_trait]
impl PageSource for StubPage {
    async fn fetch_page(&self, ticker: &Ticker) -> Result<ScrapedPage, FetchError> {
        tokio::time::sleep(self.delay).await;
        Ok(ScrapedPage {
            url: format!("https://finance.example.test/quote/{ticker}"),
            html: self.html.to_string(),
        })
    }
}

fn record(fields: &[(&str, Value)]) -> ProviderRecord {
    fields.iter().cloned().collect()
}

fn fetched_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn pipeline(
    provider: Result<ProviderRecord, FetchError>,
    page_delay: Duration,
) -> Pipeline<StubFundamentals, StubPage> {
    let config = ResearchConfig::builder()
        .fetch_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    Pipeline::new(
        Fetcher::new(
            StubFundamentals { outcome: provider },
            StubPage {
                delay: page_delay,
                html: PAGE,
            },
            config.fetch_timeout,
        ),
        &config,
    )
}

async fn refresh(pipeline: &Pipeline<StubFundamentals, StubPage>) -> StockReport {
    pipeline
        .refresh_ticker(&Ticker::parse("NVDA").unwrap(), fetched_at())
        .await
}

#[tokio::test]
async fn malformed_provider_fields_render_as_unavailable() {
    let pipeline = pipeline(
        Ok(record(&[
            ("trailingPE", json!("N/A")),
            ("revenueGrowth", json!("12.4%")),
            ("beta", json!(0)),
        ])),
        Duration::ZERO,
    );
    let report = refresh(&pipeline).await;

    let stats = report.categorized();
    assert_eq!(stats.find("trailingPE").unwrap().display, "N/A");
    assert_eq!(stats.find("revenueGrowth").unwrap().display, "12.40%");
    // zero is a real value, not a missing one
    assert_eq!(stats.find("beta").unwrap().display, "0");
    assert_eq!(stats.len(), STATISTIC_TABLE.len());
    assert_eq!(stats.dropped(), 0);
}

#[tokio::test]
async fn news_is_sorted_newest_first_with_undated_last() {
    let pipeline = pipeline(Ok(ProviderRecord::new()), Duration::ZERO);
    let report = refresh(&pipeline).await;

    let headlines: Vec<_> = report.news().iter().map(|n| n.headline.as_str()).collect();
    assert_eq!(headlines, vec!["Fresh story", "Older story", "Undated story"]);

    let older = &report.news()[1];
    assert_eq!(older.source, Field::Present("Reuters".to_string()));
    assert_eq!(
        older.published_at,
        Field::Present(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
    );
    assert_eq!(
        older.link,
        Field::Present("https://finance.example.test/news/older.html".to_string())
    );
    assert_eq!(report.news()[2].published_at, Field::Unavailable);
}

#[tokio::test]
async fn scraped_price_fills_in_when_provider_fails() {
    let pipeline = pipeline(
        Err(FetchError::new(ErrorKind::RateLimited, "slow down")),
        Duration::ZERO,
    );
    let report = refresh(&pipeline).await;

    assert_eq!(report.quote().price, Field::Present(875.28));
    assert_eq!(report.quote().as_of, fetched_at());
    assert_eq!(
        report.company_name(),
        &Field::Present("NVIDIA Corporation (NVDA)".to_string())
    );
    assert_eq!(report.sources().provider, Some(ErrorKind::RateLimited));
    for (_, stats) in report.categorized().iter() {
        assert!(stats.iter().all(|s| s.display == "N/A"));
    }
}

#[tokio::test(start_paused = true)]
async fn slow_page_times_out_without_losing_statistics() {
    let pipeline = pipeline(
        Ok(record(&[("marketCap", json!({"raw": 2.15e12, "fmt": "2.15T"}))])),
        Duration::from_secs(30),
    );
    let report = refresh(&pipeline).await;

    assert!(report.news().is_empty());
    assert_eq!(report.sources().scrape, Some(ErrorKind::Timeout));
    assert_eq!(report.sources().provider, None);
    assert_eq!(
        report.categorized().find("marketCap").unwrap().display,
        "$2,150,000,000,000.00"
    );
}

#[test]
fn normalization_is_idempotent() {
    let fetch = FetchResult {
        ticker: Ticker::parse("NVDA").unwrap(),
        fetched_at: fetched_at(),
        provider: Ok(record(&[("forwardPE", json!("35.1")), ("volume", json!(1_234_567))])),
        scrape: Ok(ScrapedPage {
            url: "https://finance.example.test/quote/NVDA".to_string(),
            html: PAGE.to_string(),
        }),
    };
    let config = NormalizeConfig::default();

    assert_eq!(normalize(&fetch, &config), normalize(&fetch, &config));
}

#[test]
fn categorization_accounts_for_every_statistic() {
    let mut statistics: Vec<Statistic> = STATISTIC_TABLE
        .iter()
        .map(|spec| Statistic::unavailable(spec.name, spec.kind))
        .collect();
    statistics.push(Statistic::number(
        "someNewField",
        research_core::FormatKind::Raw,
        1.0,
    ));
    statistics.push(Statistic::number(
        "anotherField",
        research_core::FormatKind::Ratio,
        2.0,
    ));

    let categorized = categorize(&statistics, &ResearchConfig::default().locale);

    let grouped: usize = Category::ALL
        .iter()
        .map(|c| categorized.get(*c).len())
        .sum();
    assert_eq!(grouped + categorized.dropped(), statistics.len());
    assert_eq!(categorized.dropped_names(), ["someNewField", "anotherField"]);
}
