//! Quote page retrieval for news and fallback price scraping

use crate::config::ResearchConfig;
use crate::error::{FetchError, Result};
use crate::fetcher::{PageSource, ScrapedPage};
use crate::ticker::Ticker;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

/// Fetches `{base}/quote/{TICKER}` with a browser User-Agent
#[derive(Debug, Clone)]
pub struct YahooQuotePage {
    client: Client,
    base_url: String,
}

impl YahooQuotePage {
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.scrape_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, ticker: &Ticker) -> String {
        format!("{}/quote/{}", self.base_url, ticker)
    }
}

#[async_trait]
impl PageSource for YahooQuotePage {
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn fetch_page(&self, ticker: &Ticker) -> std::result::Result<ScrapedPage, FetchError> {
        let url = self.page_url(ticker);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status(), "quote page"));
        }

        // Redirects (e.g. consent walls) change the base for relative links
        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), final_url);

        Ok(ScrapedPage {
            url: final_url,
            html,
        })
    }
}
