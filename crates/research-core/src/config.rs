//! Configuration for stock research refreshes

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Smallest summary cap that still leaves room for the ellipsis marker
const MIN_SUMMARY_CAP: usize = 4;

/// Number formatting conventions for currency and grouped digits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub currency_symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for Locale {
    fn default() -> Self {
        Self::en_us()
    }
}

impl Locale {
    pub fn en_us() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    pub fn de_de() -> Self {
        Self {
            currency_symbol: "€".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }
}

/// Configuration for a research pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Overall deadline for both retrieval paths
    pub fetch_timeout: Duration,

    /// Per HTTP request timeout
    pub request_timeout: Duration,

    /// Maximum summary length in characters, ellipsis included
    pub summary_cap: usize,

    /// Maximum number of news articles kept from the page
    pub max_news_items: usize,

    /// User-Agent sent with every Yahoo request
    pub user_agent: String,

    /// Base URL of the scraped quote pages, also used to absolutize links
    pub scrape_base_url: String,

    /// Requests per minute allowed against the fundamentals API
    pub rate_limit_per_minute: u32,

    /// Display conventions used when formatting statistics
    pub locale: Locale,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            summary_cap: 200,
            max_news_items: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scrape_base_url: "https://finance.yahoo.com".to_string(),
            rate_limit_per_minute: 60,
            locale: Locale::default(),
        }
    }
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Apply `RESEARCH_*` environment overrides
    pub fn with_env(self) -> Result<Self> {
        let config = ResearchConfigBuilder::from_config(self).with_env()?.build()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if self.summary_cap < MIN_SUMMARY_CAP {
            return Err(StockError::ConfigError(format!(
                "summary_cap must be at least {MIN_SUMMARY_CAP}"
            )));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(StockError::ConfigError(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.scrape_base_url)
            .map_err(|e| StockError::ConfigError(format!("scrape_base_url is not a URL: {e}")))?;

        Ok(())
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    fetch_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    summary_cap: Option<usize>,
    max_news_items: Option<usize>,
    user_agent: Option<String>,
    scrape_base_url: Option<String>,
    rate_limit_per_minute: Option<u32>,
    locale: Option<Locale>,
}

impl ResearchConfigBuilder {
    fn from_config(config: ResearchConfig) -> Self {
        Self {
            fetch_timeout: Some(config.fetch_timeout),
            request_timeout: Some(config.request_timeout),
            summary_cap: Some(config.summary_cap),
            max_news_items: Some(config.max_news_items),
            user_agent: Some(config.user_agent),
            scrape_base_url: Some(config.scrape_base_url),
            rate_limit_per_minute: Some(config.rate_limit_per_minute),
            locale: Some(config.locale),
        }
    }

    /// Set the overall fetch deadline
    pub fn fetch_timeout(mut self, duration: Duration) -> Self {
        self.fetch_timeout = Some(duration);
        self
    }

    /// Set the per request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the summary length cap
    pub fn summary_cap(mut self, cap: usize) -> Self {
        self.summary_cap = Some(cap);
        self
    }

    /// Set the maximum number of news articles
    pub fn max_news_items(mut self, max: usize) -> Self {
        self.max_news_items = Some(max);
        self
    }

    /// Set the scraper User-Agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the quote page base URL
    pub fn scrape_base_url(mut self, url: impl Into<String>) -> Self {
        self.scrape_base_url = Some(url.into());
        self
    }

    /// Set the fundamentals API rate limit
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set the display locale
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Load overrides from `RESEARCH_*` environment variables
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(secs) = env_parse::<u64>("RESEARCH_FETCH_TIMEOUT_SECS")? {
            self.fetch_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(cap) = env_parse::<usize>("RESEARCH_SUMMARY_CAP")? {
            self.summary_cap = Some(cap);
        }
        if let Some(max) = env_parse::<usize>("RESEARCH_MAX_NEWS")? {
            self.max_news_items = Some(max);
        }
        if let Ok(url) = std::env::var("RESEARCH_SCRAPE_URL") {
            self.scrape_base_url = Some(url);
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let defaults = ResearchConfig::default();

        let config = ResearchConfig {
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            summary_cap: self.summary_cap.unwrap_or(defaults.summary_cap),
            max_news_items: self.max_news_items.unwrap_or(defaults.max_news_items),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            scrape_base_url: self.scrape_base_url.unwrap_or(defaults.scrape_base_url),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            locale: self.locale.unwrap_or(defaults.locale),
        };

        config.validate()?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| StockError::ConfigError(format!("{name} has invalid value {raw:?}"))),
        Err(_) => Ok(None),
    }
}
