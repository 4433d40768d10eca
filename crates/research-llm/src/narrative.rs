//! Written analysis of a stock report

use crate::{CompletionRequest, LLMError, LLMProvider, Message, Result};
use research_core::normalizer::truncate_summary;
use research_core::{Field, StockReport};
use std::fmt::Write as _;
use tracing::{debug, instrument};

const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: usize = 2048;

/// Longest news summary passed to the model
pub const NEWS_SUMMARY_CLIP: usize = 200;

const SYSTEM_PROMPT: &str = "You are a careful equity research analyst. \
Base every statement on the data provided and say so when a value is N/A.";

const REPORT_SECTIONS: &str = "Provide a comprehensive report with:
1. **Company Overview**: Business model and industry position
2. **Financial Health**: Analysis of key metrics and ratios
3. **Valuation Assessment**: Fair value estimate and comparison
4. **Recent Developments**: News impact analysis
5. **Investment Thesis**: Conviction level and time horizon
6. **Recommendation**: Buy/Hold/Sell with price targets
7. **Risk Factors**: Key risks to the investment thesis";

/// Model settings for narratives
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl NarrativeConfig {
    /// Defaults, with the model taken from `OPENAI_MODEL` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// The report rendered into prompt sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRequest {
    pub ticker: String,
    pub company_name: String,
    pub price: String,
    pub stats: String,
    pub news: String,
}

impl NarrativeRequest {
    pub fn from_report(report: &StockReport) -> Self {
        let quote = report.quote();
        let price = quote.price.display_with(|price| match &quote.currency {
            Field::Present(currency) => format!("{price:.2} {currency}"),
            Field::Unavailable => format!("{price:.2}"),
        });

        let mut stats = String::new();
        for (category, entries) in report.categorized().iter() {
            let _ = writeln!(stats, "**{category}**");
            for stat in entries {
                let _ = writeln!(stats, "- {}: {}", stat.label, stat.display);
            }
        }

        let news = report
            .news()
            .iter()
            .map(|item| {
                let when = item
                    .published_at
                    .display_with(|at| at.format("%Y-%m-%d %H:%M UTC").to_string());
                let summary = truncate_summary(&item.summary, NEWS_SUMMARY_CLIP);
                if summary.is_empty() {
                    format!("- {} ({when})", item.headline)
                } else {
                    format!("- {} ({when}): {summary}", item.headline)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            ticker: report.ticker().to_string(),
            company_name: report.company_name().display_with(String::clone),
            price,
            stats: stats.trim_end().to_string(),
            news: if news.is_empty() {
                "No recent news available.".to_string()
            } else {
                news
            },
        }
    }

    /// The user prompt
    pub fn render(&self) -> String {
        format!(
            "Analyze {} ({}) stock with the following data:\n\n\
             **Current Price:** {}\n\n\
             **Key Statistics:**\n{}\n\n\
             **Recent News Highlights:**\n{}\n\n\
             {REPORT_SECTIONS}",
            self.ticker, self.company_name, self.price, self.stats, self.news
        )
    }
}

/// Sends reports to a model and returns its analysis
pub struct Narrator<P> {
    provider: P,
    config: NarrativeConfig,
}

impl<P: LLMProvider> Narrator<P> {
    pub fn new(provider: P, config: NarrativeConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    /// Build the completion request for a report
    pub fn request(&self, report: &StockReport) -> CompletionRequest {
        CompletionRequest::builder(&self.config.model)
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(NarrativeRequest::from_report(report).render()))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build()
    }

    #[instrument(skip(self, report), fields(ticker = %report.ticker(), model = %self.config.model))]
    pub async fn narrate(&self, report: &StockReport) -> Result<String> {
        let response = self.provider.complete(self.request(report)).await?;
        debug!(
            "Narrative finished ({:?}, {} tokens)",
            response.stop_reason,
            response.usage.total()
        );

        let text = response.message.text().trim();
        if text.is_empty() {
            return Err(LLMError::UnexpectedResponse(
                "Model returned an empty narrative".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}
