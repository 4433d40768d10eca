//! Field-by-field extraction from scraped quote page markup

use super::numeric::parse_number;
use super::timestamp::parse_timestamp;
use crate::fetcher::ScrapedPage;
use crate::field::Field;
use crate::model::NewsItem;
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Marker appended to truncated summaries
pub const ELLIPSIS: &str = "...";

/// Separator between source and age in a combined publishing line
const PUBLISHING_SEPARATOR: char = '•';

/// CSS selectors describing where each field lives on the quote page
///
/// The page structure is owned by a third party; when it changes, extraction
/// degrades to unavailable fields rather than errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeLayout {
    pub article: String,
    pub headline: String,
    pub source: String,
    pub timestamp: String,
    /// Combined "Source • 2 hours ago" line used by newer page versions
    pub publishing: String,
    pub summary: String,
    pub link: String,
    pub price: String,
    pub previous_close: String,
    pub company_name: String,
}

impl Default for ScrapeLayout {
    fn default() -> Self {
        Self::yahoo()
    }
}

impl ScrapeLayout {
    /// Yahoo Finance quote page
    pub fn yahoo() -> Self {
        Self {
            article: "li.js-stream-content, li.stream-item, section[data-testid=\"storyitem\"]"
                .to_string(),
            headline: "h3".to_string(),
            source: "div[class~=\"C(#959595)\"]".to_string(),
            timestamp: "time[datetime], span[class~=\"C(#959595)\"]".to_string(),
            publishing: "div.publishing".to_string(),
            summary: "p".to_string(),
            link: "a[href]".to_string(),
            price: "fin-streamer[data-field=\"regularMarketPrice\"], \
                    [data-testid=\"qsp-price\"]"
                .to_string(),
            previous_close: "fin-streamer[data-field=\"regularMarketPreviousClose\"], \
                             td[data-test=\"PREV_CLOSE-value\"]"
                .to_string(),
            company_name: "h1".to_string(),
        }
    }
}

/// Selectors compiled once per extraction; an invalid selector disables its field
struct CompiledLayout {
    article: Option<Selector>,
    headline: Option<Selector>,
    source: Option<Selector>,
    timestamp: Option<Selector>,
    publishing: Option<Selector>,
    summary: Option<Selector>,
    link: Option<Selector>,
    price: Option<Selector>,
    previous_close: Option<Selector>,
    company_name: Option<Selector>,
}

impl CompiledLayout {
    fn new(layout: &ScrapeLayout) -> Self {
        Self {
            article: compile(&layout.article),
            headline: compile(&layout.headline),
            source: compile(&layout.source),
            timestamp: compile(&layout.timestamp),
            publishing: compile(&layout.publishing),
            summary: compile(&layout.summary),
            link: compile(&layout.link),
            price: compile(&layout.price),
            previous_close: compile(&layout.previous_close),
            company_name: compile(&layout.company_name),
        }
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Ignoring invalid selector {:?}: {:?}", selector, e);
            None
        }
    }
}

/// Options controlling article extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions<'a> {
    pub layout: &'a ScrapeLayout,
    /// Fallback base for relative links when the page URL is unusable
    pub base_url: &'a str,
    pub summary_cap: usize,
    pub max_news_items: usize,
    /// Reference time for relative timestamps
    pub reference: DateTime<Utc>,
}

/// Everything pulled out of one quote page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrapedFields {
    pub company_name: Field<String>,
    pub price: Field<f64>,
    pub previous_close: Field<f64>,
    pub news: Vec<NewsItem>,
}

/// Extract price, name and articles; never fails
pub fn extract(page: &ScrapedPage, options: &ExtractOptions<'_>) -> ScrapedFields {
    let document = Html::parse_document(&page.html);
    let selectors = CompiledLayout::new(options.layout);
    let base = Url::parse(&page.url)
        .or_else(|_| Url::parse(options.base_url))
        .ok();

    let root = document.root_element();

    let news = match &selectors.article {
        Some(article_selector) => document
            .select(article_selector)
            .filter_map(|article| extract_article(article, &selectors, base.as_ref(), options))
            .take(options.max_news_items)
            .collect(),
        None => Vec::new(),
    };

    ScrapedFields {
        company_name: first_text(root, selectors.company_name.as_ref()),
        price: first_number(root, selectors.price.as_ref()),
        previous_close: first_number(root, selectors.previous_close.as_ref()),
        news,
    }
}

fn extract_article(
    article: ElementRef<'_>,
    selectors: &CompiledLayout,
    base: Option<&Url>,
    options: &ExtractOptions<'_>,
) -> Option<NewsItem> {
    let Field::Present(headline) = first_text(article, selectors.headline.as_ref()) else {
        debug!("Skipping article without a headline");
        return None;
    };

    let (line_source, line_age) = match first_text(article, selectors.publishing.as_ref()) {
        Field::Present(line) => split_publishing_line(&line),
        Field::Unavailable => (Field::Unavailable, Field::Unavailable),
    };

    let source = first_text(article, selectors.source.as_ref()).or(line_source);

    let published_at = first_timestamp_text(article, selectors.timestamp.as_ref())
        .or(line_age)
        .and_then(|raw| parse_timestamp(&raw, options.reference));

    let summary = match first_text(article, selectors.summary.as_ref()) {
        Field::Present(text) => truncate_summary(&text, options.summary_cap),
        Field::Unavailable => String::new(),
    };

    let link = first_attr(article, selectors.link.as_ref(), "href")
        .and_then(|href| resolve_link(&href, base));

    Some(NewsItem {
        source,
        published_at,
        headline,
        summary,
        link,
    })
}

/// Split "Reuters • 2 hours ago" into its source and age parts
fn split_publishing_line(line: &str) -> (Field<String>, Field<String>) {
    match line.split_once(PUBLISHING_SEPARATOR) {
        Some((source, age)) => (non_empty(source), non_empty(age)),
        None => (non_empty(line), Field::Unavailable),
    }
}

fn non_empty(text: &str) -> Field<String> {
    let text = text.trim();
    if text.is_empty() {
        Field::Unavailable
    } else {
        Field::Present(text.to_string())
    }
}

fn first_text(scope: ElementRef<'_>, selector: Option<&Selector>) -> Field<String> {
    selector
        .and_then(|s| scope.select(s).next())
        .map_or(Field::Unavailable, |element| {
            non_empty(&clean_text(&element.text().collect::<String>()))
        })
}

/// Prefer a machine-readable `datetime` attribute over visible text
fn first_timestamp_text(scope: ElementRef<'_>, selector: Option<&Selector>) -> Field<String> {
    let Some(element) = selector.and_then(|s| scope.select(s).next()) else {
        return Field::Unavailable;
    };
    element
        .value()
        .attr("datetime")
        .map_or_else(
            || non_empty(&clean_text(&element.text().collect::<String>())),
            non_empty,
        )
}

fn first_attr(scope: ElementRef<'_>, selector: Option<&Selector>, attr: &str) -> Field<String> {
    selector
        .and_then(|s| scope.select(s).next())
        .and_then(|element| element.value().attr(attr))
        .map_or(Field::Unavailable, non_empty)
}

/// Streamer elements carry the machine value in `value`/`data-value`
fn first_number(scope: ElementRef<'_>, selector: Option<&Selector>) -> Field<f64> {
    let Some(element) = selector.and_then(|s| scope.select(s).next()) else {
        return Field::Unavailable;
    };
    let attrs = element.value();
    attrs
        .attr("value")
        .or_else(|| attrs.attr("data-value"))
        .map_or(Field::Unavailable, parse_number)
        .or_else(|| parse_number(&element.text().collect::<String>()))
}

/// Absolute http(s) URL for an article link
fn resolve_link(href: &str, base: Option<&Url>) -> Field<String> {
    if href.starts_with('#') || href.starts_with("javascript:") {
        return Field::Unavailable;
    }

    let resolved = match Url::parse(href) {
        Ok(absolute) => Some(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.and_then(|b| b.join(href).ok()),
        Err(_) => None,
    };

    match resolved {
        Some(url) if matches!(url.scheme(), "http" | "https") => Field::Present(url.into()),
        _ => Field::Unavailable,
    }
}

/// Collapse runs of whitespace and trim
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Shorten to at most `cap` characters, cutting at a word boundary
///
/// The ellipsis counts towards the cap. A single word longer than the cap is
/// cut mid-word since no boundary exists.
pub fn truncate_summary(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }

    let budget = cap.saturating_sub(ELLIPSIS.len());
    if budget == 0 {
        return ELLIPSIS.chars().take(cap).collect();
    }

    let prefix: String = text.chars().take(budget).collect();
    let next_is_boundary = text
        .chars()
        .nth(budget)
        .is_some_and(char::is_whitespace);

    let cut = if next_is_boundary {
        prefix.trim_end()
    } else {
        match prefix.rfind(char::is_whitespace) {
            Some(index) if index > 0 => prefix[..index].trim_end(),
            _ => prefix.as_str(),
        }
    };

    format!("{cut}{ELLIPSIS}")
}
