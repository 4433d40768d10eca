//! Terminal rendering of a stock report

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use research_core::categorizer::{format_currency, format_number};
use research_core::{Field, FormatKind, Locale, StockReport, UNAVAILABLE};
use std::fmt::Write as _;

pub fn heading(title: &str) -> String {
    format!("== {title} ==")
}

fn table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// Header, quote, one table per category, then news
pub fn render_report(report: &StockReport) -> String {
    let locale = Locale::default();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}\n",
        heading(&format!(
            "{} - {}",
            report.ticker(),
            report.company_name().display_with(String::clone)
        ))
    );

    let quote = report.quote();
    let mut quote_table = table(["Quote", "Value"]);
    quote_table.add_row(vec![
        "Price".to_string(),
        quote.price.display_with(|p| format_currency(*p, &locale)),
    ]);
    quote_table.add_row(vec![
        "Previous Close".to_string(),
        quote.previous_close.display_with(|p| format_currency(*p, &locale)),
    ]);
    quote_table.add_row(vec!["Change".to_string(), render_change(report, &locale)]);
    quote_table.add_row(vec![
        "Currency".to_string(),
        quote.currency.display_with(String::clone),
    ]);
    quote_table.add_row(vec![
        "As of".to_string(),
        quote.as_of.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ]);
    let _ = writeln!(out, "{quote_table}\n");

    for (category, stats) in report.categorized().iter() {
        let mut stats_table = table([category.as_str(), "Value"]);
        for stat in stats {
            stats_table.add_row(vec![stat.label.clone(), stat.display.clone()]);
        }
        let _ = writeln!(out, "{stats_table}\n");
    }

    let _ = writeln!(out, "{}", heading("Recent News"));
    if report.news().is_empty() {
        let _ = writeln!(out, "No recent news available.");
    }
    for (i, item) in report.news().iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.headline);
        let _ = writeln!(
            out,
            "   {} | {}",
            item.source.display_with(String::clone),
            item.published_at
                .display_with(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        );
        if !item.summary.is_empty() {
            let _ = writeln!(out, "   {}", item.summary);
        }
        if let Field::Present(link) = &item.link {
            let _ = writeln!(out, "   {link}");
        }
    }

    let sources = report.sources();
    if let Some(kind) = sources.provider {
        let _ = writeln!(out, "\nNote: fundamentals provider {kind}");
    }
    if let Some(kind) = sources.scrape {
        let _ = writeln!(out, "\nNote: quote page {kind}");
    }

    out
}

/// `+$15.28 (+1.78%)`, or the sentinel when either side is missing
fn render_change(report: &StockReport, locale: &Locale) -> String {
    let quote = report.quote();
    match (quote.change(), quote.change_fraction()) {
        (Field::Present(change), Field::Present(fraction)) => {
            let sign = if change > 0.0 { "+" } else { "" };
            format!(
                "{sign}{} ({sign}{})",
                format_currency(change, locale),
                format_number(fraction, FormatKind::Percentage, locale)
            )
        }
        (Field::Present(change), Field::Unavailable) => format_currency(change, locale),
        _ => UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use research_core::{
        CategorizedStatistics, ErrorKind, NewsItem, Quote, SourceHealth, Statistic, Ticker,
        categorize,
    };

    fn quote(price: Field<f64>, previous_close: Field<f64>) -> Quote {
        Quote {
            price,
            previous_close,
            currency: Field::Present("USD".to_string()),
            as_of: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn report(quote: Quote, statistics: CategorizedStatistics, news: Vec<NewsItem>) -> StockReport {
        StockReport::assemble(Ticker::parse("NVDA").unwrap(), quote, statistics, news)
    }

    #[test]
    fn test_change_rendering() {
        let locale = Locale::default();
        let up = report(
            quote(Field::Present(110.0), Field::Present(100.0)),
            CategorizedStatistics::default(),
            Vec::new(),
        );
        assert_eq!(render_change(&up, &locale), "+$10.00 (+10.00%)");

        let down = report(
            quote(Field::Present(90.0), Field::Present(100.0)),
            CategorizedStatistics::default(),
            Vec::new(),
        );
        assert_eq!(render_change(&down, &locale), "-$10.00 (-10.00%)");

        let missing = report(
            quote(Field::Present(90.0), Field::Unavailable),
            CategorizedStatistics::default(),
            Vec::new(),
        );
        assert_eq!(render_change(&missing, &locale), "N/A");
    }

    #[test]
    fn test_report_lists_statistics_and_news() {
        let statistics = categorize(
            &[
                Statistic::unavailable("trailingPE", FormatKind::Ratio),
                Statistic::number("volume", FormatKind::LargeNumber, 1_234_567.0),
            ],
            &Locale::default(),
        );
        let news = vec![NewsItem {
            source: Field::Present("Reuters".to_string()),
            published_at: Field::Unavailable,
            headline: "Chip demand surges".to_string(),
            summary: "Shares rose.".to_string(),
            link: Field::Present("https://example.test/a".to_string()),
        }];
        let rendered = report(
            quote(Field::Present(875.28), Field::Unavailable),
            statistics,
            news,
        )
        .with_company_name(Field::Present("NVIDIA Corporation".to_string()))
        .with_source_health(SourceHealth {
            provider: None,
            scrape: Some(ErrorKind::Timeout),
        });

        let text = render_report(&rendered);

        assert!(text.starts_with("== NVDA - NVIDIA Corporation =="));
        assert!(text.contains("$875.28"));
        assert!(text.contains("P/E Ratio"));
        assert!(text.contains("1.23M"));
        assert!(text.contains("1. Chip demand surges"));
        assert!(text.contains("   Reuters | N/A"));
        assert!(text.contains("https://example.test/a"));
        assert!(text.contains("Note: quote page timed out"));
    }

    #[test]
    fn test_empty_news_message() {
        let text = render_report(&report(
            quote(Field::Unavailable, Field::Unavailable),
            CategorizedStatistics::default(),
            Vec::new(),
        ));
        assert!(text.contains("No recent news available."));
        assert!(text.starts_with("== NVDA - N/A =="));
    }
}
