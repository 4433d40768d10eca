//! Stock research refresh pipeline
//!
//! For one ticker this crate fetches structured fundamentals and the quote
//! page concurrently, normalizes both into a canonical model where every
//! missing value is an explicit [`Field::Unavailable`], groups statistics
//! into fixed categories, and assembles an immutable [`StockReport`].
//!
//! - [`fetcher`]: both retrieval paths under one shared deadline
//! - [`normalizer`]: tolerant parsing of numbers, timestamps and page markup
//! - [`categorizer`]: the statistic table and display formatting
//! - [`report`]: the assembled report
//! - [`pipeline`]: end-to-end refresh and per-session supersession
//!
//! # Example
//!
//! ```rust,ignore
//! use research_core::{Pipeline, ResearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ResearchConfig::default().with_env()?;
//!     let pipeline = Pipeline::yahoo(&config)?;
//!
//!     let report = pipeline.refresh("nvda").await?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod categorizer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod field;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod ticker;

pub use categorizer::{CategorizedStatistics, FormattedStatistic, categorize};
pub use config::{Locale, ResearchConfig};
pub use error::{ErrorKind, FetchError, Result, StockError};
pub use fetcher::{FetchResult, Fetcher, FundamentalsSource, PageSource};
pub use field::{Field, UNAVAILABLE};
pub use model::{Category, FormatKind, NewsItem, Quote, StatValue, Statistic};
pub use normalizer::{NormalizeConfig, Normalized, normalize};
pub use pipeline::{Pipeline, RefreshHandle, Session};
pub use report::{SourceHealth, StockReport};
pub use ticker::Ticker;
