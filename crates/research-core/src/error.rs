//! Error types for stock research operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors surfaced to callers of the research pipeline
///
/// Once a ticker has been validated the pipeline itself cannot fail; source
/// failures are carried inside the report as [`ErrorKind`] values instead.
#[derive(Debug, Error)]
pub enum StockError {
    /// Ticker rejected before any fetch was issued
    #[error("Invalid ticker {input:?}: {reason}")]
    InvalidTicker {
        input: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client could not be constructed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A newer refresh for the same ticker replaced this one
    #[error("Refresh for {0} was superseded by a newer request")]
    Superseded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for stock research operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Why one retrieval path failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown or unlisted ticker
    NotFound,
    /// Upstream throttled the request
    RateLimited,
    /// Did not settle before the deadline
    Timeout,
    /// Response arrived but could not be decoded
    ParseFailure,
    /// Network or DNS failure
    Unreachable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::RateLimited => "rate limited",
            Self::Timeout => "timed out",
            Self::ParseFailure => "parse failure",
            Self::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}

/// Failure of a single retrieval path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailure, message)
    }

    /// Classify an HTTP status that is not a success
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        let kind = match status.as_u16() {
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            408 | 504 => ErrorKind::Timeout,
            _ => ErrorKind::Unreachable,
        };
        Self::new(kind, format!("{context}: HTTP {status}"))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_decode() {
            ErrorKind::ParseFailure
        } else if let Some(status) = err.status() {
            return Self::from_status(status, "request failed");
        } else {
            ErrorKind::Unreachable
        };
        Self::new(kind, err.to_string())
    }
}
