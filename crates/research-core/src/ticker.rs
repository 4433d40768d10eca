//! Validated exchange symbols

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TICKER_LEN: usize = 15;

/// Punctuation allowed after the first character (BRK.B, BF-B, ^GSPC, EURUSD=X)
const TICKER_PUNCTUATION: &[char] = &['.', '-', '^', '='];

/// Uppercase, validated stock symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Trim, uppercase and validate raw user input
    pub fn parse(input: &str) -> Result<Self> {
        let reject = |reason: String| StockError::InvalidTicker {
            input: input.to_string(),
            reason,
        };

        let normalized = input.trim().to_ascii_uppercase();
        let mut chars = normalized.chars();

        let Some(first) = chars.next() else {
            return Err(reject("ticker is empty".to_string()));
        };

        let len = normalized.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(reject(format!(
                "ticker has {len} characters, at most {MAX_TICKER_LEN} allowed"
            )));
        }

        // index symbols carry a leading caret (^GSPC)
        let lead = if first == '^' { chars.next() } else { Some(first) };
        if !lead.is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(reject(format!(
                "ticker must start with a letter or '^' and a letter, found {normalized:?}"
            )));
        }

        for (index, ch) in normalized.chars().enumerate().skip(1) {
            if !(ch.is_ascii_alphanumeric() || TICKER_PUNCTUATION.contains(&ch)) {
                return Err(reject(format!(
                    "invalid character {ch:?} at position {index}"
                )));
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = StockError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = StockError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}
