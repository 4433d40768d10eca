//! Network implementations of the fetch seams

pub mod quote_page;
pub mod yahoo;

pub use quote_page::YahooQuotePage;
pub use yahoo::{YahooFundamentals, flatten_quote_summary};
