//! Shared utilities for stock-research
//!
//! Logging setup and its configuration, shared by the binaries in the
//! workspace.

pub mod config;
pub mod logging;

pub use config::{LogFormat, LoggingConfig};
pub use logging::init_tracing;
