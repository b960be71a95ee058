//! Price table provider trait and structured error types.
//!
//! The `PriceTableProvider` trait abstracts over data sources (Yahoo Finance,
//! CSV import, synthetic) so the dashboard can swap implementations and tests
//! can mock them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceTable, PriceTableError};

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("no price data available: {0}")]
    DataUnavailable(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("price fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("import error: {0}")]
    Import(String),

    #[error("malformed price table: {0}")]
    Table(#[from] PriceTableError),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// What to fetch: the instruments, the first date, and an optional benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub reference: Option<String>,
}

impl FetchRequest {
    pub fn new(symbols: Vec<String>, start: NaiveDate) -> Self {
        Self {
            symbols,
            start,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Requested symbols followed by the reference, without duplicates.
    pub fn all_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.symbols.len() + 1);
        for s in self.symbols.iter().chain(self.reference.iter()) {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        out
    }
}

/// Trait for price table providers.
///
/// A provider returns whatever columns it has for the request; it never pads a
/// missing symbol. It fails with `DataUnavailable` when nothing comes back.
pub trait PriceTableProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch a dated price table for the request.
    fn fetch(&self, request: &FetchRequest) -> Result<PriceTable, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_symbols_dedupes_reference() {
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let req = FetchRequest::new(vec!["SPY".into(), "GOVT".into()], start)
            .with_reference(Some("SPY".into()));
        assert_eq!(req.all_symbols(), vec!["SPY".to_string(), "GOVT".to_string()]);

        let req = FetchRequest::new(vec!["GLD".into()], start).with_reference(Some("SPY".into()));
        assert_eq!(req.all_symbols(), vec!["GLD".to_string(), "SPY".to_string()]);
    }

    #[test]
    fn errors_are_displayable() {
        let e = DataError::Timeout { secs: 30 };
        assert_eq!(e.to_string(), "price fetch timed out after 30s");
    }
}
