//! Dated price table: one column per symbol, one row per trading day.
//!
//! Invariants enforced at construction:
//! - dates strictly increasing
//! - column names unique
//! - every column has a finite price for every date (no gaps)
//!
//! Dividend events ride along with the prices so the metrics engine can
//! compute yields from the same table it computes returns from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single cash dividend paid on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Shape violations detected while building a `PriceTable`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceTableError {
    #[error("dates not strictly increasing at row {row} ({date})")]
    UnorderedDates { row: usize, date: NaiveDate },

    #[error("duplicate column '{symbol}'")]
    DuplicateSymbol { symbol: String },

    #[error("column '{symbol}' has {got} prices for {expected} dates")]
    RaggedColumn {
        symbol: String,
        expected: usize,
        got: usize,
    },

    #[error("column '{symbol}' has no usable price on {date}")]
    Gap { symbol: String, date: NaiveDate },

    #[error("{symbols} column names for {columns} columns")]
    ColumnCount { symbols: usize, columns: usize },
}

/// Prices indexed by date and symbol, stored column-major.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: Vec<Vec<f64>>,
    dividends: BTreeMap<String, Vec<DividendEvent>>,
}

impl PriceTable {
    /// Build a table from a date axis and one price column per symbol.
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, PriceTableError> {
        if symbols.len() != columns.len() {
            return Err(PriceTableError::ColumnCount {
                symbols: symbols.len(),
                columns: columns.len(),
            });
        }

        for (row, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(PriceTableError::UnorderedDates {
                    row: row + 1,
                    date: pair[1],
                });
            }
        }

        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].contains(symbol) {
                return Err(PriceTableError::DuplicateSymbol {
                    symbol: symbol.clone(),
                });
            }
        }

        for (symbol, column) in symbols.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(PriceTableError::RaggedColumn {
                    symbol: symbol.clone(),
                    expected: dates.len(),
                    got: column.len(),
                });
            }
            if let Some(row) = column.iter().position(|p| !p.is_finite()) {
                return Err(PriceTableError::Gap {
                    symbol: symbol.clone(),
                    date: dates[row],
                });
            }
        }

        Ok(Self {
            dates,
            symbols,
            columns,
            dividends: BTreeMap::new(),
        })
    }

    /// Attach dividend events for a symbol. Events are kept sorted by date.
    pub fn with_dividends(mut self, symbol: &str, mut events: Vec<DividendEvent>) -> Self {
        events.sort_by_key(|e| e.date);
        self.dividends.insert(symbol.to_string(), events);
        self
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names in table order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Prices for one symbol, oldest first.
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterate `(symbol, prices)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.symbols
            .iter()
            .zip(&self.columns)
            .map(|(s, c)| (s.as_str(), c.as_slice()))
    }

    /// Most recent price for a symbol.
    pub fn latest(&self, symbol: &str) -> Option<f64> {
        self.column(symbol).and_then(|c| c.last().copied())
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Dividend events for a symbol (empty when none were reported).
    pub fn dividends(&self, symbol: &str) -> &[DividendEvent] {
        self.dividends
            .get(symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Keep only rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        let first = self.dates.partition_point(|d| *d < start);
        Self {
            dates: self.dates[first..].to_vec(),
            symbols: self.symbols.clone(),
            columns: self.columns.iter().map(|c| c[first..].to_vec()).collect(),
            dividends: self
                .dividends
                .iter()
                .map(|(s, events)| {
                    let kept = events.iter().filter(|e| e.date >= start).copied().collect();
                    (s.clone(), kept)
                })
                .collect(),
        }
    }

    /// Project onto the requested symbols that exist, in request order.
    ///
    /// Symbols absent from the table are skipped, not invented; callers that
    /// need every symbol check `has_symbol` afterwards.
    pub fn select(&self, symbols: &[String]) -> Self {
        let mut names = Vec::new();
        let mut columns = Vec::new();
        let mut dividends = BTreeMap::new();
        for symbol in symbols {
            if names.contains(symbol) {
                continue;
            }
            if let Some(col) = self.column(symbol) {
                names.push(symbol.clone());
                columns.push(col.to_vec());
                if let Some(events) = self.dividends.get(symbol) {
                    dividends.insert(symbol.clone(), events.clone());
                }
            }
        }
        Self {
            dates: self.dates.clone(),
            symbols: names,
            columns,
            dividends,
        }
    }
}
