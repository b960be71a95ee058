//! Offline CSV price import.
//!
//! Prices are a wide file, one column per symbol:
//!
//! ```text
//! date,DBC,GSG,SPY
//! 2024-01-02,22.31,19.80,472.65
//! ```
//!
//! Dividends are an optional long file: `date,symbol,amount`.
//! Empty cells are gaps and are rejected; the table must be complete.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::provider::{DataError, FetchRequest, PriceTableProvider};
use crate::domain::{DividendEvent, PriceTable};

/// Provider backed by a price table loaded from CSV at construction.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    table: PriceTable,
}

fn parse_date(raw: &str, line: usize) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| DataError::Import(format!("line {line}: bad date '{raw}': {e}")))
}

fn parse_price(raw: &str, symbol: &str, line: usize) -> Result<f64, DataError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DataError::Import(format!(
            "line {line}: missing price for {symbol}"
        )));
    }
    raw.parse::<f64>()
        .map_err(|e| DataError::Import(format!("line {line}: bad price '{raw}' for {symbol}: {e}")))
}

impl CsvProvider {
    /// Load prices (and optionally dividends) from files.
    pub fn open(prices: &Path, dividends: Option<&Path>) -> Result<Self, DataError> {
        let prices_file = std::fs::File::open(prices)
            .map_err(|e| DataError::Import(format!("open {}: {e}", prices.display())))?;
        match dividends {
            Some(path) => {
                let div_file = std::fs::File::open(path)
                    .map_err(|e| DataError::Import(format!("open {}: {e}", path.display())))?;
                Self::from_readers(prices_file, Some(div_file))
            }
            None => Self::from_readers(prices_file, None::<std::fs::File>),
        }
    }

    /// Load from any readers (used by tests and by `open`).
    pub fn from_readers<P: Read, D: Read>(
        prices: P,
        dividends: Option<D>,
    ) -> Result<Self, DataError> {
        let mut table = Self::read_prices(prices)?;
        if let Some(reader) = dividends {
            for (symbol, events) in Self::read_dividends(reader)? {
                table = table.with_dividends(&symbol, events);
            }
        }
        tracing::debug!(
            rows = table.len(),
            columns = table.column_count(),
            "CSV price table loaded"
        );
        Ok(Self { table })
    }

    fn read_prices<R: Read>(reader: R) -> Result<PriceTable, DataError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| DataError::Import(format!("read header: {e}")))?
            .clone();
        if headers.len() < 2 {
            return Err(DataError::Import(
                "price file needs a date column and at least one symbol".into(),
            ));
        }
        let symbols: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

        let mut dates = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); symbols.len()];
        for (i, record) in rdr.records().enumerate() {
            let line = i + 2;
            let record = record.map_err(|e| DataError::Import(format!("line {line}: {e}")))?;
            dates.push(parse_date(&record[0], line)?);
            for (col, symbol) in symbols.iter().enumerate() {
                let raw = record.get(col + 1).unwrap_or("");
                columns[col].push(parse_price(raw, symbol, line)?);
            }
        }

        Ok(PriceTable::new(dates, symbols, columns)?)
    }

    fn read_dividends<R: Read>(
        reader: R,
    ) -> Result<BTreeMap<String, Vec<DividendEvent>>, DataError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut out: BTreeMap<String, Vec<DividendEvent>> = BTreeMap::new();
        for (i, record) in rdr.records().enumerate() {
            let line = i + 2;
            let record = record.map_err(|e| DataError::Import(format!("line {line}: {e}")))?;
            if record.len() < 3 {
                return Err(DataError::Import(format!(
                    "line {line}: expected date,symbol,amount"
                )));
            }
            let symbol = record[1].trim().to_string();
            let event = DividendEvent {
                date: parse_date(&record[0], line)?,
                amount: parse_price(&record[2], &symbol, line)?,
            };
            out.entry(symbol).or_default().push(event);
        }
        Ok(out)
    }

    /// The full imported table.
    pub fn table(&self) -> &PriceTable {
        &self.table
    }
}

impl PriceTableProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceTable, DataError> {
        let wanted = request.all_symbols();
        let table = self.table.since(request.start).select(&wanted);

        if table.column_count() == 0 || table.is_empty() {
            return Err(DataError::DataUnavailable(format!(
                "CSV import has no rows for {} since {}",
                wanted.join(", "),
                request.start
            )));
        }
        if table.column_count() < wanted.len() {
            tracing::warn!(
                requested = wanted.len(),
                returned = table.column_count(),
                "CSV import is missing requested symbols"
            );
        }
        Ok(table)
    }
}
