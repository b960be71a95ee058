//! Multi-symbol time alignment.
//!
//! Given a price series per symbol, build a `PriceTable` on the dates every
//! symbol traded. Rows where any symbol has no price are dropped as a whole
//! (a younger fund shortens the table); prices are never forward-filled.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::provider::{DataError, DataSource};
use crate::domain::{DividendEvent, PriceTable};

/// Daily prices and dividends for one symbol, as a provider fetched them.
#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub prices: Vec<(NaiveDate, f64)>,
    pub dividends: Vec<DividendEvent>,
    pub source: DataSource,
}

/// Align series onto their common dates, in the order given.
///
/// Non-finite prices count as missing for that date. Fails with
/// `DataUnavailable` when no series is given or the series share no date.
pub fn align_series(series: Vec<SymbolSeries>) -> Result<PriceTable, DataError> {
    if series.is_empty() {
        return Err(DataError::DataUnavailable("no symbols returned".into()));
    }

    let lookups: Vec<BTreeMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| {
            s.prices
                .iter()
                .filter(|(_, p)| p.is_finite())
                .copied()
                .collect()
        })
        .collect();

    let mut common: BTreeSet<NaiveDate> = lookups[0].keys().copied().collect();
    for lookup in &lookups[1..] {
        common.retain(|d| lookup.contains_key(d));
    }

    if common.is_empty() {
        let names: Vec<&str> = series.iter().map(|s| s.symbol.as_str()).collect();
        return Err(DataError::DataUnavailable(format!(
            "no common trading dates for {}",
            names.join(", ")
        )));
    }

    for (s, lookup) in series.iter().zip(&lookups) {
        let dropped = lookup.len() - common.len();
        if dropped > 0 {
            tracing::debug!(symbol = %s.symbol, dropped, "rows outside common history dropped");
        }
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let columns: Vec<Vec<f64>> = lookups
        .iter()
        .map(|lookup| dates.iter().map(|d| lookup[d]).collect())
        .collect();
    let symbols: Vec<String> = series.iter().map(|s| s.symbol.clone()).collect();

    let mut table = PriceTable::new(dates, symbols, columns)?;
    for s in series {
        if !s.dividends.is_empty() {
            table = table.with_dividends(&s.symbol, s.dividends);
        }
    }
    Ok(table)
}
