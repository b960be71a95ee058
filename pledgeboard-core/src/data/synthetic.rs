//! Deterministic synthetic prices for demos and offline tests.
//!
//! Each symbol gets a random walk seeded from its name, so the same request
//! always yields the same table. Results are clearly fake: prices start at
//! 100.0 and some symbols pay a small quarterly dividend.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::align::{align_series, SymbolSeries};
use super::provider::{DataError, DataSource, FetchRequest, PriceTableProvider};
use crate::domain::{DividendEvent, PriceTable};

/// Business days between dividend payments.
const DIVIDEND_SPACING: usize = 63;

/// Seeded random-walk provider ending on a fixed date.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end: NaiveDate,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

/// FNV-1a over the symbol bytes; stable across runs and platforms.
fn seed_for(symbol: &str) -> u64 {
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

impl SyntheticProvider {
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    /// Random walk over weekdays from `start` to the provider's end date.
    pub fn series(&self, symbol: &str, start: NaiveDate) -> SymbolSeries {
        let seed = seed_for(symbol);
        let mut rng = StdRng::seed_from_u64(seed);
        let pays_dividends = seed % 3 != 0;
        let drift: f64 = rng.gen_range(-0.0002..0.0006);

        let mut prices = Vec::new();
        let mut dividends = Vec::new();
        let mut price = 100.0_f64;
        let mut current = start;

        while current <= self.end {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let daily_return: f64 = drift + rng.gen_range(-0.02..0.02);
                price = (price * (1.0 + daily_return)).max(0.01);
                prices.push((current, price));

                if pays_dividends && prices.len() % DIVIDEND_SPACING == 0 {
                    dividends.push(DividendEvent {
                        date: current,
                        amount: (price * 0.004 * 100.0).round() / 100.0,
                    });
                }
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        SymbolSeries {
            symbol: symbol.to_string(),
            prices,
            dividends,
            source: DataSource::Synthetic,
        }
    }
}

impl PriceTableProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceTable, DataError> {
        if request.start > self.end {
            return Err(DataError::DataUnavailable(format!(
                "start {} is after synthetic end {}",
                request.start, self.end
            )));
        }
        tracing::warn!("generating synthetic prices, figures are not real market data");
        let series = request
            .all_symbols()
            .iter()
            .map(|s| self.series(s, request.start))
            .collect();
        align_series(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn deterministic_per_symbol() {
        let p = SyntheticProvider::new(d("2024-06-28"));
        let a = p.series("SPY", d("2024-01-01"));
        let b = p.series("SPY", d("2024-01-01"));
        assert_eq!(a.prices, b.prices);
        assert_ne!(a.prices, p.series("GLD", d("2024-01-01")).prices);
    }

    #[test]
    fn skips_weekends_and_stays_positive() {
        let p = SyntheticProvider::new(d("2024-01-14"));
        let s = p.series("DBC", d("2024-01-01"));
        assert_eq!(s.prices.len(), 10);
        assert!(s.prices.iter().all(|(date, price)| {
            !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && *price > 0.0
        }));
    }

    #[test]
    fn fetch_builds_a_full_table() {
        let p = SyntheticProvider::new(d("2024-12-31"));
        let req = FetchRequest::new(vec!["GLD".into(), "DIA".into()], d("2024-01-01"))
            .with_reference(Some("SPY".into()));
        let t = p.fetch(&req).unwrap();
        assert_eq!(t.column_count(), 3);
        assert_eq!(t.len(), 262);
    }

    #[test]
    fn start_after_end_is_unavailable() {
        let p = SyntheticProvider::new(d("2024-01-01"));
        let req = FetchRequest::new(vec!["GLD".into()], d("2024-02-01"));
        assert!(matches!(p.fetch(&req), Err(DataError::DataUnavailable(_))));
    }
}
