//! Property tests for price table construction and alignment.
//!
//! Uses proptest to verify:
//! 1. Alignment: aligned tables are strictly increasing and gap-free
//! 2. Alignment subset: every aligned date is traded by every symbol
//! 3. Windowing: `since` never keeps a row before its start
//! 4. Currency formatting: separators strip back to the two-decimal value

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use pledgeboard_core::data::{align_series, DataSource, SymbolSeries};
use pledgeboard_core::ledger::format_currency;
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// A series on a random subset of the first 60 days.
fn arb_series(symbol: &'static str) -> impl Strategy<Value = SymbolSeries> {
    prop::collection::btree_map(0i64..60, 1.0..500.0_f64, 1..40).prop_map(move |days| SymbolSeries {
        symbol: symbol.to_string(),
        prices: days
            .into_iter()
            .map(|(offset, price)| (base() + Duration::days(offset), price))
            .collect(),
        dividends: Vec::new(),
        source: DataSource::Synthetic,
    })
}

// ── 1. Alignment ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn aligned_tables_are_ordered_and_complete(a in arb_series("AAA"), b in arb_series("BBB")) {
        if let Ok(table) = align_series(vec![a, b]) {
            prop_assert!(table.dates().windows(2).all(|w| w[0] < w[1]));
            for (_, column) in table.columns() {
                prop_assert_eq!(column.len(), table.len());
            }
            prop_assert_eq!(table.symbols(), &["AAA".to_string(), "BBB".to_string()][..]);
        }
    }
}

// ── 2. Alignment Subset ──────────────────────────────────────────────

proptest! {
    #[test]
    fn aligned_dates_are_the_intersection(a in arb_series("AAA"), b in arb_series("BBB")) {
        let a_dates: BTreeSet<NaiveDate> = a.prices.iter().map(|(d, _)| *d).collect();
        let b_dates: BTreeSet<NaiveDate> = b.prices.iter().map(|(d, _)| *d).collect();
        let expected: Vec<NaiveDate> = a_dates.intersection(&b_dates).copied().collect();

        match align_series(vec![a, b]) {
            Ok(table) => prop_assert_eq!(table.dates(), &expected[..]),
            Err(_) => prop_assert!(expected.is_empty()),
        }
    }
}

// ── 3. Windowing ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn since_drops_only_earlier_rows(a in arb_series("AAA"), cut in 0i64..70) {
        let table = align_series(vec![a]).unwrap();
        let start = base() + Duration::days(cut);
        let window = table.since(start);
        prop_assert!(window.dates().iter().all(|d| *d >= start));
        let kept = table.dates().iter().filter(|d| **d >= start).count();
        prop_assert_eq!(window.len(), kept);
        prop_assert_eq!(window.latest("AAA").is_some(), kept > 0);
    }
}

// ── 4. Currency Formatting ───────────────────────────────────────────

proptest! {
    #[test]
    fn currency_round_trips_through_separators(cents in 0u64..10_000_000_000) {
        let amount = cents as f64 / 100.0;
        let formatted = format_currency(amount);
        let digits: String = formatted.chars().filter(|c| *c != ',').collect();
        prop_assert_eq!(digits, format!("{amount:.2}"));
        // Groups of three between separators
        let int_part = formatted.split('.').next().unwrap();
        for group in int_part.split(',').skip(1) {
            prop_assert_eq!(group.len(), 3);
        }
    }
}
