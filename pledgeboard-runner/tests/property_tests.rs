//! Property tests for metrics and dashboard invariants.
//!
//! Uses proptest to verify:
//! 1. Risk rows: one per column for any non-empty table
//! 2. Short tables: "3 Year" is Missing everywhere below 757 rows
//! 3. Drawdown sign: max drawdown is never positive for positive prices
//! 4. Ledger monotonicity: totals grow by exactly each pledge
//! 5. Invalid pledges: non-positive amounts change nothing

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use pledgeboard_core::data::SyntheticProvider;
use pledgeboard_core::{AppConfig, BundleCatalog, CostSheet, PledgeLedger, PriceTable};
use pledgeboard_runner::{
    risk_statistics, trailing_returns, Dashboard, DashboardError, MetricValue, NavigationState,
    Period, ViewSettings,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 1..max_len)
}

fn arb_table(max_len: usize) -> impl Strategy<Value = PriceTable> {
    (1usize..5, 1usize..max_len).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(1.0..1000.0_f64, rows), cols).prop_map(
            move |columns| {
                let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
                let dates = (0..rows).map(|i| start + Duration::days(i as i64)).collect();
                let symbols = (0..cols).map(|c| format!("S{c}")).collect();
                PriceTable::new(dates, symbols, columns).unwrap()
            },
        )
    })
}

fn arb_pledge() -> impl Strategy<Value = f64> {
    (0.01..50_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn detail_dashboard() -> Dashboard {
    let config = AppConfig {
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ..AppConfig::default()
    };
    let catalog = BundleCatalog::new(config.bundles.clone()).unwrap();
    let ledger = Arc::new(PledgeLedger::new(&catalog));
    let provider = Arc::new(SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 3, 29).unwrap()));
    let mut d = Dashboard::new(catalog, CostSheet::from_costs(1.05, Vec::new()), ledger, provider, &config);
    assert_eq!(d.settings(), &ViewSettings::from(&config));
    d.select_bundle(0).unwrap();
    d
}

// ── 1. Risk Rows ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn one_risk_row_per_column(table in arb_table(60)) {
        let risk = risk_statistics(&table).unwrap();
        prop_assert_eq!(risk.rows.len(), table.column_count());
        for (row, symbol) in risk.rows.iter().zip(table.symbols()) {
            prop_assert_eq!(&row.symbol, symbol);
        }
    }
}

// ── 2. Short Tables ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn three_year_missing_below_757_rows(table in arb_table(757)) {
        let tr = trailing_returns(&table, &Period::ALL).unwrap();
        for symbol in table.symbols() {
            prop_assert_eq!(tr.get(Period::ThreeYear, symbol), Some(MetricValue::Missing));
        }
    }
}

// ── 3. Drawdown Sign ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn max_drawdown_never_positive(prices in arb_prices(200)) {
        let dd = pledgeboard_runner::metrics::max_drawdown(&prices);
        let v = dd.value().unwrap();
        prop_assert!(v <= 0.0);
        prop_assert!(v > -1.0);
    }
}

// ── 4. Ledger Monotonicity ───────────────────────────────────────────

proptest! {
    #[test]
    fn ledger_grows_by_each_pledge(pledges in prop::collection::vec(arb_pledge(), 1..20)) {
        let catalog = BundleCatalog::new(pledgeboard_core::config::default_bundles()).unwrap();
        let ledger = PledgeLedger::new(&catalog);
        let mut previous = 0u64;
        for amount in pledges {
            let cents = pledgeboard_core::ledger::validate_amount(Some(amount)).unwrap();
            let total = ledger.pledge("Bundle 2", Some(amount)).unwrap();
            prop_assert_eq!(total, previous + cents);
            prop_assert!(total > previous);
            previous = total;
        }
    }
}

// ── 5. Invalid Pledges ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn non_positive_pledge_changes_nothing(amount in -10_000.0..=0.0_f64) {
        let mut d = detail_dashboard();
        let err = d.submit_pledge(Some(amount)).unwrap_err();
        prop_assert!(matches!(err, DashboardError::Ledger(_)));
        prop_assert_eq!(d.state(), NavigationState::BundleDetail);
        prop_assert_eq!(d.active_bundle(), Some("Bundle 1"));
        prop_assert_eq!(d.ledger().pledged_cents("Bundle 1").unwrap(), 0);
    }
}
