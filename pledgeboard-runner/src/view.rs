//! Bundle detail view assembly.
//!
//! Loading a view is the slow part of selecting a bundle: a price fetch and a
//! metrics run. It is split out so front-ends can do it off their UI thread
//! and hand the result back to the dashboard with the ticket it was issued.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use pledgeboard_core::data::{DataError, FetchRequest, PriceTableProvider};
use pledgeboard_core::{AppConfig, Bundle};

use crate::metrics::{BundleMetrics, MetricsError};

#[derive(Debug, Clone, Error)]
pub enum ViewError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Issued by `Dashboard::prepare_selection`; redeemed by `commit_selection`.
///
/// A ticket is only honoured if no other selection or navigation happened
/// since it was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTicket {
    pub(crate) generation: u64,
    pub index: usize,
    pub bundle: Bundle,
}

/// Fetch window and benchmark for a view load.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub start: NaiveDate,
    pub benchmark: Option<String>,
}

impl From<&AppConfig> for ViewSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            start: config.start_date,
            benchmark: config.benchmark.clone(),
        }
    }
}

/// Everything the detail page shows for one bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleView {
    pub bundle: Bundle,
    pub benchmark: Option<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub rows: usize,
    pub metrics: BundleMetrics,
}

/// Fetch the bundle's prices plus the benchmark and run the metrics engine.
pub fn load_bundle_view(
    provider: &dyn PriceTableProvider,
    ticket: &SelectionTicket,
    settings: &ViewSettings,
) -> Result<BundleView, ViewError> {
    let started = Instant::now();
    let bundle = &ticket.bundle;
    let request = FetchRequest::new(bundle.symbols.clone(), settings.start)
        .with_reference(settings.benchmark.clone());

    let table = provider.fetch(&request)?;
    let metrics = BundleMetrics::compute(&bundle.symbols, &table)?;

    tracing::info!(
        bundle = %bundle.name,
        provider = provider.name(),
        rows = table.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "bundle view loaded"
    );

    Ok(BundleView {
        bundle: bundle.clone(),
        benchmark: settings.benchmark.clone(),
        first_date: table.start_date(),
        last_date: table.end_date(),
        rows: table.len(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pledgeboard_core::data::SyntheticProvider;

    fn ticket(symbols: &[&str]) -> SelectionTicket {
        SelectionTicket {
            generation: 1,
            index: 0,
            bundle: Bundle::new("Test", symbols, 1000.0),
        }
    }

    fn settings() -> ViewSettings {
        ViewSettings {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            benchmark: Some("SPY".into()),
        }
    }

    #[test]
    fn loads_bundle_and_benchmark() {
        let provider = SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
        let view = load_bundle_view(&provider, &ticket(&["DBC", "GSG"]), &settings()).unwrap();
        assert_eq!(view.metrics.trailing_returns.symbols, vec!["DBC", "GSG", "SPY"]);
        assert_eq!(view.metrics.dividends.rows.len(), 2);
        assert!(view.rows > 300);
        assert_eq!(view.first_date, Some(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()));
    }

    #[test]
    fn fetch_failure_is_data_error() {
        let provider = SyntheticProvider::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let err = load_bundle_view(&provider, &ticket(&["DBC"]), &settings()).unwrap_err();
        assert!(matches!(err, ViewError::Data(_)));
    }
}
