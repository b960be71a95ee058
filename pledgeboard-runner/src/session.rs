//! Startup wiring: config → provider → catalog → cost sheet → ledger → dashboard.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use pledgeboard_core::data::{open_provider, DataError, PriceTableProvider};
use pledgeboard_core::{AppConfig, BundleCatalog, CatalogError, CostSheet, PledgeLedger};

use crate::dashboard::Dashboard;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("provider setup failed: {0}")]
    Provider(#[from] DataError),

    #[error("bundle catalog rejected: {0}")]
    Catalog(#[from] CatalogError),
}

/// Build a dashboard from config, opening the configured provider.
pub fn build_dashboard(config: &AppConfig) -> Result<Dashboard, SessionError> {
    let provider = open_provider(
        &config.provider,
        Duration::from_secs(config.fetch_timeout_secs),
    )?;
    build_with_provider(config, provider)
}

/// Build a dashboard around an already constructed provider.
///
/// The cost sheet is computed here, once; failed bundles show as unavailable.
pub fn build_with_provider(
    config: &AppConfig,
    provider: Arc<dyn PriceTableProvider>,
) -> Result<Dashboard, SessionError> {
    let catalog = BundleCatalog::new(config.bundles.clone())?;
    tracing::info!(
        bundles = catalog.len(),
        provider = provider.name(),
        "computing startup cost sheet"
    );
    let costs = CostSheet::compute(&catalog, provider.as_ref(), config.start_date, config.markup);
    let ledger = Arc::new(PledgeLedger::new(&catalog));
    Ok(Dashboard::new(catalog, costs, ledger, provider, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pledgeboard_core::{Bundle, ProviderKind};

    #[test]
    fn synthetic_session_prices_every_bundle() {
        let mut config = AppConfig::default();
        config.start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        config.provider.kind = ProviderKind::Synthetic;
        config.provider.synthetic_end = NaiveDate::from_ymd_opt(2024, 3, 29);

        let dashboard = build_dashboard(&config).unwrap();
        for row in dashboard.selection_rows() {
            let cost = row.estimated_cost.unwrap();
            assert!(cost > 0.0, "{} should have a cost", row.name);
        }
    }

    #[test]
    fn bad_catalog_is_rejected() {
        let mut config = AppConfig::default();
        config.provider.kind = ProviderKind::Synthetic;
        config.bundles = vec![
            Bundle::new("Same", &["SPY"], 1.0),
            Bundle::new("Same", &["GLD"], 1.0),
        ];
        assert!(matches!(
            build_dashboard(&config),
            Err(SessionError::Catalog(_))
        ));
    }
}
