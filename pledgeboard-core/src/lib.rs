//! PledgeBoard Core — domain types, price data, bundle catalog, pledge ledger.
//!
//! This crate contains everything below the dashboard:
//! - `PriceTable`: dated, gap-free price columns plus dividend events
//! - Price table providers (Yahoo Finance, CSV import, synthetic) behind one trait
//! - The fixed bundle catalog and its startup cost sheet
//! - The in-memory pledge ledger with atomic updates
//! - TOML configuration

pub mod catalog;
pub mod config;
pub mod data;
pub mod domain;
pub mod ledger;

pub use catalog::{BundleCatalog, CatalogError, CostSheet};
pub use config::{AppConfig, ConfigError, ProviderConfig, ProviderKind};
pub use domain::{Bundle, DividendEvent, PriceTable, PriceTableError};
pub use ledger::{LedgerError, PledgeLedger, PledgeProgress};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the TUI worker thread touches is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceTable>();
        require_sync::<PriceTable>();
        require_send::<Bundle>();
        require_sync::<Bundle>();
        require_send::<BundleCatalog>();
        require_sync::<BundleCatalog>();
        require_send::<CostSheet>();
        require_sync::<CostSheet>();
        require_send::<PledgeLedger>();
        require_sync::<PledgeLedger>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<std::sync::Arc<dyn data::PriceTableProvider>>();
        require_sync::<std::sync::Arc<dyn data::PriceTableProvider>>();
    }

    /// The provider trait hands back a whole table; callers never see per-symbol
    /// series, so a short provider response surfaces as missing columns.
    #[test]
    fn provider_trait_returns_price_table() {
        fn _check(
            provider: &dyn data::PriceTableProvider,
            request: &data::FetchRequest,
        ) -> Result<PriceTable, data::DataError> {
            provider.fetch(request)
        }
    }
}
