//! Price table providers and the plumbing around them.

pub mod align;
pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod timeout;
pub mod yahoo;

use std::sync::Arc;
use std::time::Duration;

pub use align::{align_series, SymbolSeries};
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use provider::{DataError, DataSource, FetchRequest, PriceTableProvider};
pub use synthetic::SyntheticProvider;
pub use timeout::TimeoutProvider;
pub use yahoo::YahooProvider;

use crate::config::{ProviderConfig, ProviderKind};

/// Build the provider described by `config`, bounded by `fetch_timeout`.
///
/// Every provider handed to the dashboard goes through `TimeoutProvider`, so a
/// hung request surfaces as `DataError::Timeout` instead of blocking forever.
pub fn open_provider(
    config: &ProviderConfig,
    fetch_timeout: Duration,
) -> Result<Arc<dyn PriceTableProvider>, DataError> {
    let inner: Arc<dyn PriceTableProvider> = match config.kind {
        ProviderKind::Yahoo => {
            let breaker = Arc::new(CircuitBreaker::default_provider());
            Arc::new(YahooProvider::new(config, breaker)?)
        }
        ProviderKind::Csv => {
            let prices = config.prices_path.as_deref().ok_or_else(|| {
                DataError::Import("provider.kind = \"csv\" requires provider.prices_path".into())
            })?;
            Arc::new(CsvProvider::open(prices, config.dividends_path.as_deref())?)
        }
        ProviderKind::Synthetic => Arc::new(match config.synthetic_end {
            Some(end) => SyntheticProvider::new(end),
            None => SyntheticProvider::default(),
        }),
    };
    tracing::debug!(provider = inner.name(), "price table provider ready");
    Ok(Arc::new(TimeoutProvider::new(inner, fetch_timeout)))
}
