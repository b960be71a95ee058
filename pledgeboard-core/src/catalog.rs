//! Bundle catalog and startup cost sheet.
//!
//! The catalog is fixed at startup. Estimated costs are fetched once, right
//! after the catalog is built, and served from the `CostSheet` afterwards.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::data::{FetchRequest, PriceTableProvider};
use crate::domain::{Bundle, PriceTable};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("unknown bundle: {0}")]
    UnknownBundle(String),

    #[error("invalid bundle '{name}': {reason}")]
    InvalidBundle { name: String, reason: String },

    #[error("no latest price for {symbol} in bundle '{bundle}'")]
    MissingPrice { bundle: String, symbol: String },

    #[error("cost unavailable for '{bundle}': {reason}")]
    CostUnavailable { bundle: String, reason: String },
}

/// The fixed set of bundles, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleCatalog {
    bundles: Vec<Bundle>,
}

impl BundleCatalog {
    /// Validate and build a catalog. Names must be unique, symbol lists
    /// non-empty and goals positive.
    pub fn new(bundles: Vec<Bundle>) -> Result<Self, CatalogError> {
        for (i, bundle) in bundles.iter().enumerate() {
            let invalid = |reason: &str| CatalogError::InvalidBundle {
                name: bundle.name.clone(),
                reason: reason.to_string(),
            };
            if bundle.name.trim().is_empty() {
                return Err(invalid("name is blank"));
            }
            if bundles[..i].iter().any(|b| b.name == bundle.name) {
                return Err(invalid("duplicate name"));
            }
            if bundle.symbols.is_empty() {
                return Err(invalid("no symbols"));
            }
            if !(bundle.goal.is_finite() && bundle.goal > 0.0) {
                return Err(invalid("goal must be positive"));
            }
        }
        Ok(Self { bundles })
    }

    pub fn list_bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&Bundle, CatalogError> {
        self.bundles
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| CatalogError::UnknownBundle(name.to_string()))
    }

    pub fn symbols_for(&self, name: &str) -> Result<&[String], CatalogError> {
        self.get(name).map(|b| b.symbols.as_slice())
    }

    /// Bundle by display position (what the selection page hands back).
    pub fn bundle_at(&self, index: usize) -> Result<&Bundle, CatalogError> {
        self.bundles
            .get(index)
            .ok_or_else(|| CatalogError::UnknownBundle(format!("#{index}")))
    }
}

/// Sum of latest prices times `markup`.
pub fn bundle_cost(bundle: &Bundle, table: &PriceTable, markup: f64) -> Result<f64, CatalogError> {
    let mut base = 0.0;
    for symbol in &bundle.symbols {
        base += table
            .latest(symbol)
            .ok_or_else(|| CatalogError::MissingPrice {
                bundle: bundle.name.clone(),
                symbol: symbol.clone(),
            })?;
    }
    Ok(base * markup)
}

/// Estimated cost per bundle, computed once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSheet {
    markup: f64,
    costs: BTreeMap<String, Result<f64, String>>,
}

impl CostSheet {
    /// Fetch every bundle's prices (benchmark excluded) and price it.
    ///
    /// A failed fetch does not abort the sheet; that bundle's cost is recorded
    /// as unavailable with the reason.
    pub fn compute(
        catalog: &BundleCatalog,
        provider: &dyn PriceTableProvider,
        start: NaiveDate,
        markup: f64,
    ) -> Self {
        let costs = catalog
            .list_bundles()
            .par_iter()
            .map(|bundle| {
                let request = FetchRequest::new(bundle.symbols.clone(), start);
                let cost = provider
                    .fetch(&request)
                    .map_err(|e| e.to_string())
                    .and_then(|table| bundle_cost(bundle, &table, markup).map_err(|e| e.to_string()));
                match &cost {
                    Ok(c) => tracing::debug!(bundle = %bundle.name, cost = c, "bundle cost estimated"),
                    Err(e) => tracing::warn!(bundle = %bundle.name, error = %e, "bundle cost unavailable"),
                }
                (bundle.name.clone(), cost)
            })
            .collect();
        Self { markup, costs }
    }

    /// Build a sheet from known costs (tests, replay).
    pub fn from_costs(markup: f64, costs: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            markup,
            costs: costs.into_iter().map(|(k, v)| (k, Ok(v))).collect(),
        }
    }

    pub fn markup(&self) -> f64 {
        self.markup
    }

    /// Cached estimate for a bundle.
    pub fn estimated_cost(&self, name: &str) -> Result<f64, CatalogError> {
        match self.costs.get(name) {
            Some(Ok(cost)) => Ok(*cost),
            Some(Err(reason)) => Err(CatalogError::CostUnavailable {
                bundle: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(CatalogError::UnknownBundle(name.to_string())),
        }
    }
}
