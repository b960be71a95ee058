//! In-memory pledge ledger.
//!
//! One running total per bundle, starting at zero and held in whole cents.
//! Totals only grow: the sole mutation is adding a positive number of cents.
//! Each add happens under one lock, so concurrent submitters never lose an
//! update. Nothing is persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::catalog::BundleCatalog;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("invalid pledge amount: {}", describe_amount(.0))]
    InvalidPledge(Option<f64>),

    #[error("unknown bundle: {0}")]
    UnknownBundle(String),

    #[error("pledge total for {bundle} would overflow")]
    Overflow { bundle: String },
}

fn describe_amount(amount: &Option<f64>) -> String {
    match amount {
        Some(a) => format!("{a} (must be at least 0.01)"),
        None => "no amount entered".into(),
    }
}

/// Check a pledge amount without touching any ledger.
///
/// Returns the amount rounded to whole cents. Anything that rounds to zero
/// cents, or does not fit in a `u64` of cents, is rejected.
pub fn validate_amount(amount: Option<f64>) -> Result<u64, LedgerError> {
    match amount {
        Some(a) if a.is_finite() && a > 0.0 => {
            let cents = (a * 100.0).round();
            if cents >= 1.0 && cents < u64::MAX as f64 {
                Ok(cents as u64)
            } else {
                Err(LedgerError::InvalidPledge(amount))
            }
        }
        other => Err(LedgerError::InvalidPledge(other)),
    }
}

/// Cents to a decimal amount, for percentages and charts only.
pub fn cents_to_amount(cents: u64) -> f64 {
    cents as f64 / 100.0
}

/// Pledged vs goal for one bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PledgeProgress {
    pub bundle: String,
    pub pledged_cents: u64,
    pub goal: f64,
}

impl PledgeProgress {
    pub fn pledged(&self) -> f64 {
        cents_to_amount(self.pledged_cents)
    }

    /// Percentage of the goal reached; may exceed 100.
    pub fn percent_achieved(&self) -> f64 {
        self.pledged() / self.goal * 100.0
    }
}

impl fmt::Display for PledgeProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ${} pledged out of ${} ({:.2}% achieved)",
            self.bundle,
            format_cents(self.pledged_cents),
            format_currency(self.goal),
            self.percent_achieved()
        )
    }
}

/// Two decimals with thousands separators: `12345.6` → `12,345.60`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{}.{frac_part}", group_thousands(int_part))
}

/// Exact rendering of a cent count: `123456` → `1,234.56`.
pub fn format_cents(cents: u64) -> String {
    let whole = (cents / 100).to_string();
    format!("{}.{:02}", group_thousands(&whole), cents % 100)
}

fn group_thousands(int_part: &str) -> String {
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    grouped
}

#[derive(Debug)]
struct Entry {
    bundle: String,
    goal: f64,
    pledged_cents: u64,
}

impl Entry {
    fn progress(&self) -> PledgeProgress {
        PledgeProgress {
            bundle: self.bundle.clone(),
            pledged_cents: self.pledged_cents,
            goal: self.goal,
        }
    }
}

/// Pledge totals for every bundle in the catalog.
#[derive(Debug)]
pub struct PledgeLedger {
    entries: Mutex<Vec<Entry>>,
}

impl PledgeLedger {
    /// Zeroed ledger for the catalog's bundles, in catalog order.
    pub fn new(catalog: &BundleCatalog) -> Self {
        let entries = catalog
            .list_bundles()
            .iter()
            .map(|b| Entry {
                bundle: b.name.clone(),
                goal: b.goal,
                pledged_cents: 0,
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add `amount` to a bundle's total and return the new total in cents.
    ///
    /// Missing, non-positive, sub-cent or non-finite amounts are rejected and
    /// leave the ledger unchanged.
    pub fn pledge(&self, bundle: &str, amount: Option<f64>) -> Result<u64, LedgerError> {
        let cents = validate_amount(amount)?;
        self.pledge_cents(bundle, cents)
    }

    /// Add an already validated, non-zero number of cents.
    pub fn pledge_cents(&self, bundle: &str, cents: u64) -> Result<u64, LedgerError> {
        if cents == 0 {
            return Err(LedgerError::InvalidPledge(Some(0.0)));
        }
        let mut entries = self.lock();
        let entry = entries
            .iter_mut()
            .find(|e| e.bundle == bundle)
            .ok_or_else(|| LedgerError::UnknownBundle(bundle.to_string()))?;
        entry.pledged_cents = entry
            .pledged_cents
            .checked_add(cents)
            .ok_or_else(|| LedgerError::Overflow {
                bundle: bundle.to_string(),
            })?;
        tracing::info!(bundle, cents, total_cents = entry.pledged_cents, "pledge recorded");
        Ok(entry.pledged_cents)
    }

    /// Current total in cents.
    pub fn pledged_cents(&self, bundle: &str) -> Result<u64, LedgerError> {
        self.progress(bundle).map(|p| p.pledged_cents)
    }

    pub fn progress(&self, bundle: &str) -> Result<PledgeProgress, LedgerError> {
        self.lock()
            .iter()
            .find(|e| e.bundle == bundle)
            .map(Entry::progress)
            .ok_or_else(|| LedgerError::UnknownBundle(bundle.to_string()))
    }

    /// Snapshot of every bundle's progress, in catalog order.
    pub fn summary(&self) -> Vec<PledgeProgress> {
        self.lock().iter().map(Entry::progress).collect()
    }

    /// Totals in cents keyed by bundle name.
    pub fn totals(&self) -> BTreeMap<String, u64> {
        self.lock()
            .iter()
            .map(|e| (e.bundle.clone(), e.pledged_cents))
            .collect()
    }
}
