//! Dashboard navigation state machine.
//!
//! Two pages: bundle selection (initial) and bundle detail. Actions either
//! move between them or are refused; a refused action leaves the state, the
//! view and the ledger exactly as they were and records a user-visible error.
//!
//! Selecting a bundle is split into three phases so a front-end can run the
//! slow middle phase on a worker thread:
//!
//! 1. `prepare_selection` validates the index and issues a `SelectionTicket`
//! 2. `load_bundle_view` fetches prices and computes metrics (no dashboard access)
//! 3. `commit_selection` applies the result, unless the ticket went stale
//!
//! `select_bundle` runs all three inline.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use pledgeboard_core::data::{DataError, PriceTableProvider};
use pledgeboard_core::ledger::{format_cents, validate_amount};
use pledgeboard_core::{
    AppConfig, BundleCatalog, CatalogError, CostSheet, LedgerError, PledgeLedger, PledgeProgress,
};

use crate::metrics::MetricsError;
use crate::view::{load_bundle_view, BundleView, SelectionTicket, ViewError, ViewSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    BundleSelection,
    BundleDetail,
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationState::BundleSelection => f.write_str("bundle selection"),
            NavigationState::BundleDetail => f.write_str("bundle detail"),
        }
    }
}

/// A discrete user action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    SelectBundle(usize),
    /// `None` when the input was left empty.
    SubmitPledge(Option<f64>),
    Back,
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing happened: no refetch, no ledger change.
    NoOp,
    EnteredDetail { bundle: String },
    PledgeRecorded {
        bundle: String,
        amount_cents: u64,
        progress: PledgeProgress,
    },
    ReturnedToSelection,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::NoOp => f.write_str("no-op"),
            Transition::EnteredDetail { bundle } => write!(f, "entered detail for {bundle}"),
            Transition::PledgeRecorded {
                amount_cents,
                progress,
                ..
            } => {
                write!(f, "pledged ${}; {progress}", format_cents(*amount_cents))
            }
            Transition::ReturnedToSelection => f.write_str("returned to bundle selection"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{action} is not available on the {state} page")]
    WrongState {
        action: &'static str,
        state: NavigationState,
    },

    #[error("selection of '{bundle}' was superseded")]
    StaleSelection { bundle: String },
}

impl From<ViewError> for DashboardError {
    fn from(e: ViewError) -> Self {
        match e {
            ViewError::Data(e) => DashboardError::Data(e),
            ViewError::Metrics(e) => DashboardError::Metrics(e),
        }
    }
}

/// One line of the selection page.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRow {
    pub index: usize,
    pub name: String,
    pub symbols: String,
    /// `Err` carries the reason the startup cost fetch failed.
    pub estimated_cost: Result<f64, String>,
    pub progress: PledgeProgress,
}

pub struct Dashboard {
    catalog: BundleCatalog,
    costs: CostSheet,
    ledger: Arc<PledgeLedger>,
    provider: Arc<dyn PriceTableProvider>,
    settings: ViewSettings,
    state: NavigationState,
    view: Option<BundleView>,
    /// Bumped on every selection and navigation; stale tickets don't match.
    generation: u64,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(
        catalog: BundleCatalog,
        costs: CostSheet,
        ledger: Arc<PledgeLedger>,
        provider: Arc<dyn PriceTableProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog,
            costs,
            ledger,
            provider,
            settings: ViewSettings::from(config),
            state: NavigationState::BundleSelection,
            view: None,
            generation: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// Name of the bundle on the detail page; `None` on the selection page.
    pub fn active_bundle(&self) -> Option<&str> {
        self.view.as_ref().map(|v| v.bundle.name.as_str())
    }

    pub fn view(&self) -> Option<&BundleView> {
        self.view.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn catalog(&self) -> &BundleCatalog {
        &self.catalog
    }

    pub fn costs(&self) -> &CostSheet {
        &self.costs
    }

    pub fn ledger(&self) -> &Arc<PledgeLedger> {
        &self.ledger
    }

    /// Shared handle for loading views off-thread.
    pub fn provider(&self) -> Arc<dyn PriceTableProvider> {
        Arc::clone(&self.provider)
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn selection_rows(&self) -> Vec<SelectionRow> {
        let summary = self.ledger.summary();
        self.catalog
            .list_bundles()
            .iter()
            .enumerate()
            .map(|(index, bundle)| SelectionRow {
                index,
                name: bundle.name.clone(),
                symbols: bundle.symbol_list(),
                estimated_cost: self.costs.estimated_cost(&bundle.name).map_err(|e| match e {
                    CatalogError::CostUnavailable { reason, .. } => reason,
                    other => other.to_string(),
                }),
                progress: summary
                    .iter()
                    .find(|p| p.bundle == bundle.name)
                    .cloned()
                    .unwrap_or_else(|| PledgeProgress {
                        bundle: bundle.name.clone(),
                        pledged_cents: 0,
                        goal: bundle.goal,
                    }),
            })
            .collect()
    }

    /// One "…pledged out of… (…% achieved)" line per bundle.
    pub fn pledge_summary(&self) -> Vec<String> {
        self.ledger.summary().iter().map(ToString::to_string).collect()
    }

    /// Apply an action. An absent action is an explicit no-op.
    pub fn dispatch(&mut self, action: Option<Action>) -> Result<Transition, DashboardError> {
        match action {
            None => {
                tracing::trace!("no action, nothing to do");
                Ok(Transition::NoOp)
            }
            Some(Action::SelectBundle(index)) => self.select_bundle(index),
            Some(Action::SubmitPledge(amount)) => self.submit_pledge(amount),
            Some(Action::Back) => self.back(),
        }
    }

    fn refuse<T>(&mut self, err: DashboardError) -> Result<T, DashboardError> {
        tracing::warn!(state = %self.state, error = %err, "action refused");
        self.last_error = Some(err.to_string());
        Err(err)
    }

    fn require(&mut self, state: NavigationState, action: &'static str) -> Result<(), DashboardError> {
        if self.state == state {
            Ok(())
        } else {
            let current = self.state;
            self.refuse(DashboardError::WrongState {
                action,
                state: current,
            })
        }
    }

    /// Resolve, fetch, compute and enter the detail page in one call.
    pub fn select_bundle(&mut self, index: usize) -> Result<Transition, DashboardError> {
        let ticket = self.prepare_selection(index)?;
        let result = load_bundle_view(self.provider.as_ref(), &ticket, &self.settings);
        self.commit_selection(&ticket, result)
    }

    /// Validate a selection and issue a ticket. No state change; any ticket
    /// issued earlier becomes stale.
    pub fn prepare_selection(&mut self, index: usize) -> Result<SelectionTicket, DashboardError> {
        self.require(NavigationState::BundleSelection, "selecting a bundle")?;
        let bundle = match self.catalog.bundle_at(index).cloned() {
            Ok(bundle) => bundle,
            Err(e) => return self.refuse(e.into()),
        };
        self.generation += 1;
        tracing::debug!(bundle = %bundle.name, generation = self.generation, "selection prepared");
        Ok(SelectionTicket {
            generation: self.generation,
            index,
            bundle,
        })
    }

    /// Apply a loaded view. Only the most recent ticket, still on the
    /// selection page, can enter the detail page.
    pub fn commit_selection(
        &mut self,
        ticket: &SelectionTicket,
        result: Result<BundleView, ViewError>,
    ) -> Result<Transition, DashboardError> {
        if ticket.generation != self.generation || self.state != NavigationState::BundleSelection {
            tracing::debug!(bundle = %ticket.bundle.name, "discarding stale selection");
            return Err(DashboardError::StaleSelection {
                bundle: ticket.bundle.name.clone(),
            });
        }
        match result {
            Ok(view) => {
                let bundle = view.bundle.name.clone();
                self.view = Some(view);
                self.state = NavigationState::BundleDetail;
                self.last_error = None;
                tracing::info!(%bundle, "entered bundle detail");
                Ok(Transition::EnteredDetail { bundle })
            }
            Err(e) => self.refuse(e.into()),
        }
    }

    /// Invalidate any outstanding ticket (e.g. the user cancelled a load).
    pub fn cancel_pending(&mut self) {
        self.generation += 1;
    }

    /// Record a pledge for the active bundle and return to selection.
    pub fn submit_pledge(&mut self, amount: Option<f64>) -> Result<Transition, DashboardError> {
        self.require(NavigationState::BundleDetail, "pledging")?;
        let bundle = match self.active_bundle().map(str::to_string) {
            Some(name) => name,
            None => {
                let current = self.state;
                return self.refuse(DashboardError::WrongState {
                    action: "pledging",
                    state: current,
                });
            }
        };
        let amount_cents = match validate_amount(amount) {
            Ok(cents) => cents,
            Err(e) => return self.refuse(e.into()),
        };
        if let Err(e) = self.ledger.pledge_cents(&bundle, amount_cents) {
            return self.refuse(e.into());
        }
        let progress = match self.ledger.progress(&bundle) {
            Ok(p) => p,
            Err(e) => return self.refuse(e.into()),
        };

        self.leave_detail();
        Ok(Transition::PledgeRecorded {
            bundle,
            amount_cents,
            progress,
        })
    }

    /// Leave the detail page without pledging.
    pub fn back(&mut self) -> Result<Transition, DashboardError> {
        self.require(NavigationState::BundleDetail, "going back")?;
        self.leave_detail();
        Ok(Transition::ReturnedToSelection)
    }

    fn leave_detail(&mut self) {
        self.view = None;
        self.state = NavigationState::BundleSelection;
        self.generation += 1;
        self.last_error = None;
        tracing::debug!("returned to bundle selection");
    }
}
