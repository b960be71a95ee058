//! Application state — single-owner, main-thread only.
//!
//! The dashboard state machine lives here. Bundle loads run on the worker
//! thread and come back through `apply_loaded`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use chrono::NaiveDateTime;

use pledgeboard_runner::{
    BundleView, Dashboard, DashboardError, NavigationState, SelectionTicket, Transition, ViewError,
};

use crate::worker::{WorkerCommand, WorkerResponse};

/// Longest pledge amount the input box accepts.
pub const MAX_PLEDGE_INPUT: usize = 12;

const MAX_ERROR_HISTORY: usize = 50;

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Metrics,
    Catalog,
    Pledge,
    Navigation,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Data => "DATA",
            ErrorCategory::Metrics => "CALC",
            ErrorCategory::Catalog => "CAT",
            ErrorCategory::Pledge => "PLEDGE",
            ErrorCategory::Navigation => "NAV",
        }
    }

    pub fn of(err: &DashboardError) -> Self {
        match err {
            DashboardError::Data(_) => ErrorCategory::Data,
            DashboardError::Metrics(_) => ErrorCategory::Metrics,
            DashboardError::Catalog(_) => ErrorCategory::Catalog,
            DashboardError::Ledger(_) => ErrorCategory::Pledge,
            DashboardError::WrongState { .. } | DashboardError::StaleSelection { .. } => {
                ErrorCategory::Navigation
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
    Help,
}

pub struct AppState {
    pub dashboard: Dashboard,
    pub running: bool,
    /// Highlighted row on the selection page.
    pub cursor: usize,
    pub pledge_input: String,
    /// The selection currently being loaded by the worker.
    pub loading: Option<SelectionTicket>,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub cancel: Arc<AtomicBool>,

    // Status and errors
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
}

impl AppState {
    pub fn new(
        dashboard: Dashboard,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            dashboard,
            running: true,
            cursor: 0,
            pledge_input: String::new(),
            loading: None,
            worker_tx,
            worker_rx,
            cancel,
            status_message: None,
            error_history: VecDeque::with_capacity(MAX_ERROR_HISTORY),
            error_scroll: 0,
            overlay: Overlay::None,
        }
    }

    pub fn page(&self) -> NavigationState {
        self.dashboard.state()
    }

    pub fn bundle_count(&self) -> usize {
        self.dashboard.catalog().len()
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.bundle_count() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > MAX_ERROR_HISTORY {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn report(&mut self, err: &DashboardError, context: impl Into<String>) {
        self.push_error(ErrorCategory::of(err), err.to_string(), context.into());
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Start loading the highlighted bundle on the worker.
    pub fn request_selection(&mut self) {
        if let Some(ticket) = &self.loading {
            let msg = format!("Still loading {}", ticket.bundle.name);
            self.set_warning(msg);
            return;
        }
        let ticket = match self.dashboard.prepare_selection(self.cursor) {
            Ok(ticket) => ticket,
            Err(e) => {
                self.report(&e, format!("select bundle #{}", self.cursor + 1));
                return;
            }
        };

        let command = WorkerCommand::LoadBundle {
            ticket: ticket.clone(),
            provider: self.dashboard.provider(),
            settings: self.dashboard.settings().clone(),
        };
        if self.worker_tx.send(command).is_err() {
            self.set_warning("Background worker is not running");
            return;
        }
        self.set_status(format!("Loading {} ({})...", ticket.bundle.name, ticket.bundle.symbol_list()));
        self.loading = Some(ticket);
    }

    /// Apply a finished load from the worker.
    pub fn apply_loaded(&mut self, ticket: SelectionTicket, result: Result<BundleView, ViewError>) {
        if self.loading.as_ref() == Some(&ticket) {
            self.loading = None;
        }
        let name = ticket.bundle.name.clone();
        match self.dashboard.commit_selection(&ticket, result) {
            Ok(_) => {
                self.pledge_input.clear();
                self.set_status(format!("{name}: enter a pledge amount and press Enter"));
            }
            Err(DashboardError::StaleSelection { .. }) => {
                tracing::debug!(bundle = %name, "ignoring stale bundle load");
            }
            Err(e) => self.report(&e, format!("load {name}")),
        }
    }

    /// Submit the typed amount. An empty box submits no amount.
    pub fn submit_pledge(&mut self) {
        let amount = parse_amount(&self.pledge_input);
        match self.dashboard.submit_pledge(amount) {
            Ok(Transition::PledgeRecorded { progress, .. }) => {
                self.pledge_input.clear();
                self.set_status(progress.to_string());
            }
            Ok(_) => {}
            Err(e) => self.report(&e, "submit pledge"),
        }
    }

    /// Esc on the detail page, or cancel an in-flight load.
    pub fn go_back(&mut self) {
        if let Some(ticket) = self.loading.take() {
            self.cancel.store(true, Ordering::Relaxed);
            self.dashboard.cancel_pending();
            self.set_warning(format!("Cancelled loading {}", ticket.bundle.name));
            return;
        }
        if self.page() == NavigationState::BundleDetail {
            match self.dashboard.back() {
                Ok(_) => {
                    self.pledge_input.clear();
                    self.set_status("Back to bundle selection");
                }
                Err(e) => self.report(&e, "back"),
            }
        }
    }
}

/// Parse the pledge box: empty (or unparsable) is no amount.
pub fn parse_amount(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::NaiveDate;
    use pledgeboard_core::data::SyntheticProvider;
    use pledgeboard_core::AppConfig;
    use std::sync::mpsc;

    /// App over a synthetic provider; the returned receiver sees worker commands.
    pub fn test_app() -> (AppState, mpsc::Receiver<WorkerCommand>, mpsc::Sender<WorkerResponse>) {
        let config = AppConfig {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            ..AppConfig::default()
        };
        let provider = Arc::new(SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()));
        let dashboard = pledgeboard_runner::build_with_provider(&config, provider).unwrap();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let app = AppState::new(dashboard, cmd_tx, resp_rx, Arc::new(AtomicBool::new(false)));
        (app, cmd_rx, resp_tx)
    }

    /// Run a queued load command inline, the way the worker would.
    pub fn run_load(app: &mut AppState, rx: &mpsc::Receiver<WorkerCommand>) {
        match rx.try_recv() {
            Ok(WorkerCommand::LoadBundle {
                ticket,
                provider,
                settings,
            }) => {
                let result = pledgeboard_runner::load_bundle_view(provider.as_ref(), &ticket, &settings);
                app.apply_loaded(ticket, result);
            }
            _ => panic!("expected a LoadBundle command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{run_load, test_app};
    use super::*;

    #[test]
    fn error_history_caps_at_50() {
        let (mut app, _rx, _tx) = test_app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Data, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }

    #[test]
    fn cursor_stays_in_range() {
        let (mut app, _rx, _tx) = test_app();
        app.cursor_up();
        assert_eq!(app.cursor, 0);
        for _ in 0..10 {
            app.cursor_down();
        }
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn select_load_and_pledge() {
        let (mut app, rx, _tx) = test_app();
        app.cursor = 1;
        app.request_selection();
        assert!(app.loading.is_some());
        assert_eq!(app.page(), NavigationState::BundleSelection);

        run_load(&mut app, &rx);
        assert!(app.loading.is_none());
        assert_eq!(app.page(), NavigationState::BundleDetail);
        assert_eq!(app.dashboard.active_bundle(), Some("Bundle 2"));

        app.pledge_input = "1250.75".into();
        app.submit_pledge();
        assert_eq!(app.page(), NavigationState::BundleSelection);
        let (msg, level) = app.status_message.clone().unwrap();
        assert_eq!(level, StatusLevel::Info);
        assert_eq!(msg, "Bundle 2: $1,250.75 pledged out of $10,000.00 (12.51% achieved)");
    }

    #[test]
    fn empty_pledge_is_rejected_and_recorded() {
        let (mut app, rx, _tx) = test_app();
        app.request_selection();
        run_load(&mut app, &rx);
        app.submit_pledge();
        assert_eq!(app.page(), NavigationState::BundleDetail);
        assert_eq!(app.error_history[0].category, ErrorCategory::Pledge);
    }

    #[test]
    fn cancel_discards_late_result() {
        let (mut app, rx, _tx) = test_app();
        app.request_selection();
        app.go_back();
        assert!(app.cancel.load(Ordering::Relaxed));
        run_load(&mut app, &rx);
        assert_eq!(app.page(), NavigationState::BundleSelection);
        assert!(app.error_history.is_empty());
    }

    #[test]
    fn second_request_while_loading_warns() {
        let (mut app, rx, _tx) = test_app();
        app.request_selection();
        app.request_selection();
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Warning);
        run_load(&mut app, &rx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("  "), None);
        assert_eq!(parse_amount("."), None);
        assert_eq!(parse_amount("2500"), Some(2500.0));
    }
}
