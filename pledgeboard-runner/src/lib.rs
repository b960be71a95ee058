//! PledgeBoard Runner — metrics engine, bundle views, dashboard state machine.
//!
//! This crate builds on `pledgeboard-core` to provide:
//! - Trailing returns, risk statistics, dividend info and chart data
//! - Bundle detail view loading (fetch + metrics), usable off the UI thread
//! - The two-page navigation controller and its actions
//! - Markdown rendering and JSON/CSV export of bundle metrics
//! - Startup wiring from an `AppConfig`

pub mod dashboard;
pub mod metrics;
pub mod report;
pub mod session;
pub mod view;

pub use dashboard::{
    Action, Dashboard, DashboardError, NavigationState, SelectionRow, Transition,
};
pub use metrics::{
    dividend_info, risk_statistics, trailing_returns, visualization_series, BundleMetrics,
    ChartSeries, DividendInfo, MetricValue, MetricsError, Period, RiskStatistics,
    TrailingReturns,
};
pub use report::ExportFormat;
pub use session::{build_dashboard, build_with_provider, SessionError};
pub use view::{load_bundle_view, BundleView, SelectionTicket, ViewError, ViewSettings};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn metrics_are_send_sync() {
        assert_send::<BundleMetrics>();
        assert_sync::<BundleMetrics>();
    }

    #[test]
    fn worker_payloads_are_send() {
        assert_send::<SelectionTicket>();
        assert_send::<ViewSettings>();
        assert_send::<Result<BundleView, ViewError>>();
    }

    #[test]
    fn dashboard_is_send() {
        assert_send::<Dashboard>();
    }
}
