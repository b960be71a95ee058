//! Report rendering and export — Markdown, JSON and CSV.
//!
//! The Markdown tables are what the dashboard's metrics panel and the CLI
//! print. JSON is a full serialization of `BundleMetrics`; CSV is a long
//! format with one row per cell.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::metrics::{BundleMetrics, ChartSeries, DividendInfo, RiskStatistics, TrailingReturns};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{other}' (expected json or csv)")),
        }
    }
}

// ─── Markdown ───────────────────────────────────────────────────────

fn header(out: &mut String, first: &str, columns: &[String]) {
    let _ = write!(out, "| {first} |");
    for c in columns {
        let _ = write!(out, " {c} |");
    }
    out.push('\n');
    out.push_str("|---|");
    for _ in columns {
        out.push_str("---|");
    }
    out.push('\n');
}

pub fn trailing_returns_table(returns: &TrailingReturns) -> String {
    let mut out = String::new();
    header(&mut out, "Period", &returns.symbols);
    for row in &returns.rows {
        let _ = write!(out, "| {} |", row.period);
        for v in &row.values {
            let _ = write!(out, " {} |", v.as_percent());
        }
        out.push('\n');
    }
    out
}

pub fn risk_table(risk: &RiskStatistics) -> String {
    let mut out = String::new();
    let columns = [
        "Annualized Volatility".to_string(),
        "Sharpe Ratio".to_string(),
        "Max Drawdown".to_string(),
    ];
    header(&mut out, "Symbol", &columns);
    for row in &risk.rows {
        let _ = writeln!(
            out,
            "| {} | {} | {:.2} | {} |",
            row.symbol,
            row.annualized_volatility.as_percent(),
            row.sharpe_ratio,
            row.max_drawdown.as_percent()
        );
    }
    out
}

pub fn dividend_table(dividends: &DividendInfo) -> String {
    let mut out = String::new();
    let columns = ["Dividend Yield".to_string(), "Annual Payout".to_string()];
    header(&mut out, "Symbol", &columns);
    for row in &dividends.rows {
        let _ = writeln!(
            out,
            "| {} | {} | ${:.2} |",
            row.symbol,
            row.yield_percent.map(|y| y / 100.0).as_percent(),
            row.annual_payout
        );
    }
    out
}

/// Text rendering of the chart data: one line per period group.
pub fn chart_summary(chart: &ChartSeries) -> String {
    let mut out = format!("{} ({} vs {})\n", chart.title, chart.y_axis, chart.x_axis);
    for group in &chart.groups {
        let _ = write!(out, "  {:<8}", group.label);
        for bar in &group.bars {
            let _ = write!(out, "  {} {:>8}", bar.symbol, bar.value.as_percent());
        }
        out.push('\n');
    }
    out
}

/// All sections, with headings.
pub fn metrics_markdown(bundle: &str, metrics: &BundleMetrics) -> String {
    format!(
        "# {bundle}\n\n\
         ## Trailing Returns\n\n{}\n\
         ## Risk Statistics\n\n{}\n\
         ## Dividends\n\n{}\n\
         ## Chart\n\n{}",
        trailing_returns_table(&metrics.trailing_returns),
        risk_table(&metrics.risk),
        dividend_table(&metrics.dividends),
        chart_summary(&metrics.chart),
    )
}

// ─── JSON / CSV ─────────────────────────────────────────────────────

pub fn export_json(metrics: &BundleMetrics) -> Result<String> {
    serde_json::to_string_pretty(metrics).context("failed to serialize metrics to JSON")
}

/// Long-format CSV. Columns: section, row, symbol, value.
/// Cells that could not be computed carry `n/a` or `div/0`.
pub fn export_csv(metrics: &BundleMetrics) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["section", "row", "symbol", "value"])?;

    let returns = &metrics.trailing_returns;
    for row in &returns.rows {
        for (symbol, value) in returns.symbols.iter().zip(&row.values) {
            wtr.write_record([
                "trailing_return",
                row.period.label(),
                symbol.as_str(),
                format!("{value:.6}").as_str(),
            ])?;
        }
    }
    for row in &metrics.risk.rows {
        for (name, value) in [
            ("annualized_volatility", row.annualized_volatility),
            ("sharpe_ratio", row.sharpe_ratio),
            ("max_drawdown", row.max_drawdown),
        ] {
            wtr.write_record(["risk", name, row.symbol.as_str(), format!("{value:.6}").as_str()])?;
        }
    }
    for row in &metrics.dividends.rows {
        wtr.write_record([
            "dividend",
            "yield_percent",
            row.symbol.as_str(),
            format!("{:.6}", row.yield_percent).as_str(),
        ])?;
        wtr.write_record([
            "dividend",
            "annual_payout",
            row.symbol.as_str(),
            format!("{:.6}", row.annual_payout).as_str(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

pub fn export(metrics: &BundleMetrics, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(metrics),
        ExportFormat::Csv => export_csv(metrics),
    }
}

/// Render and write to `path`, creating parent directories.
pub fn write_export(metrics: &BundleMetrics, format: ExportFormat, path: &Path) -> Result<()> {
    let body = export(metrics, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), ?format, "metrics exported");
    Ok(())
}
