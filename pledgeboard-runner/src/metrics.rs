//! Metrics engine — trailing returns, risk statistics, dividend info, chart data.
//!
//! All functions are pure: a `PriceTable` in, tables of `MetricValue` out.
//! A cell that cannot be computed is never dropped; it is marked `Missing`
//! (not enough rows) or `Undefined` (division by zero).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use pledgeboard_core::PriceTable;

/// Trading days in a year, used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Below this, a standard deviation is treated as zero.
const ZERO_VOLATILITY: f64 = 1e-15;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("insufficient data: {0}")]
    DataInsufficient(String),

    #[error("symbol {symbol} is not a column of the price table (columns: {available})")]
    SymbolMismatch { symbol: String, available: String },
}

/// One computed cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Value(f64),
    /// The table is too short for this computation.
    Missing,
    /// The computation divides by zero.
    Undefined,
}

impl MetricValue {
    /// `numerator / denominator`, `Undefined` when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            MetricValue::Undefined
        } else {
            MetricValue::Value(numerator / denominator)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(self) -> bool {
        matches!(self, MetricValue::Value(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            MetricValue::Value(v) => MetricValue::Value(f(v)),
            other => other,
        }
    }

    /// As a percentage with two decimals: `0.1234` → `12.34%`.
    pub fn as_percent(self) -> String {
        match self {
            MetricValue::Value(v) => format!("{:.2}%", v * 100.0),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v:.4}"),
            },
            MetricValue::Missing => f.write_str("n/a"),
            MetricValue::Undefined => f.write_str("div/0"),
        }
    }
}

/// Trailing-return lookback, in trading days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1 Month")]
    OneMonth,
    #[serde(rename = "3 Month")]
    ThreeMonth,
    #[serde(rename = "1 Year")]
    OneYear,
    #[serde(rename = "3 Year")]
    ThreeYear,
}

impl Period {
    /// Canonical display order.
    pub const ALL: [Period; 4] = [
        Period::OneMonth,
        Period::ThreeMonth,
        Period::OneYear,
        Period::ThreeYear,
    ];

    pub fn trading_days(self) -> usize {
        match self {
            Period::OneMonth => 21,
            Period::ThreeMonth => 63,
            Period::OneYear => 252,
            Period::ThreeYear => 756,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::OneMonth => "1 Month",
            Period::ThreeMonth => "3 Month",
            Period::OneYear => "1 Year",
            Period::ThreeYear => "3 Year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn check_table(prices: &PriceTable) -> Result<(), MetricsError> {
    if prices.is_empty() {
        return Err(MetricsError::DataInsufficient("price table has no rows".into()));
    }
    if prices.column_count() == 0 {
        return Err(MetricsError::DataInsufficient("price table has no columns".into()));
    }
    Ok(())
}

fn require_column<'a>(prices: &'a PriceTable, symbol: &str) -> Result<&'a [f64], MetricsError> {
    prices.column(symbol).ok_or_else(|| MetricsError::SymbolMismatch {
        symbol: symbol.to_string(),
        available: prices.symbols().join(", "),
    })
}

// ─── Trailing returns ───────────────────────────────────────────────

/// Returns for one period, one cell per symbol (table column order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingRow {
    pub period: Period,
    pub values: Vec<MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingReturns {
    pub symbols: Vec<String>,
    pub rows: Vec<TrailingRow>,
}

impl TrailingReturns {
    pub fn get(&self, period: Period, symbol: &str) -> Option<MetricValue> {
        let col = self.symbols.iter().position(|s| s == symbol)?;
        self.rows
            .iter()
            .find(|r| r.period == period)
            .and_then(|r| r.values.get(col).copied())
    }
}

/// `price[last] / price[last - period] - 1` for each period and column.
///
/// Periods are reported in canonical order regardless of input order.
pub fn trailing_returns(
    prices: &PriceTable,
    periods: &[Period],
) -> Result<TrailingReturns, MetricsError> {
    check_table(prices)?;

    let mut periods = periods.to_vec();
    periods.sort();
    periods.dedup();

    let last = prices.len() - 1;
    let rows = periods
        .into_iter()
        .map(|period| {
            let lookback = period.trading_days();
            let values = prices
                .columns()
                .map(|(_, column)| {
                    if last < lookback {
                        MetricValue::Missing
                    } else {
                        MetricValue::ratio(column[last], column[last - lookback]).map(|r| r - 1.0)
                    }
                })
                .collect();
            TrailingRow { period, values }
        })
        .collect();

    Ok(TrailingReturns {
        symbols: prices.symbols().to_vec(),
        rows,
    })
}

// ─── Risk statistics ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRow {
    pub symbol: String,
    pub annualized_volatility: MetricValue,
    pub sharpe_ratio: MetricValue,
    pub max_drawdown: MetricValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskStatistics {
    pub rows: Vec<RiskRow>,
}

impl RiskStatistics {
    pub fn get(&self, symbol: &str) -> Option<&RiskRow> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }
}

/// Simple daily returns; the first row has none, so the output is one shorter.
/// A zero previous price yields a non-finite entry.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator). Needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Deepest fall from the running peak, as a fraction (≤ 0).
pub fn max_drawdown(prices: &[f64]) -> MetricValue {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &p in prices {
        peak = peak.max(p);
        if peak <= 0.0 {
            return MetricValue::Undefined;
        }
        worst = worst.min(p / peak - 1.0);
    }
    MetricValue::Value(worst)
}

fn risk_row(symbol: &str, column: &[f64]) -> RiskRow {
    let returns = daily_returns(column);
    let (annualized_volatility, sharpe_ratio) = if returns.iter().any(|r| !r.is_finite()) {
        (MetricValue::Undefined, MetricValue::Undefined)
    } else {
        match sample_std_dev(&returns) {
            None => (MetricValue::Missing, MetricValue::Missing),
            Some(std) => {
                let vol = std * TRADING_DAYS_PER_YEAR.sqrt();
                let annual_return = mean(&returns) * TRADING_DAYS_PER_YEAR;
                let sharpe = if vol < ZERO_VOLATILITY {
                    MetricValue::Undefined
                } else {
                    MetricValue::Value(annual_return / vol)
                };
                (MetricValue::Value(vol), sharpe)
            }
        }
    };

    RiskRow {
        symbol: symbol.to_string(),
        annualized_volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(column),
    }
}

/// Volatility, Sharpe and max drawdown for every column of the table.
pub fn risk_statistics(prices: &PriceTable) -> Result<RiskStatistics, MetricsError> {
    check_table(prices)?;
    let rows = prices
        .columns()
        .map(|(symbol, column)| risk_row(symbol, column))
        .collect();
    Ok(RiskStatistics { rows })
}

// ─── Dividends ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRow {
    pub symbol: String,
    /// Payouts since the first table date over the latest price, in percent.
    pub yield_percent: MetricValue,
    /// Sum of payouts since the first table date.
    pub annual_payout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendInfo {
    pub rows: Vec<DividendRow>,
}

impl DividendInfo {
    pub fn get(&self, symbol: &str) -> Option<&DividendRow> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }
}

/// Cumulative dividends since the table start, relative to the latest price.
///
/// Symbols with no dividend events report a zero yield and payout.
pub fn dividend_info(symbols: &[String], prices: &PriceTable) -> Result<DividendInfo, MetricsError> {
    check_table(prices)?;
    let start = prices.start_date();

    let mut rows = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let column = require_column(prices, symbol)?;
        let latest = column[column.len() - 1];
        let payout: f64 = prices
            .dividends(symbol)
            .iter()
            .filter(|d| start.map_or(true, |s| d.date >= s))
            .map(|d| d.amount)
            .sum();
        let yield_percent = if payout == 0.0 {
            MetricValue::Value(0.0)
        } else {
            MetricValue::ratio(payout, latest).map(|y| y * 100.0)
        };
        rows.push(DividendRow {
            symbol: symbol.clone(),
            yield_percent,
            annual_payout: payout,
        });
    }
    Ok(DividendInfo { rows })
}

// ─── Chart data ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub value: MetricValue,
}

/// One group of bars: a period label with a bar per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartGroup {
    pub label: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub bar_mode: BarMode,
    pub groups: Vec<ChartGroup>,
}

impl ChartSeries {
    /// Largest absolute computed value, for scaling.
    pub fn max_abs(&self) -> f64 {
        self.groups
            .iter()
            .flat_map(|g| g.bars.iter())
            .filter_map(|b| b.value.value())
            .fold(0.0, |acc, v| acc.max(v.abs()))
    }
}

/// Reshape trailing returns into grouped-bar data. No rendering happens here.
pub fn visualization_series(returns: &TrailingReturns) -> ChartSeries {
    let groups = returns
        .rows
        .iter()
        .map(|row| ChartGroup {
            label: row.period.label().to_string(),
            bars: returns
                .symbols
                .iter()
                .zip(&row.values)
                .map(|(symbol, value)| Bar {
                    symbol: symbol.clone(),
                    value: *value,
                })
                .collect(),
        })
        .collect();

    ChartSeries {
        title: "Trailing Returns Comparison".into(),
        x_axis: "Time Period".into(),
        y_axis: "Returns".into(),
        bar_mode: BarMode::Group,
        groups,
    }
}

// ─── Everything for one bundle ──────────────────────────────────────

/// All metrics shown on a bundle's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetrics {
    pub trailing_returns: TrailingReturns,
    pub risk: RiskStatistics,
    pub dividends: DividendInfo,
    pub chart: ChartSeries,
}

impl BundleMetrics {
    /// Run the whole engine. `symbols` are the bundle's own instruments; the
    /// table may carry extra columns (the benchmark), which get returns and
    /// risk rows but no dividend row.
    pub fn compute(symbols: &[String], prices: &PriceTable) -> Result<Self, MetricsError> {
        check_table(prices)?;
        for symbol in symbols {
            require_column(prices, symbol)?;
        }
        let trailing_returns = trailing_returns(prices, &Period::ALL)?;
        let risk = risk_statistics(prices)?;
        let dividends = dividend_info(symbols, prices)?;
        let chart = visualization_series(&trailing_returns);
        Ok(Self {
            trailing_returns,
            risk,
            dividends,
            chart,
        })
    }
}
