//! Yahoo Finance price table provider.
//!
//! Fetches daily adjusted closes and dividend events from Yahoo's v8 chart API,
//! one request per symbol (in parallel), then aligns them into a table.
//! Handles rate limiting, retries with exponential backoff, and the circuit
//! breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV provider is the fallback when Yahoo is unavailable.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::align::{align_series, SymbolSeries};
use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, FetchRequest, PriceTableProvider};
use crate::config::ProviderConfig;
use crate::domain::{DividendEvent, PriceTable};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
    events: Option<Events>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct Events {
    dividends: Option<HashMap<String, DividendData>>,
}

#[derive(Debug, Deserialize)]
struct DividendData {
    amount: f64,
    date: i64,
}

/// Longest single backoff between attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Exponential backoff for retry `attempt` (1-based), capped at [`MAX_RETRY_DELAY`].
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

/// Yahoo Finance provider, configured once at construction.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        config: &ProviderConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let midnight = |d: NaiveDate| {
            d.and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp())
                .unwrap_or_default()
        };
        let start_ts = midnight(start);
        let end_ts = midnight(end.succ_opt().unwrap_or(end));
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true&events=div"
        )
    }

    fn to_date(ts: i64) -> Result<NaiveDate, DataError> {
        chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))
    }

    /// Parse the chart response into a series (adjusted close, falling back to close).
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<SymbolSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut prices = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let adj = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());
            let close = closes.get(i).copied().flatten();
            // Holidays come back as all-null rows
            if let Some(price) = adj.or(close) {
                prices.push((Self::to_date(ts)?, price));
            }
        }

        if prices.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut dividends = Vec::new();
        if let Some(divs) = data.events.and_then(|e| e.dividends) {
            for d in divs.into_values() {
                dividends.push(DividendEvent {
                    date: Self::to_date(d.date)?,
                    amount: d.amount,
                });
            }
        }
        dividends.sort_by_key(|d| d.date);

        Ok(SymbolSeries {
            symbol: symbol.to_string(),
            prices,
            dividends,
            source: DataSource::YahooFinance,
        })
    }

    /// One symbol, with retry and circuit breaker logic.
    fn fetch_series(&self, symbol: &str, start: NaiveDate) -> Result<SymbolSeries, DataError> {
        let end = chrono::Utc::now().date_naive();
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, attempt);
                tracing::debug!(symbol, attempt, ?delay, "retrying price fetch");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let series = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_success();
            return Ok(series);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl PriceTableProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceTable, DataError> {
        let symbols = request.all_symbols();
        tracing::info!(symbols = ?symbols, start = %request.start, "fetching prices from Yahoo");

        let fetched: Vec<Result<SymbolSeries, DataError>> = symbols
            .par_iter()
            .map(|s| self.fetch_series(s, request.start))
            .collect();

        let mut series = Vec::with_capacity(fetched.len());
        for result in fetched {
            match result {
                Ok(s) => series.push(s),
                // A delisted or mistyped symbol leaves its column out; the
                // metrics engine reports it as a symbol mismatch.
                Err(DataError::SymbolNotFound { symbol }) => {
                    tracing::warn!(%symbol, "symbol not found, column omitted");
                }
                Err(e) => return Err(e),
            }
        }

        align_series(series)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "chart": {
        "result": [{
          "timestamp": [1704205800, 1704292200, 1704378600],
          "indicators": {
            "quote": [{"close": [472.65, 468.79, null]}],
            "adjclose": [{"adjclose": [465.1, 461.3, null]}]
          },
          "events": {
            "dividends": {
              "1704292200": {"amount": 1.9, "date": 1704292200}
            }
          }
        }],
        "error": null
      }
    }"#;

    #[test]
    fn parses_adjusted_close_and_dividends() {
        let resp: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let series = YahooProvider::parse_response("SPY", resp).unwrap();
        assert_eq!(series.prices.len(), 2);
        assert_eq!(series.prices[0].1, 465.1);
        assert_eq!(series.dividends.len(), 1);
        assert_eq!(series.dividends[0].amount, 1.9);
        assert_eq!(series.source, DataSource::YahooFinance);
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        let err = YahooProvider::parse_response("NOPE", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE"));
    }

    #[test]
    fn url_covers_the_end_date() {
        let url = YahooProvider::chart_url(
            "GLD",
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        );
        assert!(url.contains("period1=1262304000"));
        assert!(url.contains("period2=1262390400"));
        assert!(url.contains("events=div"));
    }

    #[test]
    fn retry_delay_doubles_then_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(500));
        assert_eq!(retry_delay(base, 3), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 40), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(Duration::from_millis(u64::MAX), 5), MAX_RETRY_DELAY);
    }
}
