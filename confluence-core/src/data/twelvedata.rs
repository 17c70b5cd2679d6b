//! TwelveData time-series provider.
//!
//! Fetches recent candles from `/time_series` with retries, exponential
//! backoff and a shared circuit breaker. Prices arrive as JSON strings and
//! are parsed here; the resulting series goes through the same validation
//! as any other source.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{FetchError, PriceSeriesProvider};
use crate::domain::{Candle, CandleSeries, Interval};

pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// Largest `outputsize` the API accepts.
pub const MAX_OUTPUT_SIZE: usize = 5000;

/// Ceiling for a single retry wait.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Wait before retry number `attempt` (1-based): `base * 2^(attempt - 1)`,
/// capped at [`MAX_RETRY_DELAY`].
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Vec<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

pub struct TwelveDataProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl TwelveDataProvider {
    pub fn new(
        api_key: impl Into<String>,
        timeout: Duration,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("confluence/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::NetworkUnreachable(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Point at a different host (a mirror or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn query(&self, symbol: &str, interval: Interval, size: usize) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.as_str().to_string()),
            ("outputsize", size.clamp(1, MAX_OUTPUT_SIZE).to_string()),
            ("apikey", self.api_key.clone()),
            ("timezone", "UTC".to_string()),
            ("order", "ASC".to_string()),
            ("format", "JSON".to_string()),
        ]
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        interval: Interval,
        size: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        if self.api_key.trim().is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let url = format!("{}/time_series", self.base_url);
        let query = self.query(symbol, interval, size);
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, attempt);
                let reason = last_error.as_ref().map(ToString::to_string).unwrap_or_default();
                warn!(
                    symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %reason,
                    "retrying time_series request"
                );
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(FetchError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).query(&query).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(FetchError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(FetchError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(FetchError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                last_error = Some(FetchError::RateLimited);
                continue;
            }
            if status.is_server_error() {
                self.circuit_breaker.record_failure();
                last_error = Some(FetchError::Api {
                    code: i64::from(status.as_u16()),
                    message: format!("HTTP {status}"),
                });
                continue;
            }

            let body = resp
                .text()
                .map_err(|e| FetchError::ResponseFormatChanged(format!("unreadable body: {e}")))?;

            match parse_response(symbol, &body) {
                Ok(candles) => {
                    self.circuit_breaker.record_success();
                    debug!(symbol, %interval, candles = candles.len(), "time_series fetched");
                    return Ok(candles);
                }
                Err(FetchError::RateLimited) => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(FetchError::RateLimited);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(FetchError::RateLimited))
    }
}

impl PriceSeriesProvider for TwelveDataProvider {
    fn name(&self) -> &str {
        "twelvedata"
    }

    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        size: usize,
    ) -> Result<CandleSeries, FetchError> {
        let candles = self.fetch_with_retry(symbol, interval, size)?;
        Ok(CandleSeries::new(symbol, interval, candles)?)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Decode a `/time_series` body into candles sorted oldest first.
///
/// An error body maps to [`FetchError::Api`] (or `RateLimited` for code 429);
/// a body without `values` is [`FetchError::MissingValues`].
pub fn parse_response(symbol: &str, body: &str) -> Result<Vec<Candle>, FetchError> {
    let resp: TimeSeriesResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::ResponseFormatChanged(format!("invalid JSON: {e}")))?;

    if resp.status.as_deref() == Some("error") {
        let code = resp.code.unwrap_or(0);
        if code == 429 {
            return Err(FetchError::RateLimited);
        }
        return Err(FetchError::Api {
            code,
            message: resp.message.unwrap_or_else(|| "unknown error".into()),
        });
    }

    let values = resp.values.ok_or_else(|| FetchError::MissingValues {
        symbol: symbol.to_string(),
    })?;

    let mut candles = values
        .iter()
        .map(parse_value)
        .collect::<Result<Vec<_>, _>>()?;
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn parse_value(raw: &RawValue) -> Result<Candle, FetchError> {
    let price = |field: &str, text: &str| {
        text.trim().parse::<f64>().map_err(|_| {
            FetchError::ResponseFormatChanged(format!(
                "{field} at {} is not a number: {text:?}",
                raw.datetime
            ))
        })
    };
    let candle = Candle::new(
        parse_datetime(&raw.datetime)?,
        price("open", &raw.open)?,
        price("high", &raw.high)?,
        price("low", &raw.low)?,
        price("close", &raw.close)?,
    );
    let volume = match raw.volume.as_deref() {
        Some(text) if !text.trim().is_empty() => price("volume", text)?,
        _ => 0.0,
    };
    Ok(candle.with_volume(volume))
}

/// Intraday values carry a time; daily values are a bare date.
pub(crate) fn parse_datetime(text: &str) -> Result<DateTime<Utc>, FetchError> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| FetchError::ResponseFormatChanged(format!("unrecognised datetime: {text:?}")))
}
