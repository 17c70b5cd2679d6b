//! Price series provider trait and structured fetch errors.
//!
//! The engine never talks to a data source directly. Anything that can
//! produce a validated [`CandleSeries`] implements [`PriceSeriesProvider`],
//! so the runner can swap TwelveData for CSV files or a synthetic feed.

use thiserror::Error;

use crate::domain::{CandleSeries, Interval};
use crate::error::ConfluenceError;

/// Errors from fetching a price series.
///
/// Displayable as-is in CLI output and log lines.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("response for {symbol} carried no price values")]
    MissingValues { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("no API key configured (set TWELVEDATA_KEY)")]
    MissingApiKey,

    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Series(#[from] ConfluenceError),
}

impl FetchError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::NetworkUnreachable(_) | FetchError::RateLimited
        )
    }
}

/// Source of recent candles for a symbol.
pub trait PriceSeriesProvider: Send + Sync {
    /// Short name for logs, e.g. "twelvedata".
    fn name(&self) -> &str;

    /// Fetch the most recent `size` candles, oldest first.
    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        size: usize,
    ) -> Result<CandleSeries, FetchError>;

    /// False while the provider refuses requests (e.g. breaker open).
    fn is_available(&self) -> bool {
        true
    }
}

impl<P: PriceSeriesProvider + ?Sized> PriceSeriesProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        size: usize,
    ) -> Result<CandleSeries, FetchError> {
        (**self).fetch_series(symbol, interval, size)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::NetworkUnreachable("timeout".into()).is_retryable());
        assert!(!FetchError::MissingApiKey.is_retryable());
        assert!(!FetchError::CircuitBreakerTripped.is_retryable());
    }

    #[test]
    fn series_errors_convert() {
        let err: FetchError = ConfluenceError::InsufficientData {
            required: 30,
            available: 3,
        }
        .into();
        assert!(matches!(err, FetchError::Series(_)));
        assert_eq!(
            err.to_string(),
            "insufficient data: 30 bars required, 3 available"
        );
    }
}
