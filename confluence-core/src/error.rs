//! Engine error taxonomy.
//!
//! Every failure inside the engine surfaces as a `ConfluenceError`. A WAIT
//! decision or a policy rejection is not an error; see `policy::Verdict`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfluenceError {
    #[error("insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("invalid rule configuration: {0}")]
    Configuration(String),
}

impl ConfluenceError {
    pub(crate) fn invalid_candle(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCandle {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = ConfluenceError::InsufficientData {
            required: 32,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: 32 bars required, 10 available"
        );

        let err = ConfluenceError::invalid_candle(3, "high < low");
        assert_eq!(err.to_string(), "invalid candle at index 3: high < low");
    }
}
