//! Price series providers.

pub mod circuit_breaker;
pub mod csv_provider;
pub mod provider;
pub mod synthetic;
pub mod twelvedata;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_provider::CsvProvider;
pub use provider::{FetchError, PriceSeriesProvider};
pub use synthetic::SyntheticProvider;
pub use twelvedata::TwelveDataProvider;
