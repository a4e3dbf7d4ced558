use crossprice_market_data::MarketDataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("No exchange rate source configured")]
    NoRateSource,

    #[error("Rate source failed: {0}")]
    Upstream(#[from] MarketDataError),

    #[error("Rate source returned no usable rates")]
    EmptyRateTable,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Snapshot storage failed: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl From<std::io::Error> for FxError {
    fn from(err: std::io::Error) -> Self {
        FxError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        FxError::Storage(format!("Invalid snapshot JSON: {}", err))
    }
}
