//! FX (Foreign Exchange) module - rate cache, snapshot persistence, and
//! price normalization.

pub mod convert;
mod exchange_rate_cache;
mod fx_errors;
mod fx_model;
mod fx_repository;
mod fx_traits;

pub use convert::{apply_rate, round_half_even};
pub use exchange_rate_cache::ExchangeRateCache;
pub use fx_errors::FxError;
pub use fx_model::{CacheState, ConversionResult, RateSnapshot};
pub use fx_repository::{InMemorySnapshotStore, JsonFileSnapshotStore};
pub use fx_traits::RateSnapshotStore;
