//! Crossprice Core - Aggregation services, exchange rates and price
//! normalization.
//!
//! This crate holds the business logic of the aggregator. Marketplace
//! access lives in `crossprice-market-data`; snapshot persistence is
//! pluggable through [`fx::RateSnapshotStore`].

pub mod aggregation;
pub mod constants;
pub mod errors;
pub mod fx;

// Re-export the service surface
pub use aggregation::{AggregatedResult, PriceAnalysis, PriceComparisonService, SearchRequest};
pub use fx::{ConversionResult, ExchangeRateCache};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
