//! Marketplace client abstractions and implementations.
//!
//! This module contains:
//! - The `MarketplaceClient` trait that all marketplace adapters implement
//! - The `RateSource` trait for exchange-rate upstreams
//! - Client capabilities
//! - Concrete clients (Taobao, Amazon, eBay, FairAPI, PriceAPI) and the
//!   ExchangeRate-API rate source
//!
//! # Architecture
//!
//! The client layer is designed to be:
//! - **Marketplace-agnostic**: the orchestrator only sees `MarketplaceClient`
//! - **Extensible**: a new marketplace is a new trait implementation
//! - **Fail-soft**: upstream failures surface as `Fetched::Empty`, never as
//!   errors the orchestrator has to handle

mod capabilities;
pub(crate) mod http;
pub(crate) mod rows;
mod traits;

pub mod amazon;
pub mod ebay;
pub mod exchange_rate_api;
pub mod fair_api;
pub mod price_api;
pub mod taobao;

// Re-exports
pub use capabilities::{ClientCapabilities, DEFAULT_UPSTREAM_TIMEOUT};
pub use traits::{MarketplaceClient, RateSource};
