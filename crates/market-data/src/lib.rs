//! Crossprice Market Data Crate
//!
//! This crate provides marketplace-agnostic product and price fetching for
//! the Crossprice aggregator.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Keyword search and detail lookup across domestic and international
//!   marketplaces
//! - Price tracking, price history and market insights through aggregators
//! - Request signing for gateways that require it (HMAC-SHA256, MD5 digest)
//! - Exchange-rate tables for price normalization
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   Orchestrator   |  (crossprice-core)
//! +------------------+
//!          |
//!          v
//! +--------------------+     +------------------+
//! | MarketplaceClient  | --> |    Fetched<T>    |  (data, or empty + reason)
//! +--------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  Client (Taobao, | --> |     signing      |
//! |  Amazon, eBay..) |     +------------------+
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     Listing      |  (normalized row)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Listing`] - Normalized search result row
//! - [`ListingDetail`] - Full product detail
//! - [`Fetched`] - Fail-soft call outcome
//! - [`Platform`] / [`Bucket`] - Marketplace tag and result bucket
//! - [`MarketplaceClient`] / [`RateSource`] - Upstream abstractions

pub mod errors;
pub mod models;
pub mod provider;
pub mod signing;

// Re-export all public types from models
pub use models::{
    Bucket, Fetched, Listing, ListingDetail, MarketInsights, Platform, PricePoint, SearchOptions,
    SellerReputation, ShippingCost, TrackingRegistration,
};

// Re-export provider types
pub use provider::amazon::AmazonClient;
pub use provider::ebay::EbayClient;
pub use provider::exchange_rate_api::ExchangeRateApiProvider;
pub use provider::fair_api::FairApiClient;
pub use provider::price_api::PriceApiClient;
pub use provider::taobao::TaobaoClient;
pub use provider::{ClientCapabilities, MarketplaceClient, RateSource, DEFAULT_UPSTREAM_TIMEOUT};

// Re-export error types
pub use errors::{FailureKind, MarketDataError};
