//! Marketplace data models
//!
//! This module contains the core data types shared by every client:
//! - `platform` - Marketplace tag (Platform) and result bucket (Bucket)
//! - `listing` - Normalized search rows (Listing) and details (ListingDetail)
//! - `tracking` - Tracking receipts, price history points, market insights
//! - `search` - Search options passed to clients
//! - `fetched` - Fail-soft call outcome (Fetched)

mod fetched;
mod listing;
mod platform;
mod search;
mod tracking;

pub use fetched::Fetched;
pub use listing::{
    amount_from_value, parse_amount, Listing, ListingDetail, SellerReputation, ShippingCost,
};
pub use platform::{Bucket, Platform};
pub use search::SearchOptions;
pub use tracking::{MarketInsights, PricePoint, TrackingRegistration};
