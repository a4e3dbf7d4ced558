//! Marketplace client and rate source trait definitions.
//!
//! `MarketplaceClient` is the uniform capability set every marketplace
//! adapter implements. Implementors write the fallible primitives
//! (`search_listings`, `fetch_details`, ...). Callers use the provided
//! fail-soft wrappers (`search`, `get_details`, ...), which never return an
//! error: upstream failures are logged and come back as [`Fetched::Empty`].

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{
    Bucket, Fetched, Listing, ListingDetail, MarketInsights, Platform, PricePoint, SearchOptions,
    TrackingRegistration,
};

use super::capabilities::ClientCapabilities;

/// Trait for marketplace clients.
///
/// Implement this trait to add support for a new marketplace. The
/// orchestrator only relies on the identity methods and the fail-soft
/// wrappers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use crossprice_market_data::provider::{ClientCapabilities, MarketplaceClient};
///
/// struct MyMarketplace {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketplaceClient for MyMarketplace {
///     fn id(&self) -> &'static str {
///         "MY_MARKETPLACE"
///     }
///
///     fn platform(&self) -> Platform {
///         Platform::Walmart
///     }
///
///     fn bucket(&self) -> Bucket {
///         Bucket::International
///     }
///
///     // ... implement search_listings
/// }
/// ```
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Unique identifier for this client, e.g. "TAOBAO", "EBAY".
    ///
    /// Used for logging and per-source reporting.
    fn id(&self) -> &'static str;

    /// Marketplace this client speaks for.
    fn platform(&self) -> Platform;

    /// Bucket its search results are filed under.
    fn bucket(&self) -> Bucket;

    fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities::search_and_details()
    }

    /// Whether detail lookups for `platform` can be served by this client.
    ///
    /// Aggregators override this to cover the marketplaces they proxy.
    fn serves_details_for(&self, platform: Platform) -> bool {
        self.capabilities().supports_details && platform == self.platform()
    }

    /// Whether a search restricted to `platform` should include this client.
    fn covers_platform(&self, platform: Platform) -> bool {
        platform == self.platform() || self.serves_details_for(platform)
    }

    /// Search the marketplace. Fallible primitive behind [`search`](Self::search).
    async fn search_listings(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Listing>, MarketDataError>;

    /// Look up one listing. `platform` matters only for aggregators.
    async fn fetch_details(
        &self,
        id: &str,
        platform: Platform,
    ) -> Result<ListingDetail, MarketDataError> {
        let _ = (id, platform);
        Err(MarketDataError::not_supported(self.id(), "details"))
    }

    /// Register price tracking for `url` against optional competitor URLs.
    async fn register_tracking(
        &self,
        url: &str,
        competitor_urls: &[String],
    ) -> Result<TrackingRegistration, MarketDataError> {
        let _ = (url, competitor_urls);
        Err(MarketDataError::not_supported(self.id(), "tracking"))
    }

    /// Historical prices for a product URL over the last `days` days.
    async fn fetch_price_history(
        &self,
        url: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let _ = (url, days);
        Err(MarketDataError::not_supported(self.id(), "price_history"))
    }

    /// Category-level insights for a platform.
    async fn fetch_market_insights(
        &self,
        category: &str,
        platform: Platform,
    ) -> Result<MarketInsights, MarketDataError> {
        let _ = (category, platform);
        Err(MarketDataError::not_supported(self.id(), "market_insights"))
    }

    // ------------------------------------------------------------------
    // Fail-soft operations
    // ------------------------------------------------------------------

    /// Search without ever failing. Upstream errors yield `Fetched::Empty`.
    async fn search(&self, keyword: &str, options: &SearchOptions) -> Fetched<Vec<Listing>> {
        match self.search_listings(keyword, options).await {
            Ok(listings) => {
                let before = listings.len();
                let listings: Vec<Listing> = listings
                    .into_iter()
                    .filter(Listing::has_valid_price)
                    .collect();
                if listings.len() < before {
                    warn!(
                        "{}: dropped {} listings with negative prices",
                        self.id(),
                        before - listings.len()
                    );
                }
                debug!("{}: {} listings for '{}'", self.id(), listings.len(), keyword);
                Fetched::Data(listings)
            }
            Err(e) => {
                warn!("{} search failed ({}): {}", self.id(), e.kind().as_str(), e);
                Fetched::Empty(e)
            }
        }
    }

    /// Detail lookup without ever failing. An upstream answer with no usable
    /// id counts as not found.
    async fn get_details(&self, id: &str) -> Fetched<ListingDetail> {
        self.get_details_for(id, self.platform()).await
    }

    /// Detail lookup for a specific marketplace (aggregators).
    async fn get_details_for(&self, id: &str, platform: Platform) -> Fetched<ListingDetail> {
        match self.fetch_details(id, platform).await {
            Ok(detail) if detail.is_empty() => {
                warn!("{}: no detail for '{}'", self.id(), id);
                Fetched::Empty(MarketDataError::NotFound(id.to_string()))
            }
            Ok(detail) if !detail.listing.has_valid_price() => {
                warn!(
                    "{}: detail for '{}' has negative price {}",
                    self.id(),
                    id,
                    detail.listing.price
                );
                Fetched::Empty(MarketDataError::MalformedResponse {
                    client: self.id().to_string(),
                    message: format!("negative price {}", detail.listing.price),
                })
            }
            Ok(detail) => Fetched::Data(detail),
            Err(e) => {
                warn!("{} detail lookup for '{}' failed: {}", self.id(), id, e);
                Fetched::Empty(e)
            }
        }
    }

    async fn track(&self, url: &str, competitor_urls: &[String]) -> Fetched<TrackingRegistration> {
        match self.register_tracking(url, competitor_urls).await {
            Ok(registration) => Fetched::Data(registration),
            Err(e) => {
                warn!("{} tracking for '{}' failed: {}", self.id(), url, e);
                Fetched::Empty(e)
            }
        }
    }

    async fn price_history(&self, url: &str, days: u32) -> Fetched<Vec<PricePoint>> {
        match self.fetch_price_history(url, days).await {
            Ok(points) => Fetched::Data(points),
            Err(e) => {
                warn!("{} price history for '{}' failed: {}", self.id(), url, e);
                Fetched::Empty(e)
            }
        }
    }

    async fn market_insights(&self, category: &str, platform: Platform) -> Fetched<MarketInsights> {
        match self.fetch_market_insights(category, platform).await {
            Ok(insights) => Fetched::Data(insights),
            Err(e) => {
                warn!("{} insights for '{}' failed: {}", self.id(), category, e);
                Fetched::Empty(e)
            }
        }
    }
}

/// Trait for exchange-rate upstreams.
///
/// A rate source returns the full table for `base` in a single call: every
/// entry is "units of currency per one unit of base".
#[async_trait]
pub trait RateSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>, MarketDataError>;
}
