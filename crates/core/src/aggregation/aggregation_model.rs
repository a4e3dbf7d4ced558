use chrono::{DateTime, Utc};
use crossprice_market_data::{
    Bucket, FailureKind, Listing, MarketInsights, Platform, PricePoint, SearchOptions,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parameters of a cross-platform search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Restrict dispatch to clients covering these platforms. Empty means all.
    #[serde(default)]
    pub platforms: Vec<Platform>,

    /// Normalize every listing into this currency when set.
    #[serde(default)]
    pub target_currency: Option<String>,

    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_target_currency(mut self, currency: impl Into<String>) -> Self {
        self.target_currency = Some(currency.into());
        self
    }
}

/// Listing price expressed in the requested target currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPrice {
    pub amount: Decimal,
    pub currency: String,
    pub rate: f64,
}

/// A listing as it appears in an aggregated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedListing {
    #[serde(flatten)]
    pub listing: Listing,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedPrice>,
}

impl From<Listing> for ComparedListing {
    fn from(listing: Listing) -> Self {
        Self {
            listing,
            normalized: None,
        }
    }
}

/// What one client contributed to a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub client: String,
    pub bucket: Bucket,
    pub listings: usize,
    /// Set when the client degraded to an empty contribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

impl SourceReport {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Results of one search, filed by bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub keyword: String,
    pub domestic: Vec<ComparedListing>,
    pub international: Vec<ComparedListing>,
    pub price_comparison: Vec<ComparedListing>,
    pub sources: Vec<SourceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_currency: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl AggregatedResult {
    pub fn empty(keyword: &str, target_currency: Option<String>) -> Self {
        Self {
            keyword: keyword.to_string(),
            domestic: Vec::new(),
            international: Vec::new(),
            price_comparison: Vec::new(),
            sources: Vec::new(),
            target_currency,
            generated_at: Utc::now(),
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[ComparedListing] {
        match bucket {
            Bucket::Domestic => &self.domestic,
            Bucket::International => &self.international,
            Bucket::Comparison => &self.price_comparison,
        }
    }

    pub(crate) fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<ComparedListing> {
        match bucket {
            Bucket::Domestic => &mut self.domestic,
            Bucket::International => &mut self.international,
            Bucket::Comparison => &mut self.price_comparison,
        }
    }

    /// Every listing across the three buckets.
    pub fn listings(&self) -> impl Iterator<Item = &ComparedListing> {
        self.domestic
            .iter()
            .chain(self.international.iter())
            .chain(self.price_comparison.iter())
    }

    pub(crate) fn listings_mut(&mut self) -> impl Iterator<Item = &mut ComparedListing> {
        self.domestic
            .iter_mut()
            .chain(self.international.iter_mut())
            .chain(self.price_comparison.iter_mut())
    }

    pub fn total(&self) -> usize {
        self.domestic.len() + self.international.len() + self.price_comparison.len()
    }

    /// Cheapest listing by normalized price. Listings without a normalized
    /// price are not comparable and are ignored.
    pub fn cheapest(&self) -> Option<&ComparedListing> {
        self.listings()
            .filter_map(|l| l.normalized.as_ref().map(|n| (l, n.amount)))
            .min_by_key(|(_, amount)| *amount)
            .map(|(listing, _)| listing)
    }
}

/// Price analysis for one product.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub historical_prices: Vec<PricePoint>,
    pub market_insights: MarketInsights,
    pub price_comparison: Vec<Listing>,
}
