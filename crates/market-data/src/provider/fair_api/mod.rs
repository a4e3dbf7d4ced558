//! FairAPI cross-marketplace aggregator client.
//!
//! One bearer-authenticated REST API fronting several Western marketplaces:
//! - `GET /products/search` for keyword search across `platforms`
//! - `GET /products/{platform}/{id}` for details
//! - `POST /tracking` to register price tracking
//!
//! Failures may arrive with HTTP 200 as a top-level `error` object or as
//! `success: false`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{
    Bucket, Listing, ListingDetail, Platform, SearchOptions, TrackingRegistration,
};
use crate::provider::http::{build_client, parse_json, send};
use crate::provider::rows::{check_envelope_error, detail_from_row, listing_from_row, rows_at};
use crate::provider::{ClientCapabilities, MarketplaceClient, DEFAULT_UPSTREAM_TIMEOUT};

const BASE_URL: &str = "https://api.fairapi.com/v1";
const CLIENT_ID: &str = "FAIR_API";

/// Marketplaces this aggregator can look up details for.
const DETAIL_PLATFORMS: &[Platform] = &[
    Platform::Amazon,
    Platform::Ebay,
    Platform::Walmart,
    Platform::Shopify,
    Platform::TikTok,
];

fn parse_search_body(body: &str) -> Result<Vec<Listing>, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;
    check_envelope_error(CLIENT_ID, &value)?;
    Ok(rows_at(CLIENT_ID, &value, "data")?
        .iter()
        .filter_map(|row| listing_from_row(row, Platform::Amazon))
        .collect())
}

fn parse_detail_body(
    body: &str,
    id: &str,
    platform: Platform,
) -> Result<ListingDetail, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;
    check_envelope_error(CLIENT_ID, &value)?;
    value
        .get("data")
        .and_then(|data| detail_from_row(data, platform))
        .ok_or_else(|| MarketDataError::NotFound(id.to_string()))
}

fn parse_tracking_body(body: &str) -> Result<TrackingRegistration, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;
    check_envelope_error(CLIENT_ID, &value)?;

    let payload = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(data)) => data,
            _ => map,
        },
        _ => Map::new(),
    };
    Ok(TrackingRegistration(payload))
}

/// FairAPI client. Results land in the international bucket.
pub struct FairApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FairApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_UPSTREAM_TIMEOUT),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl MarketplaceClient for FairApiClient {
    fn id(&self) -> &'static str {
        CLIENT_ID
    }

    fn platform(&self) -> Platform {
        Platform::Amazon
    }

    fn bucket(&self) -> Bucket {
        Bucket::International
    }

    fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities {
            supports_details: true,
            supports_tracking: true,
            ..Default::default()
        }
    }

    fn serves_details_for(&self, platform: Platform) -> bool {
        DETAIL_PLATFORMS.contains(&platform)
    }

    async fn search_listings(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Listing>, MarketDataError> {
        let limit = options.limit.to_string();
        let platforms = options.sources_param();
        debug!("FairAPI search '{}' on [{}]", keyword, platforms);

        let request = self
            .client
            .get(self.url("/products/search"))
            .bearer_auth(&self.api_key)
            .query(&[
                ("keyword", keyword),
                ("platforms", platforms.as_str()),
                ("limit", limit.as_str()),
            ]);
        let body = send(CLIENT_ID, request).await?;
        parse_search_body(&body)
    }

    async fn fetch_details(
        &self,
        id: &str,
        platform: Platform,
    ) -> Result<ListingDetail, MarketDataError> {
        let path = format!(
            "/products/{}/{}",
            platform.as_str(),
            urlencoding::encode(id)
        );
        let request = self.client.get(self.url(&path)).bearer_auth(&self.api_key);
        let body = send(CLIENT_ID, request).await?;
        parse_detail_body(&body, id, platform)
    }

    async fn register_tracking(
        &self,
        url: &str,
        competitor_urls: &[String],
    ) -> Result<TrackingRegistration, MarketDataError> {
        let request = self
            .client
            .post(self.url("/tracking"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "product_url": url,
                "competitor_urls": competitor_urls,
            }));
        let body = send(CLIENT_ID, request).await?;
        parse_tracking_body(&body)
    }
}
