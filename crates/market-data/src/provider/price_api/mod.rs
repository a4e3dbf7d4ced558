//! PriceAPI price-comparison client.
//!
//! Bearer-authenticated JSON API used for comparison shopping data:
//! - `POST /search` for offers across sources
//! - `POST /history` for a product's price history
//! - `POST /track` to watch a product against competitors
//! - `GET /insights` for category-level market insights
//!
//! A top-level `error` member signals failure even on HTTP 200.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{
    Bucket, Listing, MarketInsights, Platform, PricePoint, SearchOptions, TrackingRegistration,
};
use crate::provider::http::{build_client, parse_json, send};
use crate::provider::rows::{check_envelope_error, listing_from_row, price_point_from_row, rows_at};
use crate::provider::{ClientCapabilities, MarketplaceClient, DEFAULT_UPSTREAM_TIMEOUT};

const BASE_URL: &str = "https://api.priceapi.com/v2";
const CLIENT_ID: &str = "PRICE_API";

/// Market all lookups are scoped to.
const COUNTRY: &str = "CN";

/// Sources PriceAPI can compare offers from.
const SEARCH_SOURCES: &[Platform] = &[Platform::Amazon, Platform::Ebay, Platform::GoogleShopping];

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    sources: Vec<&'static str>,
    country: &'static str,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct HistoryRequest<'a> {
    url: &'a str,
    days: u32,
}

#[derive(Debug, Serialize)]
struct TrackRequest<'a> {
    target_url: &'a str,
    competitor_urls: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
}

fn parse_body(body: &str) -> Result<Value, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;
    check_envelope_error(CLIENT_ID, &value)?;
    Ok(value)
}

fn parse_search_body(body: &str) -> Result<Vec<Listing>, MarketDataError> {
    let value = parse_body(body)?;
    Ok(rows_at(CLIENT_ID, &value, "results")?
        .iter()
        .filter_map(|row| listing_from_row(row, Platform::GoogleShopping))
        .collect())
}

fn parse_history_body(body: &str) -> Result<Vec<PricePoint>, MarketDataError> {
    let value = parse_body(body)?;
    let currency = value
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or("CNY")
        .to_string();
    let mut points: Vec<PricePoint> = rows_at(CLIENT_ID, &value, "history")?
        .iter()
        .filter_map(|row| price_point_from_row(row, &currency))
        .collect();
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

fn parse_object_body(body: &str) -> Result<serde_json::Map<String, Value>, MarketDataError> {
    match parse_body(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(MarketDataError::malformed(CLIENT_ID, "Expected a JSON object")),
    }
}

/// PriceAPI client. Results land in the comparison bucket.
pub struct PriceApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    notification_url: Option<String>,
}

impl PriceApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_UPSTREAM_TIMEOUT),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            notification_url: None,
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

    /// Webhook PriceAPI calls when a tracked price moves.
    pub fn with_notification_url(mut self, url: Option<String>) -> Self {
        self.notification_url = url.filter(|u| !u.is_empty());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<String, MarketDataError> {
        debug!("PriceAPI POST {}", path);
        let request = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(payload);
        send(CLIENT_ID, request).await
    }
}

#[async_trait]
impl MarketplaceClient for PriceApiClient {
    fn id(&self) -> &'static str {
        CLIENT_ID
    }

    fn platform(&self) -> Platform {
        Platform::GoogleShopping
    }

    fn bucket(&self) -> Bucket {
        Bucket::Comparison
    }

    fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities {
            supports_details: false,
            supports_tracking: true,
            supports_history: true,
            supports_insights: true,
        }
    }

    fn covers_platform(&self, platform: Platform) -> bool {
        SEARCH_SOURCES.contains(&platform)
    }

    async fn search_listings(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Listing>, MarketDataError> {
        let payload = SearchRequest {
            query: keyword,
            sources: options.sources.iter().map(Platform::as_str).collect(),
            country: COUNTRY,
            limit: options.limit,
        };
        let body = self.post("/search", &payload).await?;
        parse_search_body(&body)
    }

    async fn register_tracking(
        &self,
        url: &str,
        competitor_urls: &[String],
    ) -> Result<TrackingRegistration, MarketDataError> {
        let payload = TrackRequest {
            target_url: url,
            competitor_urls,
            notification_url: self.notification_url.as_deref(),
        };
        let body = self.post("/track", &payload).await?;
        parse_object_body(&body).map(TrackingRegistration)
    }

    async fn fetch_price_history(
        &self,
        url: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let body = self.post("/history", &HistoryRequest { url, days }).await?;
        parse_history_body(&body)
    }

    async fn fetch_market_insights(
        &self,
        category: &str,
        platform: Platform,
    ) -> Result<MarketInsights, MarketDataError> {
        debug!("PriceAPI insights for '{}' on {}", category, platform);
        let request = self
            .client
            .get(self.url("/insights"))
            .bearer_auth(&self.api_key)
            .query(&[
                ("category", category),
                ("platform", platform.as_str()),
                ("country", COUNTRY),
            ]);
        let body = send(CLIENT_ID, request).await?;
        parse_object_body(&body).map(MarketInsights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_search_body() {
        let body = r#"{
            "results": [
                {"url": "https://shop.example/p/1", "title": "Headphones", "price": "31.50", "currency": "USD", "source": "google_shopping", "shop": "Example"},
                {"id": "B01", "title": "Headphones", "price": 29.99, "currency": "USD", "source": "amazon"}
            ]
        }"#;
        let listings = parse_search_body(body).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "https://shop.example/p/1");
        assert_eq!(listings[0].platform, Platform::GoogleShopping);
        assert_eq!(listings[0].extra["shop"], "Example");
        assert_eq!(listings[1].platform, Platform::Amazon);
    }

    #[test]
    fn test_error_member_is_detected() {
        let err = parse_search_body(r#"{"error": "invalid api key"}"#).unwrap_err();
        match err {
            MarketDataError::UpstreamError { message, .. } => assert_eq!(message, "invalid api key"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_history_is_sorted_and_skips_bad_rows() {
        let body = r#"{
            "currency": "CNY",
            "history": [
                {"date": "2024-03-02", "price": 189},
                {"date": "2024-03-01", "price": 199},
                {"date": "not a date", "price": 1}
            ]
        }"#;
        let points = parse_history_body(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, dec!(199));
        assert_eq!(points[1].price, dec!(189));
        assert_eq!(points[0].currency, "CNY");
    }

    #[test]
    fn test_tracking_and_insights_require_objects() {
        let registration = parse_object_body(r#"{"tracking_id": "t1"}"#).map(TrackingRegistration).unwrap();
        assert_eq!(registration.tracking_id(), Some("t1"));

        let err = parse_object_body("[1, 2]").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[test]
    fn test_covers_comparison_sources_only() {
        let client = PriceApiClient::new("key");
        assert!(client.covers_platform(Platform::Amazon));
        assert!(client.covers_platform(Platform::GoogleShopping));
        assert!(!client.covers_platform(Platform::Taobao));
        assert!(!client.serves_details_for(Platform::Amazon));
    }

    #[test]
    fn test_track_request_shape() {
        let competitors = vec!["https://b.example".to_string()];
        let payload = TrackRequest {
            target_url: "https://a.example",
            competitor_urls: &competitors,
            notification_url: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["target_url"], "https://a.example");
        assert_eq!(value["competitor_urls"][0], "https://b.example");
        assert!(value.get("notification_url").is_none());
    }
}
