//! eBay client.
//!
//! Two eBay services are involved:
//! - Finding API `findItemsByKeywords` for keyword search (JSON, every field
//!   wrapped in a single-element array)
//! - Shopping API `GetSingleItem` for item details (JSON)
//!
//! Both authenticate with the application id in request headers. Both can
//! report failure inside an HTTP 200 body (`ack`/`errorMessage` for Finding,
//! `Ack`/`Errors` for Shopping).

mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{amount_from_value, Bucket, Listing, ListingDetail, Platform, SearchOptions};
use crate::provider::http::{build_client, parse_json, send, value_to_string};
use crate::provider::{ClientCapabilities, MarketplaceClient, DEFAULT_UPSTREAM_TIMEOUT};

use models::{GetSingleItemResponse, ShoppingItem};

const FINDING_URL: &str = "https://svcs.ebay.com/services/search/FindingService/v1";
const SHOPPING_URL: &str = "https://open.api.ebay.com/shopping";
const CLIENT_ID: &str = "EBAY";

const FINDING_VERSION: &str = "1.13.0";
const SHOPPING_VERSION: &str = "967";

// ============================================================================
// Finding API (untyped)
// ============================================================================

/// Read `key` from a Finding API object, unwrapping the single-element array.
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value.get(key)? {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn field_str(value: &Value, key: &str) -> Option<String> {
    field(value, key).and_then(value_to_string)
}

/// Fail on `errorMessage` or a non-success `ack`.
fn check_finding_ack(response: &Value) -> Result<(), MarketDataError> {
    if let Some(error) = field(response, "errorMessage").and_then(|e| field(e, "error")) {
        return Err(MarketDataError::upstream(
            CLIENT_ID,
            field_str(error, "errorId"),
            field_str(error, "message").unwrap_or_else(|| "Unknown Finding API error".to_string()),
        ));
    }

    match field_str(response, "ack").as_deref() {
        Some("Success") => Ok(()),
        Some(ack) => Err(MarketDataError::upstream(
            CLIENT_ID,
            None,
            format!("Finding API ack: {}", ack),
        )),
        None => Err(MarketDataError::malformed(CLIENT_ID, "Missing ack")),
    }
}

fn finding_item_to_listing(item: &Value) -> Option<Listing> {
    let Some(id) = field_str(item, "itemId") else {
        warn!("{}: skipping item without itemId", CLIENT_ID);
        return None;
    };

    let current_price = field(item, "sellingStatus").and_then(|s| field(s, "currentPrice"));
    let price = current_price
        .and_then(|p| p.get("__value__"))
        .and_then(amount_from_value)
        .unwrap_or(Decimal::ZERO);
    let currency = current_price
        .and_then(|p| p.get("@currencyId"))
        .and_then(value_to_string)
        .unwrap_or_default();
    let condition = field(item, "condition")
        .and_then(|c| field_str(c, "conditionDisplayName"))
        .map(Value::String)
        .unwrap_or_default();
    let location = field_str(item, "location")
        .map(Value::String)
        .unwrap_or_default();

    Some(
        Listing::new(
            id,
            field_str(item, "title").unwrap_or_default(),
            price,
            currency,
            Platform::Ebay,
        )
        .with_image(field_str(item, "galleryURL"))
        .with_url(field_str(item, "viewItemURL"))
        .with_extra("location", location)
        .with_extra("condition", condition),
    )
}

fn parse_search_body(body: &str) -> Result<Vec<Listing>, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;

    // Unknown operations answer with a bare top-level errorMessage
    if value.get("errorMessage").is_some() {
        check_finding_ack(&value)?;
    }

    let response = field(&value, "findItemsByKeywordsResponse").ok_or_else(|| {
        MarketDataError::malformed(CLIENT_ID, "Missing 'findItemsByKeywordsResponse'")
    })?;
    check_finding_ack(response)?;

    let items: &[Value] = match field(response, "searchResult").and_then(|r| r.get("item")) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    Ok(items.iter().filter_map(finding_item_to_listing).collect())
}

// ============================================================================
// Shopping API (typed)
// ============================================================================

fn shopping_item_to_detail(item: ShoppingItem) -> ListingDetail {
    let (price, currency) = item
        .current_price
        .map(|p| (p.value.unwrap_or(Decimal::ZERO), p.currency_id))
        .unwrap_or_default();

    let listing = Listing::new(item.item_id, item.title, price, currency, Platform::Ebay)
        .with_image(item.picture_url.into_iter().next())
        .with_url(item.view_item_url);

    let mut detail = ListingDetail::from_listing(listing);
    detail.description = item.description;
    detail.condition = item.condition_display_name;
    detail.location = item.location;

    if let Some(seller) = item.seller {
        detail.seller.username = seller.user_id;
        detail.seller.feedback_score = seller.feedback_score;
        detail.seller.positive_feedback_percent =
            seller.positive_feedback_percent.unwrap_or(Decimal::ZERO);
    }

    if let Some(cost) = item.shipping_cost_summary.and_then(|s| s.shipping_service_cost) {
        detail.shipping.cost = cost.value.unwrap_or(Decimal::ZERO);
        detail.shipping.currency = cost.currency_id;
    }

    detail
}

fn parse_detail_body(body: &str, item_id: &str) -> Result<ListingDetail, MarketDataError> {
    let response: GetSingleItemResponse = serde_json::from_str(body).map_err(|e| {
        MarketDataError::malformed(CLIENT_ID, format!("Invalid GetSingleItem response: {}", e))
    })?;

    let error = response.errors.iter().find(|e| e.is_error());
    if response.ack == "Failure" || error.is_some() {
        return Err(MarketDataError::upstream(
            CLIENT_ID,
            error.and_then(|e| e.error_code.clone()),
            error
                .map(|e| e.message())
                .unwrap_or_else(|| "Shopping API ack: Failure".to_string()),
        ));
    }

    response
        .item
        .map(shopping_item_to_detail)
        .ok_or_else(|| MarketDataError::NotFound(item_id.to_string()))
}

// ============================================================================
// EbayClient
// ============================================================================

/// eBay client. Results land in the international bucket.
pub struct EbayClient {
    client: Client,
    app_id: String,
    cert_id: String,
    dev_id: String,
    finding_url: String,
    shopping_url: String,
}

impl EbayClient {
    pub fn new(
        app_id: impl Into<String>,
        cert_id: impl Into<String>,
        dev_id: impl Into<String>,
    ) -> Self {
        Self {
            client: build_client(DEFAULT_UPSTREAM_TIMEOUT),
            app_id: app_id.into(),
            cert_id: cert_id.into(),
            dev_id: dev_id.into(),
            finding_url: FINDING_URL.to_string(),
            shopping_url: SHOPPING_URL.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Override both service endpoints.
    pub fn with_endpoints(
        mut self,
        finding_url: impl Into<String>,
        shopping_url: impl Into<String>,
    ) -> Self {
        self.finding_url = finding_url.into();
        self.shopping_url = shopping_url.into();
        self
    }
}

#[async_trait]
impl MarketplaceClient for EbayClient {
    fn id(&self) -> &'static str {
        CLIENT_ID
    }

    fn platform(&self) -> Platform {
        Platform::Ebay
    }

    fn bucket(&self) -> Bucket {
        Bucket::International
    }

    fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities::search_and_details()
    }

    async fn search_listings(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Listing>, MarketDataError> {
        let page = options.page.to_string();
        let limit = options.limit.to_string();
        let params = [
            ("OPERATION-NAME", "findItemsByKeywords"),
            ("SERVICE-VERSION", FINDING_VERSION),
            ("SECURITY-APPNAME", self.app_id.as_str()),
            ("RESPONSE-DATA-FORMAT", "JSON"),
            ("REST-PAYLOAD", "true"),
            ("keywords", keyword),
            ("paginationInput.pageNumber", page.as_str()),
            ("paginationInput.entriesPerPage", limit.as_str()),
            ("sortOrder", "BestMatch"),
        ];

        debug!("eBay Finding request for '{}'", keyword);
        let request = self
            .client
            .get(&self.finding_url)
            .header("X-EBAY-SOA-SECURITY-APPNAME", &self.app_id)
            .header("X-EBAY-SOA-OPERATION-NAME", "findItemsByKeywords")
            .header("X-EBAY-SOA-SERVICE-VERSION", FINDING_VERSION)
            .header("X-EBAY-SOA-GLOBAL-ID", "EBAY-US")
            .header("X-EBAY-SOA-REQUEST-DATA-FORMAT", "JSON")
            .header("X-EBAY-SOA-RESPONSE-DATA-FORMAT", "JSON")
            .query(&params);

        let body = send(CLIENT_ID, request).await?;
        parse_search_body(&body)
    }

    async fn fetch_details(
        &self,
        id: &str,
        _platform: Platform,
    ) -> Result<ListingDetail, MarketDataError> {
        let params = [
            ("callname", "GetSingleItem"),
            ("responseencoding", "JSON"),
            ("appid", self.app_id.as_str()),
            ("siteid", "0"),
            ("version", SHOPPING_VERSION),
            ("ItemID", id),
            ("IncludeSelector", "Description,ItemSpecifics,Details,ShippingCosts"),
        ];

        debug!("eBay GetSingleItem request for '{}'", id);
        let request = self
            .client
            .get(&self.shopping_url)
            .header("X-EBAY-API-APP-ID", &self.app_id)
            .header("X-EBAY-API-DEV-NAME", &self.dev_id)
            .header("X-EBAY-API-CERT-NAME", &self.cert_id)
            .header("X-EBAY-API-CALL-NAME", "GetSingleItem")
            .header("X-EBAY-API-VERSION", SHOPPING_VERSION)
            .header("X-EBAY-API-SITE-ID", "0")
            .header("X-EBAY-API-RESPONSE-ENCODING", "JSON")
            .query(&params);

        let body = send(CLIENT_ID, request).await?;
        parse_detail_body(&body, id)
    }
}
