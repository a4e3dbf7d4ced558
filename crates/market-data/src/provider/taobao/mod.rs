//! Taobao open platform client.
//!
//! Talks to the TOP gateway (`/router/rest`) with MD5 digest signed
//! requests:
//! - Keyword search via `taobao.tbk.item.get`
//! - Item details via `taobao.tbk.item.info.get`
//!
//! The gateway answers HTTP 200 even for failed calls; the failure is carried
//! in a top-level `error_response` object and must be checked first.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{amount_from_value, Bucket, Listing, ListingDetail, Platform, SearchOptions};
use crate::provider::http::{build_client, error_message, parse_json, send, value_to_string};
use crate::provider::{ClientCapabilities, MarketplaceClient, DEFAULT_UPSTREAM_TIMEOUT};
use crate::signing::{md5_digest_signature, DIGEST_SIGNATURE_FIELD};

const BASE_URL: &str = "https://eco.taobao.com/router/rest";
const CLIENT_ID: &str = "TAOBAO";

const SEARCH_METHOD: &str = "taobao.tbk.item.get";
const DETAIL_METHOD: &str = "taobao.tbk.item.info.get";

/// Item row shared by the search and detail responses.
#[derive(Debug, Default, Deserialize)]
struct TbkItem {
    #[serde(default)]
    num_iid: Value,
    #[serde(default)]
    title: String,
    /// Final price after discounts
    #[serde(default)]
    zk_final_price: Value,
    /// List price
    #[serde(default)]
    reserve_price: Value,
    pict_url: Option<String>,
    item_url: Option<String>,
    /// Seller nickname
    nick: Option<String>,
    /// Seller province/city
    provcity: Option<String>,
    /// 30 day sales volume
    #[serde(default)]
    volume: Value,
}

impl TbkItem {
    fn price(&self) -> Decimal {
        amount_from_value(&self.zk_final_price)
            .or_else(|| amount_from_value(&self.reserve_price))
            .unwrap_or(Decimal::ZERO)
    }

    fn into_listing(self) -> Listing {
        let price = self.price();
        let id = value_to_string(&self.num_iid).unwrap_or_default();
        Listing::new(id, self.title, price, "CNY", Platform::Taobao)
            .with_image(self.pict_url.map(absolute_url))
            .with_url(self.item_url.map(absolute_url))
            .with_extra("nick", self.nick.map(Value::String).unwrap_or_default())
            .with_extra("provcity", self.provcity.map(Value::String).unwrap_or_default())
            .with_extra("volume", self.volume)
    }

    fn into_detail(self) -> ListingDetail {
        let location = self.provcity.clone().unwrap_or_default();
        let seller = self.nick.clone().unwrap_or_default();
        let mut detail = ListingDetail::from_listing(self.into_listing());
        detail.location = location;
        detail.seller.username = seller;
        detail.shipping.currency = "CNY".to_string();
        detail
    }
}

/// Taobao returns protocol-relative image URLs.
fn absolute_url(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url
    }
}

/// Fail on an embedded `error_response`, before any field extraction.
fn check_gateway_error(body: &Value) -> Result<(), MarketDataError> {
    if let Some(err) = body.get("error_response") {
        let code = err.get("code").and_then(value_to_string);
        let message = err
            .get("sub_msg")
            .or_else(|| err.get("msg"))
            .map(error_message)
            .unwrap_or_else(|| "Unknown gateway error".to_string());
        return Err(MarketDataError::upstream(CLIENT_ID, code, message));
    }
    Ok(())
}

/// Pull `n_tbk_item[]` out of `<envelope>.results`. A missing `results`
/// means the query matched nothing.
fn extract_items(body: &Value, envelope: &str) -> Result<Vec<TbkItem>, MarketDataError> {
    check_gateway_error(body)?;

    let response = body.get(envelope).ok_or_else(|| {
        MarketDataError::malformed(CLIENT_ID, format!("Missing '{}' envelope", envelope))
    })?;

    match response.pointer("/results/n_tbk_item") {
        Some(items) => serde_json::from_value(items.clone()).map_err(|e| {
            MarketDataError::malformed(CLIENT_ID, format!("Invalid item list: {}", e))
        }),
        None => Ok(Vec::new()),
    }
}

fn parse_search_body(body: &str) -> Result<Vec<Listing>, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;
    let items = extract_items(&value, "tbk_item_get_response")?;
    Ok(items.into_iter().map(TbkItem::into_listing).collect())
}

fn parse_detail_body(body: &str, id: &str) -> Result<ListingDetail, MarketDataError> {
    let value = parse_json(CLIENT_ID, body)?;
    extract_items(&value, "tbk_item_info_get_response")?
        .into_iter()
        .next()
        .map(TbkItem::into_detail)
        .ok_or_else(|| MarketDataError::NotFound(id.to_string()))
}

// ============================================================================
// TaobaoClient
// ============================================================================

/// Taobao affiliate (TBK) client. Results land in the domestic bucket.
pub struct TaobaoClient {
    client: Client,
    base_url: String,
    app_key: String,
    app_secret: String,
}

impl TaobaoClient {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_UPSTREAM_TIMEOUT),
            base_url: BASE_URL.to_string(),
            app_key: app_key.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Override the gateway URL (tests, sandbox gateway).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Common protocol parameters plus the call-specific ones, signed.
    fn signed_params(&self, method: &str, extra: &[(&str, String)]) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("method".into(), method.to_string()),
            ("app_key".into(), self.app_key.clone()),
            ("timestamp".into(), Utc::now().timestamp().to_string()),
            ("format".into(), "json".into()),
            ("v".into(), "2.0".into()),
            ("sign_method".into(), "md5".into()),
        ];
        params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));

        let sign = md5_digest_signature(&self.app_secret, params.iter().map(|(k, v)| (k, v)));
        params.push((DIGEST_SIGNATURE_FIELD.to_string(), sign));
        params
    }

    async fn call(&self, method: &str, extra: &[(&str, String)]) -> Result<String, MarketDataError> {
        let params = self.signed_params(method, extra);
        debug!("Taobao request: {} with {} params", method, params.len());
        send(CLIENT_ID, self.client.get(&self.base_url).query(&params)).await
    }
}

#[async_trait]
impl MarketplaceClient for TaobaoClient {
    fn id(&self) -> &'static str {
        CLIENT_ID
    }

    fn platform(&self) -> Platform {
        Platform::Taobao
    }

    fn bucket(&self) -> Bucket {
        Bucket::Domestic
    }

    fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities::search_and_details()
    }

    async fn search_listings(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Listing>, MarketDataError> {
        let body = self
            .call(
                SEARCH_METHOD,
                &[
                    ("q", keyword.to_string()),
                    ("page_size", options.limit.to_string()),
                    ("page_no", options.page.to_string()),
                ],
            )
            .await?;
        parse_search_body(&body)
    }

    async fn fetch_details(
        &self,
        id: &str,
        _platform: Platform,
    ) -> Result<ListingDetail, MarketDataError> {
        let body = self
            .call(DETAIL_METHOD, &[("num_iids", id.to_string())])
            .await?;
        parse_detail_body(&body, id)
    }
}
