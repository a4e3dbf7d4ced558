//! Amazon Product Advertising API client.
//!
//! Uses the signed REST endpoint (`/onca/xml`) with HMAC-SHA256 signatures:
//! - Keyword search via `ItemSearch`
//! - Item details via `ItemLookup` with the `Large` response group
//!
//! Responses are XML. Errors are reported as `Errors/Error/{Code,Message}`
//! anywhere in the document, possibly alongside an HTTP 200.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{parse_amount, Bucket, Listing, ListingDetail, Platform, SearchOptions};
use crate::provider::http::{build_client, send};
use crate::provider::{ClientCapabilities, MarketplaceClient, DEFAULT_UPSTREAM_TIMEOUT};
use crate::signing::{hmac_sha256_signature, HMAC_SIGNATURE_FIELD};

const CLIENT_ID: &str = "AMAZON_PAAPI";
const REQUEST_PATH: &str = "/onca/xml";
const API_VERSION: &str = "2013-08-01";

/// Currencies whose PA-API `Amount` carries no minor unit.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &["JPY", "KRW"];

// ============================================================================
// XML helpers
// ============================================================================

/// Follow a `/`-separated path of child element names from `node`.
fn find_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    path.split('/').try_fold(node, |current, name| {
        current
            .children()
            .find(|child| child.is_element() && child.tag_name().name() == name)
    })
}

fn text_at(node: Node, path: &str) -> Option<String> {
    find_path(node, path)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn parse_document(body: &str) -> Result<Document<'_>, MarketDataError> {
    Document::parse(body)
        .map_err(|e| MarketDataError::malformed(CLIENT_ID, format!("Invalid XML: {}", e)))
}

/// Fail on the first `Errors/Error` element in the document.
fn check_errors(doc: &Document) -> Result<(), MarketDataError> {
    let error = doc.descendants().find(|n| {
        n.tag_name().name() == "Error"
            && n.parent_element()
                .is_some_and(|p| p.tag_name().name() == "Errors")
    });

    match error {
        Some(node) => Err(MarketDataError::upstream(
            CLIENT_ID,
            text_at(node, "Code"),
            text_at(node, "Message").unwrap_or_else(|| "Unknown PA-API error".to_string()),
        )),
        None => Ok(()),
    }
}

fn items<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Item")
}

/// Convert a PA-API amount to major units.
///
/// Integral amounts are minor units (`2999` USD is 29.99). Amounts that
/// already carry a decimal point are taken as-is.
fn amount_to_major(amount: &str, currency: &str) -> Option<Decimal> {
    let amount = amount.trim();
    if amount.contains('.') {
        return parse_amount(amount);
    }
    let minor: i64 = amount.parse().ok()?;
    let scale = if ZERO_DECIMAL_CURRENCIES.contains(&currency) {
        0
    } else {
        2
    };
    Some(Decimal::new(minor, scale))
}

fn item_to_listing(item: Node) -> Option<Listing> {
    let Some(asin) = text_at(item, "ASIN") else {
        warn!("{}: skipping item without ASIN", CLIENT_ID);
        return None;
    };

    let currency = text_at(item, "OfferSummary/LowestNewPrice/CurrencyCode").unwrap_or_default();
    let price = text_at(item, "OfferSummary/LowestNewPrice/Amount")
        .and_then(|amount| amount_to_major(&amount, &currency.to_ascii_uppercase()))
        .unwrap_or(Decimal::ZERO);

    Some(
        Listing::new(
            asin,
            text_at(item, "ItemAttributes/Title").unwrap_or_default(),
            price,
            currency,
            Platform::Amazon,
        )
        .with_image(text_at(item, "LargeImage/URL"))
        .with_url(text_at(item, "DetailPageURL")),
    )
}

fn parse_search_body(body: &str) -> Result<Vec<Listing>, MarketDataError> {
    let doc = parse_document(body)?;
    check_errors(&doc)?;
    Ok(items(&doc).filter_map(item_to_listing).collect())
}

fn parse_detail_body(body: &str, asin: &str) -> Result<ListingDetail, MarketDataError> {
    let doc = parse_document(body)?;
    check_errors(&doc)?;

    let item = items(&doc)
        .next()
        .ok_or_else(|| MarketDataError::NotFound(asin.to_string()))?;
    let listing = item_to_listing(item).ok_or_else(|| MarketDataError::NotFound(asin.to_string()))?;

    let mut detail = ListingDetail::from_listing(listing);
    detail.brand = text_at(item, "ItemAttributes/Brand").unwrap_or_default();
    detail.description =
        text_at(item, "EditorialReviews/EditorialReview/Content").unwrap_or_default();
    detail.condition = "New".to_string();
    detail.shipping.currency = detail.listing.currency.clone();
    Ok(detail)
}

// ============================================================================
// AmazonClient
// ============================================================================

/// Amazon PA-API client. Results land in the international bucket.
pub struct AmazonClient {
    client: Client,
    access_key: String,
    secret_key: String,
    associate_tag: String,
    /// Host used in the string-to-sign, e.g. `webservices.amazon.com`
    host: String,
    base_url: String,
}

impl AmazonClient {
    /// `region` is the marketplace TLD: `com`, `co.uk`, `de`, `co.jp`, ...
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        associate_tag: impl Into<String>,
        region: &str,
    ) -> Self {
        let host = format!("webservices.amazon.{}", region);
        Self {
            client: build_client(DEFAULT_UPSTREAM_TIMEOUT),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            associate_tag: associate_tag.into(),
            base_url: format!("https://{}", host),
            host,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Send requests elsewhere while still signing for the regional host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn signed_params(
        &self,
        operation: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<(String, String)>, MarketDataError> {
        let mut params: Vec<(String, String)> = vec![
            ("Service".into(), "AWSECommerceService".into()),
            ("Operation".into(), operation.to_string()),
            ("AWSAccessKeyId".into(), self.access_key.clone()),
            ("AssociateTag".into(), self.associate_tag.clone()),
            (
                "Timestamp".into(),
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ),
            ("Version".into(), API_VERSION.into()),
        ];
        params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));

        let signature = hmac_sha256_signature(
            &self.secret_key,
            "GET",
            &self.host,
            REQUEST_PATH,
            params.iter().map(|(k, v)| (k, v)),
        )?;
        params.push((HMAC_SIGNATURE_FIELD.to_string(), signature));
        Ok(params)
    }

    async fn call(&self, operation: &str, extra: &[(&str, String)]) -> Result<String, MarketDataError> {
        let params = self.signed_params(operation, extra)?;
        let url = format!("{}{}", self.base_url, REQUEST_PATH);
        debug!("Amazon request: {} ({})", operation, self.host);
        send(CLIENT_ID, self.client.get(&url).query(&params)).await
    }
}

#[async_trait]
impl MarketplaceClient for AmazonClient {
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
        ClientCapabilities::search_and_details()
    }

    async fn search_listings(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Listing>, MarketDataError> {
        let body = self
            .call(
                "ItemSearch",
                &[
                    ("SearchIndex", options.search_index.clone()),
                    ("Keywords", keyword.to_string()),
                    ("ItemPage", options.page.to_string()),
                    ("ResponseGroup", "Images,ItemAttributes,OfferSummary".to_string()),
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
            .call(
                "ItemLookup",
                &[("ItemId", id.to_string()), ("ResponseGroup", "Large".to_string())],
            )
            .await?;
        parse_detail_body(&body, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SEARCH_BODY: &str = r#"<?xml version="1.0" ?>
<ItemSearchResponse xmlns="http://webservices.amazon.com/AWSECommerceService/2013-08-01">
  <Items>
    <Request><IsValid>True</IsValid></Request>
    <TotalResults>2</TotalResults>
    <Item>
      <ASIN>B01NAJGGA2</ASIN>
      <DetailPageURL>https://www.amazon.com/dp/B01NAJGGA2</DetailPageURL>
      <LargeImage><URL>https://m.media-amazon.com/images/I/a.jpg</URL></LargeImage>
      <ItemAttributes><Title>Noise Cancelling Headphones</Title></ItemAttributes>
      <OfferSummary>
        <LowestNewPrice>
          <Amount>2999</Amount>
          <CurrencyCode>USD</CurrencyCode>
          <FormattedPrice>$29.99</FormattedPrice>
        </LowestNewPrice>
      </OfferSummary>
    </Item>
    <Item>
      <ASIN>B07XYZ</ASIN>
      <ItemAttributes><Title>Cable</Title></ItemAttributes>
    </Item>
  </Items>
</ItemSearchResponse>"#;

    #[test]
    fn test_parse_search_body() {
        let listings = parse_search_body(SEARCH_BODY).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.id, "B01NAJGGA2");
        assert_eq!(first.title, "Noise Cancelling Headphones");
        assert_eq!(first.price, dec!(29.99));
        assert_eq!(first.currency, "USD");
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/a.jpg")
        );

        // Missing offer: zero price, native currency
        assert_eq!(listings[1].price, Decimal::ZERO);
        assert_eq!(listings[1].currency, "USD");
    }

    #[test]
    fn test_errors_element_is_detected() {
        let body = r#"<ItemSearchResponse>
  <Items>
    <Request>
      <Errors>
        <Error>
          <Code>AWS.InvalidParameterValue</Code>
          <Message>Invalid SearchIndex</Message>
        </Error>
      </Errors>
    </Request>
  </Items>
</ItemSearchResponse>"#;
        match parse_search_body(body).unwrap_err() {
            MarketDataError::UpstreamError { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("AWS.InvalidParameterValue"));
                assert_eq!(message, "Invalid SearchIndex");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_xml_is_malformed() {
        let err = parse_search_body("{\"not\": \"xml\"}").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[test]
    fn test_amount_to_major() {
        assert_eq!(amount_to_major("2999", "USD"), Some(dec!(29.99)));
        assert_eq!(amount_to_major("1980", "JPY"), Some(dec!(1980)));
        assert_eq!(amount_to_major("12.50", "EUR"), Some(dec!(12.50)));
        assert_eq!(amount_to_major("abc", "USD"), None);
    }

    #[test]
    fn test_parse_detail_body() {
        let body = r#"<ItemLookupResponse>
  <Items>
    <Item>
      <ASIN>B01NAJGGA2</ASIN>
      <ItemAttributes><Title>Headphones</Title><Brand>Sony</Brand></ItemAttributes>
      <OfferSummary><LowestNewPrice><Amount>5900</Amount><CurrencyCode>USD</CurrencyCode></LowestNewPrice></OfferSummary>
      <EditorialReviews><EditorialReview><Content>Great sound.</Content></EditorialReview></EditorialReviews>
    </Item>
  </Items>
</ItemLookupResponse>"#;
        let detail = parse_detail_body(body, "B01NAJGGA2").unwrap();
        assert_eq!(detail.brand, "Sony");
        assert_eq!(detail.description, "Great sound.");
        assert_eq!(detail.listing.price, dec!(59.00));
        assert_eq!(detail.location, "");
    }

    #[test]
    fn test_detail_without_item_is_not_found() {
        let err = parse_detail_body("<ItemLookupResponse><Items/></ItemLookupResponse>", "X")
            .unwrap_err();
        assert!(matches!(err, MarketDataError::NotFound(_)));
    }

    #[test]
    fn test_signature_targets_regional_host() {
        let client = AmazonClient::new("AKID", "secret", "tag-20", "co.uk")
            .with_base_url("http://127.0.0.1:9");
        let params = client
            .signed_params("ItemSearch", &[("Keywords", "headphones".to_string())])
            .unwrap();

        let (_, signature) = params.iter().find(|(k, _)| k == "Signature").unwrap();
        let expected = hmac_sha256_signature(
            "secret",
            "GET",
            "webservices.amazon.co.uk",
            REQUEST_PATH,
            params.iter().filter(|(k, _)| k != "Signature").map(|(k, v)| (k, v)),
        )
        .unwrap();
        assert_eq!(signature, &expected);
    }
}
