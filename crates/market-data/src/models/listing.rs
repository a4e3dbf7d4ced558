use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::platform::Platform;

/// One search-result row, normalized across marketplaces.
///
/// `id` + `platform` address a listing within one query session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Marketplace-scoped identifier (ASIN, num_iid, itemId, ...)
    pub id: String,

    pub title: String,

    /// Listed price, never negative
    pub price: Decimal,

    /// Price currency (ISO 4217)
    pub currency: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Product page URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Source marketplace
    pub platform: Platform,

    /// Raw source-specific fields that have no common counterpart
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Listing {
    /// Create a listing with the required fields.
    ///
    /// An empty currency falls back to the platform's native currency.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: Decimal,
        currency: impl Into<String>,
        platform: Platform,
    ) -> Self {
        let currency = currency.into();
        let currency = if currency.trim().is_empty() {
            platform.native_currency().to_string()
        } else {
            currency.trim().to_ascii_uppercase()
        };

        Self {
            id: id.into(),
            title: title.into(),
            price,
            currency,
            image_url: None,
            url: None,
            platform,
            extra: Map::new(),
        }
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.is_empty());
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url.filter(|u| !u.is_empty());
        self
    }

    /// Keep a raw upstream field. Null values are not stored.
    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        if !value.is_null() {
            self.extra.insert(key.to_string(), value);
        }
        self
    }

    pub fn has_valid_price(&self) -> bool {
        !self.price.is_sign_negative()
    }
}

/// Seller reputation as reported by the marketplace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerReputation {
    pub username: String,
    pub feedback_score: i64,
    pub positive_feedback_percent: Decimal,
}

/// Shipping cost quoted for the listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCost {
    pub cost: Decimal,
    pub currency: String,
}

/// Full product detail. Optional upstream fields default to empty/zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub description: String,
    pub brand: String,
    pub condition: String,
    pub location: String,
    pub seller: SellerReputation,
    pub shipping: ShippingCost,
}

impl ListingDetail {
    pub fn from_listing(listing: Listing) -> Self {
        Self {
            listing,
            ..Default::default()
        }
    }

    /// True for the default detail handed out when a lookup failed.
    pub fn is_empty(&self) -> bool {
        self.listing.id.is_empty()
    }
}

/// Parse an upstream price string. Currency symbols, thousands separators
/// and surrounding whitespace are ignored. Only the first number counts, so
/// a range such as "10-20" yields its lower bound.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let negative = raw[..start].ends_with('-');
    let token: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    let amount = Decimal::from_str(token.trim_end_matches('.')).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Parse a JSON price that may arrive as a number or a string.
pub fn amount_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_amount(s),
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        _ => None,
    }
}
