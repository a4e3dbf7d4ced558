use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registration receipt returned by a price-tracking upstream.
///
/// The payload shape belongs to the upstream, so it is kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingRegistration(pub Map<String, Value>);

impl TrackingRegistration {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Upstream tracking id, when the receipt carries one.
    pub fn tracking_id(&self) -> Option<&str> {
        ["id", "tracking_id", "trackingId"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }
}

/// One historical price observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub currency: String,
}

/// Market insight payload for a category/platform. Kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketInsights(pub Map<String, Value>);
