use chrono::{DateTime, Utc};
use crossprice_core::fx::CacheState;
use crossprice_market_data::Platform;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response wrapper shared by every endpoint.
#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub keyword: String,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub target_currency: Option<String>,
    /// Normalize into the server's default currency when no target is named
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ProductQuery {
    pub platform: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TrackBody {
    pub urls: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    #[serde(alias = "product_id")]
    pub product_id: i64,
    #[serde(alias = "target_price")]
    pub target_price: Decimal,
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct ConvertQuery {
    pub amount: String,
    pub from: String,
    pub to: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RateStatus {
    pub state: CacheState,
    pub last_update: Option<DateTime<Utc>>,
    pub currencies: usize,
    pub ttl_hours: i64,
}
