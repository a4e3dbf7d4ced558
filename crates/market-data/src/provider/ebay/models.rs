//! eBay Shopping API response models.
//!
//! These models cover the JSON form of `GetSingleItem`. The Finding API
//! wraps every field in a single-element array and is walked untyped in the
//! parent module instead.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level `GetSingleItem` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSingleItemResponse {
    /// "Success", "Warning", "Failure" or "PartialFailure"
    #[serde(default)]
    pub ack: String,
    #[serde(default)]
    pub errors: Vec<ShoppingError>,
    pub item: Option<ShoppingItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShoppingError {
    pub short_message: Option<String>,
    pub long_message: Option<String>,
    pub error_code: Option<String>,
    pub severity_code: Option<String>,
}

impl ShoppingError {
    pub fn is_error(&self) -> bool {
        self.severity_code.as_deref() != Some("Warning")
    }

    pub fn message(&self) -> String {
        self.long_message
            .clone()
            .or_else(|| self.short_message.clone())
            .unwrap_or_else(|| "Unknown Shopping API error".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShoppingItem {
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(default)]
    pub title: String,
    pub current_price: Option<Amount>,
    #[serde(default)]
    pub condition_display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "PictureURL", default)]
    pub picture_url: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "ViewItemURLForNaturalSearch")]
    pub view_item_url: Option<String>,
    pub seller: Option<Seller>,
    pub shipping_cost_summary: Option<ShippingCostSummary>,
}

/// Amount with currency, e.g. `{"Value": 59.0, "CurrencyID": "USD"}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Amount {
    pub value: Option<Decimal>,
    #[serde(rename = "CurrencyID", default)]
    pub currency_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Seller {
    #[serde(rename = "UserID", default)]
    pub user_id: String,
    #[serde(default)]
    pub feedback_score: i64,
    pub positive_feedback_percent: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShippingCostSummary {
    pub shipping_service_cost: Option<Amount>,
}
