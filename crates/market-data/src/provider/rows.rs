//! Mapping of loosely-shaped JSON rows returned by aggregator APIs.
//!
//! Aggregators relay data from several marketplaces, so field names vary
//! between sources. Each field is read from the first of several known
//! aliases and anything left over is kept in [`Listing::extra`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::MarketDataError;
use crate::models::{amount_from_value, Listing, ListingDetail, Platform, PricePoint};

use super::http::{error_message, value_to_string};

const ID_KEYS: &[&str] = &["id", "product_id", "item_id", "asin"];
const TITLE_KEYS: &[&str] = &["title", "name"];
const IMAGE_KEYS: &[&str] = &["image", "image_url", "thumbnail"];
const URL_KEYS: &[&str] = &["url", "product_url", "link"];
const PLATFORM_KEYS: &[&str] = &["platform", "source"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "date", "time"];

fn first_of<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

fn string_of(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_of(row, keys).and_then(value_to_string)
}

/// Price may be a bare number/string or an object with its own currency.
fn price_of(row: &Map<String, Value>) -> (Option<Decimal>, Option<String>) {
    match row.get("price") {
        Some(Value::Object(price)) => (
            first_of(price, &["value", "amount"]).and_then(amount_from_value),
            string_of(price, &["currency", "currency_code"]),
        ),
        Some(value) => (amount_from_value(value), None),
        None => (None, None),
    }
}

/// Fail on a top-level `error` or `success: false`.
pub(crate) fn check_envelope_error(client_id: &str, body: &Value) -> Result<(), MarketDataError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null() && *e != &Value::Bool(false)) {
        let code = error.get("code").and_then(value_to_string);
        return Err(MarketDataError::upstream(client_id, code, error_message(error)));
    }

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .map(error_message)
            .unwrap_or_else(|| "Request was not successful".to_string());
        return Err(MarketDataError::upstream(client_id, None, message));
    }

    Ok(())
}

/// Extract the array stored under `key`. A missing key means no rows.
pub(crate) fn rows_at<'a>(
    client_id: &str,
    body: &'a Value,
    key: &str,
) -> Result<&'a [Value], MarketDataError> {
    match body.get(key) {
        Some(Value::Array(rows)) => Ok(rows.as_slice()),
        Some(Value::Null) | None => Ok(&[]),
        Some(_) => Err(MarketDataError::malformed(
            client_id,
            format!("'{}' is not an array", key),
        )),
    }
}

/// Map one aggregator row to a listing.
///
/// Rows without any identifier (id aliases, then URL) are skipped.
pub(crate) fn listing_from_row(row: &Value, default_platform: Platform) -> Option<Listing> {
    let row = row.as_object()?;

    let url = string_of(row, URL_KEYS);
    let id = string_of(row, ID_KEYS).or_else(|| url.clone())?;

    let platform = match string_of(row, PLATFORM_KEYS).map(|p| p.parse::<Platform>()) {
        Some(Ok(platform)) if platform != Platform::Unknown => platform,
        _ => default_platform,
    };

    let (price, price_currency) = price_of(row);
    let currency = string_of(row, &["currency"])
        .or(price_currency)
        .unwrap_or_default();

    let mut listing = Listing::new(
        id,
        string_of(row, TITLE_KEYS).unwrap_or_default(),
        price.unwrap_or(Decimal::ZERO),
        currency,
        platform,
    )
    .with_image(string_of(row, IMAGE_KEYS))
    .with_url(url);

    let consumed: Vec<&str> = [ID_KEYS, TITLE_KEYS, IMAGE_KEYS, URL_KEYS, PLATFORM_KEYS]
        .concat()
        .into_iter()
        .chain(["price", "currency"])
        .collect();
    for (key, value) in row {
        if !consumed.contains(&key.as_str()) {
            listing = listing.with_extra(key, value.clone());
        }
    }

    Some(listing)
}

/// Map an aggregator detail object, filling the detail-only fields.
pub(crate) fn detail_from_row(row: &Value, default_platform: Platform) -> Option<ListingDetail> {
    let mut detail = ListingDetail::from_listing(listing_from_row(row, default_platform)?);
    let extra = &mut detail.listing.extra;

    let mut take_string = |key: &str| {
        extra
            .remove(key)
            .as_ref()
            .and_then(value_to_string)
            .unwrap_or_default()
    };
    detail.description = take_string("description");
    detail.brand = take_string("brand");
    detail.condition = take_string("condition");
    detail.location = take_string("location");

    if let Some(Value::Object(seller)) = extra.remove("seller") {
        detail.seller.username = string_of(&seller, &["username", "name", "id"]).unwrap_or_default();
        detail.seller.feedback_score = first_of(&seller, &["feedback_score", "rating_count"])
            .and_then(Value::as_i64)
            .unwrap_or(0);
        detail.seller.positive_feedback_percent =
            first_of(&seller, &["positive_feedback_percent", "positive_rating"])
                .and_then(amount_from_value)
                .unwrap_or(Decimal::ZERO);
    }

    match extra.remove("shipping") {
        Some(Value::Object(shipping)) => {
            detail.shipping.cost = first_of(&shipping, &["cost", "price", "amount"])
                .and_then(amount_from_value)
                .unwrap_or(Decimal::ZERO);
            detail.shipping.currency = string_of(&shipping, &["currency"])
                .unwrap_or_else(|| detail.listing.currency.clone());
        }
        Some(value) => {
            detail.shipping.cost = amount_from_value(&value).unwrap_or(Decimal::ZERO);
            detail.shipping.currency = detail.listing.currency.clone();
        }
        None => {}
    }

    Some(detail)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }),
        _ => None,
    }
}

/// Map one history row. Rows without a readable timestamp or price are
/// skipped.
pub(crate) fn price_point_from_row(row: &Value, default_currency: &str) -> Option<PricePoint> {
    let row = row.as_object()?;
    let timestamp = first_of(row, TIMESTAMP_KEYS).and_then(parse_timestamp)?;
    let (price, price_currency) = price_of(row);
    let currency = string_of(row, &["currency"])
        .or(price_currency)
        .unwrap_or_else(|| default_currency.to_string());

    Some(PricePoint {
        timestamp,
        price: price?,
        currency: currency.to_ascii_uppercase(),
    })
}
