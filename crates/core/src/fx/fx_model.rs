use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Full rate table keyed to the base currency (CNY).
///
/// Every entry is "units of currency per one CNY", finite and positive.
/// Snapshots are immutable: a refresh builds a new one and swaps it in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub rates: BTreeMap<String, f64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_update: DateTime<Utc>,
}

impl RateSnapshot {
    /// Build a snapshot, dropping entries that are not finite and positive.
    pub fn new<I>(rates: I, last_update: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let rates = rates
            .into_iter()
            .filter(|(code, rate)| {
                let keep = rate.is_finite() && *rate > 0.0;
                if !keep {
                    log::warn!("Discarding invalid rate for {}: {}", code, rate);
                }
                keep
            })
            .map(|(code, rate)| (code.trim().to_ascii_uppercase(), rate))
            .collect();

        Self { rates, last_update }
    }

    /// Re-apply the validity rule, e.g. after loading from disk.
    pub fn sanitized(self) -> Self {
        Self::new(self.rates, self.last_update)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_update
    }

    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

/// Accepts RFC 3339 timestamps, and naive ISO-8601 ones read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Lifecycle of the rate cache.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// No snapshot yet
    Cold,
    /// Snapshot younger than the TTL
    Fresh,
    /// Snapshot at or past the TTL, still served
    Stale,
}

/// Result of converting a price between currencies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub original_amount: Decimal,
    pub original_currency: String,
    /// Rounded half-to-even to two decimals
    pub converted_amount: Decimal,
    pub converted_currency: String,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_discards_invalid_rates() {
        let snapshot = RateSnapshot::new(
            vec![
                ("usd".to_string(), 0.14),
                ("EUR".to_string(), 0.0),
                ("JPY".to_string(), -1.0),
                ("GBP".to_string(), f64::NAN),
                ("KRW".to_string(), f64::INFINITY),
            ],
            Utc::now(),
        );
        assert_eq!(snapshot.rates.len(), 1);
        assert_eq!(snapshot.rate("USD"), Some(0.14));
    }

    #[test]
    fn test_staleness() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        let snapshot = RateSnapshot::new(
            vec![("USD".to_string(), 0.14)],
            now - Duration::hours(23),
        );
        assert!(!snapshot.is_stale(now, Duration::hours(24)));
        assert!(snapshot.is_stale(now + Duration::hours(1), Duration::hours(24)));
    }

    #[test]
    fn test_deserialize_naive_timestamp_as_utc() {
        let json = r#"{"rates": {"USD": 0.1408}, "last_update": "2024-01-01T08:30:00.123456"}"#;
        let snapshot: RateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(
            snapshot.last_update,
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap()
                + Duration::microseconds(123456)
        );
    }

    #[test]
    fn test_deserialize_offset_timestamp() {
        let json = r#"{"rates": {}, "last_update": "2024-01-01T16:00:00+08:00"}"#;
        let snapshot: RateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.last_update, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_snapshot_format_round_trips() {
        let snapshot = RateSnapshot::new(
            vec![("USD".to_string(), 0.1408)],
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["rates"]["USD"], 0.1408);
        assert!(value["last_update"].as_str().unwrap().starts_with("2024-01-01T00:00:00"));
    }
}
