//! ExchangeRate-API rate source.
//!
//! `GET /v6/{key}/latest/{base}` returns the full conversion table for one
//! base currency:
//!
//! ```json
//! {"result": "success", "base_code": "CNY", "conversion_rates": {"USD": 0.1408, ...}}
//! {"result": "error", "error-type": "invalid-key"}
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::provider::http::{build_client, send_raw};
use crate::provider::{RateSource, DEFAULT_UPSTREAM_TIMEOUT};

const BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
const PROVIDER_ID: &str = "EXCHANGE_RATE_API";

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

/// Decode a `latest` body. Errors in the body win over the HTTP status.
fn parse_latest(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<HashMap<String, f64>, MarketDataError> {
    let response: LatestResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(MarketDataError::HttpStatus {
                client: PROVIDER_ID.to_string(),
                status: status.as_u16(),
            })
        }
        Err(e) => {
            return Err(MarketDataError::malformed(
                PROVIDER_ID,
                format!("Failed to parse rates response: {}", e),
            ))
        }
    };

    if response.result != "success" {
        return Err(MarketDataError::upstream(
            PROVIDER_ID,
            response.error_type.clone(),
            format!(
                "Rate API returned error: {}",
                response.error_type.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    Ok(response.conversion_rates)
}

/// ExchangeRate-API client.
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_UPSTREAM_TIMEOUT),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
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
}

#[async_trait]
impl RateSource for ExchangeRateApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>, MarketDataError> {
        let url = format!(
            "{}/{}/latest/{}",
            self.base_url.trim_end_matches('/'),
            self.api_key,
            base
        );
        debug!("Fetching {} rates from {}", base, PROVIDER_ID);

        let (status, body) = send_raw(PROVIDER_ID, self.client.get(&url)).await?;
        parse_latest(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_parse_success() {
        let body = r#"{"result": "success", "base_code": "CNY", "conversion_rates": {"CNY": 1, "USD": 0.1408, "EUR": 0.1295}}"#;
        let rates = parse_latest(StatusCode::OK, body).unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates["USD"], 0.1408);
        assert_eq!(rates["CNY"], 1.0);
    }

    #[test]
    fn test_error_result_carries_error_type() {
        let body = r#"{"result": "error", "error-type": "invalid-key"}"#;
        // The API pairs this body with a 403
        match parse_latest(StatusCode::FORBIDDEN, body).unwrap_err() {
            MarketDataError::UpstreamError { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("invalid-key"));
                assert!(message.contains("invalid-key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_json_error_status() {
        let err = parse_latest(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, MarketDataError::HttpStatus { status: 502, .. }));

        let err = parse_latest(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }
}
