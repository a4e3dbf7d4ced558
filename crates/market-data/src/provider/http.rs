//! HTTP plumbing shared by every client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;

/// Build a reqwest client with a per-call timeout.
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and return the status together with the body text.
pub(crate) async fn send_raw(
    client_id: &str,
    request: RequestBuilder,
) -> Result<(StatusCode, String), MarketDataError> {
    let response = request
        .send()
        .await
        .map_err(|e| MarketDataError::transport(client_id, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| MarketDataError::transport(client_id, e))?;

    debug!("{} responded {} ({} bytes)", client_id, status, body.len());
    Ok((status, body))
}

/// Send a request and return the body of a 2xx response.
pub(crate) async fn send(client_id: &str, request: RequestBuilder) -> Result<String, MarketDataError> {
    let (status, body) = send_raw(client_id, request).await?;
    if !status.is_success() {
        return Err(MarketDataError::HttpStatus {
            client: client_id.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(body)
}

/// Decode a JSON body into an untyped value.
pub(crate) fn parse_json(client_id: &str, body: &str) -> Result<Value, MarketDataError> {
    serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(client_id, format!("Invalid JSON: {}", e)))
}

/// Text of a JSON value that may be a string or a number.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Best-effort message from an embedded error payload (string or object).
pub(crate) fn error_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["message", "msg", "detail", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!(5224153937_i64)), Some("5224153937".to_string()));
        assert_eq!(value_to_string(&json!("B00X")), Some("B00X".to_string()));
        assert_eq!(value_to_string(&json!("")), None);
        assert_eq!(value_to_string(&Value::Null), None);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(&json!("quota exceeded")), "quota exceeded");
        assert_eq!(error_message(&json!({"message": "bad key", "code": 401})), "bad key");
        assert_eq!(error_message(&json!(42)), "42");
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        let err = parse_json("TEST", "<html>").unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }
}
