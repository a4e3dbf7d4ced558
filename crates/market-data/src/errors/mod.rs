//! Error types and failure classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all upstream operations
//! - [`FailureKind`]: Coarse classification used in logs and source reports

mod failure;

pub use failure::FailureKind;

use thiserror::Error;

/// Errors that can occur while talking to a marketplace or rate provider.
///
/// Clients never hand these to the orchestrator as faults. They travel inside
/// [`Fetched::Empty`](crate::models::Fetched) so the caller can see why a
/// contribution came back empty.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request could not be sent or the connection dropped.
    #[error("Transport error: {client} - {message}")]
    Transport {
        /// The client that failed
        client: String,
        /// The underlying transport message
        message: String,
    },

    /// The request to the upstream timed out.
    #[error("Timeout: {client}")]
    Timeout {
        /// The client that timed out
        client: String,
    },

    /// The upstream answered with a non-2xx status.
    #[error("HTTP {status} from {client}")]
    HttpStatus {
        /// The client that received the status
        client: String,
        /// HTTP status code
        status: u16,
    },

    /// The upstream answered 2xx but embedded an error payload in the body.
    #[error("Upstream error: {client} - {message}")]
    UpstreamError {
        /// The client whose upstream reported the error
        client: String,
        /// Error code reported by the upstream, if any
        code: Option<String>,
        /// Error message reported by the upstream
        message: String,
    },

    /// The body could not be decoded into the expected shape.
    #[error("Malformed response: {client} - {message}")]
    MalformedResponse {
        /// The client that received the body
        client: String,
        /// What went wrong while decoding
        message: String,
    },

    /// The requested id does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not offered by this client.
    #[error("Operation '{operation}' not supported by {client}")]
    NotSupported {
        /// The unsupported operation
        operation: String,
        /// The client that does not support it
        client: String,
    },

    /// Computing a request signature failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A network error that was not classified by the client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the failure classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use crossprice_market_data::errors::{FailureKind, MarketDataError};
    ///
    /// let error = MarketDataError::Timeout { client: "TAOBAO".to_string() };
    /// assert_eq!(error.kind(), FailureKind::Transport);
    ///
    /// let error = MarketDataError::NotFound("123".to_string());
    /// assert_eq!(error.kind(), FailureKind::Logical);
    /// ```
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::Network(_) => FailureKind::Transport,

            Self::UpstreamError { .. } | Self::NotFound(_) => FailureKind::Logical,

            Self::MalformedResponse { .. } => FailureKind::Malformed,

            Self::NotSupported { .. } | Self::Signing(_) => FailureKind::Unsupported,
        }
    }

    pub(crate) fn transport(client: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                client: client.to_string(),
            }
        } else {
            Self::Transport {
                client: client.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(client: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            client: client.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn upstream(client: &str, code: Option<String>, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            client: client.to_string(),
            code,
            message: message.into(),
        }
    }

    pub(crate) fn not_supported(client: &str, operation: &str) -> Self {
        Self::NotSupported {
            operation: operation.to_string(),
            client: client.to_string(),
        }
    }
}
