//! Client capabilities and transport configuration.
//!
//! This module defines structures for describing what a marketplace client
//! can do and how long a single upstream call may take.

use std::time::Duration;

/// Default per-call upstream timeout.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Describes the capabilities of a marketplace client.
///
/// Used by the orchestrator to decide which client handles detail lookups,
/// tracking registrations, and analysis requests.
#[derive(Clone, Debug, Default)]
pub struct ClientCapabilities {
    /// Whether the client can fetch a single listing's details.
    pub supports_details: bool,

    /// Whether the client can register price tracking for a URL.
    pub supports_tracking: bool,

    /// Whether the client can return historical prices for a URL.
    pub supports_history: bool,

    /// Whether the client can return category-level market insights.
    pub supports_insights: bool,
}

impl ClientCapabilities {
    /// Search plus detail lookup, the common marketplace profile.
    pub fn search_and_details() -> Self {
        Self {
            supports_details: true,
            ..Default::default()
        }
    }
}
