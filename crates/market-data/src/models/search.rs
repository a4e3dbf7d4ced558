//! Search options passed to marketplace clients.

use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// Options for a keyword search.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Maximum rows requested from the upstream
    pub limit: u32,

    /// 1-based page number
    pub page: u32,

    /// Platforms an aggregator should query on our behalf
    pub sources: Vec<Platform>,

    /// Amazon search index (category)
    pub search_index: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            page: 1,
            sources: vec![Platform::Amazon, Platform::Ebay],
            search_index: "All".to_string(),
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sources(mut self, sources: Vec<Platform>) -> Self {
        if !sources.is_empty() {
            self.sources = sources;
        }
        self
    }

    /// Source tags joined with commas, as most aggregators expect.
    pub fn sources_param(&self) -> String {
        self.sources
            .iter()
            .map(Platform::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, 20);
        assert_eq!(options.page, 1);
        assert_eq!(options.sources_param(), "amazon,ebay");
        assert_eq!(options.search_index, "All");
    }

    #[test]
    fn test_empty_sources_keep_defaults() {
        let options = SearchOptions::default().with_sources(vec![]);
        assert_eq!(options.sources.len(), 2);

        let options = SearchOptions::default().with_sources(vec![Platform::Walmart]);
        assert_eq!(options.sources_param(), "walmart");
    }
}
