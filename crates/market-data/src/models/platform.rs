use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Marketplace a listing comes from.
///
/// Parsing is case-insensitive and total: anything unrecognised becomes
/// [`Platform::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Platform {
    Taobao,
    Amazon,
    Ebay,
    Walmart,
    Shopify,
    TikTok,
    GoogleShopping,
    #[default]
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Taobao => "taobao",
            Platform::Amazon => "amazon",
            Platform::Ebay => "ebay",
            Platform::Walmart => "walmart",
            Platform::Shopify => "shopify",
            Platform::TikTok => "tiktok",
            Platform::GoogleShopping => "google_shopping",
            Platform::Unknown => "unknown",
        }
    }

    /// Currency a marketplace prices in when the upstream omits it.
    pub fn native_currency(&self) -> &'static str {
        match self {
            Platform::Taobao => "CNY",
            _ => "USD",
        }
    }

    pub fn is_domestic(&self) -> bool {
        matches!(self, Platform::Taobao)
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let platform = match s.trim().to_ascii_lowercase().as_str() {
            "taobao" | "tmall" => Platform::Taobao,
            "amazon" => Platform::Amazon,
            "ebay" => Platform::Ebay,
            "walmart" => Platform::Walmart,
            "shopify" => Platform::Shopify,
            "tiktok" => Platform::TikTok,
            "google_shopping" | "google-shopping" | "googleshopping" => Platform::GoogleShopping,
            _ => Platform::Unknown,
        };
        Ok(platform)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Platform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse::<Platform>().unwrap_or_default())
    }
}

/// Result bucket a client's search results are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Domestic,
    International,
    Comparison,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Domestic => "domestic",
            Bucket::International => "international",
            Bucket::Comparison => "comparison",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Taobao".parse::<Platform>().unwrap(), Platform::Taobao);
        assert_eq!("EBAY".parse::<Platform>().unwrap(), Platform::Ebay);
        assert_eq!(
            "google_shopping".parse::<Platform>().unwrap(),
            Platform::GoogleShopping
        );
    }

    #[test]
    fn test_unknown_platform() {
        assert_eq!("jd".parse::<Platform>().unwrap(), Platform::Unknown);
        assert_eq!("".parse::<Platform>().unwrap(), Platform::Unknown);
    }

    #[test]
    fn test_native_currency() {
        assert_eq!(Platform::Taobao.native_currency(), "CNY");
        assert_eq!(Platform::Amazon.native_currency(), "USD");
    }

    #[test]
    fn test_serde_uses_tag() {
        let json = serde_json::to_string(&Platform::TikTok).unwrap();
        assert_eq!(json, "\"tiktok\"");
        let parsed: Platform = serde_json::from_str("\"Walmart\"").unwrap();
        assert_eq!(parsed, Platform::Walmart);
    }
}
