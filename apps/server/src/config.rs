use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

pub struct TaobaoCredentials {
    pub app_key: String,
    pub app_secret: String,
}

pub struct AmazonCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub associate_tag: String,
    pub region: String,
}

pub struct EbayCredentials {
    pub app_id: String,
    pub cert_id: String,
    pub dev_id: String,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub upstream_timeout: Duration,
    pub rate_cache_path: PathBuf,
    pub rate_ttl_hours: i64,
    pub default_currency: String,
    pub exchange_rate_api_key: Option<String>,
    pub taobao: Option<TaobaoCredentials>,
    pub amazon: Option<AmazonCredentials>,
    pub ebay: Option<EbayCredentials>,
    pub fair_api_key: Option<String>,
    pub price_api_key: Option<String>,
    pub price_api_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_addr: SocketAddr = var("CP_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse()
            .context("Invalid CP_LISTEN_ADDR")?;
        let cors_allow = var("CP_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = var("CP_REQUEST_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30000);
        let upstream_timeout_ms: u64 = var("CP_UPSTREAM_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10000);
        let rate_ttl_hours: i64 = var("CP_RATE_TTL_HOURS")
            .and_then(|v| v.parse().ok())
            .filter(|h| *h > 0)
            .unwrap_or(crossprice_core::constants::DEFAULT_RATE_TTL_HOURS);

        let taobao = match (var("CP_TAOBAO_APP_KEY"), var("CP_TAOBAO_APP_SECRET")) {
            (Some(app_key), Some(app_secret)) => Some(TaobaoCredentials {
                app_key,
                app_secret,
            }),
            _ => None,
        };
        let amazon = match (
            var("CP_AMAZON_ACCESS_KEY"),
            var("CP_AMAZON_SECRET_KEY"),
            var("CP_AMAZON_ASSOCIATE_TAG"),
        ) {
            (Some(access_key), Some(secret_key), Some(associate_tag)) => Some(AmazonCredentials {
                access_key,
                secret_key,
                associate_tag,
                region: var("CP_AMAZON_REGION").unwrap_or_else(|| "com".to_string()),
            }),
            _ => None,
        };
        // The dev and cert ids are only sent along, the app id is what authenticates
        let ebay = var("CP_EBAY_APP_ID").map(|app_id| EbayCredentials {
            app_id,
            cert_id: var("CP_EBAY_CERT_ID").unwrap_or_default(),
            dev_id: var("CP_EBAY_DEV_ID").unwrap_or_default(),
        });

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            rate_cache_path: var("CP_RATE_CACHE_PATH")
                .unwrap_or_else(|| "cache/exchange_rates.json".into())
                .into(),
            rate_ttl_hours,
            default_currency: var("CP_DEFAULT_CURRENCY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| crossprice_core::constants::BASE_CURRENCY.to_string()),
            exchange_rate_api_key: var("CP_EXCHANGE_RATE_API_KEY"),
            taobao,
            amazon,
            ebay,
            fair_api_key: var("CP_FAIR_API_KEY"),
            price_api_key: var("CP_PRICE_API_KEY"),
            price_api_webhook_url: var("CP_PRICE_API_WEBHOOK_URL"),
        })
    }
}
