use std::sync::Arc;

use crossprice_core::fx::{ExchangeRateCache, JsonFileSnapshotStore};
use crossprice_core::PriceComparisonService;
use crossprice_market_data::{
    AmazonClient, EbayClient, ExchangeRateApiProvider, FairApiClient, MarketplaceClient,
    PriceApiClient, RateSource, TaobaoClient,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub comparison_service: Arc<PriceComparisonService>,
    pub rate_cache: Arc<ExchangeRateCache>,
    pub default_currency: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("CP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Marketplace clients for which credentials are configured.
fn build_clients(config: &Config) -> Vec<Arc<dyn MarketplaceClient>> {
    let timeout = config.upstream_timeout;
    let mut clients: Vec<Arc<dyn MarketplaceClient>> = Vec::new();

    if let Some(taobao) = &config.taobao {
        clients.push(Arc::new(
            TaobaoClient::new(&taobao.app_key, &taobao.app_secret).with_timeout(timeout),
        ));
    }
    if let Some(amazon) = &config.amazon {
        clients.push(Arc::new(
            AmazonClient::new(
                &amazon.access_key,
                &amazon.secret_key,
                &amazon.associate_tag,
                &amazon.region,
            )
            .with_timeout(timeout),
        ));
    }
    if let Some(ebay) = &config.ebay {
        clients.push(Arc::new(
            EbayClient::new(&ebay.app_id, &ebay.cert_id, &ebay.dev_id).with_timeout(timeout),
        ));
    }
    if let Some(key) = &config.fair_api_key {
        clients.push(Arc::new(FairApiClient::new(key).with_timeout(timeout)));
    }
    if let Some(key) = &config.price_api_key {
        clients.push(Arc::new(
            PriceApiClient::new(key)
                .with_timeout(timeout)
                .with_notification_url(config.price_api_webhook_url.clone()),
        ));
    }

    clients
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let rate_source: Option<Arc<dyn RateSource>> = match &config.exchange_rate_api_key {
        Some(key) => Some(Arc::new(
            ExchangeRateApiProvider::new(key).with_timeout(config.upstream_timeout),
        )),
        None => {
            tracing::warn!("CP_EXCHANGE_RATE_API_KEY not set; rates come from the cache file only");
            None
        }
    };

    let store = Arc::new(JsonFileSnapshotStore::new(&config.rate_cache_path));
    tracing::info!("Rate cache file: {}", store.path().display());
    let rate_cache = Arc::new(
        ExchangeRateCache::new(rate_source, store)
            .with_ttl(chrono::Duration::hours(config.rate_ttl_hours)),
    );

    let clients = build_clients(config);
    if clients.is_empty() {
        tracing::warn!("No marketplace credentials configured; searches will return empty results");
    } else {
        let ids: Vec<&str> = clients.iter().map(|c| c.id()).collect();
        tracing::info!("Marketplace clients: {}", ids.join(", "));
    }

    let comparison_service = Arc::new(
        PriceComparisonService::new(clients, rate_cache.clone())
            .with_upstream_timeout(config.upstream_timeout),
    );

    Ok(Arc::new(AppState {
        comparison_service,
        rate_cache,
        default_currency: config.default_currency.clone(),
    }))
}
