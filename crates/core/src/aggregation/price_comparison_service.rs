use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crossprice_market_data::{
    Bucket, ClientCapabilities, Fetched, ListingDetail, MarketDataError, MarketInsights,
    MarketplaceClient, Platform, SearchOptions, TrackingRegistration, DEFAULT_UPSTREAM_TIMEOUT,
};
use futures::future::join_all;
use rust_decimal::Decimal;

use crate::constants::{DEFAULT_INSIGHT_CATEGORY, PRICE_HISTORY_DAYS};
use crate::errors::Result;
use crate::fx::{ConversionResult, ExchangeRateCache};

use super::aggregation_model::{
    AggregatedResult, ComparedListing, NormalizedPrice, PriceAnalysis, SearchRequest, SourceReport,
};

/// Fans requests out to marketplace clients and merges what comes back.
///
/// Every upstream call is bounded by `upstream_timeout`. A client that
/// fails or times out contributes nothing; the others are unaffected.
pub struct PriceComparisonService {
    clients: Vec<Arc<dyn MarketplaceClient>>,
    rates: Arc<ExchangeRateCache>,
    upstream_timeout: Duration,
}

impl PriceComparisonService {
    pub fn new(clients: Vec<Arc<dyn MarketplaceClient>>, rates: Arc<ExchangeRateCache>) -> Self {
        Self {
            clients,
            rates,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn clients(&self) -> &[Arc<dyn MarketplaceClient>] {
        &self.clients
    }

    pub fn rates(&self) -> &Arc<ExchangeRateCache> {
        &self.rates
    }

    /// Run one fail-soft call under the upstream timeout.
    async fn bounded<T, F>(
        &self,
        client: &Arc<dyn MarketplaceClient>,
        operation: &str,
        call: F,
    ) -> Fetched<T>
    where
        F: Future<Output = Fetched<T>>,
    {
        match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(fetched) => fetched,
            Err(_) => {
                log::warn!(
                    "{} {} timed out after {:?}",
                    client.id(),
                    operation,
                    self.upstream_timeout
                );
                Fetched::Empty(MarketDataError::Timeout {
                    client: client.id().to_string(),
                })
            }
        }
    }

    /// First client with the capability, preferring comparison services.
    fn capable(
        &self,
        supports: impl Fn(&ClientCapabilities) -> bool,
    ) -> Option<&Arc<dyn MarketplaceClient>> {
        self.clients
            .iter()
            .filter(|c| supports(&c.capabilities()))
            .min_by_key(|c| c.bucket() != Bucket::Comparison)
    }

    fn selected_clients(&self, platforms: &[Platform]) -> Vec<&Arc<dyn MarketplaceClient>> {
        self.clients
            .iter()
            .filter(|c| platforms.is_empty() || platforms.iter().any(|p| c.covers_platform(*p)))
            .collect()
    }

    /// Search every selected client concurrently and file results by bucket.
    ///
    /// Never fails: a blank keyword yields an empty result without any
    /// upstream call.
    pub async fn search_all_platforms(&self, keyword: &str, request: &SearchRequest) -> AggregatedResult {
        let keyword = keyword.trim();
        let target_currency = request
            .target_currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_ascii_uppercase);
        let mut result = AggregatedResult::empty(keyword, target_currency.clone());

        if keyword.is_empty() {
            log::debug!("Empty keyword, skipping dispatch");
            return result;
        }

        // Aggregators search the requested marketplaces on our behalf
        let aggregator_sources: Vec<Platform> = request
            .platforms
            .iter()
            .copied()
            .filter(|p| !p.is_domestic() && *p != Platform::Unknown)
            .collect();
        let options: SearchOptions = request.options.clone().with_sources(aggregator_sources);

        let clients = self.selected_clients(&request.platforms);
        let outcomes = join_all(clients.iter().map(|client| {
            self.bounded(client, "search", client.search(keyword, &options))
        }))
        .await;

        for (client, outcome) in clients.iter().zip(outcomes) {
            let (listings, failure) = outcome.into_parts();
            result.sources.push(SourceReport {
                client: client.id().to_string(),
                bucket: client.bucket(),
                listings: listings.len(),
                failure: failure.as_ref().map(|e| e.to_string()),
                failure_kind: failure.as_ref().map(|e| e.kind()),
            });
            result
                .bucket_mut(client.bucket())
                .extend(listings.into_iter().map(ComparedListing::from));
        }

        if let Some(target) = target_currency.as_deref() {
            self.normalize(&mut result, target).await;
        }

        log::info!(
            "Search '{}': {} listings from {} clients ({} degraded)",
            keyword,
            result.total(),
            result.sources.len(),
            result.sources.iter().filter(|s| s.is_degraded()).count()
        );
        result
    }

    /// Convert every listing into `target`. The rate cache is refreshed at
    /// most once per call, however many listings need converting.
    async fn normalize(&self, result: &mut AggregatedResult, target: &str) {
        if result
            .listings()
            .any(|c| !c.listing.currency.eq_ignore_ascii_case(target))
        {
            self.rates.ensure_fresh().await;
        }

        for compared in result.listings_mut() {
            let listing = &compared.listing;
            match self.rates.convert_cached(listing.price, &listing.currency, target) {
                Ok(conversion) => {
                    compared.normalized = Some(NormalizedPrice {
                        amount: conversion.converted_amount,
                        currency: conversion.converted_currency,
                        rate: conversion.rate,
                    });
                }
                Err(e) => log::warn!(
                    "Could not normalize {} {} listing {}: {}",
                    listing.price,
                    listing.currency,
                    listing.id,
                    e
                ),
            }
        }
    }

    fn detail_client(&self, platform: Platform) -> Option<&Arc<dyn MarketplaceClient>> {
        self.clients
            .iter()
            .find(|c| c.platform() == platform && c.capabilities().supports_details)
            .or_else(|| self.clients.iter().find(|c| c.serves_details_for(platform)))
    }

    /// Details for one listing from exactly one client.
    ///
    /// `None` when the platform is unknown, no client serves it, or the
    /// lookup came back empty.
    pub async fn get_details(&self, id: &str, platform: Platform) -> Option<ListingDetail> {
        let id = id.trim();
        if id.is_empty() || platform == Platform::Unknown {
            return None;
        }

        let Some(client) = self.detail_client(platform) else {
            log::warn!("No client serves details for {}", platform);
            return None;
        };

        let fetched = self
            .bounded(client, "details", client.get_details_for(id, platform))
            .await;
        match fetched {
            Fetched::Data(detail) => Some(detail),
            Fetched::Empty(e) => {
                log::debug!("No {} detail for '{}': {}", platform, id, e);
                None
            }
        }
    }

    /// Register price tracking for each URL independently.
    ///
    /// Failed or empty registrations are left out of the map.
    pub async fn track_price(&self, urls: &[String]) -> BTreeMap<String, TrackingRegistration> {
        let mut registrations = BTreeMap::new();

        let Some(client) = self.capable(|c| c.supports_tracking) else {
            log::warn!("No tracking-capable client configured");
            return registrations;
        };

        let mut unique: Vec<&str> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        unique.sort_unstable();
        unique.dedup();

        let outcomes = join_all(unique.iter().map(|url| async move {
            let fetched = self.bounded(client, "tracking", client.track(url, &[])).await;
            (*url, fetched)
        }))
        .await;

        for (url, fetched) in outcomes {
            match fetched {
                Fetched::Data(registration) if !registration.is_empty() => {
                    registrations.insert(url.to_string(), registration);
                }
                Fetched::Data(_) => log::debug!("Empty tracking registration for {}", url),
                Fetched::Empty(_) => {}
            }
        }

        registrations
    }

    /// Price history and market insights for one product, both fail-soft.
    ///
    /// History is only available for Taobao items, addressed by their
    /// public item page.
    pub async fn price_analysis(&self, id: &str, platform: Platform) -> PriceAnalysis {
        let history = async {
            if platform != Platform::Taobao {
                return Vec::new();
            }
            let Some(client) = self.capable(|c| c.supports_history) else {
                return Vec::new();
            };
            let url = format!("https://item.taobao.com/item.htm?id={}", id.trim());
            self.bounded(
                client,
                "price history",
                client.price_history(&url, PRICE_HISTORY_DAYS),
            )
            .await
            .into_value()
        };

        let insights = async {
            let Some(client) = self.capable(|c| c.supports_insights) else {
                return MarketInsights::default();
            };
            self.bounded(
                client,
                "market insights",
                client.market_insights(DEFAULT_INSIGHT_CATEGORY, platform),
            )
            .await
            .into_value()
        };

        let (historical_prices, market_insights) = tokio::join!(history, insights);
        PriceAnalysis {
            historical_prices,
            market_insights,
            price_comparison: Vec::new(),
        }
    }

    pub async fn convert_price(&self, amount: Decimal, from: &str, to: &str) -> Result<ConversionResult> {
        Ok(self.rates.convert(amount, from, to).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{InMemorySnapshotStore, RateSnapshot};
    use async_trait::async_trait;
    use chrono::Utc;
    use crossprice_market_data::{Listing, PricePoint};
    use rust_decimal_macros::dec;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockClient {
        id: &'static str,
        platform: Platform,
        bucket: Bucket,
        capabilities: ClientCapabilities,
        serves: Vec<Platform>,
        listings: Option<Vec<Listing>>,
        delay: Duration,
        calls: AtomicUsize,
        last_url: Mutex<Option<String>>,
    }

    impl MockClient {
        fn new(id: &'static str, platform: Platform, bucket: Bucket) -> Self {
            Self {
                id,
                platform,
                bucket,
                capabilities: ClientCapabilities::search_and_details(),
                serves: Vec::new(),
                listings: Some(Vec::new()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                last_url: Mutex::new(None),
            }
        }

        fn with_listings(mut self, listings: Vec<Listing>) -> Self {
            self.listings = Some(listings);
            self
        }

        fn failing(mut self) -> Self {
            self.listings = None;
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
            self.capabilities = capabilities;
            self
        }

        fn serving(mut self, platforms: Vec<Platform>) -> Self {
            self.serves = platforms;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn outage(&self) -> MarketDataError {
            MarketDataError::HttpStatus {
                client: self.id.to_string(),
                status: 503,
            }
        }
    }

    #[async_trait]
    impl MarketplaceClient for MockClient {
        fn id(&self) -> &'static str {
            self.id
        }

        fn platform(&self) -> Platform {
            self.platform
        }

        fn bucket(&self) -> Bucket {
            self.bucket
        }

        fn capabilities(&self) -> ClientCapabilities {
            self.capabilities.clone()
        }

        fn serves_details_for(&self, platform: Platform) -> bool {
            platform == self.platform || self.serves.contains(&platform)
        }

        async fn search_listings(
            &self,
            _keyword: &str,
            _options: &SearchOptions,
        ) -> std::result::Result<Vec<Listing>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.listings.clone().ok_or_else(|| self.outage())
        }

        async fn fetch_details(
            &self,
            id: &str,
            platform: Platform,
        ) -> std::result::Result<ListingDetail, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match id {
                "missing" => Err(MarketDataError::NotFound(id.to_string())),
                "blank" => Ok(ListingDetail::default()),
                _ => Ok(ListingDetail::from_listing(Listing::new(
                    id,
                    self.id,
                    dec!(10),
                    "",
                    platform,
                ))),
            }
        }

        async fn register_tracking(
            &self,
            url: &str,
            _competitor_urls: &[String],
        ) -> std::result::Result<TrackingRegistration, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("fail") {
                return Err(self.outage());
            }
            if url.contains("empty") {
                return Ok(TrackingRegistration::default());
            }
            let mut map = Map::new();
            map.insert("id".to_string(), Value::String(format!("trk:{}", url)));
            map.insert("client".to_string(), json!(self.id));
            Ok(TrackingRegistration(map))
        }

        async fn fetch_price_history(
            &self,
            url: &str,
            _days: u32,
        ) -> std::result::Result<Vec<PricePoint>, MarketDataError> {
            *self.last_url.lock().unwrap() = Some(url.to_string());
            Ok(vec![PricePoint {
                timestamp: Utc::now(),
                price: dec!(199),
                currency: "CNY".to_string(),
            }])
        }

        async fn fetch_market_insights(
            &self,
            _category: &str,
            platform: Platform,
        ) -> std::result::Result<MarketInsights, MarketDataError> {
            let mut map = Map::new();
            map.insert("platform".to_string(), json!(platform.as_str()));
            Ok(MarketInsights(map))
        }
    }

    fn comparison_caps() -> ClientCapabilities {
        ClientCapabilities {
            supports_details: false,
            supports_tracking: true,
            supports_history: true,
            supports_insights: true,
        }
    }

    fn rates_usd_at_7_1() -> Arc<ExchangeRateCache> {
        let snapshot = RateSnapshot::new(vec![("USD".to_string(), 1.0 / 7.1)], Utc::now());
        Arc::new(ExchangeRateCache::new(
            None,
            Arc::new(InMemorySnapshotStore::new(Some(snapshot))),
        ))
    }

    fn service(clients: Vec<Arc<MockClient>>) -> PriceComparisonService {
        let clients = clients
            .into_iter()
            .map(|c| c as Arc<dyn MarketplaceClient>)
            .collect();
        PriceComparisonService::new(clients, rates_usd_at_7_1())
    }

    fn taobao() -> MockClient {
        MockClient::new("TAOBAO", Platform::Taobao, Bucket::Domestic).with_listings(vec![Listing::new(
            "5224",
            "Wireless headphones",
            dec!(199),
            "CNY",
            Platform::Taobao,
        )])
    }

    fn amazon() -> MockClient {
        MockClient::new("AMAZON", Platform::Amazon, Bucket::International).with_listings(vec![
            Listing::new("B01", "Wireless headphones", dec!(29.99), "USD", Platform::Amazon),
        ])
    }

    #[tokio::test]
    async fn test_headphones_normalized_to_cny() {
        let service = service(vec![Arc::new(taobao()), Arc::new(amazon())]);
        let request = SearchRequest::default().with_target_currency("CNY");

        let result = service.search_all_platforms("headphones", &request).await;

        assert_eq!(result.domestic.len(), 1);
        assert_eq!(result.international.len(), 1);
        let domestic = result.domestic[0].normalized.as_ref().unwrap();
        assert_eq!(domestic.amount, dec!(199));
        let international = result.international[0].normalized.as_ref().unwrap();
        assert_eq!(international.amount, dec!(212.93));
        assert_eq!(international.currency, "CNY");
        assert_eq!(result.cheapest().unwrap().listing.id, "5224");
    }

    struct DeadRateSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl crossprice_market_data::RateSource for DeadRateSource {
        fn id(&self) -> &'static str {
            "DEAD"
        }

        async fn fetch_rates(
            &self,
            _base: &str,
        ) -> std::result::Result<std::collections::HashMap<String, f64>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(MarketDataError::Timeout {
                client: "DEAD".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_failing_rate_source_is_tried_once_per_search() {
        let source = Arc::new(DeadRateSource {
            calls: AtomicUsize::new(0),
        });
        let rates = Arc::new(ExchangeRateCache::new(
            Some(source.clone() as Arc<dyn crossprice_market_data::RateSource>),
            Arc::new(InMemorySnapshotStore::new(None)),
        ));
        let listings = (0..20)
            .map(|i| {
                Listing::new(format!("B{}", i), "Headphones", dec!(29.99), "USD", Platform::Amazon)
            })
            .collect();
        let amazon = MockClient::new("AMAZON", Platform::Amazon, Bucket::International)
            .with_listings(listings);
        let service = PriceComparisonService::new(vec![Arc::new(amazon)], rates);

        let request = SearchRequest::default().with_target_currency("CNY");
        let started = std::time::Instant::now();
        let result = service.search_all_platforms("headphones", &request).await;

        assert_eq!(result.international.len(), 20);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(500));
        // Cold cache: missing codes count as 1.0
        assert!(result
            .listings()
            .all(|l| l.normalized.as_ref().map(|n| n.amount) == Some(dec!(29.99))));
    }

    #[tokio::test]
    async fn test_same_currency_results_skip_rate_refresh() {
        let source = Arc::new(DeadRateSource {
            calls: AtomicUsize::new(0),
        });
        let rates = Arc::new(ExchangeRateCache::new(
            Some(source.clone() as Arc<dyn crossprice_market_data::RateSource>),
            Arc::new(InMemorySnapshotStore::new(None)),
        ));
        let service = PriceComparisonService::new(vec![Arc::new(taobao())], rates);

        let request = SearchRequest::default().with_target_currency("cny");
        let result = service.search_all_platforms("headphones", &request).await;

        assert_eq!(result.domestic[0].normalized.as_ref().unwrap().amount, dec!(199));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_failing_client_does_not_affect_others() {
        let comparison = MockClient::new("PRICE", Platform::GoogleShopping, Bucket::Comparison)
            .with_capabilities(comparison_caps())
            .failing();
        let service = service(vec![Arc::new(taobao()), Arc::new(amazon()), Arc::new(comparison)]);

        let result = service
            .search_all_platforms("headphones", &SearchRequest::default())
            .await;

        assert_eq!(result.domestic.len(), 1);
        assert_eq!(result.international.len(), 1);
        assert!(result.price_comparison.is_empty());
        assert!(result.listings().all(|l| l.normalized.is_none()));

        assert_eq!(result.sources.len(), 3);
        let degraded: Vec<_> = result.sources.iter().filter(|s| s.is_degraded()).collect();
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].client, "PRICE");
        assert_eq!(degraded[0].listings, 0);
    }

    #[tokio::test]
    async fn test_slow_client_times_out_as_empty() {
        let slow = Arc::new(amazon().slow(Duration::from_millis(500)));
        let service = service(vec![Arc::new(taobao()), slow.clone()])
            .with_upstream_timeout(Duration::from_millis(50));

        let result = service
            .search_all_platforms("headphones", &SearchRequest::default())
            .await;

        assert_eq!(result.domestic.len(), 1);
        assert!(result.international.is_empty());
        let report = result.sources.iter().find(|s| s.client == "AMAZON").unwrap();
        assert_eq!(
            report.failure_kind,
            Some(crossprice_market_data::FailureKind::Transport)
        );
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_keyword_skips_dispatch() {
        let taobao = Arc::new(taobao());
        let service = service(vec![taobao.clone()]);

        let result = service
            .search_all_platforms("   ", &SearchRequest::default())
            .await;

        assert_eq!(result.total(), 0);
        assert!(result.sources.is_empty());
        assert_eq!(taobao.calls(), 0);
    }

    #[tokio::test]
    async fn test_platform_filter_keeps_covering_aggregators() {
        let taobao = Arc::new(taobao());
        let amazon = Arc::new(amazon());
        let fair = Arc::new(
            MockClient::new("FAIR", Platform::Amazon, Bucket::International)
                .serving(vec![Platform::Walmart]),
        );
        let service = service(vec![taobao.clone(), amazon.clone(), fair.clone()]);

        let request = SearchRequest::default().with_platforms(vec![Platform::Walmart]);
        let result = service.search_all_platforms("lamp", &request).await;

        assert_eq!(result.sources.len(), 1);
        assert_eq!(taobao.calls(), 0);
        assert_eq!(amazon.calls(), 0);
        assert_eq!(fair.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_clients_yields_empty_buckets() {
        let service = service(Vec::new());
        let result = service
            .search_all_platforms("headphones", &SearchRequest::default())
            .await;
        assert_eq!(result.total(), 0);
        assert_eq!(result.keyword, "headphones");
    }

    #[tokio::test]
    async fn test_details_route_to_exactly_one_client() {
        let taobao = Arc::new(taobao());
        let amazon = Arc::new(amazon());
        let service = service(vec![taobao.clone(), amazon.clone()]);

        let detail = service.get_details("5224", Platform::Taobao).await.unwrap();
        assert_eq!(detail.listing.title, "TAOBAO");
        assert_eq!(taobao.calls(), 1);
        assert_eq!(amazon.calls(), 0);
    }

    #[tokio::test]
    async fn test_details_fall_back_to_aggregator() {
        let fair = Arc::new(
            MockClient::new("FAIR", Platform::Amazon, Bucket::International)
                .serving(vec![Platform::Walmart, Platform::Ebay]),
        );
        let service = service(vec![Arc::new(taobao()), fair.clone()]);

        let detail = service.get_details("w-1", Platform::Walmart).await.unwrap();
        assert_eq!(detail.listing.platform, Platform::Walmart);
        assert_eq!(fair.calls(), 1);
    }

    #[tokio::test]
    async fn test_details_none_cases() {
        let service = service(vec![Arc::new(taobao())]);

        assert!(service.get_details("1", Platform::Unknown).await.is_none());
        assert!(service.get_details("1", Platform::Shopify).await.is_none());
        assert!(service.get_details("missing", Platform::Taobao).await.is_none());
        assert!(service.get_details("blank", Platform::Taobao).await.is_none());
        assert!(service.get_details(" ", Platform::Taobao).await.is_none());
    }

    #[tokio::test]
    async fn test_track_price_skips_failures_and_duplicates() {
        let fair = Arc::new(
            MockClient::new("FAIR", Platform::Amazon, Bucket::International).with_capabilities(
                ClientCapabilities {
                    supports_details: true,
                    supports_tracking: true,
                    ..Default::default()
                },
            ),
        );
        let price = Arc::new(
            MockClient::new("PRICE", Platform::GoogleShopping, Bucket::Comparison)
                .with_capabilities(comparison_caps()),
        );
        let service = service(vec![fair.clone(), price.clone()]);

        let urls = vec![
            "https://a.example/1".to_string(),
            "https://a.example/1".to_string(),
            "https://a.example/fail".to_string(),
            "https://a.example/empty".to_string(),
            "".to_string(),
        ];
        let registrations = service.track_price(&urls).await;

        assert_eq!(registrations.len(), 1);
        let registration = &registrations["https://a.example/1"];
        assert_eq!(registration.0["client"], "PRICE");
        assert_eq!(fair.calls(), 0);
        assert_eq!(price.calls(), 3);
    }

    #[tokio::test]
    async fn test_track_price_without_capable_client() {
        let service = service(vec![Arc::new(taobao())]);
        assert!(service
            .track_price(&["https://a.example/1".to_string()])
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_price_analysis_for_taobao() {
        let price = Arc::new(
            MockClient::new("PRICE", Platform::GoogleShopping, Bucket::Comparison)
                .with_capabilities(comparison_caps()),
        );
        let service = service(vec![Arc::new(taobao()), price.clone()]);

        let analysis = service.price_analysis("5224", Platform::Taobao).await;
        assert_eq!(analysis.historical_prices.len(), 1);
        assert_eq!(analysis.market_insights.0["platform"], "taobao");
        assert!(analysis.price_comparison.is_empty());
        assert_eq!(
            price.last_url.lock().unwrap().as_deref(),
            Some("https://item.taobao.com/item.htm?id=5224")
        );

        let analysis = service.price_analysis("B01", Platform::Amazon).await;
        assert!(analysis.historical_prices.is_empty());
        assert_eq!(analysis.market_insights.0["platform"], "amazon");
    }

    #[tokio::test]
    async fn test_price_analysis_without_clients_is_empty() {
        let analysis = service(Vec::new()).price_analysis("1", Platform::Taobao).await;
        assert!(analysis.historical_prices.is_empty());
        assert!(analysis.market_insights.0.is_empty());
    }

    #[tokio::test]
    async fn test_convert_price_passthrough() {
        let service = service(Vec::new());
        let result = service.convert_price(dec!(29.99), "usd", "cny").await.unwrap();
        assert_eq!(result.converted_amount, dec!(212.93));
        assert!(service.convert_price(dec!(-1), "USD", "CNY").await.is_err());
    }
}
