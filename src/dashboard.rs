//! # Dashboard Facade
//!
//! Single entry point for consumers: "give me the current aggregation". Wires the
//! adapters, price source and cache from [`Settings`], serves cached results inside the
//! TTL and runs a new cycle when they expire.
//!
//! ```rust,no_run
//! use validator_revenue_sdk::dashboard::Dashboard;
//! use validator_revenue_sdk::settings::Settings;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let dashboard = Dashboard::from_settings(&Settings::new()?)?;
//! let view = dashboard.current().await?;
//! println!("{:?}: ${:.0}", view.freshness, view.result.metrics.total_stake_usd);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::adapters::{
    ChainlinkAdapter, ChainlinkConfig, ChainlinkStats, CosmosAdapter, NearAdapter, NeutronAdapter,
    SkaleAdapter, SolanaAdapter, SuiAdapter,
};
use crate::cache::{AggregationCache, Freshness};
use crate::endpoints::EndpointRegistry;
use crate::error::{AdapterError, RegistryError};
use crate::orchestrator::Aggregator;
use crate::price_feeds::{CoinGeckoClient, PriceSource};
use crate::registry::{Ecosystem, NetworkRegistry};
use crate::revenue::{PerformanceQuotaRevenue, StakeBasedRevenue};
use crate::rpc_client::HttpClient;
use crate::settings::Settings;
use crate::strategies::{NetworkStrategy, StrategyRegistry};
use crate::types::conversions::string_to_address;
use crate::types::network::{AggregationResult, EnrichedNetwork};

pub const CHAINLINK_NETWORK_ID: &str = "chainlink";

/// Commission assumed for Skale, whose reference data carries no rate
const SKALE_FALLBACK_COMMISSION: f64 = 5.0;

/// What a consumer renders: the result, how old it is, and the last good values of
/// networks that failed in it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub freshness: Freshness,
    pub result: Arc<AggregationResult>,
    pub last_known: Vec<EnrichedNetwork>,
}

pub struct Dashboard {
    aggregator: Aggregator,
    prices: Arc<dyn PriceSource>,
    cache: AggregationCache,
    registry_path: Option<PathBuf>,
    chainlink: Option<Arc<ChainlinkAdapter>>,
    refresh_lock: Mutex<()>,
}

impl Dashboard {
    pub fn new(
        aggregator: Aggregator,
        prices: Arc<dyn PriceSource>,
        cache: AggregationCache,
        registry_path: Option<PathBuf>,
    ) -> Self {
        Self {
            aggregator,
            prices,
            cache,
            registry_path,
            chainlink: None,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_chainlink(mut self, adapter: Arc<ChainlinkAdapter>) -> Self {
        self.chainlink = Some(adapter);
        self
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = HttpClient::new(
            Duration::from_secs(settings.http.timeout_seconds),
            &settings.http.user_agent,
        )
        .context("building HTTP client")?;
        let endpoints = Arc::new(EndpointRegistry::mainnet().with_overrides(&settings.endpoint_overrides));

        let link_token = string_to_address(&settings.chainlink.link_token)
            .with_context(|| format!("invalid LINK token address {}", settings.chainlink.link_token))?;
        let chainlink = Arc::new(ChainlinkAdapter::new(
            http.clone(),
            endpoints.clone(),
            ChainlinkConfig {
                link_token,
                etherscan_url: settings.chainlink.etherscan_url.clone(),
                api_key: settings.chainlink.etherscan_api_key.clone(),
                history_page_size: settings.chainlink.history_page_size,
            },
        ));

        let stake_based = Arc::new(StakeBasedRevenue::new());
        let strategies = StrategyRegistry::new()
            .with_ecosystem(
                Ecosystem::Cosmos,
                NetworkStrategy::new(
                    Arc::new(CosmosAdapter::new(http.clone(), endpoints.clone())),
                    stake_based.clone(),
                ),
            )
            .with_ecosystem(
                Ecosystem::Solana,
                NetworkStrategy::new(
                    Arc::new(SolanaAdapter::new(http.clone(), endpoints.clone())),
                    stake_based.clone(),
                ),
            )
            .with_ecosystem(
                Ecosystem::Sui,
                NetworkStrategy::new(
                    Arc::new(SuiAdapter::new(http.clone(), endpoints.clone())),
                    stake_based.clone(),
                ),
            )
            .with_ecosystem(
                Ecosystem::Near,
                NetworkStrategy::new(
                    Arc::new(NearAdapter::new(http.clone(), endpoints.clone())),
                    stake_based.clone(),
                ),
            )
            .with_network(
                "neutron",
                NetworkStrategy::new(
                    Arc::new(NeutronAdapter::new(http.clone(), endpoints.clone())),
                    Arc::new(PerformanceQuotaRevenue::new(settings.neutron_revenue.default_quota_usd)),
                ),
            )
            .with_network(
                "skale",
                NetworkStrategy::new(
                    Arc::new(SkaleAdapter::new(endpoints.clone())),
                    Arc::new(StakeBasedRevenue::with_fallback_commission(SKALE_FALLBACK_COMMISSION)),
                ),
            )
            .with_network(CHAINLINK_NETWORK_ID, NetworkStrategy::new(chainlink.clone(), stake_based));

        let prices: Arc<dyn PriceSource> = Arc::new(CoinGeckoClient::new(
            http,
            settings.prices.coingecko_url.clone(),
            settings.prices.api_key.clone(),
            settings.prices.api_key_header.clone(),
        ));

        info!(
            "🚀 Dashboard configured (chainlink: {:?}, cache ttl {}s, registry: {})",
            chainlink.capability(),
            settings.cache.ttl_seconds,
            settings.registry_path.as_deref().unwrap_or("built-in")
        );

        let aggregator = Aggregator::new(
            strategies,
            prices.clone(),
            Duration::from_secs(settings.http.adapter_timeout_seconds),
        );
        Ok(Self::new(
            aggregator,
            prices,
            AggregationCache::new(Duration::from_secs(settings.cache.ttl_seconds)),
            settings.registry_path.as_ref().map(PathBuf::from),
        )
        .with_chainlink(chainlink))
    }

    fn load_registry(&self) -> Result<NetworkRegistry, RegistryError> {
        match &self.registry_path {
            Some(path) => NetworkRegistry::from_file(path),
            None => Ok(NetworkRegistry::builtin()),
        }
    }

    fn view(&self, result: Arc<AggregationResult>, freshness: Freshness) -> DashboardView {
        let last_known = self.cache.last_known_for(&result);
        DashboardView { freshness, result, last_known }
    }

    fn fresh_view(&self) -> Option<DashboardView> {
        match self.cache.get() {
            Some((result, Freshness::Fresh)) => Some(self.view(result, Freshness::Fresh)),
            _ => None,
        }
    }

    /// Cached result while it is inside the TTL, otherwise a new cycle.
    ///
    /// Concurrent callers that find the cache expired share one cycle.
    pub async fn current(&self) -> Result<DashboardView, RegistryError> {
        if let Some(view) = self.fresh_view() {
            return Ok(view);
        }
        let _guard = self.refresh_lock.lock().await;
        if let Some(view) = self.fresh_view() {
            return Ok(view);
        }
        self.run_cycle().await
    }

    /// Freshness of the cached result. Never runs a cycle.
    pub fn freshness(&self) -> Freshness {
        self.cache.freshness()
    }

    /// The cached view as it stands, `None` before the first cycle.
    pub fn cached(&self) -> Option<DashboardView> {
        self.cache.get().map(|(result, freshness)| self.view(result, freshness))
    }

    /// Runs a new cycle regardless of the cache.
    pub async fn refresh(&self) -> Result<DashboardView, RegistryError> {
        let _guard = self.refresh_lock.lock().await;
        self.run_cycle().await
    }

    /// One network from the current view.
    pub async fn network(&self, id: &str) -> Result<Option<EnrichedNetwork>, RegistryError> {
        Ok(self.current().await?.result.network(id).cloned())
    }

    async fn run_cycle(&self) -> Result<DashboardView, RegistryError> {
        let registry = match self.load_registry() {
            Ok(registry) => registry,
            Err(e) => {
                return match self.cache.get() {
                    Some((result, _)) => {
                        warn!("⚠️ Registry unavailable, serving cycle {} as stale: {}", result.cycle_id, e);
                        Ok(self.view(result, Freshness::Stale))
                    }
                    None => {
                        error!("❌ Registry unavailable and nothing cached: {}", e);
                        Err(e)
                    }
                };
            }
        };

        let result = self.aggregator.aggregate(registry.entries()).await;
        let result = self.cache.store(result);
        Ok(self.view(result, Freshness::Fresh))
    }

    /// Balance and payment history of the Chainlink node operator.
    pub async fn chainlink_stats(&self) -> Result<ChainlinkStats, AdapterError> {
        let adapter = self
            .chainlink
            .as_ref()
            .ok_or_else(|| AdapterError::Misconfigured("chainlink adapter not configured".into()))?;
        let registry = self
            .load_registry()
            .map_err(|e| AdapterError::Misconfigured(e.to_string()))?;
        let entry = registry
            .get(CHAINLINK_NETWORK_ID)
            .ok_or_else(|| AdapterError::NotFound("no chainlink entry in registry".into()))?;

        let cached_price = self
            .cache
            .get()
            .and_then(|(result, _)| result.network(CHAINLINK_NETWORK_ID).and_then(|n| n.price_usd));
        let link_price = match (cached_price, &entry.price_id) {
            (Some(price), _) => Some(price),
            (None, Some(price_id)) => {
                let ids = BTreeSet::from([price_id.clone()]);
                match self.prices.fetch_prices(&ids).await {
                    Ok(prices) => prices.get(price_id).map(|q| q.usd),
                    Err(e) => {
                        warn!("⚠️ LINK price unavailable: {}", e);
                        None
                    }
                }
            }
            (None, None) => None,
        };

        adapter.fetch_operator_stats(entry, link_price).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_feeds::StaticPrices;
    use crate::registry::NetworkRegistryEntry;
    use crate::types::snapshot::{TokenAmount, ValidatorSnapshot};
    use crate::validator_adapter::ValidatorAdapter;
    use async_trait::async_trait;
    use ethers::types::U256;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAdapter {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ValidatorAdapter for CountingAdapter {
        fn name(&self) -> &'static str {
            "Counting"
        }

        async fn fetch_snapshot(
            &self,
            entry: &NetworkRegistryEntry,
        ) -> Result<ValidatorSnapshot, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ValidatorSnapshot::new(&entry.id, TokenAmount::new(U256::from(5_000_000u64), 6)))
        }
    }

    const REGISTRY_JSON: &str = r#"[
        {"id": "osmosis", "name": "Osmosis", "token": "OSMO", "ecosystem": "cosmos",
         "apr": {"min": 10.0, "max": 20.0}, "address": "osmovaloper1abc", "status": "active",
         "priceId": "osmosis"}
    ]"#;

    fn dashboard(registry_path: PathBuf, ttl: Duration, calls: Arc<AtomicUsize>) -> Dashboard {
        let prices: Arc<dyn PriceSource> = Arc::new(StaticPrices::new([("osmosis", 0.5)]));
        let strategies = StrategyRegistry::new().with_ecosystem(
            Ecosystem::Cosmos,
            NetworkStrategy::new(Arc::new(CountingAdapter { calls }), Arc::new(StakeBasedRevenue::new())),
        );
        Dashboard::new(
            Aggregator::new(strategies, prices.clone(), Duration::from_secs(5)),
            prices,
            AggregationCache::new(ttl),
            Some(registry_path),
        )
    }

    fn registry_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY_JSON.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_current_serves_cache_within_ttl() {
        let file = registry_file();
        let calls = Arc::new(AtomicUsize::new(0));
        let dash = dashboard(file.path().to_path_buf(), Duration::from_secs(300), calls.clone());

        let first = dash.current().await.unwrap();
        let second = dash.current().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.freshness, Freshness::Fresh);
        assert_eq!(second.freshness, Freshness::Fresh);
        assert_eq!(first.result.cycle_id, second.result.cycle_id);
        let osmosis = second.result.network("osmosis").unwrap();
        assert_eq!(osmosis.stake.as_ref().unwrap().usd_value, Some(2.5));

        dash.refresh().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_never_fetched_until_first_cycle() {
        let file = registry_file();
        let calls = Arc::new(AtomicUsize::new(0));
        let dash = dashboard(file.path().to_path_buf(), Duration::from_secs(300), calls.clone());

        assert_eq!(dash.freshness(), Freshness::NeverFetched);
        assert!(dash.cached().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let fetched = dash.current().await.unwrap();
        assert_eq!(dash.freshness(), Freshness::Fresh);
        let cached = dash.cached().unwrap();
        assert_eq!(cached.freshness, Freshness::Fresh);
        assert_eq!(cached.result.cycle_id, fetched.result.cycle_id);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_registry_without_cache_is_an_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dash = dashboard(PathBuf::from("/nonexistent/registry.json"), Duration::from_secs(300), calls.clone());
        let err = dash.current().await.unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_registry_failure_falls_back_to_stale_result() {
        let file = registry_file();
        let path = file.path().to_path_buf();
        let calls = Arc::new(AtomicUsize::new(0));
        let dash = dashboard(path, Duration::ZERO, calls.clone());

        let first = dash.current().await.unwrap();
        drop(file);

        let second = dash.current().await.unwrap();
        assert_eq!(second.freshness, Freshness::Stale);
        assert_eq!(second.result.cycle_id, first.result.cycle_id);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_network_lookup() {
        let file = registry_file();
        let dash = dashboard(file.path().to_path_buf(), Duration::from_secs(300), Arc::new(AtomicUsize::new(0)));
        assert!(dash.network("osmosis").await.unwrap().is_some());
        assert!(dash.network("juno").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chainlink_stats_requires_adapter() {
        let file = registry_file();
        let dash = dashboard(file.path().to_path_buf(), Duration::from_secs(300), Arc::new(AtomicUsize::new(0)));
        let err = dash.chainlink_stats().await.unwrap_err();
        assert!(matches!(err, AdapterError::Misconfigured(_)));
    }

    #[test]
    fn test_from_settings_wires_defaults() {
        let dash = Dashboard::from_settings(&Settings::default()).unwrap();
        assert!(dash.chainlink.is_some());
        assert!(dash.registry_path.is_none());
        let registry = NetworkRegistry::builtin();
        for id in ["osmosis", "neutron", "solana", "sui", "near", "skale", "chainlink"] {
            let entry = registry.get(id).unwrap();
            assert!(dash.aggregator.strategies().resolve(entry).is_some(), "{id}");
        }
        let neutron = dash.aggregator.strategies().resolve(registry.get("neutron").unwrap()).unwrap();
        assert_eq!(neutron.revenue.name(), "performance_quota");
    }
}
