// End-to-end aggregation against HTTP doubles.
// Run with: cargo test --test aggregation

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use validator_revenue_sdk::adapters::{ChainlinkAdapter, ChainlinkConfig, CosmosAdapter, SolanaAdapter};
use validator_revenue_sdk::cache::Freshness;
use validator_revenue_sdk::dashboard::Dashboard;
use validator_revenue_sdk::endpoints::{EndpointConfig, EndpointOverride, EndpointRegistry};
use validator_revenue_sdk::error::ErrorKind;
use validator_revenue_sdk::orchestrator::Aggregator;
use validator_revenue_sdk::price_feeds::CoinGeckoClient;
use validator_revenue_sdk::registry::{AprRange, Ecosystem, NetworkRegistryEntry, NetworkStatus};
use validator_revenue_sdk::revenue::StakeBasedRevenue;
use validator_revenue_sdk::rpc_client::HttpClient;
use validator_revenue_sdk::settings::{Prices, Settings};
use validator_revenue_sdk::strategies::{NetworkStrategy, StrategyRegistry};
use validator_revenue_sdk::types::conversions::string_to_address;

fn entry(id: &str, ecosystem: Ecosystem, address: &str, apr: Option<(f64, f64)>) -> NetworkRegistryEntry {
    NetworkRegistryEntry {
        id: id.to_string(),
        name: id.to_uppercase(),
        token: id.to_uppercase(),
        ecosystem,
        apr: apr.map(|(min, max)| AprRange::new(min, max)),
        address: Some(address.to_string()),
        status: NetworkStatus::Active,
        price_id: Some(format!("{}-token", id)),
    }
}

async fn mount_cosmos_validator(server: &MockServer, address: &str, tokens: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/cosmos/staking/v1beta1/validators/{}", address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "validator": {
                "operator_address": address,
                "jailed": false,
                "tokens": tokens,
                "description": {"moniker": "01node"},
                "commission": {"commission_rates": {"rate": "0.050000000000000000"}}
            }
        })))
        .mount(server)
        .await;
}

async fn mount_prices(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), "aggregation-test").unwrap()
}

#[tokio::test]
async fn test_mixed_outcomes_across_ecosystems() {
    let cosmos = MockServer::start().await;
    let solana = MockServer::start().await;
    let coingecko = MockServer::start().await;

    mount_cosmos_validator(&cosmos, "valoperAlpha", "1000000000000").await;
    mount_cosmos_validator(&cosmos, "valoperBeta", "70000000").await;
    // valoperGamma is not mounted and answers 404
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getVoteAccounts"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1,
            "result": {
                "current": [
                    {"votePubkey": "Vote1", "activatedStake": 9_000_000_000u64, "commission": 10},
                    {"votePubkey": "Vote2", "activatedStake": 3_000_000_000u64, "commission": 7}
                ],
                "delinquent": []
            }
        })))
        .mount(&solana)
        .await;
    mount_prices(
        &coingecko,
        json!({"alpha-token": {"usd": 2.0}, "sol-token": {"usd": 100.0}}),
    )
    .await;

    let mut endpoints = EndpointRegistry::empty();
    for id in ["alpha", "beta", "gamma"] {
        endpoints.insert(
            id,
            EndpointConfig { rest: Some(cosmos.uri()), rpc: vec![], chain_id: None, decimals: 6 },
        );
    }
    endpoints.insert(
        "sol",
        EndpointConfig { rest: None, rpc: vec![solana.uri()], chain_id: None, decimals: 9 },
    );
    let endpoints = Arc::new(endpoints);

    let revenue = Arc::new(StakeBasedRevenue::new());
    let strategies = StrategyRegistry::new()
        .with_ecosystem(
            Ecosystem::Cosmos,
            NetworkStrategy::new(Arc::new(CosmosAdapter::new(http(), endpoints.clone())), revenue.clone()),
        )
        .with_ecosystem(
            Ecosystem::Solana,
            NetworkStrategy::new(Arc::new(SolanaAdapter::new(http(), endpoints.clone())), revenue),
        );
    let prices = Arc::new(CoinGeckoClient::new(http(), coingecko.uri(), None, "x-cg-demo-api-key"));
    let aggregator = Aggregator::new(strategies, prices, Duration::from_secs(10));

    let entries = vec![
        entry("alpha", Ecosystem::Cosmos, "valoperAlpha", Some((10.0, 20.0))),
        entry("beta", Ecosystem::Cosmos, "valoperBeta", Some((10.0, 20.0))),
        entry("gamma", Ecosystem::Cosmos, "valoperGamma", Some((10.0, 20.0))),
        entry("sol", Ecosystem::Solana, "Vote2", None),
    ];
    let result = aggregator.aggregate(&entries).await;

    let ids: Vec<_> = result.networks.iter().map(|n| n.id()).collect();
    assert_eq!(ids, vec!["alpha", "beta", "gamma", "sol"]);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].network_id, "gamma");
    assert_eq!(result.errors[0].kind, ErrorKind::NotFound);
    assert!(result.network("gamma").unwrap().stake.is_none());

    let alpha = result.network("alpha").unwrap();
    assert_eq!(alpha.stake.as_ref().unwrap().amount, 1_000_000.0);
    assert_eq!(alpha.stake.as_ref().unwrap().usd_value, Some(2_000_000.0));
    assert!((alpha.estimated_monthly_revenue.unwrap() - 1_250.0).abs() < 1e-6);

    // known stake, unknown price
    let beta = result.network("beta").unwrap();
    assert_eq!(beta.stake.as_ref().unwrap().amount, 70.0);
    assert_eq!(beta.stake.as_ref().unwrap().usd_value, None);
    assert_eq!(beta.estimated_monthly_revenue, None);

    let sol = result.network("sol").unwrap();
    assert_eq!(sol.rank, Some(2));
    assert_eq!(sol.total_validators, Some(2));
    assert_eq!(sol.commission, Some(7.0));
    assert_eq!(sol.stake.as_ref().unwrap().usd_value, Some(300.0));

    assert!((result.metrics.total_stake_usd - 2_000_300.0).abs() < 1e-6);
    assert_eq!(result.metrics.active_networks, 4);
    assert_eq!(result.metrics.avg_apr, Some(15.0));

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["networks"][1]["stake"]["usdValue"].is_null());
    assert_eq!(json["errors"][0]["kind"], "not_found");
}

#[tokio::test]
async fn test_price_outage_keeps_stakes() {
    let cosmos = MockServer::start().await;
    let coingecko = MockServer::start().await;
    mount_cosmos_validator(&cosmos, "valoperAlpha", "5000000").await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&coingecko)
        .await;

    let mut endpoints = EndpointRegistry::empty();
    endpoints.insert(
        "alpha",
        EndpointConfig { rest: Some(cosmos.uri()), rpc: vec![], chain_id: None, decimals: 6 },
    );
    let strategies = StrategyRegistry::new().with_ecosystem(
        Ecosystem::Cosmos,
        NetworkStrategy::new(
            Arc::new(CosmosAdapter::new(http(), Arc::new(endpoints))),
            Arc::new(StakeBasedRevenue::new()),
        ),
    );
    let prices = Arc::new(CoinGeckoClient::new(http(), coingecko.uri(), None, "x-cg-demo-api-key"));
    let aggregator = Aggregator::new(strategies, prices, Duration::from_secs(10));

    let result = aggregator
        .aggregate(&[entry("alpha", Ecosystem::Cosmos, "valoperAlpha", Some((5.0, 7.0)))])
        .await;

    assert!(result.errors.is_empty());
    assert_eq!(result.degraded.len(), 1);
    assert_eq!(result.degraded[0].source, "prices");
    let alpha = result.network("alpha").unwrap();
    assert_eq!(alpha.stake.as_ref().unwrap().amount, 5.0);
    assert_eq!(alpha.price_usd, None);
    assert_eq!(result.metrics.total_stake_usd, 0.0);
    assert_eq!(result.metrics.estimated_monthly_revenue, 0.0);
}

#[tokio::test]
async fn test_dashboard_from_settings_with_registry_file() {
    let cosmos = MockServer::start().await;
    let coingecko = MockServer::start().await;
    mount_cosmos_validator(&cosmos, "osmovaloper1test", "2000000000").await;
    mount_prices(&coingecko, json!({"osmosis": {"usd": 0.5}})).await;

    let mut registry = tempfile::NamedTempFile::new().unwrap();
    write!(
        registry,
        r#"[
            {{"id": "osmosis", "name": "Osmosis", "token": "OSMO", "ecosystem": "cosmos",
              "apr": {{"min": 8.0, "max": 12.0}}, "address": "osmovaloper1test",
              "status": "active", "priceId": "osmosis"}},
            {{"id": "monad", "name": "Monad", "token": "MON", "ecosystem": "other",
              "apr": null, "status": "coming_soon"}}
        ]"#
    )
    .unwrap();

    let mut overrides = HashMap::new();
    overrides.insert(
        "osmosis".to_string(),
        EndpointOverride { rest: Some(cosmos.uri()), ..Default::default() },
    );
    let settings = Settings {
        prices: Prices { coingecko_url: coingecko.uri(), ..Default::default() },
        endpoint_overrides: overrides,
        registry_path: Some(registry.path().to_string_lossy().into_owned()),
        ..Default::default()
    };

    let dashboard = Dashboard::from_settings(&settings).unwrap();
    let view = dashboard.current().await.unwrap();

    assert_eq!(view.freshness, Freshness::Fresh);
    assert_eq!(view.result.networks.len(), 2);
    assert!(view.result.errors.is_empty());
    assert!(view.last_known.is_empty());

    let osmosis = dashboard.network("osmosis").await.unwrap().unwrap();
    assert_eq!(osmosis.stake.as_ref().unwrap().amount, 2_000.0);
    assert_eq!(osmosis.stake.as_ref().unwrap().usd_value, Some(1_000.0));
    assert_eq!(view.result.metrics.total_networks, 2);
    assert_eq!(view.result.metrics.active_networks, 1);
    assert_eq!(view.result.metrics.avg_apr, Some(10.0));
}

#[tokio::test]
async fn test_operator_wallet_is_not_stake() {
    let cosmos = MockServer::start().await;
    let eth = MockServer::start().await;
    let coingecko = MockServer::start().await;
    mount_cosmos_validator(&cosmos, "valoperAlpha", "1000000").await;
    // 1000 LINK
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_call"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x00000000000000000000000000000000000000000000003635c9adc5dea00000"
        })))
        .mount(&eth)
        .await;
    mount_prices(&coingecko, json!({"alpha-token": {"usd": 2.0}, "link-token": {"usd": 15.0}})).await;

    let mut endpoints = EndpointRegistry::empty();
    endpoints.insert(
        "alpha",
        EndpointConfig { rest: Some(cosmos.uri()), rpc: vec![], chain_id: None, decimals: 6 },
    );
    endpoints.insert(
        "link",
        EndpointConfig { rest: None, rpc: vec![eth.uri()], chain_id: None, decimals: 18 },
    );
    let endpoints = Arc::new(endpoints);
    let chainlink = ChainlinkAdapter::new(
        http(),
        endpoints.clone(),
        ChainlinkConfig {
            link_token: string_to_address("0x514910771AF9Ca656af840dff83E8264EcF986CA").unwrap(),
            etherscan_url: "http://127.0.0.1:1/v2/api".to_string(),
            api_key: None,
            history_page_size: 1000,
        },
    );
    let revenue = Arc::new(StakeBasedRevenue::new());
    let strategies = StrategyRegistry::new()
        .with_ecosystem(
            Ecosystem::Cosmos,
            NetworkStrategy::new(Arc::new(CosmosAdapter::new(http(), endpoints.clone())), revenue.clone()),
        )
        .with_network("link", NetworkStrategy::new(Arc::new(chainlink), revenue));
    let prices = Arc::new(CoinGeckoClient::new(http(), coingecko.uri(), None, "x-cg-demo-api-key"));
    let aggregator = Aggregator::new(strategies, prices, Duration::from_secs(10));

    let result = aggregator
        .aggregate(&[
            entry("alpha", Ecosystem::Cosmos, "valoperAlpha", None),
            entry("link", Ecosystem::Ethereum, "0x7A30E4B6307c0Db7AeF247A656b44d888B23a2DC", None),
        ])
        .await;

    assert!(result.errors.is_empty());
    let link = result.network("link").unwrap();
    assert!(link.stake.is_none());
    assert_eq!(link.wallet_balance.as_ref().unwrap().amount, 1_000.0);
    assert_eq!(link.wallet_balance.as_ref().unwrap().usd_value, Some(15_000.0));
    assert_eq!(link.estimated_monthly_revenue, None);
    assert_eq!(result.metrics.total_stake_usd, 2.0);
}
