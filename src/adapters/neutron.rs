// Neutron runs the Cosmos staking module plus a revenue module that pays validators a
// USD-denominated quota scaled by their performance rating.

use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;

use crate::adapters::cosmos::CosmosAdapter;
use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::normalization::to_decimal;
use crate::registry::NetworkRegistryEntry;
use crate::rpc_client::HttpClient;
use crate::types::snapshot::{DataQuality, RevenueModuleStats, ValidatorSnapshot};
use crate::validator_adapter::{require_address, ValidatorAdapter};

/// untrn
const NTRN_DECIMALS: u8 = 6;

#[derive(Debug, Deserialize)]
struct StatsResponse {
    stats: Stats,
}

#[derive(Debug, Deserialize)]
struct Stats {
    validator_info: ValidatorInfo,
    performance_rating: String,
    expected_revenue: Coin,
}

// field names follow the module's own spelling
#[derive(Debug, Deserialize)]
struct ValidatorInfo {
    commited_blocks_in_period: String,
    commited_oracle_votes_in_period: String,
    in_active_valset_for_blocks_in_period: String,
}

#[derive(Debug, Deserialize)]
struct Coin {
    amount: String,
}

#[derive(Debug, Deserialize)]
struct ParamsResponse {
    params: RevenueParams,
}

#[derive(Debug, Deserialize)]
struct RevenueParams {
    reward_quote: Coin,
}

fn parse_count(field: &str, raw: &str) -> Result<u64, AdapterError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| AdapterError::MalformedResponse(format!("{}={:?}: {}", field, raw, e)))
}

fn uptime_percent(committed: u64, active: u64) -> f64 {
    if active == 0 {
        0.0
    } else {
        committed as f64 / active as f64 * 100.0
    }
}

pub struct NeutronAdapter {
    cosmos: CosmosAdapter,
    http: HttpClient,
    endpoints: Arc<EndpointRegistry>,
}

impl NeutronAdapter {
    pub fn new(http: HttpClient, endpoints: Arc<EndpointRegistry>) -> Self {
        Self {
            cosmos: CosmosAdapter::new(http.clone(), endpoints.clone()),
            http,
            endpoints,
        }
    }

    /// Reads the revenue module's stats and params for `address`.
    ///
    /// The params call is optional: without it `reward_quote_usd` stays `None`.
    pub async fn fetch_revenue_stats(
        &self,
        network_id: &str,
        address: &str,
    ) -> Result<RevenueModuleStats, AdapterError> {
        let base = self.endpoints.get(network_id)?.rest_base(network_id)?;
        let stats_url = format!("{}/neutron/revenue/validator_stats", base);
        let params_url = format!("{}/neutron/revenue/params", base);

        let stats_query = [("val_oper_address", address)];
        let (stats, params) = tokio::join!(
            self.http.get_json::<StatsResponse>(&stats_url, &stats_query),
            self.http.get_json::<ParamsResponse>(&params_url, &[])
        );
        let stats = stats?.stats;

        let committed_blocks =
            parse_count("commited_blocks_in_period", &stats.validator_info.commited_blocks_in_period)?;
        let committed_oracle_votes = parse_count(
            "commited_oracle_votes_in_period",
            &stats.validator_info.commited_oracle_votes_in_period,
        )?;
        let active_blocks = parse_count(
            "in_active_valset_for_blocks_in_period",
            &stats.validator_info.in_active_valset_for_blocks_in_period,
        )?;
        let performance_rating = stats
            .performance_rating
            .trim()
            .parse::<f64>()
            .map_err(|e| AdapterError::MalformedResponse(format!("performance_rating: {}", e)))?;

        let reward_quote_usd = match params {
            Ok(p) => p.params.reward_quote.amount.trim().parse::<f64>().ok(),
            Err(e) => {
                warn!("⚠️ {}: revenue params unavailable: {}", network_id, e);
                None
            }
        };

        Ok(RevenueModuleStats {
            performance_rating,
            committed_blocks,
            committed_oracle_votes,
            active_blocks,
            blocks_uptime: uptime_percent(committed_blocks, active_blocks),
            oracle_uptime: uptime_percent(committed_oracle_votes, active_blocks),
            expected_revenue: to_decimal(&stats.expected_revenue.amount, NTRN_DECIMALS)?,
            reward_quote_usd,
        })
    }
}

#[async_trait]
impl ValidatorAdapter for NeutronAdapter {
    fn name(&self) -> &'static str {
        "Neutron"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let address = require_address(entry)?;
        let (snapshot, revenue) = tokio::join!(
            self.cosmos.fetch_snapshot(entry),
            self.fetch_revenue_stats(&entry.id, address)
        );

        let revenue = match revenue {
            Ok(stats) => {
                info!(
                    "✅ {}: performance {:.2}%, blocks {:.2}%, oracle {:.2}%",
                    entry.id,
                    stats.performance_rating * 100.0,
                    stats.blocks_uptime,
                    stats.oracle_uptime
                );
                Some(stats)
            }
            Err(e) => {
                warn!("⚠️ {}: revenue module unavailable: {}", entry.id, e);
                None
            }
        };

        // revenue comes from the module alone, so a failed staking read still yields it
        let mut snapshot = match (snapshot, revenue.is_some()) {
            (Ok(snapshot), _) => snapshot,
            (Err(e), true) => {
                warn!("⚠️ {}: staking read failed, reporting revenue module only: {}", entry.id, e);
                let mut partial = ValidatorSnapshot::without_stake(&entry.id);
                partial.quality = DataQuality::Degraded {
                    reason: format!("staking data unavailable: {}", e),
                };
                partial
            }
            (Err(e), false) => return Err(e),
        };
        snapshot.revenue_module = revenue;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cosmos::tests::{cosmos_entry, http, mount_validator, rest_endpoints};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_stats(server: &MockServer, address: &str) {
        Mock::given(method("GET"))
            .and(path("/neutron/revenue/validator_stats"))
            .and(query_param("val_oper_address", address))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stats": {
                    "validator_info": {
                        "val_oper_address": address,
                        "commited_blocks_in_period": "950",
                        "commited_oracle_votes_in_period": "900",
                        "in_active_valset_for_blocks_in_period": "1000"
                    },
                    "performance_rating": "0.9",
                    "expected_revenue": {"denom": "untrn", "amount": "12500000"}
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_attaches_revenue_module_stats() {
        let server = MockServer::start().await;
        mount_validator(&server, "neutronvaloper1x", "2000000").await;
        mount_stats(&server, "neutronvaloper1x").await;
        Mock::given(method("GET"))
            .and(path("/neutron/revenue/params"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "params": {"reward_asset": "untrn", "reward_quote": {"amount": "2500", "asset": "USD"}}
            })))
            .mount(&server)
            .await;

        let adapter = NeutronAdapter::new(http(), rest_endpoints("neutron", &server.uri(), 6));
        let snap = adapter
            .fetch_snapshot(&cosmos_entry("neutron", "neutronvaloper1x"))
            .await
            .unwrap();

        let stats = snap.revenue_module.unwrap();
        assert!((stats.performance_rating - 0.9).abs() < 1e-12);
        assert_eq!(stats.active_blocks, 1000);
        assert!((stats.blocks_uptime - 95.0).abs() < 1e-9);
        assert!((stats.oracle_uptime - 90.0).abs() < 1e-9);
        assert!((stats.expected_revenue - 12.5).abs() < 1e-9);
        assert_eq!(stats.reward_quote_usd, Some(2500.0));
    }

    #[tokio::test]
    async fn test_revenue_module_failure_keeps_staking_snapshot() {
        let server = MockServer::start().await;
        mount_validator(&server, "neutronvaloper1x", "2000000").await;

        let adapter = NeutronAdapter::new(http(), rest_endpoints("neutron", &server.uri(), 6));
        let snap = adapter
            .fetch_snapshot(&cosmos_entry("neutron", "neutronvaloper1x"))
            .await
            .unwrap();
        assert!(snap.revenue_module.is_none());
        assert!((snap.stake.unwrap().to_f64() - 2.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_missing_params_leaves_quote_unset() {
        let server = MockServer::start().await;
        mount_stats(&server, "neutronvaloper1x").await;

        let adapter = NeutronAdapter::new(http(), rest_endpoints("neutron", &server.uri(), 6));
        let stats = adapter.fetch_revenue_stats("neutron", "neutronvaloper1x").await.unwrap();
        assert_eq!(stats.reward_quote_usd, None);
    }

    #[tokio::test]
    async fn test_staking_failure_keeps_revenue_module() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/staking/v1beta1/validators/neutronvaloper1x"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_stats(&server, "neutronvaloper1x").await;

        let adapter = NeutronAdapter::new(http(), rest_endpoints("neutron", &server.uri(), 6));
        let snap = adapter
            .fetch_snapshot(&cosmos_entry("neutron", "neutronvaloper1x"))
            .await
            .unwrap();

        assert!(snap.stake.is_none());
        assert!(matches!(snap.quality, DataQuality::Degraded { .. }));
        let stats = snap.revenue_module.unwrap();
        assert!((stats.performance_rating - 0.9).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_both_reads_failing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let adapter = NeutronAdapter::new(http(), rest_endpoints("neutron", &server.uri(), 6));
        let err = adapter
            .fetch_snapshot(&cosmos_entry("neutron", "neutronvaloper1x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NetworkUnavailable(_)));
    }

    #[test]
    fn test_uptime_with_no_active_blocks() {
        assert_eq!(uptime_percent(10, 0), 0.0);
    }
}
