use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::registry::NetworkRegistryEntry;
use crate::rpc_client::HttpClient;
use crate::types::conversions::{basis_points_to_percent, parse_dec_u256};
use crate::types::snapshot::{TokenAmount, ValidatorSnapshot};
use crate::validator_adapter::{rank_by_stake, require_address, ValidatorAdapter};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SystemState {
    active_validators: Vec<SuiValidator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuiValidator {
    sui_address: String,
    #[serde(default)]
    name: String,
    /// MIST
    staking_pool_sui_balance: String,
    /// basis points
    commission_rate: String,
    /// basis points of total voting power
    voting_power: String,
}

#[derive(Debug, Deserialize)]
struct ValidatorsApy {
    apys: Vec<ValidatorApy>,
}

#[derive(Debug, Deserialize)]
struct ValidatorApy {
    address: String,
    /// fraction, 0.032 = 3.2%
    apy: f64,
}

/// Sui validators from the latest system state object.
pub struct SuiAdapter {
    http: HttpClient,
    endpoints: Arc<EndpointRegistry>,
}

impl SuiAdapter {
    pub fn new(http: HttpClient, endpoints: Arc<EndpointRegistry>) -> Self {
        Self { http, endpoints }
    }

    async fn fetch_apy(&self, urls: &[String], address: &str) -> Result<Option<f64>, AdapterError> {
        let apys: ValidatorsApy = self
            .http
            .rpc_call_any(urls, "suix_getValidatorsApy", json!([]))
            .await?;
        Ok(apys
            .apys
            .iter()
            .find(|a| a.address == address)
            .filter(|a| a.apy.is_finite())
            .map(|a| round_percent(a.apy)))
    }
}

/// Fraction to percent, rounded to two decimals.
fn round_percent(fraction: f64) -> f64 {
    (fraction * 100.0 * 100.0).round() / 100.0
}

#[async_trait]
impl ValidatorAdapter for SuiAdapter {
    fn name(&self) -> &'static str {
        "Sui"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let address = require_address(entry)?;
        let endpoint = self.endpoints.get(&entry.id)?;
        let urls = endpoint.rpc_urls(&entry.id)?;

        let (state, apy) = tokio::join!(
            self.http
                .rpc_call_any::<SystemState>(urls, "suix_getLatestSuiSystemState", json!([])),
            self.fetch_apy(urls, address)
        );
        let state = state?;

        let stakes = state
            .active_validators
            .iter()
            .map(|v| parse_dec_u256(&v.staking_pool_sui_balance))
            .collect::<Result<Vec<_>, _>>()?;
        let idx = state
            .active_validators
            .iter()
            .position(|v| v.sui_address == address)
            .ok_or_else(|| AdapterError::NotFound(format!("validator {} not in active set", address)))?;
        let ours = &state.active_validators[idx];

        let mut snapshot = ValidatorSnapshot::new(&entry.id, TokenAmount::new(stakes[idx], endpoint.decimals));
        snapshot.commission = Some(basis_points_to_percent(&ours.commission_rate)?);
        snapshot.voting_power = Some(basis_points_to_percent(&ours.voting_power)?);
        snapshot.rank = rank_by_stake(&stakes, idx);
        snapshot.total_validators = Some(state.active_validators.len() as u32);
        snapshot.moniker = Some(ours.name.clone()).filter(|n| !n.is_empty());
        snapshot.apr_override = match apy {
            Ok(apy) => apy,
            Err(e) => {
                warn!("⚠️ {}: APY unavailable, registry APR kept: {}", entry.id, e);
                None
            }
        };
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::EndpointConfig;
    use crate::registry::{Ecosystem, NetworkStatus};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry() -> NetworkRegistryEntry {
        NetworkRegistryEntry {
            id: "sui".into(),
            name: "Sui".into(),
            token: "SUI".into(),
            ecosystem: Ecosystem::Sui,
            apr: None,
            address: Some("0xb".into()),
            status: NetworkStatus::Active,
            price_id: Some("sui".into()),
        }
    }

    async fn adapter_with_state(server: &MockServer) -> SuiAdapter {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "suix_getLatestSuiSystemState"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "epoch": "500",
                    "totalStake": "16000000000000000",
                    "activeValidators": [
                        {"suiAddress": "0xa", "name": "A", "stakingPoolSuiBalance": "9000000000000000",
                         "commissionRate": "500", "votingPower": "56"},
                        {"suiAddress": "0xb", "name": "01node", "stakingPoolSuiBalance": "7000000000000000",
                         "commissionRate": "200", "votingPower": "44"}
                    ]
                }
            })))
            .mount(server)
            .await;
        let mut endpoints = EndpointRegistry::empty();
        endpoints.insert(
            "sui",
            EndpointConfig { rest: None, rpc: vec![server.uri()], chain_id: None, decimals: 9 },
        );
        SuiAdapter::new(HttpClient::new(Duration::from_secs(5), "test").unwrap(), Arc::new(endpoints))
    }

    #[tokio::test]
    async fn test_snapshot_with_apy_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "suix_getValidatorsApy"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {"epoch": "500", "apys": [{"address": "0xb", "apy": 0.031847}]}
            })))
            .mount(&server)
            .await;
        let adapter = adapter_with_state(&server).await;
        let snap = adapter.fetch_snapshot(&entry()).await.unwrap();

        assert_eq!(snap.rank, Some(2));
        assert_eq!(snap.total_validators, Some(2));
        assert!((snap.commission.unwrap() - 2.0).abs() < 1e-12);
        assert!((snap.voting_power.unwrap() - 0.44).abs() < 1e-12);
        assert_eq!(snap.apr_override, Some(3.18));
        assert!((snap.stake.unwrap().to_f64() - 7_000_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_apy_failure_keeps_snapshot() {
        let server = MockServer::start().await;
        let adapter = adapter_with_state(&server).await;
        let snap = adapter.fetch_snapshot(&entry()).await.unwrap();
        assert_eq!(snap.apr_override, None);
        assert_eq!(snap.rank, Some(2));
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(0.031847), 3.18);
        assert_eq!(round_percent(0.0), 0.0);
    }
}
