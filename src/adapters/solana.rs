use async_trait::async_trait;
use ethers::types::U256;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::registry::NetworkRegistryEntry;
use crate::rpc_client::HttpClient;
use crate::types::snapshot::{share_percent, TokenAmount, ValidatorSnapshot};
use crate::validator_adapter::{rank_by_stake, require_address, ValidatorAdapter};

#[derive(Debug, Deserialize)]
struct VoteAccounts {
    current: Vec<VoteAccount>,
    delinquent: Vec<VoteAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteAccount {
    vote_pubkey: String,
    /// lamports
    activated_stake: u64,
    commission: u8,
}

/// Solana vote accounts via `getVoteAccounts`.
pub struct SolanaAdapter {
    http: HttpClient,
    endpoints: Arc<EndpointRegistry>,
}

impl SolanaAdapter {
    pub fn new(http: HttpClient, endpoints: Arc<EndpointRegistry>) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl ValidatorAdapter for SolanaAdapter {
    fn name(&self) -> &'static str {
        "Solana"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let vote_pubkey = require_address(entry)?;
        let endpoint = self.endpoints.get(&entry.id)?;
        let accounts: VoteAccounts = self
            .http
            .rpc_call_any(
                endpoint.rpc_urls(&entry.id)?,
                "getVoteAccounts",
                json!([{ "commitment": "finalized" }]),
            )
            .await?;

        let current_idx = accounts.current.iter().position(|v| v.vote_pubkey == vote_pubkey);
        let ours = match current_idx {
            Some(i) => &accounts.current[i],
            None => accounts
                .delinquent
                .iter()
                .find(|v| v.vote_pubkey == vote_pubkey)
                .ok_or_else(|| {
                    AdapterError::NotFound(format!("vote account {} not in current or delinquent set", vote_pubkey))
                })?,
        };

        let total_stake = accounts
            .current
            .iter()
            .chain(accounts.delinquent.iter())
            .fold(U256::zero(), |acc, v| acc + U256::from(v.activated_stake));
        let stake = U256::from(ours.activated_stake);

        let mut snapshot = ValidatorSnapshot::new(&entry.id, TokenAmount::new(stake, endpoint.decimals));
        snapshot.commission = Some(f64::from(ours.commission));
        snapshot.total_validators = Some(accounts.current.len() as u32);
        snapshot.voting_power = share_percent(stake, total_stake);
        // delinquent validators are not ranked
        snapshot.jailed = Some(current_idx.is_none());
        snapshot.rank = current_idx.and_then(|idx| {
            let stakes: Vec<U256> =
                accounts.current.iter().map(|v| U256::from(v.activated_stake)).collect();
            rank_by_stake(&stakes, idx)
        });
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

    fn entry(address: &str) -> NetworkRegistryEntry {
        NetworkRegistryEntry {
            id: "solana".into(),
            name: "Solana".into(),
            token: "SOL".into(),
            ecosystem: Ecosystem::Solana,
            apr: None,
            address: Some(address.into()),
            status: NetworkStatus::Active,
            price_id: Some("solana".into()),
        }
    }

    async fn adapter_for(server: &MockServer) -> SolanaAdapter {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getVoteAccounts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "current": [
                        {"votePubkey": "A", "nodePubkey": "nA", "activatedStake": 5_000_000_000u64, "commission": 10},
                        {"votePubkey": "B", "nodePubkey": "nB", "activatedStake": 3_000_000_000u64, "commission": 7},
                        {"votePubkey": "C", "nodePubkey": "nC", "activatedStake": 8_000_000_000u64, "commission": 5}
                    ],
                    "delinquent": [
                        {"votePubkey": "D", "nodePubkey": "nD", "activatedStake": 4_000_000_000u64, "commission": 100}
                    ]
                }
            })))
            .mount(server)
            .await;
        let mut endpoints = EndpointRegistry::empty();
        endpoints.insert(
            "solana",
            EndpointConfig { rest: None, rpc: vec![server.uri()], chain_id: None, decimals: 9 },
        );
        SolanaAdapter::new(HttpClient::new(Duration::from_secs(5), "test").unwrap(), Arc::new(endpoints))
    }

    #[tokio::test]
    async fn test_current_validator_is_ranked() {
        let server = MockServer::start().await;
        let adapter = adapter_for(&server).await;
        let snap = adapter.fetch_snapshot(&entry("B")).await.unwrap();

        assert_eq!(snap.rank, Some(3));
        assert_eq!(snap.total_validators, Some(3));
        assert_eq!(snap.jailed, Some(false));
        assert_eq!(snap.commission, Some(7.0));
        assert!((snap.stake.unwrap().to_f64() - 3.0).abs() < 1e-12);
        // 3 of 20 SOL, delinquent stake included in the total
        assert!((snap.voting_power.unwrap() - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delinquent_validator_has_no_rank() {
        let server = MockServer::start().await;
        let adapter = adapter_for(&server).await;
        let snap = adapter.fetch_snapshot(&entry("D")).await.unwrap();
        assert_eq!(snap.rank, None);
        assert_eq!(snap.jailed, Some(true));
        assert_eq!(snap.total_validators, Some(3));
    }

    #[tokio::test]
    async fn test_unknown_vote_account_is_not_found() {
        let server = MockServer::start().await;
        let adapter = adapter_for(&server).await;
        let err = adapter.fetch_snapshot(&entry("Z")).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotFound(_)));
    }
}
