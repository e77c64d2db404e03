use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::registry::NetworkRegistryEntry;
use crate::rpc_client::HttpClient;
use crate::types::conversions::{parse_dec_u256, ratio_to_percent};
use crate::types::snapshot::{TokenAmount, ValidatorSnapshot};
use crate::validator_adapter::{require_address, ValidatorAdapter};

#[derive(Debug, Deserialize)]
struct CallFunctionResult {
    /// UTF-8 JSON bytes returned by the contract
    #[serde(default)]
    result: Vec<u8>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RewardFeeFraction {
    numerator: u64,
    denominator: u64,
}

/// Near staking-pool contracts through `query` / `call_function` view calls.
pub struct NearAdapter {
    http: HttpClient,
    endpoints: Arc<EndpointRegistry>,
}

impl NearAdapter {
    pub fn new(http: HttpClient, endpoints: Arc<EndpointRegistry>) -> Self {
        Self { http, endpoints }
    }

    /// Calls a view method with empty args and decodes its JSON return value.
    async fn view<T: DeserializeOwned>(
        &self,
        urls: &[String],
        pool_id: &str,
        method_name: &str,
    ) -> Result<T, AdapterError> {
        let params = json!({
            "request_type": "call_function",
            "finality": "final",
            "account_id": pool_id,
            "method_name": method_name,
            "args_base64": BASE64.encode(b"{}"),
        });
        let call: CallFunctionResult = self.http.rpc_call_any(urls, "query", params).await?;
        if let Some(err) = call.error {
            return Err(AdapterError::NetworkUnavailable(format!("{}: {}", method_name, err)));
        }
        serde_json::from_slice(&call.result)
            .map_err(|e| AdapterError::MalformedResponse(format!("{} result: {}", method_name, e)))
    }
}

#[async_trait]
impl ValidatorAdapter for NearAdapter {
    fn name(&self) -> &'static str {
        "Near"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let pool_id = require_address(entry)?;
        let endpoint = self.endpoints.get(&entry.id)?;
        let urls = endpoint.rpc_urls(&entry.id)?;

        let (staked, owner, fee, accounts) = tokio::join!(
            self.view::<String>(urls, pool_id, "get_total_staked_balance"),
            self.view::<String>(urls, pool_id, "get_owner_total_balance"),
            self.view::<RewardFeeFraction>(urls, pool_id, "get_reward_fee_fraction"),
            self.view::<u64>(urls, pool_id, "get_number_of_accounts"),
        );

        let staked = parse_dec_u256(&staked?)?;
        let fee = fee?;
        let owner = match owner.and_then(|raw| parse_dec_u256(&raw).map_err(AdapterError::from)) {
            Ok(v) => Some(TokenAmount::new(v, endpoint.decimals)),
            Err(e) => {
                warn!("⚠️ {}: owner balance unavailable: {}", entry.id, e);
                None
            }
        };

        let mut snapshot = ValidatorSnapshot::new(&entry.id, TokenAmount::new(staked, endpoint.decimals));
        snapshot.commission = Some(ratio_to_percent(fee.numerator, fee.denominator)?);
        snapshot.owner_balance = owner;
        snapshot.delegators = match accounts {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("⚠️ {}: delegator count unavailable: {}", entry.id, e);
                None
            }
        };
        Ok(snapshot)
    }
}
