use async_trait::async_trait;
use ethers::types::U256;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;

use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::registry::NetworkRegistryEntry;
use crate::rpc_client::HttpClient;
use crate::types::conversions::{fraction_str_to_percent, parse_dec_u256};
use crate::types::snapshot::{share_percent, TokenAmount, ValidatorSnapshot};
use crate::validator_adapter::{rank_by_stake, require_address, ValidatorAdapter};

const BONDED_PAGE_LIMIT: &str = "500";

#[derive(Debug, Deserialize)]
struct ValidatorResponse {
    validator: CosmosValidator,
}

#[derive(Debug, Deserialize)]
struct ValidatorsResponse {
    #[serde(default)]
    validators: Vec<CosmosValidator>,
}

#[derive(Debug, Deserialize)]
struct CosmosValidator {
    operator_address: String,
    #[serde(default)]
    jailed: bool,
    tokens: String,
    #[serde(default)]
    description: Option<Description>,
    #[serde(default)]
    commission: Option<Commission>,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    moniker: String,
}

#[derive(Debug, Deserialize)]
struct Commission {
    commission_rates: CommissionRates,
}

#[derive(Debug, Deserialize)]
struct CommissionRates {
    rate: String,
}

#[derive(Debug, Deserialize)]
struct PoolResponse {
    pool: StakingPool,
}

#[derive(Debug, Deserialize)]
struct StakingPool {
    bonded_tokens: String,
}

/// Cosmos-SDK staking module over the LCD REST API.
#[derive(Clone)]
pub struct CosmosAdapter {
    http: HttpClient,
    endpoints: Arc<EndpointRegistry>,
}

impl CosmosAdapter {
    pub fn new(http: HttpClient, endpoints: Arc<EndpointRegistry>) -> Self {
        Self { http, endpoints }
    }

    async fn fetch_bonded_tokens(&self, base: &str) -> Result<U256, AdapterError> {
        let url = format!("{}/cosmos/staking/v1beta1/pool", base);
        let pool: PoolResponse = self.http.get_json(&url, &[]).await?;
        Ok(parse_dec_u256(&pool.pool.bonded_tokens)?)
    }

    /// (rank, total) among bonded validators. Rank is `None` when we are not in the set.
    async fn fetch_rank(
        &self,
        base: &str,
        address: &str,
    ) -> Result<(Option<u32>, u32), AdapterError> {
        let url = format!("{}/cosmos/staking/v1beta1/validators", base);
        let list: ValidatorsResponse = self
            .http
            .get_json(
                &url,
                &[("status", "BOND_STATUS_BONDED"), ("pagination.limit", BONDED_PAGE_LIMIT)],
            )
            .await?;

        let mut ranked = Vec::with_capacity(list.validators.len());
        for v in &list.validators {
            match parse_dec_u256(&v.tokens) {
                Ok(stake) => ranked.push((v.operator_address.as_str(), stake)),
                Err(e) => debug!("skipping bonded validator {} in rank: {}", v.operator_address, e),
            }
        }
        let stakes: Vec<U256> = ranked.iter().map(|(_, stake)| *stake).collect();
        let total = list.validators.len() as u32;
        let rank = ranked
            .iter()
            .position(|(operator, _)| *operator == address)
            .and_then(|idx| rank_by_stake(&stakes, idx));
        Ok((rank, total))
    }
}

#[async_trait]
impl ValidatorAdapter for CosmosAdapter {
    fn name(&self) -> &'static str {
        "Cosmos"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let address = require_address(entry)?;
        let endpoint = self.endpoints.get(&entry.id)?;
        let base = endpoint.rest_base(&entry.id)?;

        // addresses like "lava@valoper1..." need escaping in the path
        let encoded: String = url::form_urlencoded::byte_serialize(address.as_bytes()).collect();
        let url = format!("{}/cosmos/staking/v1beta1/validators/{}", base, encoded);
        let response: ValidatorResponse = self.http.get_json(&url, &[]).await?;
        let validator = response.validator;

        let stake = parse_dec_u256(&validator.tokens)?;
        let commission = validator
            .commission
            .as_ref()
            .map(|c| fraction_str_to_percent(&c.commission_rates.rate))
            .transpose()?;

        // pool and rank are best-effort: either may fail without failing the snapshot
        let (bonded, rank) = tokio::join!(
            self.fetch_bonded_tokens(base),
            self.fetch_rank(base, address)
        );

        let mut snapshot = ValidatorSnapshot::new(&entry.id, TokenAmount::new(stake, endpoint.decimals));
        snapshot.commission = commission;
        snapshot.jailed = Some(validator.jailed);
        snapshot.moniker = validator.description.map(|d| d.moniker).filter(|m| !m.is_empty());

        match bonded {
            Ok(total) => snapshot.voting_power = share_percent(stake, total),
            Err(e) => warn!("⚠️ {}: bonded pool unavailable, voting power omitted: {}", entry.id, e),
        }
        match rank {
            Ok((rank, total)) => {
                if rank.is_none() {
                    debug!("{}: {} not in bonded set of {}", entry.id, address, total);
                }
                snapshot.rank = rank;
                snapshot.total_validators = Some(total);
            }
            Err(e) => warn!("⚠️ {}: bonded validator list unavailable, rank omitted: {}", entry.id, e),
        }

        Ok(snapshot)
    }
}
