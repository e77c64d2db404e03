use crate::normalization::u256_to_f64;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Raw on-chain amount in the smallest denomination, paired with its decimal exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Whole-token amount (e.g. 1_500_000 uatom -> 1.5 ATOM).
    pub fn to_f64(&self) -> f64 {
        u256_to_f64(self.raw, self.decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

/// Provenance of the data behind a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DataQuality {
    /// Fetched from the chain this cycle
    Live,
    /// Static reference figures, not a live read
    Reference,
    /// Live, but from a reduced-capability path
    Degraded { reason: String },
}

/// Neutron revenue-module figures for our validator in the current payment period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueModuleStats {
    /// 0.0 - 1.0
    pub performance_rating: f64,
    pub committed_blocks: u64,
    pub committed_oracle_votes: u64,
    pub active_blocks: u64,
    /// percent
    pub blocks_uptime: f64,
    /// percent
    pub oracle_uptime: f64,
    /// NTRN
    pub expected_revenue: f64,
    /// Monthly USD quota per validator, when the params call succeeded
    pub reward_quote_usd: Option<f64>,
}

/// Normalized result of one adapter call. Created per cycle, consumed by the merge step.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorSnapshot {
    pub network_id: String,
    /// Delegated stake; `None` when only auxiliary data could be read
    pub stake: Option<TokenAmount>,
    /// percent, 0 - 100
    pub commission: Option<f64>,
    pub rank: Option<u32>,
    pub total_validators: Option<u32>,
    /// Jailed (Cosmos) or delinquent (Solana)
    pub jailed: Option<bool>,
    pub moniker: Option<String>,
    /// Share of total network stake, percent
    pub voting_power: Option<f64>,
    /// Live APY reported by the chain, percent
    pub apr_override: Option<f64>,
    pub delegators: Option<u64>,
    pub owner_balance: Option<TokenAmount>,
    /// Liquid balance of an operator wallet (Chainlink). Never counted as stake.
    pub wallet_balance: Option<TokenAmount>,
    pub revenue_module: Option<RevenueModuleStats>,
    pub quality: DataQuality,
}

impl ValidatorSnapshot {
    /// Snapshot with only the stake filled in; adapters set the rest field by field.
    pub fn new(network_id: impl Into<String>, stake: TokenAmount) -> Self {
        Self {
            stake: Some(stake),
            ..Self::without_stake(network_id)
        }
    }

    pub fn without_stake(network_id: impl Into<String>) -> Self {
        Self {
            network_id: network_id.into(),
            stake: None,
            commission: None,
            rank: None,
            total_validators: None,
            jailed: None,
            moniker: None,
            voting_power: None,
            apr_override: None,
            delegators: None,
            owner_balance: None,
            wallet_balance: None,
            revenue_module: None,
            quality: DataQuality::Live,
        }
    }
}

/// USD quote for one price id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub id: String,
    pub usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_24h_change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_market_cap: Option<f64>,
}

/// Stake expressed as a share of `total`, in percent. `None` when total is zero.
pub fn share_percent(part: U256, total: U256) -> Option<f64> {
    if total.is_zero() {
        return None;
    }
    // same exponent on both sides cancels out; 18 keeps both values well inside f64 range
    let part = u256_to_f64(part, 18);
    let total = u256_to_f64(total, 18);
    Some(part / total * 100.0)
}
