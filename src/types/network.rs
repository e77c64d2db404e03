use crate::error::ErrorKind;
use crate::registry::NetworkRegistryEntry;
use crate::types::snapshot::{DataQuality, RevenueModuleStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Stake overlaid from a snapshot. `usd_value` is only present when the token price is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stake {
    pub amount: f64,
    pub usd_value: Option<f64>,
}

/// Registry entry with live data merged on top. Fields without live data stay `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedNetwork {
    #[serde(flatten)]
    pub entry: NetworkRegistryEntry,
    pub stake: Option<Stake>,
    pub commission: Option<f64>,
    pub rank: Option<u32>,
    pub total_validators: Option<u32>,
    pub voting_power: Option<f64>,
    pub jailed: Option<bool>,
    pub moniker: Option<String>,
    pub delegators: Option<u64>,
    /// Pool owner's own stake in whole tokens (Near)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_balance: Option<f64>,
    /// Operator wallet balance, reported beside stake and excluded from stake totals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_balance: Option<Stake>,
    pub price_usd: Option<f64>,
    pub estimated_monthly_revenue: Option<f64>,
    pub estimated_yearly_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_module: Option<RevenueModuleStats>,
    /// `None` when no snapshot was merged this cycle
    pub data_quality: Option<DataQuality>,
}

impl EnrichedNetwork {
    /// Copy of the registry entry with no live data attached.
    pub fn from_entry(entry: &NetworkRegistryEntry) -> Self {
        Self {
            entry: entry.clone(),
            stake: None,
            commission: None,
            rank: None,
            total_validators: None,
            voting_power: None,
            jailed: None,
            moniker: None,
            delegators: None,
            owner_balance: None,
            wallet_balance: None,
            price_usd: None,
            estimated_monthly_revenue: None,
            estimated_yearly_revenue: None,
            revenue_module: None,
            data_quality: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.entry.id
    }

    pub fn has_live_data(&self) -> bool {
        self.data_quality.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    pub total_stake_usd: f64,
    pub total_networks: usize,
    pub active_networks: usize,
    pub estimated_monthly_revenue: f64,
    pub estimated_yearly_revenue: f64,
    /// Unweighted mean of APR midpoints; `None` when no active network has an APR
    pub avg_apr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkError {
    pub network_id: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// A source that answered with reduced capability, or not at all, without failing a network.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedSource {
    pub source: String,
    pub reason: String,
}

/// Output of one aggregation cycle. Immutable once returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub networks: Vec<EnrichedNetwork>,
    pub metrics: NetworkMetrics,
    pub last_updated: DateTime<Utc>,
    pub errors: Vec<NetworkError>,
    pub degraded: Vec<DegradedSource>,
    pub cycle_id: Uuid,
}

impl AggregationResult {
    pub fn network(&self, id: &str) -> Option<&EnrichedNetwork> {
        self.networks.iter().find(|n| n.id() == id)
    }

    pub fn failed(&self, id: &str) -> bool {
        self.errors.iter().any(|e| e.network_id == id)
    }
}
