//! Pure merge of live data onto registry entries, and the summary metrics over the result.
//!
//! Nothing here performs I/O. Each live field is independently optional: a known stake with
//! an unknown price yields an amount without a USD value, never a zero.

use crate::registry::{AprRange, NetworkRegistryEntry};
use crate::revenue::{RevenueInputs, RevenueStrategy};
use crate::types::network::{EnrichedNetwork, NetworkMetrics, Stake};
use crate::types::snapshot::{PriceQuote, TokenAmount, ValidatorSnapshot};

/// Overlays `snapshot` and `price` onto a copy of `entry`.
pub fn merge_network(
    entry: &NetworkRegistryEntry,
    snapshot: Option<&ValidatorSnapshot>,
    price: Option<&PriceQuote>,
    revenue: Option<&dyn RevenueStrategy>,
) -> EnrichedNetwork {
    let mut network = EnrichedNetwork::from_entry(entry);
    let price_usd = price.map(|p| p.usd);
    network.price_usd = price_usd;

    let Some(snapshot) = snapshot else {
        return network;
    };

    if let Some(apy) = snapshot.apr_override {
        network.entry.apr = Some(AprRange::point(apy));
    }

    let valued = |amount: TokenAmount| {
        let amount = amount.to_f64();
        Stake {
            amount,
            usd_value: price_usd.map(|p| amount * p),
        }
    };
    network.stake = snapshot.stake.map(&valued);
    network.wallet_balance = snapshot.wallet_balance.map(&valued);
    network.commission = snapshot.commission;
    network.rank = snapshot.rank;
    network.total_validators = snapshot.total_validators;
    network.voting_power = snapshot.voting_power;
    network.jailed = snapshot.jailed;
    network.moniker = snapshot.moniker.clone();
    network.delegators = snapshot.delegators;
    network.owner_balance = snapshot.owner_balance.map(|b| b.to_f64());
    network.revenue_module = snapshot.revenue_module.clone();
    network.data_quality = Some(snapshot.quality.clone());

    if let Some(strategy) = revenue {
        let inputs = RevenueInputs {
            stake_tokens: network.stake.as_ref().map(|s| s.amount),
            apr: network.entry.apr,
            commission: snapshot.commission,
            price_usd,
            snapshot,
        };
        if let Some(estimate) = strategy.estimate(&inputs) {
            network.estimated_monthly_revenue = Some(estimate.monthly_usd);
            network.estimated_yearly_revenue = Some(estimate.yearly_usd);
        }
    }

    network
}

/// Summary over `active` networks. Unknown values are skipped, never counted as zero.
pub fn derive_metrics(networks: &[EnrichedNetwork]) -> NetworkMetrics {
    let active: Vec<&EnrichedNetwork> = networks.iter().filter(|n| n.entry.is_active()).collect();

    let total_stake_usd = active
        .iter()
        .filter_map(|n| n.stake.as_ref().and_then(|s| s.usd_value))
        .sum();

    let aprs: Vec<f64> = active
        .iter()
        .filter_map(|n| n.entry.apr.map(|a| a.midpoint()))
        .collect();
    let avg_apr = if aprs.is_empty() {
        None
    } else {
        Some(aprs.iter().sum::<f64>() / aprs.len() as f64)
    };

    NetworkMetrics {
        total_stake_usd,
        total_networks: networks.len(),
        active_networks: active.len(),
        estimated_monthly_revenue: active.iter().filter_map(|n| n.estimated_monthly_revenue).sum(),
        estimated_yearly_revenue: active.iter().filter_map(|n| n.estimated_yearly_revenue).sum(),
        avg_apr,
    }
}
