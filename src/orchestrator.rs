//! # Aggregation Orchestrator
//!
//! The `Aggregator` runs one aggregation cycle over a set of registry entries.
//!
//! ## Overview
//!
//! A cycle:
//! - Resolves an adapter and revenue strategy for every entry via the `StrategyRegistry`
//! - Calls every adapter concurrently, each bounded by its own timeout
//! - Fetches USD prices for all price ids concurrently with the adapter fan-out
//! - Waits for everything, then merges snapshots and prices onto the entries
//! - Derives summary metrics over the active entries
//!
//! A failing adapter only costs its own network: the failure is recorded in
//! `AggregationResult::errors` and the entry is still returned with its registry data.
//! A failing price source empties the price map and is reported in `degraded`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use validator_revenue_sdk::orchestrator::Aggregator;
//! use validator_revenue_sdk::price_feeds::StaticPrices;
//! use validator_revenue_sdk::registry::NetworkRegistry;
//! use validator_revenue_sdk::strategies::StrategyRegistry;
//!
//! # async fn run() {
//! let aggregator = Aggregator::new(
//!     StrategyRegistry::new(),
//!     Arc::new(StaticPrices::default()),
//!     Duration::from_secs(10),
//! );
//! let result = aggregator.aggregate(NetworkRegistry::builtin().entries()).await;
//! println!("{} networks, {} errors", result.networks.len(), result.errors.len());
//! # }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::AdapterError;
use crate::merge::{derive_metrics, merge_network};
use crate::metrics;
use crate::price_feeds::PriceSource;
use crate::registry::NetworkRegistryEntry;
use crate::strategies::{NetworkStrategy, StrategyRegistry};
use crate::types::network::{AggregationResult, DegradedSource, NetworkError};
use crate::types::snapshot::{DataQuality, PriceQuote, ValidatorSnapshot};

pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Source name used in `degraded` when the price oracle fails.
pub const PRICE_SOURCE: &str = "prices";

/// Coordinates one aggregation cycle across all ecosystem adapters.
///
/// # Thread Safety
///
/// The aggregator holds no mutable state; a single instance can be shared behind `Arc`
/// and `aggregate` called from several tasks at once.
pub struct Aggregator {
    strategies: StrategyRegistry,
    prices: Arc<dyn PriceSource>,
    adapter_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        strategies: StrategyRegistry,
        prices: Arc<dyn PriceSource>,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            strategies,
            prices,
            adapter_timeout,
        }
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Runs one full cycle over `entries`. Never fails: per-network failures are reported
    /// inside the result.
    pub async fn aggregate(&self, entries: &[NetworkRegistryEntry]) -> AggregationResult {
        let started = Instant::now();
        let cycle_id = Uuid::new_v4();
        debug!("[{}] aggregation cycle over {} networks", cycle_id, entries.len());

        let dispatch: Vec<(usize, &NetworkRegistryEntry, &NetworkStrategy)> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.address.is_some())
            .filter_map(|(idx, entry)| match self.strategies.resolve(entry) {
                Some(strategy) => Some((idx, entry, strategy)),
                None => {
                    debug!("No strategy for {} ({:?}), skipping", entry.id, entry.ecosystem);
                    None
                }
            })
            .collect();

        let price_ids: BTreeSet<String> = entries.iter().filter_map(|e| e.price_id.clone()).collect();

        let fetches = dispatch
            .iter()
            .map(|(idx, entry, strategy)| self.fetch_one(*idx, entry, strategy));
        let (outcomes, price_result) =
            tokio::join!(join_all(fetches), self.prices.fetch_prices(&price_ids));

        let mut degraded = Vec::new();
        let prices: HashMap<String, PriceQuote> = match price_result {
            Ok(prices) => prices,
            Err(e) => {
                warn!("⚠️ [{}] price fetch failed, continuing without prices: {}", cycle_id, e);
                metrics::increment_price_failure(e.kind().as_str());
                degraded.push(DegradedSource {
                    source: PRICE_SOURCE.to_string(),
                    reason: e.to_string(),
                });
                HashMap::new()
            }
        };

        let mut snapshots: HashMap<usize, ValidatorSnapshot> = HashMap::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        // join_all keeps input order, which is registry order
        for (idx, outcome) in outcomes {
            let entry = &entries[idx];
            match outcome {
                Ok(snapshot) => {
                    if let DataQuality::Degraded { reason } = &snapshot.quality {
                        degraded.push(DegradedSource {
                            source: entry.id.clone(),
                            reason: reason.clone(),
                        });
                    }
                    snapshots.insert(idx, snapshot);
                }
                Err(e) => {
                    warn!("⚠️ [{}] {} failed: {}", cycle_id, entry.id, e);
                    errors.push(NetworkError {
                        network_id: entry.id.clone(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let networks: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let revenue = self.strategies.resolve(entry).map(|s| s.revenue.as_ref());
                let price = entry.price_id.as_ref().and_then(|id| prices.get(id));
                merge_network(entry, snapshots.get(&idx), price, revenue)
            })
            .collect();

        let metrics_summary = derive_metrics(&networks);
        let elapsed = started.elapsed();
        metrics::record_aggregation(elapsed, errors.len());
        metrics::set_total_stake_usd(metrics_summary.total_stake_usd);

        info!(
            "✅ [{}] aggregated {} networks in {:?}: {} live, {} errors, {} prices, ${:.0} staked",
            cycle_id,
            networks.len(),
            elapsed,
            snapshots.len(),
            errors.len(),
            prices.len(),
            metrics_summary.total_stake_usd
        );

        AggregationResult {
            networks,
            metrics: metrics_summary,
            last_updated: Utc::now(),
            errors,
            degraded,
            cycle_id,
        }
    }

    async fn fetch_one(
        &self,
        idx: usize,
        entry: &NetworkRegistryEntry,
        strategy: &NetworkStrategy,
    ) -> (usize, Result<ValidatorSnapshot, AdapterError>) {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.adapter_timeout, strategy.adapter.fetch_snapshot(entry))
            .await
            .unwrap_or_else(|_| {
                Err(AdapterError::NetworkUnavailable(format!(
                    "{} adapter timed out after {:?}",
                    strategy.adapter.name(),
                    self.adapter_timeout
                )))
            });
        let label = match &outcome {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        metrics::record_adapter_call(&entry.id, label, started.elapsed());
        (idx, outcome)
    }
}
