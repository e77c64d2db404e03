use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics;
use crate::types::network::{AggregationResult, EnrichedNetwork};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Age of the result a caller is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    NeverFetched,
    Fresh,
    Stale,
}

#[derive(Debug)]
struct CachedAggregation {
    result: Arc<AggregationResult>,
    fetched_at: Instant,
    invalidated: bool,
}

impl CachedAggregation {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.invalidated && self.fetched_at.elapsed() < ttl
    }
}

/// Holds the latest aggregation result for a time window.
///
/// Readers never block writers: the current result is swapped atomically. Alongside it the
/// cache remembers, per network, the last entry that carried live data, so a network that
/// fails in one cycle can still be shown with its previous values.
#[derive(Debug)]
pub struct AggregationCache {
    current: ArcSwapOption<CachedAggregation>,
    ttl: Duration,
    last_good: DashMap<String, EnrichedNetwork>,
}

impl AggregationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: ArcSwapOption::from(None),
            ttl,
            last_good: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Latest result with its freshness, or `None` before the first store.
    pub fn get(&self) -> Option<(Arc<AggregationResult>, Freshness)> {
        let guard = self.current.load();
        match &*guard {
            Some(cached) => {
                let freshness = if cached.is_fresh(self.ttl) {
                    metrics::increment_cache_hit();
                    Freshness::Fresh
                } else {
                    metrics::increment_cache_miss();
                    Freshness::Stale
                };
                Some((cached.result.clone(), freshness))
            }
            None => {
                metrics::increment_cache_miss();
                None
            }
        }
    }

    pub fn freshness(&self) -> Freshness {
        match &*self.current.load() {
            Some(cached) if cached.is_fresh(self.ttl) => Freshness::Fresh,
            Some(_) => Freshness::Stale,
            None => Freshness::NeverFetched,
        }
    }

    /// Replaces the current result and records every network that carried live data.
    pub fn store(&self, result: AggregationResult) -> Arc<AggregationResult> {
        let mut remembered = 0;
        for network in result.networks.iter().filter(|n| n.has_live_data()) {
            self.last_good.insert(network.id().to_string(), network.clone());
            remembered += 1;
        }
        debug!(
            "Cached cycle {} ({} networks with live data, ttl {:?})",
            result.cycle_id, remembered, self.ttl
        );

        let result = Arc::new(result);
        self.current.store(Some(Arc::new(CachedAggregation {
            result: result.clone(),
            fetched_at: Instant::now(),
            invalidated: false,
        })));
        result
    }

    /// Last good entries for the networks that failed in `result`, in error order.
    pub fn last_known_for(&self, result: &AggregationResult) -> Vec<EnrichedNetwork> {
        result
            .errors
            .iter()
            .filter_map(|e| self.last_good.get(&e.network_id).map(|n| n.value().clone()))
            .collect()
    }

    /// Forces the next read to be stale without dropping the last result.
    pub fn invalidate(&self) {
        if let Some(cached) = self.current.load_full() {
            self.current.store(Some(Arc::new(CachedAggregation {
                result: cached.result.clone(),
                fetched_at: cached.fetched_at,
                invalidated: true,
            })));
        }
    }
}

impl Default for AggregationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::registry::NetworkRegistry;
    use crate::types::network::{NetworkError, NetworkMetrics, Stake};
    use crate::types::snapshot::DataQuality;
    use chrono::Utc;
    use uuid::Uuid;

    fn result(networks: Vec<EnrichedNetwork>, failed: &[&str]) -> AggregationResult {
        AggregationResult {
            networks,
            metrics: NetworkMetrics::default(),
            last_updated: Utc::now(),
            errors: failed
                .iter()
                .map(|id| NetworkError {
                    network_id: id.to_string(),
                    kind: ErrorKind::NetworkUnavailable,
                    message: "down".into(),
                })
                .collect(),
            degraded: vec![],
            cycle_id: Uuid::new_v4(),
        }
    }

    fn live(id: &str, amount: f64) -> EnrichedNetwork {
        let entry = NetworkRegistry::builtin().get(id).cloned().unwrap();
        let mut n = EnrichedNetwork::from_entry(&entry);
        n.stake = Some(Stake { amount, usd_value: None });
        n.data_quality = Some(DataQuality::Live);
        n
    }

    fn bare(id: &str) -> EnrichedNetwork {
        EnrichedNetwork::from_entry(NetworkRegistry::builtin().get(id).unwrap())
    }

    #[test]
    fn test_freshness_transitions() {
        let cache = AggregationCache::new(Duration::from_secs(60));
        assert_eq!(cache.freshness(), Freshness::NeverFetched);
        assert!(cache.get().is_none());

        cache.store(result(vec![live("osmosis", 1.0)], &[]));
        assert_eq!(cache.freshness(), Freshness::Fresh);
        assert_eq!(cache.get().unwrap().1, Freshness::Fresh);

        cache.invalidate();
        assert_eq!(cache.freshness(), Freshness::Stale);
        assert_eq!(cache.get().unwrap().0.networks.len(), 1);
    }

    #[test]
    fn test_zero_ttl_is_always_stale() {
        let cache = AggregationCache::new(Duration::ZERO);
        cache.store(result(vec![], &[]));
        assert_eq!(cache.freshness(), Freshness::Stale);
    }

    #[test]
    fn test_last_known_only_for_failed_networks() {
        let cache = AggregationCache::default();
        cache.store(result(vec![live("osmosis", 10.0), live("celestia", 20.0)], &[]));

        let second = result(vec![bare("osmosis"), live("celestia", 21.0)], &["osmosis"]);
        let stored = cache.store(second);

        let last_known = cache.last_known_for(&stored);
        assert_eq!(last_known.len(), 1);
        assert_eq!(last_known[0].id(), "osmosis");
        assert_eq!(last_known[0].stake.as_ref().unwrap().amount, 10.0);
    }
}
