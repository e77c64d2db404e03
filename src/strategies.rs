// Maps each registry entry to the adapter that reads it and the revenue formula that prices
// it. Per-network overrides take precedence over the ecosystem default.

use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::{Ecosystem, NetworkRegistryEntry};
use crate::revenue::RevenueStrategy;
use crate::validator_adapter::ValidatorAdapter;

#[derive(Clone)]
pub struct NetworkStrategy {
    pub adapter: Arc<dyn ValidatorAdapter>,
    pub revenue: Arc<dyn RevenueStrategy>,
}

impl NetworkStrategy {
    pub fn new(adapter: Arc<dyn ValidatorAdapter>, revenue: Arc<dyn RevenueStrategy>) -> Self {
        Self { adapter, revenue }
    }
}

#[derive(Clone, Default)]
pub struct StrategyRegistry {
    by_ecosystem: HashMap<Ecosystem, NetworkStrategy>,
    by_network: HashMap<String, NetworkStrategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ecosystem(mut self, ecosystem: Ecosystem, strategy: NetworkStrategy) -> Self {
        self.by_ecosystem.insert(ecosystem, strategy);
        self
    }

    pub fn with_network(mut self, network_id: impl Into<String>, strategy: NetworkStrategy) -> Self {
        self.by_network.insert(network_id.into(), strategy);
        self
    }

    pub fn resolve(&self, entry: &NetworkRegistryEntry) -> Option<&NetworkStrategy> {
        self.by_network
            .get(&entry.id)
            .or_else(|| self.by_ecosystem.get(&entry.ecosystem))
    }
}
