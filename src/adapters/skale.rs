// SKALE delegations live behind proxy contracts that need bespoke handling, so this adapter
// serves published reference figures instead of a live read. Snapshots are marked
// `DataQuality::Reference` so nothing downstream mistakes them for live data.

use async_trait::async_trait;
use ethers::types::U256;
use log::debug;
use std::sync::Arc;

use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::registry::NetworkRegistryEntry;
use crate::types::snapshot::{DataQuality, TokenAmount, ValidatorSnapshot};
use crate::validator_adapter::{require_address, ValidatorAdapter};

/// (validator id, delegated SKL)
const REFERENCE_DELEGATIONS: &[(u32, u64)] = &[(10, 168_000_000), (43, 45_000_000)];

pub struct SkaleAdapter {
    endpoints: Arc<EndpointRegistry>,
}

impl SkaleAdapter {
    pub fn new(endpoints: Arc<EndpointRegistry>) -> Self {
        Self { endpoints }
    }
}

/// Parses the registry address, a comma-separated list of validator ids ("10,43").
fn parse_validator_ids(raw: &str) -> Result<Vec<u32>, AdapterError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| AdapterError::Misconfigured(format!("invalid SKALE validator id {:?}", s)))
        })
        .collect()
}

#[async_trait]
impl ValidatorAdapter for SkaleAdapter {
    fn name(&self) -> &'static str {
        "Skale"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let ids = parse_validator_ids(require_address(entry)?)?;
        let decimals = self.endpoints.get(&entry.id).map(|e| e.decimals).unwrap_or(18);
        let unit = U256::exp10(decimals as usize);

        let mut total = U256::zero();
        for id in ids {
            let tokens = REFERENCE_DELEGATIONS
                .iter()
                .find(|(vid, _)| *vid == id)
                .map(|(_, tokens)| *tokens)
                .ok_or_else(|| AdapterError::NotFound(format!("no reference data for SKALE validator {}", id)))?;
            debug!("SKALE validator {}: {} SKL (reference)", id, tokens);
            total += U256::from(tokens) * unit;
        }

        let mut snapshot = ValidatorSnapshot::new(&entry.id, TokenAmount::new(total, decimals));
        snapshot.quality = DataQuality::Reference;
        Ok(snapshot)
    }
}
