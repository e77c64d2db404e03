//! # Validator Adapter Trait
//!
//! This module defines the core abstraction for reading one validator's state from one
//! blockchain ecosystem. Every ecosystem (Cosmos-SDK LCD, Solana JSON-RPC, Sui JSON-RPC,
//! Near view calls, Ethereum `eth_call`) implements [`ValidatorAdapter`] and returns the
//! same normalized [`ValidatorSnapshot`].
//!
//! ## Overview
//!
//! Adapters know one wire protocol and one response schema each. They never panic and
//! never abort sibling calls: transport and decoding failures come back as a tagged
//! [`AdapterError`] that the orchestrator records against the network id.
//!
//! ## Adding a New Ecosystem
//!
//! 1. Implement `ValidatorAdapter` for your protocol under `src/adapters/`
//! 2. Add an endpoint entry in `endpoints.rs` if the protocol needs one
//! 3. Register the adapter for its ecosystem (or a single network) in `StrategyRegistry`
//!
//! ## Example
//!
//! ```rust,no_run
//! use validator_revenue_sdk::validator_adapter::ValidatorAdapter;
//! use validator_revenue_sdk::registry::NetworkRegistryEntry;
//! use validator_revenue_sdk::types::snapshot::{TokenAmount, ValidatorSnapshot};
//! use validator_revenue_sdk::error::AdapterError;
//! use async_trait::async_trait;
//! use ethers::types::U256;
//!
//! struct FixedStake;
//!
//! #[async_trait]
//! impl ValidatorAdapter for FixedStake {
//!     fn name(&self) -> &'static str {
//!         "Fixed"
//!     }
//!
//!     async fn fetch_snapshot(
//!         &self,
//!         entry: &NetworkRegistryEntry,
//!     ) -> Result<ValidatorSnapshot, AdapterError> {
//!         Ok(ValidatorSnapshot::new(&entry.id, TokenAmount::new(U256::from(1_000_000u64), 6)))
//!     }
//! }
//! ```

use crate::error::AdapterError;
use crate::registry::NetworkRegistryEntry;
use crate::types::snapshot::ValidatorSnapshot;
use async_trait::async_trait;
use ethers::types::U256;

/// The main trait for all ecosystem adapters.
///
/// # Thread Safety
///
/// All adapters must be `Send + Sync`: the orchestrator shares them behind `Arc` and calls
/// them concurrently for every network of the same ecosystem.
#[async_trait]
pub trait ValidatorAdapter: Send + Sync {
    /// Returns the name of the ecosystem protocol, used for logging and metrics.
    fn name(&self) -> &'static str;

    /// Fetches a fresh snapshot of the validator described by `entry`.
    ///
    /// # Errors
    ///
    /// - `Misconfigured` when the entry has no address or no endpoint is known
    /// - `NotFound` when the validator is absent from an otherwise valid response
    /// - `NetworkUnavailable`, `MalformedResponse`, `MalformedAmount` for upstream failures
    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError>;
}

/// Registry address of `entry`, or `Misconfigured`.
pub fn require_address(entry: &NetworkRegistryEntry) -> Result<&str, AdapterError> {
    entry
        .address
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AdapterError::Misconfigured(format!("no validator address for {}", entry.id)))
}

/// 1-based position of `stakes[target]` when sorted by stake, largest first.
///
/// The sort is stable, so equal stakes keep their original relative order.
/// Returns `None` when `target` is out of bounds.
pub fn rank_by_stake(stakes: &[U256], target: usize) -> Option<u32> {
    if target >= stakes.len() {
        return None;
    }
    let mut order: Vec<usize> = (0..stakes.len()).collect();
    order.sort_by(|a, b| stakes[*b].cmp(&stakes[*a]));
    order
        .iter()
        .position(|&i| i == target)
        .map(|pos| (pos + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stakes(values: &[u64]) -> Vec<U256> {
        values.iter().map(|v| U256::from(*v)).collect()
    }

    #[test]
    fn test_rank_ties_keep_original_order() {
        let s = stakes(&[500, 300, 800, 300]);
        assert_eq!(rank_by_stake(&s, 1), Some(3));
        assert_eq!(rank_by_stake(&s, 3), Some(4));
        assert_eq!(rank_by_stake(&s, 2), Some(1));
    }

    #[test]
    fn test_rank_out_of_bounds() {
        assert_eq!(rank_by_stake(&stakes(&[1, 2]), 2), None);
        assert_eq!(rank_by_stake(&[], 0), None);
    }

    #[test]
    fn test_rank_uses_full_u256_range() {
        let big = U256::from_dec_str("1000000000000000000000000000000").unwrap();
        let s = vec![U256::from(u64::MAX), big];
        assert_eq!(rank_by_stake(&s, 1), Some(1));
    }
}
