//! Static connection table: where each network's API lives and how many decimals its
//! staking token uses. Entries can be overridden from `Settings::endpoint_overrides`.

use crate::error::AdapterError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Cosmos LCD / REST base URL
    pub rest: Option<String>,
    /// JSON-RPC URLs in failover order
    pub rpc: Vec<String>,
    pub chain_id: Option<String>,
    pub decimals: u8,
}

impl EndpointConfig {
    fn cosmos(rest: &str, rpc: &str, chain_id: &str, decimals: u8) -> Self {
        Self {
            rest: Some(rest.to_string()),
            rpc: vec![rpc.to_string()],
            chain_id: Some(chain_id.to_string()),
            decimals,
        }
    }

    fn json_rpc(urls: &[&str], decimals: u8) -> Self {
        Self {
            rest: None,
            rpc: urls.iter().map(|u| u.to_string()).collect(),
            chain_id: None,
            decimals,
        }
    }

    /// REST base without a trailing slash, or `Misconfigured`.
    pub fn rest_base(&self, network: &str) -> Result<&str, AdapterError> {
        self.rest
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .ok_or_else(|| AdapterError::Misconfigured(format!("no REST endpoint for {network}")))
    }

    pub fn rpc_urls(&self, network: &str) -> Result<&[String], AdapterError> {
        if self.rpc.is_empty() {
            return Err(AdapterError::Misconfigured(format!("no RPC endpoint for {network}")));
        }
        Ok(&self.rpc)
    }
}

/// Partial replacement of an endpoint entry, as read from configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EndpointOverride {
    #[serde(default)]
    pub rest: Option<String>,
    #[serde(default)]
    pub rpc: Option<Vec<String>>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, EndpointConfig>,
}

impl EndpointRegistry {
    pub fn mainnet() -> Self {
        let mut endpoints = HashMap::new();
        let cosmos = [
            ("cosmos", "https://cosmoshub.api.kjnodes.com", "https://cosmoshub-rpc.publicnode.com", "cosmoshub-4", 6),
            ("osmosis", "https://lcd.osmosis.zone", "https://rpc.osmosis.zone", "osmosis-1", 6),
            ("celestia", "https://celestia-rest.publicnode.com", "https://celestia-rpc.publicnode.com", "celestia", 6),
            ("babylon", "https://babylon-api.polkachu.com", "https://babylon-rpc.polkachu.com", "bbn-1", 6),
            ("terra", "https://terra-api.polkachu.com", "https://terra-rpc.polkachu.com", "phoenix-1", 6),
            ("union", "https://union-api.polkachu.com", "https://union-rpc.polkachu.com", "union-1", 18),
            ("neutron", "https://rest-lb.neutron.org", "https://rpc-lb.neutron.org", "neutron-1", 6),
            ("xpla", "https://dimension-lcd.xpla.dev", "https://dimension-rpc.xpla.dev", "dimension_37-1", 18),
            ("agoric", "https://main.api.agoric.net", "https://main.rpc.agoric.net", "agoric-3", 6),
            ("zetachain", "https://zetachain-api.polkachu.com", "https://zetachain-rpc.polkachu.com", "zetachain_7000-1", 18),
            ("dymension", "https://dymension-rest.publicnode.com", "https://dymension-rpc.publicnode.com", "dymension_1100-1", 18),
            ("nolus", "https://nolus-api.polkachu.com", "https://nolus-rpc.polkachu.com", "pirin-1", 6),
            ("seda", "https://seda-api.polkachu.com", "https://seda-rpc.polkachu.com", "seda-1", 18),
            ("persistence", "https://rest.core.persistence.one", "https://rpc.core.persistence.one", "core-1", 6),
            ("lava", "https://lava-api.polkachu.com", "https://lava-rpc.polkachu.com", "lava-mainnet-1", 6),
            ("nibiru", "https://nibiru-api.polkachu.com", "https://nibiru-rpc.polkachu.com", "cataclysm-1", 6),
            ("quicksilver", "https://quicksilver-api.polkachu.com", "https://quicksilver-rpc.polkachu.com", "quicksilver-2", 6),
            ("sentinel", "https://sentinel-api.polkachu.com", "https://sentinel-rpc.polkachu.com", "sentinelhub-2", 6),
            ("haqq", "https://haqq-api.polkachu.com", "https://haqq-rpc.polkachu.com", "haqq_11235-1", 18),
        ];
        for (id, rest, rpc, chain_id, decimals) in cosmos {
            endpoints.insert(id.to_string(), EndpointConfig::cosmos(rest, rpc, chain_id, decimals));
        }

        endpoints.insert(
            "solana".to_string(),
            EndpointConfig::json_rpc(
                &[
                    "https://api.mainnet-beta.solana.com",
                    "https://solana-mainnet.g.alchemy.com/v2/demo",
                    "https://rpc.ankr.com/solana",
                ],
                9,
            ),
        );
        endpoints.insert(
            "sui".to_string(),
            EndpointConfig::json_rpc(
                &["https://fullnode.mainnet.sui.io:443", "https://sui-mainnet.nodeinfra.com"],
                9,
            ),
        );
        endpoints.insert(
            "near".to_string(),
            EndpointConfig::json_rpc(&["https://rpc.mainnet.near.org", "https://near.lava.build"], 24),
        );
        // reference data only, nothing to call
        endpoints.insert("skale".to_string(), EndpointConfig::json_rpc(&[], 18));
        endpoints.insert(
            "chainlink".to_string(),
            EndpointConfig::json_rpc(
                &[
                    "https://eth.llamarpc.com",
                    "https://ethereum.publicnode.com",
                    "https://rpc.ankr.com/eth",
                    "https://cloudflare-eth.com",
                ],
                18,
            ),
        );

        Self { endpoints }
    }

    /// Empty table, filled through [`EndpointRegistry::insert`]. Used by tests.
    pub fn empty() -> Self {
        Self { endpoints: HashMap::new() }
    }

    pub fn insert(&mut self, network: impl Into<String>, config: EndpointConfig) {
        self.endpoints.insert(network.into(), config);
    }

    /// Applies configured overrides on top of the current table. Unknown networks are added.
    pub fn with_overrides(mut self, overrides: &HashMap<String, EndpointOverride>) -> Self {
        for (network, o) in overrides {
            let entry = self.endpoints.entry(network.clone()).or_insert_with(|| EndpointConfig {
                rest: None,
                rpc: Vec::new(),
                chain_id: None,
                decimals: 6,
            });
            if let Some(rest) = &o.rest {
                entry.rest = Some(rest.clone());
            }
            if let Some(rpc) = &o.rpc {
                entry.rpc = rpc.clone();
            }
            if let Some(decimals) = o.decimals {
                entry.decimals = decimals;
            }
        }
        self
    }

    pub fn get(&self, network: &str) -> Result<&EndpointConfig, AdapterError> {
        self.endpoints
            .get(network)
            .ok_or_else(|| AdapterError::Misconfigured(format!("no endpoint entry for {network}")))
    }
}
