//! # Network Registry
//!
//! Static list of the validators this SDK reports on. The registry is the source of
//! truth for which networks exist; live data is only ever overlaid on copies of its
//! entries, never written back.
//!
//! The built-in table can be replaced with a JSON file (see `Settings::registry_path`).

use crate::error::RegistryError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    Cosmos,
    Solana,
    Sui,
    Near,
    Ethereum,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    Active,
    ComingSoon,
    Inactive,
}

/// Expected staking APR range, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AprRange {
    pub min: f64,
    pub max: f64,
}

impl AprRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A single live value reported by the chain (min == max).
    pub fn point(value: f64) -> Self {
        Self { min: value, max: value }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// One validator we operate, as known before any network call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRegistryEntry {
    pub id: String,
    pub name: String,
    pub token: String,
    pub ecosystem: Ecosystem,
    pub apr: Option<AprRange>,
    /// Validator operator address, vote account, pool id or node operator address
    #[serde(default)]
    pub address: Option<String>,
    pub status: NetworkStatus,
    /// CoinGecko id used for price lookup
    #[serde(default)]
    pub price_id: Option<String>,
}

impl NetworkRegistryEntry {
    pub fn is_active(&self) -> bool {
        self.status == NetworkStatus::Active
    }
}

/// Validated, ordered list of registry entries.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    entries: Vec<NetworkRegistryEntry>,
}

impl NetworkRegistry {
    pub fn new(entries: Vec<NetworkRegistryEntry>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(RegistryError::DuplicateId(entry.id.clone()));
            }
            if let Some(apr) = entry.apr {
                if apr.min > apr.max || !apr.min.is_finite() || !apr.max.is_finite() {
                    return Err(RegistryError::InvalidApr {
                        id: entry.id.clone(),
                        min: apr.min,
                        max: apr.max,
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    /// The registry compiled into the SDK.
    pub fn builtin() -> Self {
        Self { entries: BUILTIN_NETWORKS.clone() }
    }

    /// Loads a registry from a JSON array of entries.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: display.clone(),
            source,
        })?;
        let entries: Vec<NetworkRegistryEntry> =
            serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
                path: display,
                source,
            })?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[NetworkRegistryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&NetworkRegistryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry(
    id: &str,
    name: &str,
    token: &str,
    ecosystem: Ecosystem,
    apr: Option<(f64, f64)>,
    address: Option<&str>,
    status: NetworkStatus,
    price_id: Option<&str>,
) -> NetworkRegistryEntry {
    NetworkRegistryEntry {
        id: id.to_string(),
        name: name.to_string(),
        token: token.to_string(),
        ecosystem,
        apr: apr.map(|(min, max)| AprRange::new(min, max)),
        address: address.map(str::to_string),
        status,
        price_id: price_id.map(str::to_string),
    }
}

static BUILTIN_NETWORKS: Lazy<Vec<NetworkRegistryEntry>> = Lazy::new(|| {
    use Ecosystem::*;
    use NetworkStatus::*;

    vec![
        entry("cosmos", "Cosmos Hub", "ATOM", Cosmos, Some((15.0, 20.0)),
            Some("cosmosvaloper17mggn4znyeyg25wd7498qxl7r2jhgue8u4qjcq"), Active, Some("cosmos")),
        entry("osmosis", "Osmosis", "OSMO", Cosmos, Some((2.0, 4.0)),
            Some("osmovaloper17mggn4znyeyg25wd7498qxl7r2jhgue8td054x"), Active, Some("osmosis")),
        entry("celestia", "Celestia", "TIA", Cosmos, Some((9.0, 11.0)),
            Some("celestiavaloper1murrqgqahxevedty0nzqrn5hj434fvffxufxcl"), Active, Some("celestia")),
        entry("babylon", "Babylon", "BBN", Cosmos, Some((6.0, 9.0)),
            Some("bbnvaloper1fyfnvvswqjmg2xlpx2grldmlnuzqj6zj2hc8hd"), Active, Some("babylon")),
        entry("terra", "Terra", "LUNA", Cosmos, Some((6.0, 8.0)),
            Some("terravaloper1wdymftapg5pcvf2aqw4pd0yuuh5w9m6yqdnukv"), Active, Some("terra-luna-2")),
        entry("union", "Union", "U", Cosmos, Some((10.0, 15.0)),
            Some("unionvaloper1dqsjs63kpahlkfj3x5f9kuryk78uekqdv9z72k"), Active, Some("union-2")),
        entry("neutron", "Neutron", "NTRN", Cosmos, None,
            Some("neutronvaloper1rlyy2ltkc9t9s8gp2tmqxk6guggf6h9g6xj26y"), Active, Some("neutron-3")),
        entry("xpla", "XPLA", "XPLA", Cosmos, Some((8.0, 12.0)),
            Some("xplavaloper1a00g26m9ut98xspcmlz0fmtknfeqmmne3jdr99"), Active, Some("xpla")),
        entry("agoric", "Agoric", "BLD", Cosmos, Some((10.0, 14.0)),
            Some("agoricvaloper148xd583ya4pjs3g7wj2h2eatsy294azk452k6v"), Active, Some("agoric")),
        entry("zetachain", "ZetaChain", "ZETA", Cosmos, Some((8.0, 11.0)),
            Some("zetavaloper1svnup50643mzhcda98fm20r2cvafpllcnuaefx"), Active, Some("zetachain")),
        entry("dymension", "Dymension", "DYM", Cosmos, Some((4.0, 7.0)),
            Some("dymvaloper1ycsjsqqucdyvl2560y7y2yhfjaj0vvta4v7hm3"), Active, Some("dymension")),
        entry("nolus", "Nolus", "NLS", Cosmos, Some((15.0, 25.0)),
            Some("nolusvaloper1vph2mzpcx8a366strk30cg60nznrwy762eteks"), Active, Some("nolus")),
        entry("seda", "SEDA", "SEDA", Cosmos, Some((10.0, 14.0)),
            Some("sedavaloper1rzhv790ftxg3u5zsevuz8efqq37dq5gaqtktm3"), Active, Some("seda-2")),
        entry("persistence", "Persistence", "XPRT", Cosmos, Some((12.0, 16.0)),
            Some("persistencevaloper1etueaqe9teaamq40pln9xrncwgfns8mtdfr02c"), Active, Some("persistence")),
        entry("lava", "Lava", "LAVA", Cosmos, Some((10.0, 20.0)),
            Some("lava@valoper1askl4xtuwgt9ngll0unjp975fgk954y2fjpdc2"), Active, Some("lava-network")),
        entry("nibiru", "Nibiru", "NIBI", Cosmos, Some((8.0, 12.0)),
            Some("nibivaloper1w26kzhwhely77xup3npfh70tzuc4amtx8j0743"), Active, Some("nibiru")),
        entry("quicksilver", "Quicksilver", "QCK", Cosmos, Some((5.0, 9.0)),
            Some("quickvaloper1dqnwnf3rj8xwd82qra0v5zzkxd9szawy30k6fn"), Active, Some("quicksilver")),
        entry("sentinel", "Sentinel", "DVPN", Cosmos, Some((15.0, 25.0)),
            Some("sentvaloper1gcx3cq450dgmyha7s3x5mhjqcnxxn40tqykq20"), Active, Some("sentinel")),
        entry("haqq", "HAQQ", "ISLM", Cosmos, Some((4.0, 6.0)),
            Some("haqqvaloper1dr24vnl8veae8998c78vth6qrrmtnhle49vjqg"), Active, Some("islamic-coin")),
        entry("solana", "Solana", "SOL", Solana, Some((6.5, 7.5)),
            Some("BH7asDZbKkTmT3UWiNfmMVRgQEEpXoVThGPmQfgWwDhg"), Active, Some("solana")),
        entry("sui", "Sui", "SUI", Sui, Some((2.5, 3.5)),
            Some("0x876e2ad4ba0375c7752d24ca47c69e7096e6dbfd82a215612a08f47cffebcfbc"), Active, Some("sui")),
        entry("near", "NEAR Protocol", "NEAR", Near, Some((8.0, 10.0)),
            Some("01node.poolv1.near"), Active, Some("near")),
        entry("skale", "SKALE", "SKL", Other, Some((6.0, 8.0)),
            Some("10,43"), Active, Some("skale")),
        entry("chainlink", "Chainlink", "LINK", Ethereum, None,
            Some("0x7A30E4B6307c0Db7AeF247A656b44d888B23a2DC"), Active, Some("chainlink")),
        entry("monad", "Monad", "MON", Other, None, None, ComingSoon, None),
        entry("juno", "Juno", "JUNO", Cosmos, Some((10.0, 14.0)), None, Inactive, Some("juno-network")),
    ]
});
