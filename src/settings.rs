use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::endpoints::EndpointOverride;

#[derive(Debug, Deserialize, Clone)]
pub struct Http {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Upper bound for a whole adapter call, retries and fallbacks included
    #[serde(default = "default_adapter_timeout_seconds")]
    pub adapter_timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    8
}
fn default_adapter_timeout_seconds() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("validator-dashboard/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            adapter_timeout_seconds: default_adapter_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Prices {
    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// `x-cg-demo-api-key` for the public tier, `x-cg-pro-api-key` for pro
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
}

fn default_coingecko_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}
fn default_api_key_header() -> String {
    "x-cg-demo-api-key".to_string()
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            coingecko_url: default_coingecko_url(),
            api_key: None,
            api_key_header: default_api_key_header(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Chainlink {
    #[serde(default = "default_link_token")]
    pub link_token: String,
    #[serde(default = "default_etherscan_url")]
    pub etherscan_url: String,
    #[serde(default)]
    pub etherscan_api_key: Option<String>,
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,
}

fn default_link_token() -> String {
    "0x514910771AF9Ca656af840dff83E8264EcF986CA".to_string()
}
fn default_etherscan_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}
fn default_history_page_size() -> u32 {
    1000
}

impl Default for Chainlink {
    fn default() -> Self {
        Self {
            link_token: default_link_token(),
            etherscan_url: default_etherscan_url(),
            etherscan_api_key: None,
            history_page_size: default_history_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NeutronRevenue {
    /// Monthly USD quota used when the chain does not report one
    #[serde(default = "default_quota_usd")]
    pub default_quota_usd: f64,
}

fn default_quota_usd() -> f64 {
    3000.0
}

impl Default for NeutronRevenue {
    fn default() -> Self {
        Self { default_quota_usd: default_quota_usd() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Cache {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    300
}

impl Default for Cache {
    fn default() -> Self {
        Self { ttl_seconds: default_ttl_seconds() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default)]
    pub chainlink: Chainlink,
    #[serde(default)]
    pub neutron_revenue: NeutronRevenue,
    #[serde(default)]
    pub cache: Cache,
    /// Per-network replacements for the built-in endpoint table
    #[serde(default)]
    pub endpoint_overrides: HashMap<String, EndpointOverride>,
    /// JSON registry file; the built-in registry is used when unset
    #[serde(default)]
    pub registry_path: Option<String>,
}

impl Settings {
    /// Loads `Config.toml` from the working directory when present, then applies
    /// environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("Config.toml")
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env("ETHERSCAN_API_KEY").or_else(|| non_empty_env("NEXT_PUBLIC_ETHERSCAN_API_KEY")) {
            self.chainlink.etherscan_api_key = Some(key);
        }
        if let Some(key) = non_empty_env("COINGECKO_API_KEY") {
            self.prices.api_key = Some(key);
        }
        if let Some(path) = non_empty_env("DASHBOARD_REGISTRY_PATH") {
            self.registry_path = Some(path);
        }

        // Ethereum RPC list for the LINK balance lookup, JSON array or comma separated
        if let Some(raw) = non_empty_env("DASHBOARD_ETH_RPC_URLS") {
            if let Some(list) = parse_string_list(&raw) {
                if !list.is_empty() {
                    self.endpoint_overrides.entry("chainlink".to_string()).or_default().rpc = Some(list);
                }
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_string_list(input: &str) -> Option<Vec<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(vec![]);
    }

    if trimmed.starts_with('[') {
        if let Ok(v) = serde_json::from_str::<Vec<String>>(trimmed) {
            return Some(v);
        }
        // unquoted list such as [https://a,https://b]
        let without_brackets = trimmed.trim_start_matches('[').trim_end_matches(']');
        return Some(split_list(without_brackets));
    }

    Some(split_list(trimmed))
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
