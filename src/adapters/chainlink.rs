//! Chainlink node operator: LINK balance and payment history.
//!
//! Works in two capability levels. Without an Etherscan key only the current LINK balance
//! is available, read through a public Ethereum RPC `eth_call` to `balanceOf`. With a key,
//! transfer history is pulled from the Etherscan v2 API and summarized into payment
//! windows, and Etherscan's `tokenbalance` backs up the RPC balance read.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ethers::abi::{self, Token};
use ethers::types::{Address, U256};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::endpoints::EndpointRegistry;
use crate::error::AdapterError;
use crate::normalization::{to_decimal, u256_to_f64};
use crate::registry::NetworkRegistryEntry;
use crate::rpc_client::HttpClient;
use crate::types::conversions::{address_to_string, parse_dec_u256, parse_hex_u256, string_to_address};
use crate::types::snapshot::{DataQuality, TokenAmount, ValidatorSnapshot};
use crate::validator_adapter::{require_address, ValidatorAdapter};

/// `balanceOf(address)`
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
const LINK_DECIMALS: u8 = 18;
const ETHEREUM_CHAIN_ID: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Balance and transfer history
    Full,
    /// No API key: balance only
    BalanceOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainlinkPayment {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    /// LINK
    pub amount: f64,
    pub amount_usd: Option<f64>,
    pub from: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferHistory {
    pub total_received: f64,
    pub total_sent: f64,
    pub net_balance: f64,
    pub last_7_days: f64,
    pub last_30_days: f64,
    pub last_90_days: f64,
    pub payments: Vec<ChainlinkPayment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainlinkStats {
    pub capability: Capability,
    pub history_available: bool,
    pub current_balance: f64,
    pub current_balance_usd: Option<f64>,
    #[serde(flatten)]
    pub history: TransferHistory,
}

/// One row of Etherscan's `tokentx` action.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTransfer {
    pub hash: String,
    pub time_stamp: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub token_decimal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Clone)]
pub struct ChainlinkConfig {
    pub link_token: Address,
    pub etherscan_url: String,
    pub api_key: Option<String>,
    pub history_page_size: u32,
}

pub struct ChainlinkAdapter {
    http: HttpClient,
    endpoints: Arc<EndpointRegistry>,
    config: ChainlinkConfig,
}

impl ChainlinkAdapter {
    pub fn new(http: HttpClient, endpoints: Arc<EndpointRegistry>, config: ChainlinkConfig) -> Self {
        let config = ChainlinkConfig {
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
            ..config
        };
        Self { http, endpoints, config }
    }

    pub fn capability(&self) -> Capability {
        if self.config.api_key.is_some() {
            Capability::Full
        } else {
            Capability::BalanceOnly
        }
    }

    fn operator(entry: &NetworkRegistryEntry) -> Result<Address, AdapterError> {
        let raw = require_address(entry)?;
        string_to_address(raw)
            .map_err(|e| AdapterError::Misconfigured(format!("{} operator address: {}", entry.id, e)))
    }

    async fn balance_via_rpc(&self, url: &str, operator: Address) -> Result<U256, AdapterError> {
        let mut data = BALANCE_OF_SELECTOR.to_vec();
        data.extend(abi::encode(&[Token::Address(operator)]));
        let call = json!([
            {
                "to": address_to_string(self.config.link_token),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);
        let raw: String = self.http.rpc_call(url, "eth_call", call).await?;
        Ok(parse_hex_u256(&raw)?)
    }

    /// Etherscan v2 call scoped to LINK and `operator`. Returns the `result` member.
    async fn etherscan(
        &self,
        key: &str,
        action: &str,
        operator: Address,
        extra: &[(&str, &str)],
    ) -> Result<Value, AdapterError> {
        let contract = address_to_string(self.config.link_token);
        let address = address_to_string(operator);
        let mut query: Vec<(&str, &str)> = vec![
            ("chainid", ETHEREUM_CHAIN_ID),
            ("module", "account"),
            ("action", action),
            ("contractaddress", contract.as_str()),
            ("address", address.as_str()),
        ];
        query.extend_from_slice(extra);
        query.push(("apikey", key));

        let response: EtherscanResponse = self.http.get_json(&self.config.etherscan_url, &query).await?;
        if response.status == "1" {
            return Ok(response.result);
        }

        let detail = response.result.as_str().unwrap_or_default().to_string();
        let lowered = detail.to_lowercase();
        if lowered.contains("api key") {
            Err(AdapterError::Unauthorized(format!("etherscan {}: {}", action, detail)))
        } else if lowered.contains("rate limit") {
            Err(AdapterError::RateLimited(format!("etherscan {}: {}", action, detail)))
        } else if response.message.starts_with("No transactions found") {
            Ok(Value::Array(Vec::new()))
        } else {
            Err(AdapterError::NetworkUnavailable(format!(
                "etherscan {}: {} {}",
                action, response.message, detail
            )))
        }
    }

    /// LINK balance in wei: public RPCs in order, then Etherscan when a key is configured.
    pub async fn fetch_balance(&self, network_id: &str, operator: Address) -> Result<U256, AdapterError> {
        let urls = self
            .endpoints
            .get(network_id)
            .map(|e| e.rpc.clone())
            .unwrap_or_default();

        let mut last_err = AdapterError::Misconfigured(format!("no Ethereum RPC for {}", network_id));
        for url in &urls {
            match self.balance_via_rpc(url, operator).await {
                Ok(balance) => return Ok(balance),
                Err(e) => {
                    debug!("LINK balanceOf via {} failed: {}", url, e);
                    last_err = e;
                }
            }
        }

        if let Some(key) = &self.config.api_key {
            warn!("⚠️ {}: all Ethereum RPCs failed, falling back to Etherscan", network_id);
            let result = self.etherscan(key, "tokenbalance", operator, &[("tag", "latest")]).await?;
            let raw = result
                .as_str()
                .ok_or_else(|| AdapterError::MalformedResponse("tokenbalance result is not a string".into()))?;
            return Ok(parse_dec_u256(raw)?);
        }
        Err(last_err)
    }

    pub async fn fetch_transfers(&self, key: &str, operator: Address) -> Result<Vec<LinkTransfer>, AdapterError> {
        let page_size = self.config.history_page_size.to_string();
        let result = self
            .etherscan(
                key,
                "tokentx",
                operator,
                &[
                    ("startblock", "0"),
                    ("endblock", "99999999"),
                    ("page", "1"),
                    ("offset", page_size.as_str()),
                    ("sort", "desc"),
                ],
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| AdapterError::MalformedResponse(format!("tokentx result: {}", e)))
    }

    /// Balance plus, when a key is configured, payment history summarized at `Utc::now()`.
    pub async fn fetch_operator_stats(
        &self,
        entry: &NetworkRegistryEntry,
        link_price: Option<f64>,
    ) -> Result<ChainlinkStats, AdapterError> {
        let operator = Self::operator(entry)?;
        let history = async {
            match &self.config.api_key {
                Some(key) => self.fetch_transfers(key, operator).await.map(Some),
                None => Ok(None),
            }
        };
        let (balance, transfers) = tokio::join!(self.fetch_balance(&entry.id, operator), history);
        let balance = u256_to_f64(balance?, LINK_DECIMALS);
        let transfers = transfers?;

        let history_available = transfers.is_some();
        let history = transfers
            .map(|t| process_transfers(&t, operator, link_price, Utc::now()))
            .unwrap_or_default();

        Ok(ChainlinkStats {
            capability: self.capability(),
            history_available,
            current_balance: balance,
            current_balance_usd: link_price.map(|p| balance * p),
            history,
        })
    }
}

/// Summarizes transfers into totals and trailing 7/30/90-day incoming windows ending at `now`.
///
/// Rows with an unparsable value or timestamp are skipped.
pub fn process_transfers(
    transfers: &[LinkTransfer],
    operator: Address,
    link_price: Option<f64>,
    now: DateTime<Utc>,
) -> TransferHistory {
    let day7 = now - Duration::days(7);
    let day30 = now - Duration::days(30);
    let day90 = now - Duration::days(90);
    let operator = address_to_string(operator);

    let mut history = TransferHistory::default();
    for tx in transfers {
        let decimals = tx
            .token_decimal
            .as_deref()
            .and_then(|d| d.parse::<u8>().ok())
            .unwrap_or(LINK_DECIMALS);
        let amount = match to_decimal(&tx.value, decimals) {
            Ok(a) => a,
            Err(e) => {
                debug!("skipping transfer {}: {}", tx.hash, e);
                continue;
            }
        };
        let timestamp = match tx
            .time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        {
            Some(ts) => ts,
            None => {
                debug!("skipping transfer {}: bad timestamp {:?}", tx.hash, tx.time_stamp);
                continue;
            }
        };

        let direction = if tx.to.to_lowercase() == operator {
            history.total_received += amount;
            if timestamp >= day7 {
                history.last_7_days += amount;
            }
            if timestamp >= day30 {
                history.last_30_days += amount;
            }
            if timestamp >= day90 {
                history.last_90_days += amount;
            }
            Direction::In
        } else {
            history.total_sent += amount;
            Direction::Out
        };

        history.payments.push(ChainlinkPayment {
            hash: tx.hash.clone(),
            timestamp,
            amount,
            amount_usd: link_price.map(|p| amount * p),
            from: tx.from.clone(),
            direction,
        });
    }
    history.net_balance = history.total_received - history.total_sent;
    history
}

#[async_trait]
impl ValidatorAdapter for ChainlinkAdapter {
    fn name(&self) -> &'static str {
        "Chainlink"
    }

    async fn fetch_snapshot(
        &self,
        entry: &NetworkRegistryEntry,
    ) -> Result<ValidatorSnapshot, AdapterError> {
        let operator = Self::operator(entry)?;
        let balance = self.fetch_balance(&entry.id, operator).await?;

        // a node operator wallet holds earnings, not delegated stake
        let mut snapshot = ValidatorSnapshot::without_stake(&entry.id);
        snapshot.wallet_balance = Some(TokenAmount::new(balance, LINK_DECIMALS));
        if self.capability() == Capability::BalanceOnly {
            snapshot.quality = DataQuality::Degraded {
                reason: "no Etherscan API key configured; balance only".to_string(),
            };
        }
        Ok(snapshot)
    }
}
