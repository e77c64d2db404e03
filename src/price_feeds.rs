// src/price_feeds.rs

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::error::AdapterError;
use crate::rpc_client::HttpClient;
use crate::types::snapshot::PriceQuote;

/// Source of USD quotes keyed by price id.
///
/// Ids the source cannot price are absent from the map, never present with a zero.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, PriceQuote>, AdapterError>;
}

// CoinGecko /simple/price returns a map of id -> { "usd": .., "usd_24h_change": .., .. }
type SimplePriceResponse = HashMap<String, CoinGeckoTokenPrice>;

#[derive(Debug, Deserialize)]
struct CoinGeckoTokenPrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_market_cap: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    api_key_header: String,
}

impl CoinGeckoClient {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        api_key: Option<String>,
        api_key_header: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_header: api_key_header.into(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_prices(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, PriceQuote>, AdapterError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids_param = ids.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        let url = format!("{}/simple/price", self.base_url);

        let mut request = self
            .http
            .inner()
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("ids", ids_param.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_market_cap", "true"),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header(self.api_key_header.as_str(), key.as_str());
        }

        let data: SimplePriceResponse = self.http.send_json(request).await.map_err(|e| {
            if let AdapterError::RateLimited(_) = e {
                warn!("⚠️ CoinGecko rate limit reached");
            }
            e
        })?;

        let mut prices = HashMap::with_capacity(data.len());
        for (id, price) in data {
            match price.usd {
                Some(usd) if usd.is_finite() && usd >= 0.0 => {
                    prices.insert(
                        id.clone(),
                        PriceQuote {
                            id,
                            usd,
                            usd_24h_change: price.usd_24h_change.filter(|v| v.is_finite()),
                            usd_market_cap: price.usd_market_cap.filter(|v| v.is_finite()),
                        },
                    );
                }
                other => debug!("CoinGecko: no usable price for {} ({:?})", id, other),
            }
        }
        debug!("CoinGecko: {} of {} ids priced", prices.len(), ids.len());
        Ok(prices)
    }
}

/// Fixed quotes, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticPrices {
    quotes: HashMap<String, f64>,
}

impl StaticPrices {
    pub fn new<I, S>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            quotes: quotes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait]
impl PriceSource for StaticPrices {
    async fn fetch_prices(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, PriceQuote>, AdapterError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.quotes.get(id).map(|usd| {
                    (
                        id.clone(),
                        PriceQuote { id: id.clone(), usd: *usd, usd_24h_change: None, usd_market_cap: None },
                    )
                })
            })
            .collect())
    }
}
