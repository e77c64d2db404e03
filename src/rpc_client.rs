// src/rpc_client.rs
//
// Thin HTTP transport shared by all adapters: REST GETs and JSON-RPC 2.0 POSTs, with HTTP
// status and decode failures mapped onto the adapter error taxonomy.

use crate::error::AdapterError;
use log::debug;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

static NEXT_RPC_ID: AtomicU64 = AtomicU64::new(1);

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET url?query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AdapterError> {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query);
        self.send_json(request).await
    }

    /// Sends a prepared request, mapping the status code before decoding.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AdapterError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        if !status.is_success() {
            return Err(status_to_error(status, url.as_str()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AdapterError::MalformedResponse(format!("{}: {}", url, e)))
    }

    /// JSON-RPC 2.0 call. An `error` member is reported as `NetworkUnavailable`,
    /// a missing `result` as `MalformedResponse`.
    pub async fn rpc_call<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        params: Value,
    ) -> Result<T, AdapterError> {
        let id = NEXT_RPC_ID.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let request = self.client.post(url).json(&body);
        let envelope: RpcEnvelope = self.send_json(request).await?;

        if let Some(err) = envelope.error {
            return Err(AdapterError::NetworkUnavailable(format!(
                "{} returned rpc error {}: {}",
                method, err.code, err.message
            )));
        }
        let result = envelope
            .result
            .filter(|v| !v.is_null())
            .ok_or_else(|| AdapterError::MalformedResponse(format!("{} returned no result", method)))?;
        serde_json::from_value(result)
            .map_err(|e| AdapterError::MalformedResponse(format!("{}: {}", method, e)))
    }

    /// Tries each URL in order and returns the first success, or the last error.
    pub async fn rpc_call_any<T: DeserializeOwned>(
        &self,
        urls: &[String],
        method: &str,
        params: Value,
    ) -> Result<T, AdapterError> {
        let mut last_err =
            AdapterError::Misconfigured(format!("no RPC endpoints configured for {}", method));
        for url in urls {
            match self.rpc_call(url, method, params.clone()).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    debug!("{} via {} failed: {}", method, url, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

fn status_to_error(status: StatusCode, url: &str) -> AdapterError {
    match status {
        StatusCode::NOT_FOUND => AdapterError::NotFound(format!("{} returned 404", url)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AdapterError::Unauthorized(format!("{} returned {}", url, status))
        }
        StatusCode::TOO_MANY_REQUESTS => AdapterError::RateLimited(format!("{} returned 429", url)),
        other => AdapterError::NetworkUnavailable(format!("{} returned HTTP {}", url, other)),
    }
}
