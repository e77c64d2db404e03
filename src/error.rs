//! Error taxonomy shared by every adapter.
//!
//! Adapter errors never escape an aggregation cycle: the orchestrator records them
//! against the network id and carries on. Only [`RegistryError`] is fatal.

use crate::types::conversions::ConversionError;
use serde::Serialize;

/// Failure of a single upstream call made on behalf of one network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Transport failure, timeout or non-2xx status
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    /// Address or pool absent from an otherwise valid response
    #[error("not found: {0}")]
    NotFound(String),
    /// Schema mismatch or unparsable numeric field
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Balance string that is not a non-negative integer
    #[error("malformed amount: {0}")]
    MalformedAmount(String),
    /// Key-gated source rejected the request or no key is configured
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Upstream asked us to slow down (HTTP 429)
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// No endpoint or address configured for the network
    #[error("misconfigured: {0}")]
    Misconfigured(String),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
            AdapterError::NotFound(_) => ErrorKind::NotFound,
            AdapterError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            AdapterError::MalformedAmount(_) => ErrorKind::MalformedAmount,
            AdapterError::Unauthorized(_) => ErrorKind::Unauthorized,
            AdapterError::RateLimited(_) => ErrorKind::RateLimited,
            AdapterError::Misconfigured(_) => ErrorKind::Misconfigured,
        }
    }
}

impl From<ConversionError> for AdapterError {
    fn from(e: ConversionError) -> Self {
        match e {
            ConversionError::MalformedAmount(raw) => AdapterError::MalformedAmount(raw),
            other => AdapterError::MalformedResponse(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AdapterError::MalformedResponse(e.to_string())
        } else {
            AdapterError::NetworkUnavailable(e.to_string())
        }
    }
}

/// Serializable tag of an [`AdapterError`], reported in aggregation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkUnavailable,
    NotFound,
    MalformedResponse,
    MalformedAmount,
    Unauthorized,
    RateLimited,
    Misconfigured,
}

impl ErrorKind {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkUnavailable => "network_unavailable",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::MalformedAmount => "malformed_amount",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Misconfigured => "misconfigured",
        }
    }
}

/// Failure to load or validate the static network registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse registry file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate network id in registry: {0}")]
    DuplicateId(String),
    #[error("invalid APR range for {id}: min {min} > max {max}")]
    InvalidApr { id: String, min: f64, max: f64 },
}
