//! # Validator Revenue SDK
//!
//! A Rust library for read-only aggregation of validator stake, commission, rank and
//! revenue across Cosmos-SDK chains, Solana, Sui, Near, Skale and a Chainlink node operator,
//! priced in USD through CoinGecko.
//!
//! ## Overview
//!
//! The SDK separates data acquisition (one adapter per ecosystem API family) from the pure
//! merge that produces the dashboard model. It focuses on:
//!
//! - **Acquisition**: Concurrent, time-bounded reads from every ecosystem
//! - **Normalization**: Decimal-safe conversion of raw on-chain amounts
//! - **Merge**: Enriched network records and summary metrics, with unknown values kept unknown
//! - **Caching**: Time-windowed results with freshness signals and last-known fallbacks
//!
//! ## Architecture
//!
//! ### Registry Layer
//! Static list of validators (`registry`) and where each network's API lives (`endpoints`).
//!
//! ### Adapter Layer
//! `ValidatorAdapter` implementations under `adapters`, plus the CoinGecko price source.
//!
//! ### Aggregation Layer
//! The `Aggregator` fans out to adapters, joins, and merges through revenue strategies
//! resolved by the `StrategyRegistry`.
//!
//! ### Facade
//! `Dashboard` wires everything from `Settings` and serves cached views.

// Core Types
/// Snapshot, price and enriched network types
pub mod types;
/// Error taxonomy
pub mod error;
/// Static validator registry
pub mod registry;
/// Per-network connection table
pub mod endpoints;

// Adapter Layer
/// Trait for ecosystem-specific adapters
pub mod validator_adapter;
/// Ecosystem adapters (Cosmos, Neutron, Solana, Sui, Near, Skale, Chainlink)
pub mod adapters;
/// HTTP and JSON-RPC transport
pub mod rpc_client;
/// USD price sources
pub mod price_feeds;
/// Decimal-safe amount conversion
pub mod normalization;

// Aggregation Layer
/// Revenue estimation formulas
pub mod revenue;
/// Ecosystem/network to adapter and revenue strategy mapping
pub mod strategies;
/// Pure merge and metrics derivation
pub mod merge;
/// Aggregation cycle
pub mod orchestrator;
/// Result cache with freshness signals
pub mod cache;
/// Consumer facade
pub mod dashboard;

// Infrastructure
/// Metrics and observability
pub mod metrics;
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use dashboard::{Dashboard, DashboardView};
pub use orchestrator::Aggregator;
pub use registry::{NetworkRegistry, NetworkRegistryEntry};
pub use settings::Settings;
pub use validator_adapter::ValidatorAdapter;
