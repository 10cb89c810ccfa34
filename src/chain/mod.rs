//! Chain-reading adapter (implementation of the [`crate::ports::chain::ChainClient`] port).
//!
//! [`AlloyChainClient`] wraps an `alloy` [`alloy::providers::Provider`] and
//! is the only place in the crate that speaks raw JSON-RPC.

mod alloy_client;

pub use alloy_client::AlloyChainClient;
