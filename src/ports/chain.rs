//! Port for reading chain state: block headers and event logs.
//!
//! This is the seam between the scanner algorithms and Alloy. Tests drive
//! the scanner against an in-memory fake rather than a real RPC endpoint.

use alloy::primitives::Bytes;
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BlockHeader, BlockNumber, EthAddress, LogQuery, RawLog};

/// Read-only access to an EVM-compatible chain's headers and logs.
///
/// Implementations are expected to be cheap to clone (an `Arc`-wrapped RPC
/// client) and safe to call concurrently; the scanner fans out several log
/// fetches at once.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain head.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    async fn latest_block(&self) -> Result<BlockNumber>;

    /// Header for a specific block, or `None` if it doesn't exist (yet, or
    /// anymore, after a reorg pruned it from the node's view).
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    async fn block_header(&self, number: BlockNumber) -> Result<Option<BlockHeader>>;

    /// Contract bytecode deployed at `address` as of `height`. Empty bytes
    /// means no contract existed at that height — the signal
    /// [`crate::scanner::CreationLocator`] binary-searches on.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    async fn code_at(&self, address: EthAddress, height: BlockNumber) -> Result<Bytes>;

    /// Fetch logs matching `query`.
    ///
    /// Implementations should surface "range too large" / "query timed out"
    /// style RPC errors distinctly enough that [`crate::scanner::LogFetcher`]
    /// can decide to shrink the range and retry rather than give up.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    async fn get_logs(&self, query: LogQuery) -> Result<Vec<RawLog>>;
}
