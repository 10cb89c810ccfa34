//! Core scan orchestration.
//!
//! - [`chunk_sizer`] - adaptive chunk-size heuristic ([`ChunkSizer`])
//! - [`creation_locator`] - binary search for a contract's creation block
//!   ([`CreationLocator`])
//! - [`log_fetcher`] - retry-and-shrink log retrieval ([`LogFetcher`])
//! - [`scanner`] - drives a single segment ([`Scanner`])
//! - [`coordinator`] - partitions a range into segments and runs them
//!   concurrently under the watermark discipline ([`ScanCoordinator`])
//!
//! [`scan`] ties these together into the one entry point an external caller
//! (the CLI, or an embedding application) invokes per cycle.

pub mod chunk_sizer;
pub mod coordinator;
pub mod creation_locator;
pub mod log_fetcher;
pub mod scanner;

pub use chunk_sizer::ChunkSizer;
pub use coordinator::{ScanCoordinator, ScanReport};
pub use creation_locator::CreationLocator;
pub use log_fetcher::LogFetcher;
pub use scanner::Scanner;

use tracing::info;

use crate::error::Result;
use crate::ports::chain::ChainClient;
use crate::ports::store::ProgressStore;
use crate::types::{BlockNumber, EthAddress, EventSchema};

/// A single scan cycle's tunables, mirroring [`crate::config::ScannerSettings`].
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Floor for adaptive chunk sizing.
    pub min_chunk_size: u64,
    /// Ceiling for adaptive chunk sizing.
    pub max_chunk_size: u64,
    /// Chunk size used for the first chunk of each segment.
    pub initial_chunk_size: u64,
    /// Retry budget for a single chunk's log fetch.
    pub max_retries: u32,
    /// Fixed delay between retries.
    pub retry_delay: std::time::Duration,
    /// Blocks to re-scan at the start of every cycle to absorb shallow reorgs.
    pub reorg_safety: u64,
    /// Known creation block from config (`ContractConfig::creation_block`).
    /// When set and the store has no cached creation block yet, it's seeded
    /// directly, skipping [`CreationLocator`]'s binary search.
    pub configured_creation_block: Option<BlockNumber>,
}

/// Run one scan cycle for `(address, schema)` against `chain`/`store`.
///
/// Resolves a starting height (existing cursor minus `reorg_safety`, or a
/// freshly located creation block) and an ending height (`latest - 1`, the
/// tip is never scanned), then delegates the walk to [`ScanCoordinator`].
///
/// # Errors
///
/// Returns an error if the creation block can't be located, if the chain or
/// store are unreachable, or if a segment fails outright.
pub async fn scan<C, S>(
    chain: &C,
    store: &S,
    address: EthAddress,
    schema: EventSchema,
    config: ScanConfig,
) -> Result<ScanReport>
where
    C: ChainClient,
    S: ProgressStore,
{
    let latest = chain.latest_block().await?;
    let end = BlockNumber::new(latest.get().saturating_sub(1));

    let cursor = store.load_cursor(address, schema).await?;

    // Nothing new to cover: the tip is never scanned, so if we've already
    // reached `end` there is no forward progress to make this cycle, and
    // no reorg rewind is worth doing without somewhere new to scan into.
    if !cursor.is_none() && cursor.last_scanned_block.get() >= end.get() {
        return Ok(ScanReport {
            events_persisted: 0,
            cursor: cursor.last_scanned_block.get(),
        });
    }

    let start = if cursor.is_none() {
        match store.creation_block(address).await? {
            Some(known) => known,
            None => match config.configured_creation_block {
                Some(configured) => {
                    store.save_creation_block(address, configured).await?;
                    configured
                }
                None => {
                    let locator = CreationLocator::new(chain);
                    let found = locator
                        .locate(address, BlockNumber::new(1), latest)
                        .await?;
                    store.save_creation_block(address, found).await?;
                    found
                }
            },
        }
    } else {
        BlockNumber::new(
            cursor
                .last_scanned_block
                .get()
                .saturating_sub(config.reorg_safety)
                .max(1),
        )
    };

    info!(%address, event = schema.name(), start = start.get(), end = end.get(), "starting scan cycle");

    if start.get() > end.get() {
        return Ok(ScanReport {
            events_persisted: 0,
            cursor: cursor.last_scanned_block.get(),
        });
    }

    let coordinator = ScanCoordinator::new(
        chain,
        store,
        config.min_chunk_size,
        config.max_chunk_size,
        config.max_retries,
        config.retry_delay,
        config.initial_chunk_size,
    );

    coordinator.scan_range(address, schema, start, end).await
}

impl From<crate::config::ScannerSettings> for ScanConfig {
    fn from(settings: crate::config::ScannerSettings) -> Self {
        Self {
            min_chunk_size: settings.min_chunk_size,
            max_chunk_size: settings.max_chunk_size,
            initial_chunk_size: settings.initial_chunk_size,
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay(),
            reorg_safety: settings.reorg_safety,
            configured_creation_block: None,
        }
    }
}
