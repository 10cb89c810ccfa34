//! Drives a single scan segment: chunk → fetch → decode → persist → advance.
//!
//! Replaces the teacher's `BlockProcessor::backfill`; keeps its
//! `#[instrument(skip(self))]` plus structured `info!`/`debug!` logging style
//! and its "returns the number of things processed" convention.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::ports::chain::ChainClient;
use crate::types::{BlockNumber, DecodedEvent, EthAddress, EventSchema};

use super::chunk_sizer::ChunkSizer;
use super::log_fetcher::LogFetcher;

/// Outcome of driving one segment to completion.
///
/// Carries everything the caller needs to commit durable state itself —
/// `Scanner` never writes to a [`crate::ports::store::ProgressStore`]; only
/// the coordinator driving one or more segments knows the true watermark
/// and is the sole writer of the cursor.
#[derive(Debug, Clone, Default)]
pub struct SegmentReport {
    /// Highest block fully processed in this segment.
    pub last_block: u64,
    /// Decoded events found across the segment, in ascending log order.
    pub events: Vec<DecodedEvent>,
    /// Total decoded events found.
    pub events_persisted: usize,
    /// Set when the segment stopped early because a log's block header came
    /// back `NotFound` — the lowest such block height. `last_block` is
    /// already capped at `held_back - 1` when this is set.
    pub held_back: Option<u64>,
}

/// Drives one contiguous `[start, end]` segment of a scan.
pub struct Scanner<'a, C> {
    chain: &'a C,
    chunk_sizer: ChunkSizer,
    log_fetcher: LogFetcher<'a, C>,
}

impl<'a, C> Scanner<'a, C>
where
    C: ChainClient,
{
    /// Build a scanner over a shared chain client.
    #[must_use]
    pub const fn new(
        chain: &'a C,
        min_chunk: u64,
        max_chunk: u64,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            chain,
            chunk_sizer: ChunkSizer::new(min_chunk, max_chunk),
            log_fetcher: LogFetcher::new(chain, max_retries, retry_delay),
        }
    }

    /// Walk `[start, end]` for `(address, schema)`, decoding events chunk by
    /// chunk and returning them for the caller to persist.
    ///
    /// A per-segment block-timestamp cache is used so a given block's
    /// header is fetched at most once within the segment. If a log's block
    /// header comes back `NotFound` (the tip moved, or a shallow reorg
    /// detached the block), the segment stops at the block before it rather
    /// than silently dropping the log — holding the cursor back so a future
    /// cycle re-attempts that height.
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk's logs can't be fetched within the retry
    /// budget, or if a log fails to decode.
    #[instrument(skip(self), fields(%address, start = start.get(), end = end.get()))]
    pub async fn run_segment(
        &self,
        address: EthAddress,
        schema: EventSchema,
        start: BlockNumber,
        end: BlockNumber,
        initial_chunk_size: u64,
    ) -> Result<SegmentReport> {
        let mut block_time_cache: HashMap<u64, Option<u64>> = HashMap::new();
        let mut current = start.get();
        let mut size = initial_chunk_size;
        let mut report = SegmentReport {
            last_block: start.get().saturating_sub(1),
            ..Default::default()
        };

        'chunks: while current <= end.get() {
            let tentative_to = (current + size).min(end.get());

            let (actual_to, logs) = self
                .log_fetcher
                .fetch(
                    address,
                    schema,
                    BlockNumber::new(current),
                    BlockNumber::new(tentative_to),
                )
                .await?;

            let mut decoded = Vec::with_capacity(logs.len());
            let mut chunk_held_back = None;
            for log in &logs {
                let block_number = log.block_number.unwrap_or_default();
                if !block_time_cache.contains_key(&block_number) {
                    let header = self.chain.block_header(BlockNumber::new(block_number)).await?;
                    block_time_cache.insert(block_number, header.map(|h| h.timestamp));
                }

                if block_time_cache.get(&block_number).copied().flatten().is_none() {
                    debug!(block_number, "block header not found yet, holding cursor back");
                    chunk_held_back = Some(chunk_held_back.unwrap_or(block_number).min(block_number));
                    // Logs are delivered in ascending block order; every
                    // later log in this chunk is at >= this height, so none
                    // of them can be safely included either.
                    break;
                }

                decoded.push(schema.decode(address, log)?);
            }

            let chunk_event_count = decoded.len();
            report.events_persisted += chunk_event_count;
            report.events.extend(decoded);

            if let Some(held_back_at) = chunk_held_back {
                report.last_block = held_back_at.saturating_sub(1).max(report.last_block);
                report.held_back = Some(held_back_at);

                info!(
                    from = current,
                    held_back_at,
                    events = chunk_event_count,
                    "segment held back pending block header"
                );
                break 'chunks;
            }

            report.last_block = actual_to.get();

            info!(
                from = current,
                to = actual_to.get(),
                chunk_size = size,
                events = chunk_event_count,
                "segment chunk scanned"
            );

            size = self.chunk_sizer.next_size(size, logs.len());
            current = actual_to.get() + 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::types::{BlockHeader, LogQuery, RawLog};

    struct FakeChain {
        latest: u64,
        headers: HashMap<u64, u64>,
        logs_by_range: Vec<((u64, u64), Vec<RawLog>)>,
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn latest_block(&self) -> Result<BlockNumber> {
            Ok(BlockNumber::new(self.latest))
        }

        async fn block_header(&self, number: BlockNumber) -> Result<Option<BlockHeader>> {
            Ok(self.headers.get(&number.get()).map(|&timestamp| BlockHeader {
                number,
                hash: Default::default(),
                parent_hash: Default::default(),
                timestamp,
            }))
        }

        async fn code_at(
            &self,
            _address: EthAddress,
            _height: BlockNumber,
        ) -> Result<alloy::primitives::Bytes> {
            Ok(alloy::primitives::Bytes::new())
        }

        async fn get_logs(&self, query: LogQuery) -> Result<Vec<RawLog>> {
            for ((from, to), logs) in &self.logs_by_range {
                if *from == query.from_block.get() && *to >= query.to_block.get() {
                    return Ok(logs.clone());
                }
            }
            Ok(vec![])
        }
    }

    fn transfer_log(block_number: u64, log_index: u64) -> RawLog {
        use alloy::primitives::{Address, LogData, U256};
        use alloy::sol_types::SolEvent;

        let topics = vec![
            crate::abi::Transfer::SIGNATURE_HASH,
            Address::ZERO.into_word(),
            Address::ZERO.into_word(),
        ];
        let data = U256::from(1_000u64).to_be_bytes_vec().into();
        let log_data = LogData::new(topics, data).unwrap();

        RawLog {
            inner: alloy::primitives::Log {
                address: Address::ZERO,
                data: log_data,
            },
            block_hash: None,
            block_number: Some(block_number),
            block_timestamp: None,
            transaction_hash: Some(Default::default()),
            transaction_index: None,
            log_index: Some(log_index),
            removed: false,
        }
    }

    #[tokio::test]
    async fn scenario_one_empty_range_does_nothing() {
        let chain = FakeChain {
            latest: 100,
            headers: HashMap::new(),
            logs_by_range: vec![],
        };
        let scanner = Scanner::new(&chain, 10, 1000, 4, Duration::from_millis(0));

        let report = scanner
            .run_segment(
                EthAddress::ZERO,
                EventSchema::Erc20Transfer,
                BlockNumber::new(100),
                BlockNumber::new(100),
                20,
            )
            .await
            .unwrap();

        assert_eq!(report.events_persisted, 0);
        assert_eq!(report.last_block, 100);
        assert!(report.held_back.is_none());
    }

    #[tokio::test]
    async fn scenario_two_single_hit_is_returned_with_its_log_index() {
        let log = transfer_log(517, 3);

        let mut headers = HashMap::new();
        headers.insert(517, 1_700_000_000);

        let chain = FakeChain {
            latest: 520,
            headers,
            logs_by_range: vec![((490, 519), vec![log])],
        };
        let scanner = Scanner::new(&chain, 10, 1000, 4, Duration::from_millis(0));

        let report = scanner
            .run_segment(
                EthAddress::ZERO,
                EventSchema::Erc20Transfer,
                BlockNumber::new(490),
                BlockNumber::new(519),
                20,
            )
            .await
            .unwrap();

        assert_eq!(report.last_block, 519);
        assert_eq!(report.events_persisted, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].log_index, 3);
        assert_eq!(report.events[0].block_number.get(), 517);
        assert!(report.held_back.is_none());
    }

    #[tokio::test]
    async fn missing_block_header_holds_cursor_back_instead_of_dropping_the_log() {
        // Block 517 has a log but no header yet (not yet visible to the
        // node); block 510 is fully resolved.
        let logs = vec![transfer_log(510, 0), transfer_log(517, 1)];

        let mut headers = HashMap::new();
        headers.insert(510, 1_700_000_000);
        // 517 deliberately absent from `headers`.

        let chain = FakeChain {
            latest: 520,
            headers,
            logs_by_range: vec![((490, 519), logs)],
        };
        let scanner = Scanner::new(&chain, 10, 1000, 4, Duration::from_millis(0));

        let report = scanner
            .run_segment(
                EthAddress::ZERO,
                EventSchema::Erc20Transfer,
                BlockNumber::new(490),
                BlockNumber::new(519),
                30,
            )
            .await
            .unwrap();

        assert_eq!(report.held_back, Some(517));
        assert_eq!(report.last_block, 516);
        assert_eq!(report.events_persisted, 1);
        assert_eq!(report.events[0].block_number.get(), 510);
    }
}
