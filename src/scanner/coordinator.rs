//! Splits a scan range into bounded segments and runs them concurrently.
//!
//! Grounded in the teacher's `join_all`-based fan-out in
//! `indexer/block_processor.rs`, generalized to segment-level concurrency.
//! Implements the watermark strategy from §4.7: concurrent segments can
//! finish out of height order, so the durable cursor only advances to the
//! highest height for which every lower segment has also completed.

use std::time::Duration;

use futures::future::join_all;
use tracing::{info, instrument};

use crate::error::{Result, ScanError};
use crate::ports::chain::ChainClient;
use crate::ports::store::ProgressStore;
use crate::types::{BlockNumber, DecodedEvent, EthAddress, EventSchema, ScanCursor};

use super::scanner::Scanner;

/// Width of one coordinator-assigned segment.
pub const MAX_SEGMENT_WIDTH: u64 = 1000;

/// Aggregate result of a coordinated scan across all segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanReport {
    /// Total decoded events persisted across all segments.
    pub events_persisted: usize,
    /// Highest block height the durable cursor was advanced to.
    pub cursor: u64,
}

/// Splits `[start, end]` into segments of width [`MAX_SEGMENT_WIDTH`] and
/// drives each with an independent [`Scanner`].
pub struct ScanCoordinator<'a, C, S> {
    chain: &'a C,
    store: &'a S,
    min_chunk: u64,
    max_chunk: u64,
    max_retries: u32,
    retry_delay: Duration,
    initial_chunk_size: u64,
}

impl<'a, C, S> ScanCoordinator<'a, C, S>
where
    C: ChainClient,
    S: ProgressStore,
{
    /// Construct a coordinator sharing a chain client and progress store
    /// across all segments.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        chain: &'a C,
        store: &'a S,
        min_chunk: u64,
        max_chunk: u64,
        max_retries: u32,
        retry_delay: Duration,
        initial_chunk_size: u64,
    ) -> Self {
        Self {
            chain,
            store,
            min_chunk,
            max_chunk,
            max_retries,
            retry_delay,
            initial_chunk_size,
        }
    }

    /// Partition `[start, end]` into contiguous segments and scan them
    /// concurrently, advancing the durable cursor under the watermark
    /// discipline: the cursor only ever reaches as far as the longest
    /// unbroken prefix of completed segments, in height order.
    ///
    /// # Errors
    ///
    /// If any segment fails, the cursor is still advanced to the highest
    /// safe watermark across the segments that did complete, and the first
    /// error is then returned.
    #[instrument(skip(self), fields(%address, start = start.get(), end = end.get()))]
    pub async fn scan_range(
        &self,
        address: EthAddress,
        schema: EventSchema,
        start: BlockNumber,
        end: BlockNumber,
    ) -> Result<ScanReport> {
        if start.get() > end.get() {
            return Ok(ScanReport {
                events_persisted: 0,
                cursor: start.get().saturating_sub(1),
            });
        }

        let mut bounds = Vec::new();
        let mut cursor_b = start.get();
        while cursor_b < end.get() {
            let stop = (cursor_b + MAX_SEGMENT_WIDTH - 1).min(end.get());
            bounds.push((cursor_b, stop));
            cursor_b = stop + 1;
        }
        if bounds.is_empty() {
            bounds.push((start.get(), end.get()));
        }

        let scanner = Scanner::new(
            self.chain,
            self.min_chunk,
            self.max_chunk,
            self.max_retries,
            self.retry_delay,
        );

        let futures = bounds.iter().map(|&(from, to)| {
            let scanner = &scanner;
            async move {
                let result = scanner
                    .run_segment(
                        address,
                        schema,
                        BlockNumber::new(from),
                        BlockNumber::new(to),
                        self.initial_chunk_size,
                    )
                    .await;
                (from, result)
            }
        });

        let mut results = join_all(futures).await;
        results.sort_by_key(|(from, _)| *from);

        // `results` is sorted by segment start; since every segment is
        // awaited before any cursor commit, the watermark is simply the
        // highest `last_block` reached by an unbroken prefix of successful
        // segments in height order — the first failure, or the first
        // reorg holdback, stops it. Segments don't touch the store
        // themselves (see `Scanner::run_segment`); their decoded events are
        // aggregated here and persisted in the one commit below, atomically
        // with the watermark that covers them.
        let mut watermark = start.get().saturating_sub(1);
        let mut events_persisted = 0usize;
        let mut all_events: Vec<DecodedEvent> = Vec::new();
        let mut first_error = None;
        let mut holdback = None;

        for (_from, result) in results {
            match result {
                Ok(report) => {
                    watermark = report.last_block;
                    events_persisted += report.events_persisted;
                    all_events.extend(report.events);
                    if let Some(held_back_at) = report.held_back {
                        holdback = Some(held_back_at);
                        break;
                    }
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                    break;
                }
            }
        }

        // The only commit for this cycle: it never moves the durable cursor
        // past the highest height for which every lower segment has also
        // completed, and persists exactly the events that watermark covers.
        if watermark != start.get().saturating_sub(1) {
            self.store
                .commit_segment(
                    address,
                    schema,
                    &all_events,
                    ScanCursor {
                        last_scanned_block: BlockNumber::new(watermark),
                        last_scanned_hash: None,
                    },
                )
                .await?;
        }

        info!(
            watermark,
            events_persisted, segments = bounds.len(), "scan range complete"
        );

        if let Some(err) = first_error {
            return Err(err);
        }

        if holdback.is_some() {
            return Err(ScanError::ReorgHoldback { last_safe: watermark });
        }

        Ok(ScanReport {
            events_persisted,
            cursor: watermark,
        })
    }
}
