//! Single-chunk log retrieval with retry-and-shrink.
//!
//! Grounded in `original_source/event_filter.py`'s `_retry_web3_call`: nodes
//! like go-ethereum reject oversized `eth_getLogs` ranges with an opaque
//! timeout or "context cancelled" error, indistinguishable from a plain
//! transport timeout. Halving the range converges quickly to one the node
//! accepts.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::ports::chain::ChainClient;
use crate::types::{BlockNumber, EthAddress, EventSchema, LogQuery, RawLog};

/// Fetches logs for a block range, shrinking the range on repeated failure.
pub struct LogFetcher<'a, C> {
    chain: &'a C,
    max_retries: u32,
    retry_delay: Duration,
}

impl<'a, C: ChainClient> LogFetcher<'a, C> {
    /// Construct a fetcher with the given retry budget and fixed backoff.
    #[must_use]
    pub const fn new(chain: &'a C, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            chain,
            max_retries,
            retry_delay,
        }
    }

    /// Fetch logs for `[from, to]`, shrinking `to` on failure.
    ///
    /// Returns `(actual_to, logs)` where `actual_to <= to`. Callers must use
    /// the returned value, not the requested one, to advance their cursor.
    ///
    /// # Errors
    ///
    /// Returns the last error once `max_retries` attempts are exhausted.
    #[instrument(skip(self), fields(address = %address, from = from.get(), to = to.get()))]
    pub async fn fetch(
        &self,
        address: EthAddress,
        schema: EventSchema,
        from: BlockNumber,
        mut to: BlockNumber,
    ) -> Result<(BlockNumber, Vec<RawLog>)> {
        let mut attempt = 0u32;
        loop {
            let query = LogQuery {
                address,
                schema,
                from_block: from,
                to_block: to,
            };

            match self.chain.get_logs(query).await {
                Ok(logs) => return Ok((to, logs)),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        warn!(attempt, "out of retries fetching logs");
                        return Err(err);
                    }

                    let span = to.get().saturating_sub(from.get());
                    let shrunk = from.get() + span / 2;
                    warn!(
                        attempt,
                        from = from.get(),
                        to = to.get(),
                        shrunk_to = shrunk,
                        error = %err,
                        "log fetch failed, retrying with a smaller range"
                    );
                    to = BlockNumber::new(shrunk);

                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::types::BlockHeader;

    /// Accepts any query whose span is `<= max_span`; otherwise errors.
    struct SpanLimitedChain {
        max_span: u64,
        calls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ChainClient for SpanLimitedChain {
        async fn latest_block(&self) -> Result<BlockNumber> {
            Ok(BlockNumber::new(10_000))
        }

        async fn block_header(&self, _number: BlockNumber) -> Result<Option<BlockHeader>> {
            Ok(None)
        }

        async fn code_at(
            &self,
            _address: EthAddress,
            _height: BlockNumber,
        ) -> Result<alloy::primitives::Bytes> {
            Ok(alloy::primitives::Bytes::new())
        }

        async fn get_logs(&self, query: LogQuery) -> Result<Vec<RawLog>> {
            let span = query.to_block.get() - query.from_block.get();
            self.calls.lock().push(span);
            if span > self.max_span {
                Err(crate::error::InfraError::Timeout("range too large".into()).into())
            } else {
                Ok(vec![])
            }
        }
    }

    #[tokio::test]
    async fn shrink_converges_within_retry_budget() {
        let chain = SpanLimitedChain {
            max_span: 125,
            calls: Mutex::new(vec![]),
        };
        let fetcher = LogFetcher::new(&chain, 4, Duration::from_millis(0));

        let (actual_to, logs) = fetcher
            .fetch(
                EthAddress::ZERO,
                EventSchema::Erc20Transfer,
                BlockNumber::new(1000),
                BlockNumber::new(2000),
            )
            .await
            .unwrap();

        assert!(logs.is_empty());
        assert_eq!(actual_to.get(), 1125);
        assert_eq!(*chain.calls.lock(), vec![1000, 500, 250, 125]);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_error() {
        let chain = SpanLimitedChain {
            max_span: 0,
            calls: Mutex::new(vec![]),
        };
        let fetcher = LogFetcher::new(&chain, 2, Duration::from_millis(0));

        let result = fetcher
            .fetch(
                EthAddress::ZERO,
                EventSchema::Erc20Transfer,
                BlockNumber::new(1000),
                BlockNumber::new(1010),
            )
            .await;

        assert!(result.is_err());
    }
}
