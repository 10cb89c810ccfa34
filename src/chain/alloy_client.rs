//! `alloy`-backed [`ChainClient`] implementation.
//!
//! Grounded in the teacher's `BlockProcessor<P: Provider>`: generic over any
//! `alloy::providers::Provider`, so tests can swap in a mock transport
//! without touching the scanner's call sites.

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::Bytes;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use async_trait::async_trait;
use tracing::instrument;

use crate::error::{InfraError, Result};
use crate::ports::chain::ChainClient;
use crate::types::{BlockHeader, BlockNumber, EthAddress, LogQuery, RawLog};

/// [`ChainClient`] implementation backed by a live `alloy` provider.
#[derive(Debug, Clone)]
pub struct AlloyChainClient<P> {
    provider: P,
}

impl<P> AlloyChainClient<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    /// Wrap an existing provider.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> ChainClient for AlloyChainClient<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    #[instrument(skip(self))]
    async fn latest_block(&self) -> Result<BlockNumber> {
        let number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| InfraError::Rpc(Box::new(e)))?;
        Ok(BlockNumber::new(number))
    }

    #[instrument(skip(self), fields(block = number.get()))]
    async fn block_header(&self, number: BlockNumber) -> Result<Option<BlockHeader>> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number.get()))
            .await
            .map_err(|e| InfraError::Rpc(Box::new(e)))?;

        Ok(block.map(|b| BlockHeader {
            number,
            hash: b.header.hash,
            parent_hash: b.header.parent_hash,
            timestamp: b.header.timestamp,
        }))
    }

    #[instrument(skip(self), fields(%address, height = height.get()))]
    async fn code_at(&self, address: EthAddress, height: BlockNumber) -> Result<Bytes> {
        self.provider
            .get_code_at(address.into())
            .block_id(BlockNumberOrTag::Number(height.get()).into())
            .await
            .map_err(|e| InfraError::Rpc(Box::new(e)).into())
    }

    #[instrument(skip(self), fields(address = %query.address, from = query.from_block.get(), to = query.to_block.get()))]
    async fn get_logs(&self, query: LogQuery) -> Result<Vec<RawLog>> {
        let filter = Filter::new()
            .address(alloy::primitives::Address::from(query.address))
            .event_signature(query.schema.topic0())
            .from_block(query.from_block.get())
            .to_block(query.to_block.get());

        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| InfraError::Rpc(Box::new(e)).into())
    }
}
