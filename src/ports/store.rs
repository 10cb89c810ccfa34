//! Storage port for scan progress and decoded events.
//!
//! A single implementation backs both halves of the contract: cursor
//! persistence must be transactionally consistent with the events it
//! claims to have recorded, so a crash between "logs fetched" and
//! "cursor advanced" never loses or duplicates data on resume.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BlockNumber, DecodedEvent, EthAddress, EventSchema, ScanCursor};

/// Port for durable scan progress and decoded-event persistence.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Key cursors by `(address, schema)` — one cursor per scanned pair.
/// - Make `record_events` + cursor advancement atomic (a single
///   transaction), so a crash never leaves a cursor ahead of the events
///   it claims cover.
/// - Treat `record_events` as idempotent on `(tx_hash, log_index)` so a
///   re-scanned range after a reorg rewind doesn't duplicate rows.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the cursor for `(address, schema)`.
    ///
    /// Returns [`ScanCursor::none`] if this pair has never been scanned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn load_cursor(&self, address: EthAddress, schema: EventSchema) -> Result<ScanCursor>;

    /// Persist decoded events and advance the cursor in one durable step.
    ///
    /// `events` may be empty (an empty range still advances the cursor).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn commit_segment(
        &self,
        address: EthAddress,
        schema: EventSchema,
        events: &[DecodedEvent],
        new_cursor: ScanCursor,
    ) -> Result<()>;

    /// Delete all recorded events at or after `from_block` for `(address,
    /// schema)`, ahead of rewinding the cursor past a reorg.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn delete_events_from(
        &self,
        address: EthAddress,
        schema: EventSchema,
        from_block: BlockNumber,
    ) -> Result<()>;

    /// Persist the block a contract was first observed at (its creation
    /// block, once discovered by [`crate::scanner::CreationLocator`]), so
    /// later scans skip the binary search.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn save_creation_block(&self, address: EthAddress, block: BlockNumber) -> Result<()>;

    /// Previously discovered creation block for `address`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn creation_block(&self, address: EthAddress) -> Result<Option<BlockNumber>>;
}
