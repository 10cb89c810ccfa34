//! `PostgreSQL` implementation of the [`ProgressStore`] port using `SQLx`.
//!
//! # Type Conversions
//!
//! `PostgreSQL` uses signed integers for numeric columns while our domain
//! uses unsigned block numbers. These casts are safe because block numbers
//! won't exceed `i64::MAX` (~9 quintillion) for the lifetime of any real
//! chain.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::use_self
)]

use alloy::primitives::B256;
use async_trait::async_trait;
use sqlx::{FromRow, postgres::PgPool};
use tracing::{debug, instrument};

use crate::error::{InfraError, Result};
use crate::ports::store::ProgressStore;
use crate::types::{BlockNumber, DecodedEvent, EthAddress, EventSchema, ScanCursor};

// ═══════════════════════════════════════════════════════════════════════════════
// POSTGRES PROGRESS STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// `PostgreSQL`-based implementation of [`ProgressStore`].
#[derive(Debug, Clone)]
pub struct PostgresProgressStore {
    pool: PgPool,
}

impl PostgresProgressStore {
    /// Create a new store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InfraError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROW TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct CursorRow {
    last_scanned_block: i64,
    last_scanned_hash: Option<Vec<u8>>,
}

impl TryFrom<CursorRow> for ScanCursor {
    type Error = InfraError;

    fn try_from(row: CursorRow) -> std::result::Result<Self, Self::Error> {
        let last_scanned_hash = row
            .last_scanned_hash
            .map(|bytes| {
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| InfraError::Database(sqlx::Error::Decode(
                        "invalid block hash length in scan_cursors".into(),
                    )))?;
                Ok::<_, InfraError>(B256::from(arr))
            })
            .transpose()?;

        Ok(Self {
            last_scanned_block: BlockNumber::new(row.last_scanned_block as u64),
            last_scanned_hash,
        })
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    block_number: i64,
    block_hash: Vec<u8>,
    tx_hash: Vec<u8>,
    log_index: i64,
    address: Vec<u8>,
    event_schema: String,
    from_address: Vec<u8>,
    to_address: Vec<u8>,
    value: sqlx::types::BigDecimal,
}

impl TryFrom<EventRow> for DecodedEvent {
    type Error = InfraError;

    fn try_from(row: EventRow) -> std::result::Result<Self, Self::Error> {
        use crate::types::DecimalU256;
        use std::str::FromStr;

        let bytes32 = |v: Vec<u8>| -> std::result::Result<[u8; 32], InfraError> {
            v.try_into()
                .map_err(|_| InfraError::Database(sqlx::Error::Decode("invalid 32-byte column".into())))
        };
        let bytes20 = |v: Vec<u8>| -> std::result::Result<[u8; 20], InfraError> {
            v.try_into()
                .map_err(|_| InfraError::Database(sqlx::Error::Decode("invalid 20-byte column".into())))
        };

        Ok(Self {
            block_number: BlockNumber::new(row.block_number as u64),
            block_hash: B256::from(bytes32(row.block_hash)?),
            tx_hash: B256::from(bytes32(row.tx_hash)?),
            log_index: row.log_index as u64,
            address: EthAddress::new(bytes20(row.address)?),
            schema: EventSchema::from_str(&row.event_schema)
                .map_err(|e| InfraError::Database(sqlx::Error::Decode(e.to_string().into())))?,
            from: EthAddress::new(bytes20(row.from_address)?),
            to: EthAddress::new(bytes20(row.to_address)?),
            value: DecimalU256::from_bigdecimal(&row.value),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRESS STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[async_trait]
impl ProgressStore for PostgresProgressStore {
    #[instrument(skip(self), fields(%address, event = schema.name()))]
    async fn load_cursor(&self, address: EthAddress, schema: EventSchema) -> Result<ScanCursor> {
        let row: Option<CursorRow> = sqlx::query_as(
            "SELECT last_scanned_block, last_scanned_hash FROM scan_cursors
             WHERE address = $1 AND event_schema = $2",
        )
        .bind(address.as_slice())
        .bind(schema.name())
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        match row {
            Some(row) => row.try_into().map_err(Into::into),
            None => Ok(ScanCursor::none()),
        }
    }

    #[instrument(skip(self, events), fields(%address, event = schema.name(), events = events.len()))]
    async fn commit_segment(
        &self,
        address: EthAddress,
        schema: EventSchema,
        events: &[DecodedEvent],
        new_cursor: ScanCursor,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(InfraError::Database)?;

        for event in events {
            sqlx::query(
                r#"
                INSERT INTO decoded_events
                    (block_number, block_hash, tx_hash, log_index, address,
                     event_schema, from_address, to_address, value)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (tx_hash, log_index) DO NOTHING
                "#,
            )
            .bind(i64::from(event.block_number))
            .bind(event.block_hash.as_slice())
            .bind(event.tx_hash.as_slice())
            .bind(event.log_index as i64)
            .bind(event.address.as_slice())
            .bind(event.schema.name())
            .bind(event.from.as_slice())
            .bind(event.to.as_slice())
            .bind(event.value.to_bigdecimal())
            .execute(&mut *tx)
            .await
            .map_err(InfraError::Database)?;
        }

        sqlx::query(
            r#"
            INSERT INTO scan_cursors (address, event_schema, last_scanned_block, last_scanned_hash, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (address, event_schema) DO UPDATE SET
                last_scanned_block = EXCLUDED.last_scanned_block,
                last_scanned_hash = EXCLUDED.last_scanned_hash,
                updated_at = NOW()
            "#,
        )
        .bind(address.as_slice())
        .bind(schema.name())
        .bind(i64::from(new_cursor.last_scanned_block))
        .bind(new_cursor.last_scanned_hash.map(|h| h.as_slice().to_vec()))
        .execute(&mut *tx)
        .await
        .map_err(InfraError::Database)?;

        tx.commit().await.map_err(InfraError::Database)?;

        debug!(cursor = new_cursor.last_scanned_block.get(), "segment committed");
        Ok(())
    }

    #[instrument(skip(self), fields(%address, event = schema.name(), from = from_block.get()))]
    async fn delete_events_from(
        &self,
        address: EthAddress,
        schema: EventSchema,
        from_block: BlockNumber,
    ) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM decoded_events WHERE address = $1 AND event_schema = $2 AND block_number >= $3",
        )
        .bind(address.as_slice())
        .bind(schema.name())
        .bind(i64::from(from_block))
        .execute(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        debug!(deleted = result.rows_affected(), "events rolled back for reorg");
        Ok(())
    }

    #[instrument(skip(self), fields(%address, block = block.get()))]
    async fn save_creation_block(&self, address: EthAddress, block: BlockNumber) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contracts (address, creation_block)
            VALUES ($1, $2)
            ON CONFLICT (address) DO UPDATE SET creation_block = EXCLUDED.creation_block
            "#,
        )
        .bind(address.as_slice())
        .bind(i64::from(block))
        .execute(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        Ok(())
    }

    #[instrument(skip(self), fields(%address))]
    async fn creation_block(&self, address: EthAddress) -> Result<Option<BlockNumber>> {
        let row: Option<i64> =
            sqlx::query_scalar("SELECT creation_block FROM contracts WHERE address = $1")
                .bind(address.as_slice())
                .fetch_optional(&self.pool)
                .await
                .map_err(InfraError::Database)?;

        Ok(row.map(|n| BlockNumber::new(n as u64)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cursor_row_roundtrip() {
        let row = CursorRow {
            last_scanned_block: 517,
            last_scanned_hash: Some(vec![0u8; 32]),
        };
        let cursor: ScanCursor = row.try_into().unwrap();
        assert_eq!(cursor.last_scanned_block.get(), 517);
        assert_eq!(cursor.last_scanned_hash, Some(B256::ZERO));
    }

    #[test]
    fn cursor_row_rejects_short_hash() {
        let row = CursorRow {
            last_scanned_block: 1,
            last_scanned_hash: Some(vec![0u8; 4]),
        };
        let result: Result<ScanCursor, InfraError> = row.try_into();
        assert!(result.is_err());
    }
}
