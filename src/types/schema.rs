//! Core scanner data types: log filters, raw and decoded events, cursors.
//!
//! These types are the contract between [`crate::ports::chain::ChainClient`],
//! [`crate::ports::store::ProgressStore`], and the scanner algorithms in
//! [`crate::scanner`]. None of them depend on a concrete RPC or database
//! implementation.

use alloy::primitives::B256;
use alloy::rpc::types::Log as AlloyLog;
use serde::{Deserialize, Serialize};

use super::primitives::{BlockNumber, DecimalU256, EthAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK HEADER
// ═══════════════════════════════════════════════════════════════════════════════

/// The subset of a block header the scanner needs: identity, lineage, time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block number.
    pub number: BlockNumber,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash (used to detect reorgs across a cursor rewind).
    pub parent_hash: B256,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT SCHEMA
// ═══════════════════════════════════════════════════════════════════════════════

/// A named, ABI-typed event a scan targets.
///
/// One scan always targets exactly one contract and one event schema;
/// scanning several event types for a contract means running several scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSchema {
    /// Standard ERC-20 `Transfer(address indexed from, address indexed to, uint256 value)`.
    Erc20Transfer,
}

impl EventSchema {
    /// The event's topic-0 (keccak256 of its canonical signature).
    #[must_use]
    pub fn topic0(self) -> B256 {
        match self {
            Self::Erc20Transfer => crate::abi::Transfer::SIGNATURE_HASH,
        }
    }

    /// Human-readable event name, for logging and config.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Erc20Transfer => "Transfer",
        }
    }
}

impl std::str::FromStr for EventSchema {
    type Err = UnknownEventSchema;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Transfer" | "transfer" | "erc20_transfer" => Ok(Self::Erc20Transfer),
            other => Err(UnknownEventSchema(other.to_string())),
        }
    }
}

/// Error returned when a configured event name has no known schema.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown event schema: {0}")]
pub struct UnknownEventSchema(pub String);

impl EventSchema {
    /// Decode a raw log against this schema.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ScannerError::PendingLog`] if `raw.log_index`
    /// is `None`, or [`crate::error::ScannerError::DecodeFailed`] if the log
    /// doesn't match the schema's ABI shape.
    pub fn decode(
        self,
        address: EthAddress,
        raw: &RawLog,
    ) -> Result<DecodedEvent, crate::error::ScannerError> {
        use alloy::sol_types::SolEvent;

        let tx_hash = raw.transaction_hash.unwrap_or_default();
        let Some(log_index) = raw.log_index else {
            return Err(crate::error::ScannerError::PendingLog {
                tx_hash: tx_hash.to_string(),
            });
        };

        match self {
            Self::Erc20Transfer => {
                let decoded = crate::abi::Transfer::decode_log(&raw.inner, true).map_err(|e| {
                    crate::error::ScannerError::DecodeFailed {
                        schema: self.name().to_string(),
                        tx_hash: tx_hash.to_string(),
                        log_index,
                        reason: e.to_string(),
                    }
                })?;

                Ok(DecodedEvent {
                    block_number: BlockNumber::new(raw.block_number.unwrap_or_default()),
                    block_hash: raw.block_hash.unwrap_or_default(),
                    tx_hash,
                    log_index,
                    address,
                    schema: self,
                    from: EthAddress::from(decoded.from),
                    to: EthAddress::from(decoded.to),
                    value: DecimalU256::from_u256(decoded.value),
                })
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RAW LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// A log entry exactly as returned by `eth_getLogs`, before ABI decoding.
pub type RawLog = AlloyLog;

// ═══════════════════════════════════════════════════════════════════════════════
// DECODED EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// An ABI-decoded ERC-20 `Transfer` event with its chain-location metadata.
///
/// The scanner currently ships one concrete decoded shape. Adding a second
/// `EventSchema` means adding a sibling variant here, grounded the same way
/// `Transfer` is below (an `alloy::sol!` binding plus a `decode_log` arm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Block the event was emitted in.
    pub block_number: BlockNumber,
    /// Hash of that block.
    pub block_hash: B256,
    /// Transaction that emitted the event.
    pub tx_hash: B256,
    /// Index of the log within the block.
    pub log_index: u64,
    /// Contract address the log was emitted from.
    pub address: EthAddress,
    /// Which schema this event was decoded against.
    pub schema: EventSchema,
    /// `Transfer.from`.
    pub from: EthAddress,
    /// `Transfer.to`.
    pub to: EthAddress,
    /// `Transfer.value`, stored as an exact decimal (never as a float).
    pub value: DecimalU256,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG QUERY
// ═══════════════════════════════════════════════════════════════════════════════

/// A bounded, single-contract, single-topic log query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    /// Contract address to query.
    pub address: EthAddress,
    /// Event schema (determines the topic-0 filter).
    pub schema: EventSchema,
    /// First block, inclusive.
    pub from_block: BlockNumber,
    /// Last block, inclusive.
    pub to_block: BlockNumber,
}

impl LogQuery {
    /// Number of blocks covered by this query, inclusive on both ends.
    #[must_use]
    pub const fn span(&self) -> u64 {
        self.to_block.get().saturating_sub(self.from_block.get()) + 1
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN CURSOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Durable progress marker for one (contract, schema) scan.
///
/// Invariant: `last_scanned_block` is always a block that has been fully
/// processed and persisted — never a block currently in flight. A crash
/// between fetching logs and advancing the cursor must be safe to resume
/// by re-scanning from `last_scanned_block + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor {
    /// Last block whose logs have been durably recorded.
    pub last_scanned_block: BlockNumber,
    /// Hash of `last_scanned_block`, used to detect a reorg on resume.
    pub last_scanned_hash: Option<B256>,
}

impl ScanCursor {
    /// A cursor representing "nothing scanned yet".
    #[must_use]
    pub const fn none() -> Self {
        Self {
            last_scanned_block: BlockNumber::new(0),
            last_scanned_hash: None,
        }
    }

    /// Whether this cursor represents "nothing scanned yet".
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.last_scanned_block.get() == 0 && self.last_scanned_hash.is_none()
    }
}
