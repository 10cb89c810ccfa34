//! Layered error types for the scanner.
//!
//! - [`ScannerError`] - Scan-logic errors (bad config, reorg past safety margin)
//! - [`InfraError`] - Infrastructure errors (database, RPC)
//! - [`ScanError`] - Top-level error combining the two, used by `Result`
//!
//! # Error Philosophy
//!
//! - Scanner errors are recoverable and describe what the caller did wrong
//! - Infrastructure errors are logged with full detail; callers only need
//!   to know that *something* downstream failed
//! - The `Result` type alias uses [`ScanError`] for application code

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from the scan logic itself, as opposed to its dependencies.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScannerError {
    /// A reorg rewound the chain further than `reorg_safety` blocks can
    /// absorb; the cursor can't be trusted without manual intervention.
    #[error("reorg at block {block} exceeds safety margin of {safety_margin} blocks")]
    ReorgBeyondSafetyMargin {
        /// Block where the mismatch was detected.
        block: u64,
        /// Configured `reorg_safety` in blocks.
        safety_margin: u64,
    },

    /// Binary search for a contract's creation block didn't converge.
    #[error("could not locate creation block for {address} within [{low}, {high}]")]
    CreationBlockNotFound {
        /// Contract address searched for.
        address: String,
        /// Lower bound of the search.
        low: u64,
        /// Upper bound of the search.
        high: u64,
    },

    /// A chunk shrank below `min_chunk_size` and logs still couldn't be
    /// fetched.
    #[error("log fetch failed even at minimum chunk size ({min_chunk_size} blocks)")]
    ChunkExhausted {
        /// Configured floor for chunk size.
        min_chunk_size: u64,
    },

    /// A log with a null `log_index` reached the decoder — it belongs to a
    /// pending block and the scanner promised never to scan the tip.
    #[error("log at tx {tx_hash} has a null log index (pending block)")]
    PendingLog {
        /// Transaction hash of the offending log.
        tx_hash: String,
    },

    /// An event log didn't decode against its expected schema.
    #[error("failed to decode {schema} log at tx {tx_hash} log index {log_index}: {reason}")]
    DecodeFailed {
        /// Event schema the log was expected to match.
        schema: String,
        /// Transaction hash of the offending log.
        tx_hash: String,
        /// Log index within the transaction's block.
        log_index: u64,
        /// Underlying decode error message.
        reason: String,
    },

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid decimal amount (negative or malformed).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown event schema name in config.
    #[error(transparent)]
    UnknownEventSchema(#[from] crate::types::UnknownEventSchema),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INFRASTRUCTURE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Infrastructure-level errors from external systems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InfraError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// RPC error (Ethereum node communication).
    #[error("RPC error: {0}")]
    Rpc(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Resource not found in storage.
    #[error("resource not found")]
    NotFound,

    /// Connection pool exhausted.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Timeout waiting for an RPC call to return.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// An on-chain address in config couldn't be parsed.
    #[error("address parsing error: {0}")]
    AddressParsing(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Top-level error combining scanner and infrastructure errors.
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// Scan-logic error.
    #[error(transparent)]
    Scanner(#[from] ScannerError),

    /// Infrastructure error.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Configuration error surfaced at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initialization error.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Graceful shutdown requested.
    #[error("shutdown requested")]
    ShutdownRequested,

    /// A cycle stopped early because a block header lookup for a log came
    /// back `NotFound` (the tip moved, or a shallow reorg detached the
    /// block). The cursor was held back before the affected height; a
    /// future cycle will reach it.
    #[error("scan held back at block {last_safe}: a block header lookup returned not-found")]
    ReorgHoldback {
        /// Highest block height the cursor was safely advanced to this cycle.
        last_safe: u64,
    },
}

/// Type alias for crate-wide Results.
pub type Result<T> = std::result::Result<T, ScanError>;

// ═══════════════════════════════════════════════════════════════════════════════
// CONVENIENCE CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<crate::types::primitives::InvalidAddress> for ScannerError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidAmount> for ScannerError {
    fn from(err: crate::types::primitives::InvalidAmount) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidAddress> for ScanError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::Scanner(err.into())
    }
}

impl From<crate::types::primitives::InvalidAmount> for ScanError {
    fn from(err: crate::types::primitives::InvalidAmount) -> Self {
        Self::Scanner(err.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_error_display() {
        let err = ScannerError::ReorgBeyondSafetyMargin {
            block: 100,
            safety_margin: 10,
        };
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn scan_error_from_scanner() {
        let scanner = ScannerError::ChunkExhausted { min_chunk_size: 10 };
        let scan: ScanError = scanner.into();
        assert!(matches!(
            scan,
            ScanError::Scanner(ScannerError::ChunkExhausted { min_chunk_size: 10 })
        ));
    }

    #[test]
    fn scan_error_from_infra() {
        let infra = InfraError::NotFound;
        let scan: ScanError = infra.into();
        assert!(matches!(scan, ScanError::Infra(InfraError::NotFound)));
    }
}
