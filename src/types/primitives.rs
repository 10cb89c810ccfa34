//! Validated primitive types for domain entities.
//!
//! These newtypes provide:
//! - Type safety (can't accidentally pass an amount as a block number)
//! - Validation at construction time
//! - Domain semantics in function signatures

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated 20-byte Ethereum address.
///
/// Use `Address` from `alloy-primitives` for on-chain interaction, but this
/// type for persistence and domain logic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// Create from a fixed-size array (infallible).
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Try to create from a byte slice.
    ///
    /// # Errors
    /// Returns `InvalidAddress::WrongLength` if the slice is not exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, InvalidAddress> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| InvalidAddress::WrongLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Parse from hex string (with or without 0x prefix).
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the string is not valid hex or wrong length.
    pub fn from_hex(s: &str) -> Result<Self, InvalidAddress> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(InvalidAddress::WrongLength(s.len() / 2));
        }
        let bytes = hex::decode(s).map_err(|_| InvalidAddress::InvalidHex)?;
        Self::from_slice(&bytes)
    }

    /// Get the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Get as a byte slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Convert to EIP-55 checksummed hex string with 0x prefix, in the form
    /// the node expects addresses rendered in.
    #[must_use]
    pub fn to_hex(&self) -> String {
        Address::from(self.0).to_checksum(None)
    }

    /// Check if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<EthAddress> for String {
    fn from(addr: EthAddress) -> Self {
        addr.to_hex()
    }
}

impl TryFrom<String> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl TryFrom<&str> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_hex(s)
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

impl From<Address> for EthAddress {
    fn from(addr: Address) -> Self {
        Self::new(addr.0.0)
    }
}

impl From<EthAddress> for Address {
    fn from(addr: EthAddress) -> Self {
        Self::from(addr.0)
    }
}

/// Error for invalid Ethereum addresses.
#[derive(Debug, Clone, Error)]
pub enum InvalidAddress {
    /// Address has wrong byte length.
    #[error("wrong length: expected 20 bytes, got {0}")]
    WrongLength(usize),
    /// Address contains invalid hex characters.
    #[error("invalid hex encoding")]
    InvalidHex,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECIMAL AMOUNT (256-bit integers as exact decimal strings)
// ═══════════════════════════════════════════════════════════════════════════════

/// A 256-bit on-chain integer represented as an exact decimal value.
///
/// Backed by `BigDecimal` so values round-trip through storage without the
/// precision loss a `f64` conversion would introduce. Used for any event
/// field (`value`, `amount`, ...) that originates as a Solidity `uint256`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DecimalU256(BigDecimal);

impl DecimalU256 {
    /// Zero.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::from(0))
    }

    /// Parse from a decimal string representation.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if parsing fails or the value is negative.
    pub fn parse(s: &str) -> Result<Self, InvalidAmount> {
        let value = BigDecimal::from_str(s).map_err(|_| InvalidAmount::ParseError)?;
        if value.sign() == bigdecimal::num_bigint::Sign::Minus {
            return Err(InvalidAmount::Negative);
        }
        Ok(Self(value))
    }

    /// Create from a raw `U256` (always non-negative, so this never fails).
    #[must_use]
    pub fn from_u256(value: U256) -> Self {
        // U256::to_string is always a valid decimal integer literal.
        Self(BigDecimal::from_str(&value.to_string()).unwrap_or_default())
    }

    /// Convert back to `U256`. Fractional components (never produced by
    /// `from_u256`) are truncated.
    #[must_use]
    pub fn to_u256(&self) -> U256 {
        let int_str = self.0.to_string();
        let int_str = int_str.split('.').next().unwrap_or("0");
        U256::from_str(int_str).unwrap_or_default()
    }

    /// Check if zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.sign() == bigdecimal::num_bigint::Sign::NoSign
    }

    /// Convert to `sqlx::types::BigDecimal` for database persistence.
    #[must_use]
    pub fn to_bigdecimal(&self) -> sqlx::types::BigDecimal {
        // sqlx's BigDecimal and bigdecimal::BigDecimal are different crate
        // versions; round-trip through the decimal string to stay exact.
        self.0.to_string().parse().unwrap_or_default()
    }

    /// Create from `sqlx::types::BigDecimal`.
    #[must_use]
    pub fn from_bigdecimal(value: &sqlx::types::BigDecimal) -> Self {
        Self::parse(&value.to_string()).unwrap_or_else(|_| Self::zero())
    }
}

impl fmt::Debug for DecimalU256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecimalU256({})", self.0)
    }
}

impl fmt::Display for DecimalU256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DecimalU256> for String {
    fn from(amount: DecimalU256) -> Self {
        amount.0.to_string()
    }
}

impl TryFrom<String> for DecimalU256 {
    type Error = InvalidAmount;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl Default for DecimalU256 {
    fn default() -> Self {
        Self::zero()
    }
}

/// Error for invalid decimal amounts.
#[derive(Debug, Clone, Error)]
pub enum InvalidAmount {
    /// Amount cannot be negative.
    #[error("amount cannot be negative")]
    Negative,
    /// Failed to parse amount string.
    #[error("failed to parse amount")]
    ParseError,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK NUMBER
// ═══════════════════════════════════════════════════════════════════════════════

/// Block number newtype for clarity in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Create a new block number.
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Get the value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Alias for `get()` for consistency with other newtypes.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the next block number (saturating at `u64::MAX`).
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the previous block number (saturating at 0).
    #[must_use]
    pub const fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Returns this block number minus `n` (saturating at 0).
    #[must_use]
    pub const fn saturating_sub(&self, n: u64) -> Self {
        Self(self.0.saturating_sub(n))
    }
}

impl From<u64> for BlockNumber {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl From<BlockNumber> for u64 {
    fn from(b: BlockNumber) -> Self {
        b.0
    }
}

impl From<BlockNumber> for i64 {
    #[allow(clippy::cast_possible_wrap)]
    fn from(b: BlockNumber) -> Self {
        b.0 as Self
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
