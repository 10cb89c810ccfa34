//! ABI bindings for supported on-chain events.
//!
//! Events are decoded from raw logs using the `SolEvent` trait:
//!
//! ```ignore
//! use alloy::sol_types::SolEvent;
//! use evmscan::abi::Transfer;
//!
//! let event = Transfer::decode_log(&log.inner, true)?;
//! println!("{} -> {}: {}", event.from, event.to, event.value);
//! ```
//!
//! Adding a new [`crate::types::EventSchema`] variant means adding a sibling
//! module here with its own `alloy::sol!` binding.

pub mod data_token;

pub use data_token::Transfer;

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolEvent;

    use super::*;

    #[test]
    fn transfer_signature_hash_is_32_bytes() {
        assert_eq!(Transfer::SIGNATURE_HASH.as_slice().len(), 32);
    }

    #[test]
    fn event_schema_topic0_matches_binding() {
        assert_eq!(
            crate::types::EventSchema::Erc20Transfer.topic0(),
            Transfer::SIGNATURE_HASH
        );
    }
}
