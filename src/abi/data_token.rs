//! ABI binding for the standard ERC-20 `Transfer` event.
//!
//! # Solidity Contract
//!
//! ```solidity
//! event Transfer(address indexed from, address indexed to, uint256 value);
//! ```

use alloy::sol;

sol! {
    /// Standard ERC20 transfer event.
    ///
    /// `from` is 0x0 for mints, `to` is the burn address for burns.
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(
        address indexed from,
        address indexed to,
        uint256 value
    );
}
