//! Binary search for a contract's creation block.
//!
//! Grounded in `original_source/event_filter.py`'s recursive
//! `get_contract_creation_block`, rewritten as an iterative loop — the
//! idiomatic shape for a bounded binary search in Rust.

use tracing::{debug, instrument};

use crate::error::{Result, ScannerError};
use crate::ports::chain::ChainClient;
use crate::types::{BlockNumber, EthAddress};

/// Locates the block at which a contract's bytecode first appears.
pub struct CreationLocator<'a, C> {
    chain: &'a C,
}

impl<'a, C: ChainClient> CreationLocator<'a, C> {
    /// Wrap a chain client to search with.
    #[must_use]
    pub const fn new(chain: &'a C) -> Self {
        Self { chain }
    }

    /// Find the smallest `h` in `[lo, hi]` such that `code_at(address, h)` is
    /// non-empty and `code_at(address, h-1)` is empty.
    ///
    /// # Preconditions
    ///
    /// `code_at(lo)` must be empty and `code_at(hi)` must be non-empty; a
    /// violated precondition surfaces as [`ScannerError::CreationBlockNotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if the binary search can't converge, or if a
    /// `code_at` call fails.
    #[instrument(skip(self), fields(%address, lo = lo.get(), hi = hi.get()))]
    pub async fn locate(
        &self,
        address: EthAddress,
        lo: BlockNumber,
        hi: BlockNumber,
    ) -> Result<BlockNumber> {
        let mut lo = lo.get();
        let mut hi = hi.get();

        if lo >= hi {
            return Err(ScannerError::CreationBlockNotFound {
                address: address.to_hex(),
                low: lo,
                high: hi,
            }
            .into());
        }

        loop {
            // Below this width, `mid = lo + (hi - lo) / 2` can land back on
            // `lo` (floor division) and never make progress toward `hi`. Test
            // the narrow interval directly instead of bisecting it.
            if hi - lo <= 2 {
                if hi - lo == 2 {
                    let candidate = lo + 1;
                    let candidate_code = self
                        .chain
                        .code_at(address, BlockNumber::new(candidate))
                        .await?;
                    if !candidate_code.is_empty() {
                        return Ok(BlockNumber::new(candidate));
                    }
                }
                // Preconditions guarantee `code_at(hi)` is non-empty and
                // `code_at(hi - 1)` is empty whenever no earlier candidate matched.
                return Ok(BlockNumber::new(hi));
            }

            let mid = lo + (hi - lo) / 2;
            let mid_code = self.chain.code_at(address, BlockNumber::new(mid)).await?;
            let prev_code = self
                .chain
                .code_at(address, BlockNumber::new(mid.saturating_sub(1)))
                .await?;

            let mid_has_code = !mid_code.is_empty();
            let prev_has_code = !prev_code.is_empty();

            debug!(mid, mid_has_code, prev_has_code, "creation search step");

            match (mid_has_code, prev_has_code) {
                (true, false) => return Ok(BlockNumber::new(mid)),
                (true, true) => hi = mid,
                (false, _) => lo = mid,
            }
        }
    }
}
