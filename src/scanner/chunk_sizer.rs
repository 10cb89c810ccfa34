//! Adaptive chunk sizing heuristic.
//!
//! Grounded in `original_source/event_filter.py`'s `estimate_next_chunk_size`:
//! expand aggressively over empty ranges, collapse the moment logs are found
//! so a dense region isn't scanned in one giant, slow chunk.

/// Stateless chunk-size estimator.
///
/// The sizer never reacts to latency or transport errors — that's
/// [`crate::scanner::LogFetcher`]'s job. It only reacts to whether the
/// previous chunk found anything.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSizer {
    min_chunk: u64,
    max_chunk: u64,
}

impl ChunkSizer {
    /// Construct a sizer bounded to `[min_chunk, max_chunk]`.
    #[must_use]
    pub const fn new(min_chunk: u64, max_chunk: u64) -> Self {
        Self {
            min_chunk,
            max_chunk,
        }
    }

    /// Compute the next chunk size given the current one and how many logs
    /// the last chunk returned.
    ///
    /// - `hit_count > 0` collapses to `min_chunk`.
    /// - `hit_count == 0` doubles `current`.
    /// - Result is always clamped to `[min_chunk, max_chunk]`.
    #[must_use]
    pub fn next_size(self, current: u64, hit_count: usize) -> u64 {
        let next = if hit_count > 0 {
            self.min_chunk
        } else {
            current.saturating_mul(2)
        };
        next.clamp(self.min_chunk, self.max_chunk)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn hit_collapses_to_min() {
        let sizer = ChunkSizer::new(10, 1000);
        assert_eq!(sizer.next_size(640, 3), 10);
    }

    #[test]
    fn empty_doubles() {
        let sizer = ChunkSizer::new(10, 1000);
        assert_eq!(sizer.next_size(20, 0), 40);
    }

    #[test]
    fn scenario_five_hit_then_empty_sizing() {
        let sizer = ChunkSizer::new(10, 1000);
        let mut size = 20;
        for expected in [40, 80, 160, 320, 640, 1000] {
            size = sizer.next_size(size, 0);
            assert_eq!(size, expected);
        }
        assert_eq!(sizer.next_size(size, 3), 10);
    }

    proptest! {
        #[test]
        fn sizer_bounds(current in 1u64..10_000, hit_count in 0usize..100) {
            let sizer = ChunkSizer::new(10, 1000);
            let next = sizer.next_size(current, hit_count);
            prop_assert!(next >= 10 && next <= 1000);
        }
    }
}
