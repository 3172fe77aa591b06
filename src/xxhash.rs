//! Thin wrapper around the `xxhash-rust` crate providing the XXH32 API used
//! alongside the encoder: a one-shot helper and a streaming state with a
//! finalize-once contract.

use std::fmt;

use xxhash_rust::xxh32::Xxh32;

/// One-shot XXH32 hash.
///
/// # Parity vectors
/// * `xxh32_oneshot(b"", 0)` == `0x02CC5D05`
#[inline]
pub fn xxh32_oneshot(data: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(data, seed)
}

/// Error returned when a [`StreamingXxh32`] is used again after
/// [`value`](StreamingXxh32::value) consumed its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyFinalized;

impl fmt::Display for AlreadyFinalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "checksum value has already been taken; call reset first")
    }
}

impl std::error::Error for AlreadyFinalized {}

/// Incremental XXH32 over fed byte ranges.
///
/// [`value`](Self::value) is single-use per [`reset`](Self::reset): taking
/// the value consumes the live state, and a subsequent `update` or second
/// `value` without an intervening `reset` fails with [`AlreadyFinalized`].
/// `reset` is idempotent and re-arms the state with the original seed.
/// Dropping the struct releases whatever state is held, finalized or not.
pub struct StreamingXxh32 {
    seed: u32,
    state: Option<Xxh32>,
}

impl StreamingXxh32 {
    /// Creates a live checksum state with the given seed.
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            state: Some(Xxh32::new(seed)),
        }
    }

    /// Discards any current state and starts a fresh one with the original
    /// seed.  Safe to call at any point, any number of times.
    pub fn reset(&mut self) {
        self.state = Some(Xxh32::new(self.seed));
    }

    /// Feeds `data` into the running hash.
    pub fn update(&mut self, data: &[u8]) -> Result<(), AlreadyFinalized> {
        match self.state.as_mut() {
            Some(state) => {
                state.update(data);
                Ok(())
            }
            None => Err(AlreadyFinalized),
        }
    }

    /// Finalizes and returns the hash of everything fed since the last
    /// `reset`, consuming the state.
    pub fn value(&mut self) -> Result<u32, AlreadyFinalized> {
        match self.state.take() {
            Some(state) => Ok(state.digest()),
            None => Err(AlreadyFinalized),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_parity_vector() {
        assert_eq!(xxh32_oneshot(b"", 0), 0x02CC_5D05);
    }

    #[test]
    fn streaming_matches_oneshot() {
        let data = b"streaming checksums should match one-shot checksums";
        let mut hasher = StreamingXxh32::new(0);
        for chunk in data.chunks(7) {
            hasher.update(chunk).unwrap();
        }
        assert_eq!(hasher.value().unwrap(), xxh32_oneshot(data, 0));
    }

    #[test]
    fn value_is_single_use() {
        let mut hasher = StreamingXxh32::new(42);
        hasher.update(b"abc").unwrap();
        hasher.value().unwrap();
        assert_eq!(hasher.value(), Err(AlreadyFinalized));
        assert_eq!(hasher.update(b"more"), Err(AlreadyFinalized));
    }

    #[test]
    fn reset_rearms_after_finalization() {
        let mut hasher = StreamingXxh32::new(7);
        hasher.update(b"first").unwrap();
        let first = hasher.value().unwrap();
        hasher.reset();
        hasher.update(b"first").unwrap();
        assert_eq!(hasher.value().unwrap(), first);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut hasher = StreamingXxh32::new(0);
        hasher.reset();
        hasher.reset();
        hasher.update(b"data").unwrap();
        assert_eq!(hasher.value().unwrap(), xxh32_oneshot(b"data", 0));
    }
}
