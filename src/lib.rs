//! Streaming LZ4 block compression.
//!
//! This crate implements the output path of the LZ4 algorithm as a streaming
//! encoder: bytes are accepted incrementally, buffered in a bounded sliding
//! window, and emitted to a downstream sink as compressed sequences as soon
//! as enough lookahead is available.  The complete output forms one valid
//! LZ4 block; a decoder that knows the original length reproduces the input
//! exactly.
//!
//! The crate is organized the way the engine is layered:
//!
//! - [`block::types`]: block-format constants, hashing, and the
//!   [`MatchTable`] index.
//! - [`block::compress`]: the [`PartialCompressor`] contract and the
//!   provided [`GreedyCompressor`].
//! - [`block::stream`]: [`StreamEncoder`], the windowing/orchestration core.
//! - [`xxhash`]: XXH32 helpers (one-shot and streaming with a finalize-once
//!   contract).
//!
//! # Example
//!
//! ```
//! use lz4stream::StreamEncoder;
//!
//! # fn main() -> Result<(), lz4stream::StreamError> {
//! let mut encoder = StreamEncoder::new(Vec::new());
//! encoder.write(b"an example payload, an example payload")?;
//! encoder.write_byte(b'!')?;
//! let compressed = encoder.finish()?;
//! assert!(!compressed.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod xxhash;

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use block::compress::{GreedyCompressor, PartialCompressor};
pub use block::stream::{StreamEncoder, StreamError};
pub use block::types::{max_compressed_len, MatchTable, MAX_DISTANCE};
pub use xxhash::{xxh32_oneshot, AlreadyFinalized, StreamingXxh32};
