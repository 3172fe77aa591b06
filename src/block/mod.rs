//! LZ4 block-format engine: the streaming encoder, its compression
//! primitive, and the shared match-index types.

pub mod compress;
pub mod stream;
pub mod types;

// Re-export the most important public API items at the module level.
pub use compress::{GreedyCompressor, PartialCompressor};
pub use stream::{StreamEncoder, StreamError};
pub use types::{max_compressed_len, MatchTable, MAX_DISTANCE};
