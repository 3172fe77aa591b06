//! Streaming LZ4 block encoder.
//!
//! [`StreamEncoder`] accepts an arbitrary-length byte stream incrementally,
//! keeps a bounded sliding window of recent input, and drives a
//! [`PartialCompressor`] over that window, writing compressed sequences to a
//! downstream sink as soon as enough lookahead is available.  The emitted
//! bytes concatenate into one valid LZ4 block, closed out by a literal-only
//! tail at [`close`](StreamEncoder::close).
//!
//! # Window management
//!
//! The window buffer carries two cursors: `consumed` (input already turned
//! into compressed output, retained only as back-match source material) and
//! `pending_end` (input appended but not yet compressed).  A compression pass
//! is triggered when `pending_end - consumed` reaches [`MAX_DISTANCE`] or the
//! buffer fills up.  After a pass:
//!
//! - a stall (zero output) grows the buffer if it was full, and defensively
//!   clamps the match table so no entry points past `consumed`;
//! - produced output is written downstream immediately, and once `consumed`
//!   exceeds [`MAX_DISTANCE`] the window slides: retained bytes move down to
//!   offset 0 and every match-table entry is rebased.
//!
//! The invariant after any slide is `consumed == MAX_DISTANCE`, so no emitted
//! back-reference can ever point at data that left the window.
//!
//! # Lifecycle
//!
//! The encoder owns its sink.  `close` must be called exactly once: it
//! flushes the remaining pending bytes as a literal tail and tears the sink
//! down even when the final write fails.  A second `close`, or any write
//! after close, fails with [`StreamError::Closed`].  Dropping an open encoder
//! performs a best-effort close so the sink is never leaked, but errors are
//! only observable through an explicit `close` or
//! [`finish`](StreamEncoder::finish).

use std::fmt;
use std::io::{self, Write};

use super::compress::{GreedyCompressor, PartialCompressor};
use super::types::{max_compressed_len, MatchTable, MAX_DISTANCE};

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors surfaced by [`StreamEncoder`].
///
/// The encoder performs no local recovery: every failure aborts the current
/// operation and is surfaced unchanged.  After a failure the internal state
/// is guaranteed consistent only for a subsequent `close`, not for further
/// writes.
#[derive(Debug)]
pub enum StreamError {
    /// An operation was attempted after the stream was closed.
    Closed,
    /// The downstream sink rejected a compressed-block write.  Not retried.
    SinkWrite(io::Error),
    /// Sink teardown failed.  Reported only when no earlier error occurred.
    SinkClose(io::Error),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Closed => write!(f, "stream is already closed"),
            StreamError::SinkWrite(e) => write!(f, "failed to write compressed data: {}", e),
            StreamError::SinkClose(e) => write!(f, "failed to close sink: {}", e),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Closed => None,
            StreamError::SinkWrite(e) | StreamError::SinkClose(e) => Some(e),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> io::Error {
        match e {
            StreamError::SinkWrite(inner) | StreamError::SinkClose(inner) => inner,
            StreamError::Closed => io::Error::other(StreamError::Closed),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder
// ─────────────────────────────────────────────────────────────────────────────

/// Streaming encoder producing one continuous LZ4 block.
///
/// Generic over the sink `W` and the compression primitive `C`, with
/// [`GreedyCompressor`] as the default.  Single-threaded and non-reentrant;
/// the encoder is the sole writer and sole closer of its sink.
///
/// # Example
///
/// ```
/// use lz4stream::StreamEncoder;
///
/// # fn main() -> Result<(), lz4stream::StreamError> {
/// let mut encoder = StreamEncoder::new(Vec::new());
/// encoder.write(b"hello hello hello hello hello hello")?;
/// let compressed = encoder.finish()?;
/// assert!(!compressed.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct StreamEncoder<W: Write, C: PartialCompressor = GreedyCompressor> {
    /// `None` once the stream is closed.
    sink: Option<W>,
    compressor: C,
    table: MatchTable,
    /// Window buffer; its full length is the current capacity.
    window: Vec<u8>,
    /// Compressed-output scratch, sized to the worst case for the window.
    scratch: Vec<u8>,
    /// Input below this offset has been emitted as compressed output.
    consumed: usize,
    /// Input below this offset has been appended; `[consumed, pending_end)`
    /// is awaiting compression.
    pending_end: usize,
}

impl<W: Write> StreamEncoder<W> {
    /// Creates an encoder over `sink` using the default [`GreedyCompressor`].
    pub fn new(sink: W) -> Self {
        Self::with_compressor(sink, GreedyCompressor)
    }
}

impl<W: Write, C: PartialCompressor> StreamEncoder<W, C> {
    /// Creates an encoder over `sink` driving the given compression
    /// primitive.
    ///
    /// The window starts at `2 ×` [`MAX_DISTANCE`] bytes and only ever grows
    /// (doubling); the scratch buffer is kept at the worst-case compressed
    /// size for the window.
    pub fn with_compressor(sink: W, compressor: C) -> Self {
        let capacity = 2 * MAX_DISTANCE;
        Self {
            sink: Some(sink),
            compressor,
            table: MatchTable::new(),
            window: vec![0u8; capacity],
            scratch: vec![0u8; max_compressed_len(capacity)],
            consumed: 0,
            pending_end: 0,
        }
    }

    #[inline]
    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.sink.is_none() {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    /// Appends a single byte, triggering a compression pass when the pending
    /// region reaches [`MAX_DISTANCE`] or the buffer fills up.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        self.ensure_open()?;
        // A previous pass may have produced output without freeing space;
        // keep passing until the buffer has room (a stall grows it).
        while self.pending_end == self.window.len() {
            self.encode_pass()?;
        }
        self.window[self.pending_end] = byte;
        self.pending_end += 1;
        if self.pending_end - self.consumed == MAX_DISTANCE
            || self.pending_end == self.window.len()
        {
            self.encode_pass()?;
        }
        Ok(())
    }

    /// Appends a slice, triggering compression passes at the same thresholds
    /// as [`write_byte`](Self::write_byte).
    ///
    /// Input is copied in two phases: first up to the [`MAX_DISTANCE`]
    /// pending threshold, then in whole-buffer chunks, compressing whenever
    /// the buffer fills.
    pub fn write(&mut self, mut data: &[u8]) -> Result<(), StreamError> {
        self.ensure_open()?;

        if self.pending_end - self.consumed < MAX_DISTANCE {
            let room = MAX_DISTANCE - (self.pending_end - self.consumed);
            let to_copy = data.len().min(room);
            self.window[self.pending_end..self.pending_end + to_copy]
                .copy_from_slice(&data[..to_copy]);
            self.pending_end += to_copy;
            data = &data[to_copy..];
            if self.pending_end - self.consumed == MAX_DISTANCE {
                self.encode_pass()?;
            }
        }

        while !data.is_empty() {
            let to_copy = data.len().min(self.window.len() - self.pending_end);
            self.window[self.pending_end..self.pending_end + to_copy]
                .copy_from_slice(&data[..to_copy]);
            self.pending_end += to_copy;
            data = &data[to_copy..];
            if self.pending_end == self.window.len() {
                self.encode_pass()?;
            }
        }
        Ok(())
    }

    /// Runs one compression pass over `[consumed, pending_end)` and
    /// interprets the result: advance, slide, grow, or stall.
    fn encode_pass(&mut self) -> Result<(), StreamError> {
        let (new_consumed, produced) = self.compressor.greedy_compress(
            &self.window,
            self.consumed,
            self.pending_end,
            &mut self.table,
            &mut self.scratch,
        );

        if produced == 0 {
            // Stall: not enough lookahead to close out a sequence.  Growth is
            // the only way forward when the buffer is completely full.
            if self.pending_end == self.window.len() {
                let capacity = self.window.len() * 2;
                self.window.resize(capacity, 0);
                self.scratch.resize(max_compressed_len(capacity), 0);
            }
            // Defensive clamp: the pass may have hashed positions beyond
            // new_consumed; no entry may survive pointing past it.
            if new_consumed == 0 {
                self.table.clear();
            } else {
                self.table.clamp_to(new_consumed);
            }
            self.consumed = new_consumed;
        } else {
            match self.sink.as_mut() {
                Some(sink) => sink
                    .write_all(&self.scratch[..produced])
                    .map_err(StreamError::SinkWrite)?,
                None => return Err(StreamError::Closed),
            }
            self.consumed = new_consumed;

            if self.consumed > MAX_DISTANCE {
                // Slide: keep exactly MAX_DISTANCE bytes of history.
                let shift = self.consumed - MAX_DISTANCE;
                self.window.copy_within(shift..self.pending_end, 0);
                self.pending_end -= shift;
                self.consumed = MAX_DISTANCE;
                self.table.rebase(shift, self.consumed);
            } else {
                self.table.clamp_to(self.consumed);
            }
        }
        Ok(())
    }

    /// Final forced flush: one normal pass, then the pending remainder as a
    /// literal-only tail.  Always produces output, so close terminates even
    /// when a normal pass would stall.
    fn flush_tail(&mut self) -> Result<(), StreamError> {
        self.encode_pass()?;
        let produced = self.compressor.last_literals(
            &self.window,
            self.consumed,
            self.pending_end,
            &mut self.scratch,
        );
        self.consumed = self.pending_end;
        match self.sink.as_mut() {
            Some(sink) => sink
                .write_all(&self.scratch[..produced])
                .map_err(StreamError::SinkWrite),
            None => Err(StreamError::Closed),
        }
    }

    /// Flushes the literal tail and tears the sink down.
    ///
    /// Teardown is attempted even when the final pass or tail write failed;
    /// the first error encountered is the one reported, and
    /// [`StreamError::SinkClose`] only surfaces when nothing failed earlier.
    /// A second `close` fails with [`StreamError::Closed`].
    pub fn close(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        let flushed = self.flush_tail();
        let teardown = match self.sink.take() {
            Some(mut sink) => sink.flush().map_err(StreamError::SinkClose),
            None => Ok(()),
        };
        flushed.and(teardown)
    }

    /// Like [`close`](Self::close), but consumes the encoder and returns the
    /// sink on success.
    pub fn finish(mut self) -> Result<W, StreamError> {
        self.ensure_open()?;
        let flushed = self.flush_tail();
        match self.sink.take() {
            Some(mut sink) => {
                let teardown = sink.flush().map_err(StreamError::SinkClose);
                flushed.and(teardown)?;
                Ok(sink)
            }
            None => Err(StreamError::Closed),
        }
    }
}

impl<W: Write, C: PartialCompressor> Drop for StreamEncoder<W, C> {
    /// Best-effort close so the tail is not silently lost and the sink is
    /// released on every exit path.  Errors are ignored here; call
    /// [`close`](Self::close) or [`finish`](Self::finish) to observe them.
    fn drop(&mut self) {
        if self.sink.is_some() {
            let _ = self.close();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests (require field access)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Sink handing its bytes back through a shared handle, so tests can
    /// inspect output after the encoder tears the sink down.
    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn patterned(len: usize) -> Vec<u8> {
        b"The quick brown fox jumps over the lazy dog. "
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn window_invariant_holds_across_passes() {
        let mut encoder = StreamEncoder::new(io::sink());
        let data = patterned(5 * MAX_DISTANCE);
        for chunk in data.chunks(8192) {
            encoder.write(chunk).unwrap();
            assert!(encoder.consumed <= MAX_DISTANCE);
            assert!(encoder.consumed <= encoder.pending_end);
            assert!(encoder.pending_end <= encoder.window.len());
            let consumed = encoder.consumed as u32;
            assert!(
                encoder.table.entries().iter().all(|&e| e <= consumed),
                "match-table entry above consumed"
            );
        }
        encoder.close().unwrap();
    }

    #[test]
    fn consecutive_stalls_do_not_corrupt_the_table() {
        let out = SharedSink::default();
        let mut encoder = StreamEncoder::new(out.clone());
        encoder.write(b"abcd").unwrap();

        // Force two passes over a region too short to compress.
        encoder.encode_pass().unwrap();
        encoder.encode_pass().unwrap();
        assert_eq!(encoder.consumed, 0);
        assert!(encoder.table.entries().iter().all(|&e| e == 0));

        // A later pass over real data must still work at valid offsets.
        let data = patterned(MAX_DISTANCE);
        encoder.write(&data).unwrap();
        assert!(encoder.consumed > 0);
        encoder.close().unwrap();
        assert!(!out.0.borrow().is_empty());
    }

    #[test]
    fn close_twice_fails_with_closed() {
        let mut encoder = StreamEncoder::new(io::sink());
        encoder.write(b"some bytes").unwrap();
        encoder.close().unwrap();
        assert!(matches!(encoder.close(), Err(StreamError::Closed)));
    }

    #[test]
    fn write_after_close_fails_with_closed() {
        let mut encoder = StreamEncoder::new(io::sink());
        encoder.close().unwrap();
        assert!(matches!(encoder.write(b"x"), Err(StreamError::Closed)));
        assert!(matches!(encoder.write_byte(b'x'), Err(StreamError::Closed)));
    }

    #[test]
    fn empty_stream_close_emits_a_bare_literal_token() {
        let out = SharedSink::default();
        let mut encoder = StreamEncoder::new(out.clone());
        encoder.close().unwrap();
        assert_eq!(out.0.borrow().as_slice(), &[0x00]);
    }

    #[test]
    fn drop_flushes_the_tail() {
        let out = SharedSink::default();
        {
            let mut encoder = StreamEncoder::new(out.clone());
            encoder.write(b"tail bytes").unwrap();
            // no close: Drop must flush
        }
        assert!(!out.0.borrow().is_empty());
    }

    #[test]
    fn drop_after_close_does_nothing_further() {
        let out = SharedSink::default();
        {
            let mut encoder = StreamEncoder::new(out.clone());
            encoder.write(b"payload").unwrap();
            encoder.close().unwrap();
        }
        // One literal tail only; Drop must not emit a second one.
        let bytes = out.0.borrow();
        let count = bytes.iter().filter(|&&b| b == b'p').count();
        assert_eq!(count, 1);
    }

    #[test]
    fn slide_keeps_exactly_max_distance_of_history() {
        let mut encoder = StreamEncoder::new(io::sink());
        // Highly compressible input drives consumed past MAX_DISTANCE fast.
        encoder.write(&vec![0u8; 4 * MAX_DISTANCE]).unwrap();
        assert!(encoder.consumed <= MAX_DISTANCE);
        encoder.close().unwrap();
    }

    #[test]
    fn growth_doubles_capacity_and_rebounds_scratch() {
        let mut encoder = StreamEncoder::new(io::sink());
        let initial = encoder.window.len();
        // Incompressible input: every pass stalls, so a full buffer grows.
        let mut state = 0x9E37_79B9u64;
        let noise: Vec<u8> = (0..3 * initial)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                (state >> 33) as u8
            })
            .collect();
        encoder.write(&noise).unwrap();
        assert!(encoder.window.len() > initial);
        assert_eq!(
            encoder.scratch.len(),
            max_compressed_len(encoder.window.len())
        );
        encoder.close().unwrap();
    }

    #[test]
    fn finish_returns_the_sink() {
        let mut encoder = StreamEncoder::new(Vec::new());
        encoder.write(b"hello hello hello hello").unwrap();
        let out = encoder.finish().unwrap();
        assert!(!out.is_empty());
    }
}
