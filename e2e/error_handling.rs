//! E2E Test Suite: Error handling
//!
//! Validates the failure surface of [`StreamEncoder`]:
//! - `Closed` on any operation after close, and on a second close
//! - `SinkWrite` propagated unchanged, never retried
//! - `SinkClose` reported only when nothing failed earlier
//! - Sink teardown attempted on every close path
//! - Drop never panics, even with a failing sink

use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use lz4stream::{StreamEncoder, StreamError, MAX_DISTANCE};

// ─────────────────────────────────────────────────────────────────────────────
// Failing sinks
// ─────────────────────────────────────────────────────────────────────────────

/// Accepts up to `accept` bytes, then fails every write.  Flush behavior is
/// configurable so close-path precedence can be probed independently.
struct FaultySink {
    accept: usize,
    taken: usize,
    fail_flush: bool,
    flushes: Rc<Cell<u32>>,
}

impl FaultySink {
    fn failing_after(accept: usize) -> Self {
        Self {
            accept,
            taken: 0,
            fail_flush: false,
            flushes: Rc::new(Cell::new(0)),
        }
    }

    fn failing_flush() -> Self {
        Self {
            accept: usize::MAX,
            taken: 0,
            fail_flush: true,
            flushes: Rc::new(Cell::new(0)),
        }
    }
}

impl Write for FaultySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.taken + buf.len() > self.accept {
            return Err(io::Error::other("sink rejected write"));
        }
        self.taken += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes.set(self.flushes.get() + 1);
        if self.fail_flush {
            Err(io::Error::other("sink rejected flush"))
        } else {
            Ok(())
        }
    }
}

fn compressible(len: usize) -> Vec<u8> {
    b"abcdabcdabcd....abcdabcd"
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: Closed-stream surface
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_second_close_fails_with_closed() {
    let mut encoder = StreamEncoder::new(io::sink());
    encoder.write(b"data").unwrap();
    encoder.close().unwrap();
    assert!(matches!(encoder.close(), Err(StreamError::Closed)));
}

#[test]
fn test_operations_after_close_fail_with_closed() {
    let mut encoder = StreamEncoder::new(io::sink());
    encoder.close().unwrap();
    assert!(matches!(encoder.write(b"late"), Err(StreamError::Closed)));
    assert!(matches!(encoder.write_byte(0), Err(StreamError::Closed)));
}

#[test]
fn test_close_after_finish_is_unreachable_by_construction() {
    // finish() consumes the encoder, so the type system already rules the
    // second close out; this documents the close()-then-finish() ordering.
    let mut encoder = StreamEncoder::new(Vec::new());
    encoder.close().unwrap();
    assert!(matches!(encoder.finish(), Err(StreamError::Closed)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: Sink write failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_sink_write_failure_surfaces_from_write() {
    // Enough compressible input to trigger a mid-stream pass; the sink
    // rejects everything, so the pass must abort with SinkWrite.
    let mut encoder = StreamEncoder::new(FaultySink::failing_after(0));
    let data = compressible(2 * MAX_DISTANCE);
    let result = encoder.write(&data);
    assert!(matches!(result, Err(StreamError::SinkWrite(_))));
}

#[test]
fn test_sink_write_failure_surfaces_from_close() {
    // Small input never triggers a mid-stream pass; the failure shows up
    // when close writes the literal tail.
    let mut encoder = StreamEncoder::new(FaultySink::failing_after(0));
    encoder.write(b"tiny tail").unwrap();
    assert!(matches!(encoder.close(), Err(StreamError::SinkWrite(_))));
}

#[test]
fn test_sink_write_error_carries_the_io_source() {
    let mut encoder = StreamEncoder::new(FaultySink::failing_after(0));
    encoder.write(b"tiny tail").unwrap();
    match encoder.close() {
        Err(StreamError::SinkWrite(e)) => {
            assert_eq!(e.to_string(), "sink rejected write");
        }
        other => panic!("expected SinkWrite, got {:?}", other),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: Close-path error precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_sink_close_reported_when_nothing_failed_earlier() {
    let mut encoder = StreamEncoder::new(FaultySink::failing_flush());
    encoder.write(b"payload").unwrap();
    assert!(matches!(encoder.close(), Err(StreamError::SinkClose(_))));
}

#[test]
fn test_earlier_write_failure_wins_over_close_failure() {
    let mut sink = FaultySink::failing_after(0);
    sink.fail_flush = true;
    let mut encoder = StreamEncoder::new(sink);
    encoder.write(b"payload").unwrap();
    // Both the tail write and the flush fail; the write error is first.
    assert!(matches!(encoder.close(), Err(StreamError::SinkWrite(_))));
}

#[test]
fn test_teardown_attempted_even_when_tail_write_fails() {
    let mut sink = FaultySink::failing_after(0);
    let flushes = Rc::clone(&sink.flushes);
    let mut encoder = StreamEncoder::new(sink);
    encoder.write(b"payload").unwrap();
    let _ = encoder.close();
    assert_eq!(flushes.get(), 1, "sink flush must still be attempted");
}

#[test]
fn test_stream_is_closed_after_a_failed_close() {
    let mut encoder = StreamEncoder::new(FaultySink::failing_after(0));
    encoder.write(b"payload").unwrap();
    assert!(encoder.close().is_err());
    // The failed close still transitioned the stream to Closed.
    assert!(matches!(encoder.close(), Err(StreamError::Closed)));
    assert!(matches!(encoder.write(b"x"), Err(StreamError::Closed)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: Drop behavior under failure
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_drop_with_failing_sink_does_not_panic() {
    let mut encoder = StreamEncoder::new(FaultySink::failing_after(0));
    encoder.write(b"doomed tail").unwrap();
    drop(encoder);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: Error type surface
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_display_messages_name_the_failure() {
    assert_eq!(StreamError::Closed.to_string(), "stream is already closed");
    let write_err = StreamError::SinkWrite(io::Error::other("boom"));
    assert!(write_err.to_string().contains("boom"));
}

#[test]
fn test_conversion_into_io_error_preserves_the_inner_error() {
    let inner = io::Error::new(io::ErrorKind::BrokenPipe, "pipe gone");
    let converted: io::Error = StreamError::SinkWrite(inner).into();
    assert_eq!(converted.kind(), io::ErrorKind::BrokenPipe);
}
