//! E2E Test Suite: Streaming round-trip
//!
//! Feeds byte streams of varying shapes through [`StreamEncoder`] and decodes
//! the emitted block with a reference decoder, validating:
//! - Lossless round-trips for empty, tiny, and longer-than-window inputs
//! - Byte-at-a-time and chunked write paths
//! - Buffer growth (incompressible input) without data loss
//! - Window sliding (long compressible input) without invalid references

use lz4stream::{StreamEncoder, MAX_DISTANCE};

// ─────────────────────────────────────────────────────────────────────────────
// Reference decoder
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes one LZ4 block, panicking on any malformed sequence.  Kept exact
/// and slow on purpose: it is the oracle for the round-trip property.
fn decode_block(mut input: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        assert!(!input.is_empty(), "block ended without a final literal run");
        let token = input[0];
        input = &input[1..];

        let mut lit_len = (token >> 4) as usize;
        if lit_len == 15 {
            loop {
                let b = input[0];
                input = &input[1..];
                lit_len += b as usize;
                if b != 255 {
                    break;
                }
            }
        }
        out.extend_from_slice(&input[..lit_len]);
        input = &input[lit_len..];

        if input.is_empty() {
            break; // final literal-only sequence
        }

        let offset = u16::from_le_bytes([input[0], input[1]]) as usize;
        input = &input[2..];
        assert!(offset >= 1, "zero match offset");
        assert!(offset <= out.len(), "match offset {} reaches before the stream", offset);

        let mut match_len = (token & 0x0F) as usize + 4;
        if token & 0x0F == 15 {
            loop {
                let b = input[0];
                input = &input[1..];
                match_len += b as usize;
                if b != 255 {
                    break;
                }
            }
        }
        let start = out.len() - offset;
        for i in 0..match_len {
            let byte = out[start + i];
            out.push(byte);
        }
    }
    out
}

/// Deterministic pseudo-random bytes (effectively incompressible).
fn noise(len: usize, mut state: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

fn text(len: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

fn roundtrip(data: &[u8]) -> Vec<u8> {
    let mut encoder = StreamEncoder::new(Vec::new());
    encoder.write(data).expect("write failed");
    let compressed = encoder.finish().expect("finish failed");
    decode_block(&compressed)
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: Degenerate streams
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_stream_roundtrip() {
    let encoder = StreamEncoder::new(Vec::new());
    let compressed = encoder.finish().expect("finish failed");
    assert_eq!(compressed, vec![0x00], "empty stream must emit a bare token");
    assert!(decode_block(&compressed).is_empty());
}

#[test]
fn test_single_byte_roundtrip() {
    assert_eq!(roundtrip(b"x"), b"x");
}

#[test]
fn test_short_ascii_roundtrip() {
    let data = b"short, unmatched payload";
    assert_eq!(roundtrip(data), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: Compressible data within one window
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_repetitive_1kb_roundtrip() {
    let data = text(1024);
    assert_eq!(roundtrip(&data), data);
}

#[test]
fn test_repetitive_data_actually_compresses() {
    let data = text(64 * 1024);
    let mut encoder = StreamEncoder::new(Vec::new());
    encoder.write(&data).unwrap();
    let compressed = encoder.finish().unwrap();
    assert!(
        compressed.len() < data.len() / 4,
        "repetitive input compressed to only {} of {} bytes",
        compressed.len(),
        data.len()
    );
    assert_eq!(decode_block(&compressed), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: Streams longer than the window (slides)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_longer_than_window_chunked_roundtrip() {
    let data = text(5 * MAX_DISTANCE + 321);
    let mut encoder = StreamEncoder::new(Vec::new());
    for chunk in data.chunks(8 * 1024) {
        encoder.write(chunk).unwrap();
    }
    let compressed = encoder.finish().unwrap();
    assert_eq!(decode_block(&compressed), data);
}

#[test]
fn test_200000_zero_bytes_scenario() {
    // Forces at least one slide; the stream must still decode exactly.
    let data = vec![0u8; 200_000];
    let mut encoder = StreamEncoder::new(Vec::new());
    encoder.write(&data).unwrap();
    let compressed = encoder.finish().unwrap();
    assert!(compressed.len() < 2048, "zeros must compress drastically");
    assert_eq!(decode_block(&compressed), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: Incompressible data (growth path)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_growth_twice_loses_nothing() {
    // 300 KB of noise pushes the window through at least two doublings
    // (128 KB → 256 KB → 512 KB) before close.
    let data = noise(300_000, 0x1234_5678_9ABC_DEF0);
    let mut encoder = StreamEncoder::new(Vec::new());
    for &b in &data {
        encoder.write_byte(b).unwrap();
    }
    let compressed = encoder.finish().unwrap();
    assert_eq!(decode_block(&compressed), data);
}

#[test]
fn test_noise_chunked_roundtrip() {
    let data = noise(192 * 1024, 42);
    let mut encoder = StreamEncoder::new(Vec::new());
    for chunk in data.chunks(1000) {
        encoder.write(chunk).unwrap();
    }
    let compressed = encoder.finish().unwrap();
    assert_eq!(decode_block(&compressed), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: Mixed shapes and write-path equivalence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_mixed_compressible_and_noise_roundtrip() {
    let mut data = text(90_000);
    data.extend_from_slice(&noise(90_000, 7));
    data.extend_from_slice(&text(90_000));
    let mut encoder = StreamEncoder::new(Vec::new());
    for chunk in data.chunks(4096) {
        encoder.write(chunk).unwrap();
    }
    let compressed = encoder.finish().unwrap();
    assert_eq!(decode_block(&compressed), data);
}

#[test]
fn test_write_chunking_never_changes_decoded_content() {
    // Pass boundaries shift with write granularity, so the compressed bytes
    // may differ; the decoded stream must not.
    let data = text(3 * MAX_DISTANCE);

    let mut by_slice = StreamEncoder::new(Vec::new());
    by_slice.write(&data).unwrap();
    let slice_out = by_slice.finish().unwrap();

    let mut by_byte = StreamEncoder::new(Vec::new());
    for &b in &data {
        by_byte.write_byte(b).unwrap();
    }
    let byte_out = by_byte.finish().unwrap();

    assert_eq!(decode_block(&slice_out), data);
    assert_eq!(decode_block(&byte_out), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: Close flushes exactly once
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_close_flushes_exactly_once() {
    let data = text(10_000);
    let compressed = {
        let mut encoder = StreamEncoder::new(Vec::new());
        encoder.write(&data).unwrap();
        encoder.finish().unwrap()
    };
    let decoded = decode_block(&compressed);
    assert_eq!(decoded.len(), data.len(), "no bytes lost or duplicated");
    assert_eq!(decoded, data);
}
