//! E2E Test Suite: Streaming XXH32 collaborator
//!
//! Validates the checksum state machine against the one-shot reference:
//! parity across chunked feeding, the finalize-once contract, and reset
//! semantics.

use lz4stream::{xxh32_oneshot, AlreadyFinalized, StreamingXxh32};

#[test]
fn test_known_parity_vector_for_empty_input() {
    assert_eq!(xxh32_oneshot(b"", 0), 0x02CC_5D05);
    let mut hasher = StreamingXxh32::new(0);
    assert_eq!(hasher.value().unwrap(), 0x02CC_5D05);
}

#[test]
fn test_streaming_parity_across_chunk_sizes() {
    let data: Vec<u8> = (0u8..=255).cycle().take(100_000).collect();
    let expected = xxh32_oneshot(&data, 0);
    for chunk_size in [1usize, 3, 64, 4096, 100_000] {
        let mut hasher = StreamingXxh32::new(0);
        for chunk in data.chunks(chunk_size) {
            hasher.update(chunk).unwrap();
        }
        assert_eq!(
            hasher.value().unwrap(),
            expected,
            "chunk size {} diverged",
            chunk_size
        );
    }
}

#[test]
fn test_seed_changes_the_value() {
    let data = b"seeded hashing";
    assert_ne!(xxh32_oneshot(data, 0), xxh32_oneshot(data, 1));
}

#[test]
fn test_value_invalidates_the_state() {
    let mut hasher = StreamingXxh32::new(0);
    hasher.update(b"once").unwrap();
    let _ = hasher.value().unwrap();
    assert_eq!(hasher.value(), Err(AlreadyFinalized));
    assert_eq!(hasher.update(b"again"), Err(AlreadyFinalized));
}

#[test]
fn test_reset_restores_a_usable_state() {
    let mut hasher = StreamingXxh32::new(99);
    hasher.update(b"abc").unwrap();
    let first = hasher.value().unwrap();
    assert_eq!(hasher.update(b"x"), Err(AlreadyFinalized));

    hasher.reset();
    hasher.update(b"abc").unwrap();
    assert_eq!(hasher.value().unwrap(), first);
}

#[test]
fn test_reset_mid_stream_discards_fed_data() {
    let mut hasher = StreamingXxh32::new(0);
    hasher.update(b"to be discarded").unwrap();
    hasher.reset();
    hasher.update(b"kept").unwrap();
    assert_eq!(hasher.value().unwrap(), xxh32_oneshot(b"kept", 0));
}
