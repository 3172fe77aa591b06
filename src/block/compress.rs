//! The compression primitive: greedy LZ4 sequence emission over a window.
//!
//! The streaming encoder does not search for matches itself; it drives an
//! implementation of [`PartialCompressor`] over its window buffer.  The
//! contract is deliberately narrow:
//!
//! - [`PartialCompressor::greedy_compress`] emits complete LZ4 sequences
//!   (literal run + match) for the pending region and reports how far it got,
//!   leaving the unemitted tail for a later pass once more input arrives.
//! - [`PartialCompressor::last_literals`] closes the block out with a
//!   literal-only sequence; the encoder calls it exactly once, at close.
//!
//! [`GreedyCompressor`] is the provided implementation: a safe, slice-based
//! greedy matcher using multiplicative hashing and skip-trigger acceleration
//! over incompressible input.  Alternative implementations (e.g. an
//! accelerated one) can be substituted without touching the encoder.

use super::types::{
    hash, read_u32, MatchTable, LASTLITERALS, MAX_DISTANCE, MFLIMIT, MINMATCH, MIN_LENGTH,
    ML_BITS, ML_MASK, RUN_MASK, SKIP_TRIGGER,
};

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Capability consumed by the streaming encoder to turn window bytes into
/// compressed sequences.
///
/// Implementations must be deterministic (identical window contents and table
/// state produce identical output) and must never emit a back-reference with
/// distance zero or `>=` [`MAX_DISTANCE`].
pub trait PartialCompressor {
    /// Greedily compresses the region `[consumed, pending_end)` of `window`
    /// into `dst`, updating `table` with the window offsets of hashed
    /// positions.
    ///
    /// Returns `(new_consumed, produced)`: the offset up to which input has
    /// been turned into sequences, and the number of bytes written to `dst`.
    /// `produced == 0` means a stall: not enough lookahead existed to safely
    /// close out a sequence, and `new_consumed` equals `consumed`.
    ///
    /// `dst` must hold at least
    /// [`max_compressed_len`](super::types::max_compressed_len)`(pending_end - consumed)`
    /// bytes; the encoder always supplies a worst-case scratch buffer.
    ///
    /// Every table entry read must be `<= consumed` on entry; the encoder
    /// guarantees this by clamping the table after each pass.
    fn greedy_compress(
        &self,
        window: &[u8],
        consumed: usize,
        pending_end: usize,
        table: &mut MatchTable,
        dst: &mut [u8],
    ) -> (usize, usize);

    /// Emits `[consumed, pending_end)` as a single literal-only sequence into
    /// `dst` and returns its length.  An empty region produces the one-byte
    /// zero token, which decodes to nothing.
    ///
    /// Unlike [`greedy_compress`](Self::greedy_compress) this always produces
    /// output, which is what guarantees `close` terminates.
    fn last_literals(
        &self,
        window: &[u8],
        consumed: usize,
        pending_end: usize,
        dst: &mut [u8],
    ) -> usize;
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequence-encoding helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Writes the extended-length bytes for a run or match length that overflowed
/// its token nibble.  Returns the updated output offset.
#[inline]
fn write_len(mut len: usize, dst: &mut [u8], mut d_off: usize) -> usize {
    while len >= 255 {
        dst[d_off] = 255;
        d_off += 1;
        len -= 255;
    }
    dst[d_off] = len as u8;
    d_off + 1
}

/// Counts how many bytes starting at `s_off` match the bytes starting at
/// `m_off`, stopping before `limit`.  The regions may overlap (`m_off` is
/// always behind `s_off`), which is how short-distance repetitions extend.
#[inline]
fn count_matching(src: &[u8], mut m_off: usize, mut s_off: usize, limit: usize) -> usize {
    let start = s_off;
    while s_off < limit && src[m_off] == src[s_off] {
        m_off += 1;
        s_off += 1;
    }
    s_off - start
}

// ─────────────────────────────────────────────────────────────────────────────
// Greedy implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Safe, slice-based greedy matcher.
///
/// Matches are found through [`MatchTable`] lookups over 4-byte-group hashes,
/// extended backwards into the pending literal run and forwards up to the
/// last-literals limit.  Positions are skipped at an accelerating stride when
/// no matches are being found, so incompressible input is scanned cheaply.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyCompressor;

impl PartialCompressor for GreedyCompressor {
    fn greedy_compress(
        &self,
        window: &[u8],
        consumed: usize,
        pending_end: usize,
        table: &mut MatchTable,
        dst: &mut [u8],
    ) -> (usize, usize) {
        debug_assert!(consumed <= pending_end && pending_end <= window.len());

        if pending_end - consumed < MIN_LENGTH {
            return (consumed, 0);
        }

        let src = window;
        // Matches may not start past mf_limit nor extend past match_limit,
        // keeping the end-of-block restrictions satisfiable for the final
        // literal tail.
        let mf_limit = pending_end - MFLIMIT;
        let match_limit = pending_end - LASTLITERALS;

        let mut s_off = consumed;
        let mut anchor = consumed;
        let mut d_off = 0usize;

        'sequences: loop {
            // ── Find a match ────────────────────────────────────────────────
            let mut step = 1usize;
            let mut search_match_nb = 1usize << SKIP_TRIGGER;
            let mut forward = s_off;
            let mut m_off;
            loop {
                s_off = forward;
                forward += step;
                step = search_match_nb >> SKIP_TRIGGER;
                search_match_nb += 1;
                if forward > mf_limit {
                    break 'sequences;
                }

                let h = hash(read_u32(src, s_off));
                let candidate = table.get(h);
                table.put(h, s_off);
                if candidate < s_off
                    && s_off - candidate < MAX_DISTANCE
                    && read_u32(src, candidate) == read_u32(src, s_off)
                {
                    m_off = candidate;
                    break;
                }
            }

            // ── Extend the match backwards into the literal run ─────────────
            while s_off > anchor && m_off > 0 && src[s_off - 1] == src[m_off - 1] {
                s_off -= 1;
                m_off -= 1;
            }

            // ── Emit the literal run ────────────────────────────────────────
            let run_len = s_off - anchor;
            let mut token_off = d_off;
            d_off += 1;
            if run_len >= RUN_MASK {
                dst[token_off] = (RUN_MASK as u8) << ML_BITS;
                d_off = write_len(run_len - RUN_MASK, dst, d_off);
            } else {
                dst[token_off] = (run_len as u8) << ML_BITS;
            }
            dst[d_off..d_off + run_len].copy_from_slice(&src[anchor..s_off]);
            d_off += run_len;

            // ── Emit the match, then any back-to-back follow-up matches ─────
            loop {
                let distance = s_off - m_off;
                dst[d_off] = distance as u8;
                dst[d_off + 1] = (distance >> 8) as u8;
                d_off += 2;

                s_off += MINMATCH;
                m_off += MINMATCH;
                let match_len = count_matching(src, m_off, s_off, match_limit);
                s_off += match_len;

                if match_len >= ML_MASK {
                    dst[token_off] |= ML_MASK as u8;
                    d_off = write_len(match_len - ML_MASK, dst, d_off);
                } else {
                    dst[token_off] |= match_len as u8;
                }

                anchor = s_off;
                if s_off > mf_limit {
                    break 'sequences;
                }

                // Keep the table fresh across the span the match skipped.
                let h = hash(read_u32(src, s_off - 2));
                table.put(h, s_off - 2);

                // A match starting immediately gets a zero-literal token.
                let h = hash(read_u32(src, s_off));
                let candidate = table.get(h);
                table.put(h, s_off);
                if candidate < s_off
                    && s_off - candidate < MAX_DISTANCE
                    && read_u32(src, candidate) == read_u32(src, s_off)
                {
                    m_off = candidate;
                    token_off = d_off;
                    d_off += 1;
                    dst[token_off] = 0;
                    continue;
                }
                break;
            }
        }

        (anchor, d_off)
    }

    fn last_literals(
        &self,
        window: &[u8],
        consumed: usize,
        pending_end: usize,
        dst: &mut [u8],
    ) -> usize {
        let run = &window[consumed..pending_end];
        let run_len = run.len();

        let mut d_off = 1;
        if run_len >= RUN_MASK {
            dst[0] = (RUN_MASK as u8) << ML_BITS;
            d_off = write_len(run_len - RUN_MASK, dst, d_off);
        } else {
            dst[0] = (run_len as u8) << ML_BITS;
        }
        dst[d_off..d_off + run_len].copy_from_slice(run);
        d_off + run_len
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::types::max_compressed_len;

    fn scratch_for(region: usize) -> Vec<u8> {
        vec![0u8; max_compressed_len(region)]
    }

    #[test]
    fn stalls_below_min_length() {
        let window = vec![0u8; 64];
        let mut table = MatchTable::new();
        let mut dst = scratch_for(64);
        let (new_consumed, produced) =
            GreedyCompressor.greedy_compress(&window, 0, MIN_LENGTH - 1, &mut table, &mut dst);
        assert_eq!(new_consumed, 0);
        assert_eq!(produced, 0);
    }

    #[test]
    fn compresses_a_run_of_zeros() {
        let window = vec![0u8; 1024];
        let mut table = MatchTable::new();
        let mut dst = scratch_for(1024);
        let (new_consumed, produced) =
            GreedyCompressor.greedy_compress(&window, 0, 1024, &mut table, &mut dst);
        assert!(produced > 0, "a zero run must yield at least one sequence");
        assert!(new_consumed > 0 && new_consumed <= 1024);
        // Wild expansion would mean the matcher emitted literals only.
        assert!(produced < 64, "zero run compressed to {} bytes", produced);
    }

    #[test]
    fn never_consumes_the_unsafe_tail() {
        let data: Vec<u8> = b"abcdefgh".iter().copied().cycle().take(4096).collect();
        let mut table = MatchTable::new();
        let mut dst = scratch_for(4096);
        let (new_consumed, produced) =
            GreedyCompressor.greedy_compress(&data, 0, 4096, &mut table, &mut dst);
        assert!(produced > 0);
        // LASTLITERALS bytes must remain pending for the closing literal run.
        assert!(new_consumed <= 4096 - LASTLITERALS);
    }

    #[test]
    fn stall_leaves_anchor_at_consumed() {
        // Incompressible pseudo-random bytes: no 4-byte group repeats within
        // the window, so no sequence can be emitted.
        let mut state = 0x2545_F491u64;
        let data: Vec<u8> = (0..4096)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 33) as u8
            })
            .collect();
        let mut table = MatchTable::new();
        let mut dst = scratch_for(4096);
        let (new_consumed, produced) =
            GreedyCompressor.greedy_compress(&data, 0, 4096, &mut table, &mut dst);
        if produced == 0 {
            assert_eq!(new_consumed, 0);
        }
    }

    #[test]
    fn table_entries_stay_inside_the_scanned_region() {
        let data: Vec<u8> = b"The quick brown fox jumps over the lazy dog. "
            .iter()
            .copied()
            .cycle()
            .take(8192)
            .collect();
        let mut table = MatchTable::new();
        let mut dst = scratch_for(8192);
        let (_, produced) = GreedyCompressor.greedy_compress(&data, 0, 8192, &mut table, &mut dst);
        assert!(produced > 0);
        assert!(table.entries().iter().all(|&e| (e as usize) < 8192));
    }

    #[test]
    fn last_literals_empty_region_is_a_bare_token() {
        let window = vec![0u8; 16];
        let mut dst = scratch_for(0);
        let n = GreedyCompressor.last_literals(&window, 8, 8, &mut dst);
        assert_eq!(n, 1);
        assert_eq!(dst[0], 0x00);
    }

    #[test]
    fn last_literals_short_run() {
        let window = b"0123456789".to_vec();
        let mut dst = scratch_for(10);
        let n = GreedyCompressor.last_literals(&window, 2, 7, &mut dst);
        assert_eq!(n, 1 + 5);
        assert_eq!(dst[0], 5 << ML_BITS as u8);
        assert_eq!(&dst[1..6], b"23456");
    }

    #[test]
    fn last_literals_long_run_uses_extended_length() {
        let window = vec![0xAAu8; 300];
        let mut dst = scratch_for(300);
        let n = GreedyCompressor.last_literals(&window, 0, 300, &mut dst);
        // token + two length bytes (255 + 30) + 300 literals
        assert_eq!(dst[0], (RUN_MASK as u8) << ML_BITS);
        assert_eq!(dst[1], 255);
        assert_eq!(dst[2], 30);
        assert_eq!(n, 3 + 300);
    }

    #[test]
    fn write_len_boundaries() {
        let mut dst = [0u8; 8];
        assert_eq!(write_len(0, &mut dst, 0), 1);
        assert_eq!(dst[0], 0);
        assert_eq!(write_len(254, &mut dst, 0), 1);
        assert_eq!(dst[0], 254);
        assert_eq!(write_len(255, &mut dst, 0), 2);
        assert_eq!(&dst[..2], &[255, 0]);
        assert_eq!(write_len(510, &mut dst, 0), 3);
        assert_eq!(&dst[..3], &[255, 255, 0]);
    }

    #[test]
    fn overlapping_matches_count_correctly() {
        // distance-1 repetition: match source overlaps the match itself
        let src = vec![7u8; 64];
        assert_eq!(count_matching(&src, 0, 1, 60), 59);
    }
}
