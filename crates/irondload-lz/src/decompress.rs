//! Decoder for the LZ77-family scheme wrapped around download-mode EMMC
//! reads.
//!
//! A stream is a run of blocks terminated by an end marker. Every block is
//! headed by one byte whose bit pattern selects the layout:
//!
//! * `0x16`: inert boundary marker, skipped wherever it appears.
//! * `0x06`: end of stream.
//! * `0xEv` / `0xE0 n`: literal run of `v` (resp. `n + 0x10`) verbatim bytes.
//! * `UL:2 CB:3 OFF_HI:3` + `OFF_LO:8`: back-reference, 11-bit offset.
//! * `101 UL:2 CB_HI:3` + `CB_LO:2 OFF_HI:6` + `OFF_LO:8`: 14-bit offset.
//! * `UL:2 CB:3 111` + `OFF_LO:8` + `OFF_HI:8`: 16-bit offset.
//! * `0xF3 + CB` or `UL:2 CB:3 110`: back-reference reusing the previous
//!   block's offset.
//!
//! `UL` literal bytes sit between the first and second header bytes. The
//! copy count is carried as `CB + 3` plus any number of trailing additive
//! chunks (`0xFv` adds `v`, `0xF0 n` adds `n + 0x10`).

use crate::error::LzError;
use crate::window::{Window, MAX_WINDOW_SIZE};

const BOUNDARY_MARKER: u8 = 0x16;
const END_OF_STREAM: u8 = 0x06;

/// Window growth past this point triggers a mid-stream flush.
const OPTIMAL_RESULT_BUFFER: usize = MAX_WINDOW_SIZE * 13 / 10;

enum Step {
    /// One whole block was consumed.
    Block,
    /// The end marker was consumed.
    EndOfStream,
    /// The accumulated input ends inside the current block.
    Suspend,
}

/// Stateful streaming decompressor.
///
/// Compressed payloads are pushed in with [`Decompressor::feed`]; each call
/// returns the decompressed bytes it was able to produce. A stream larger
/// than the flush threshold comes out in several chunks: as long as
/// [`Decompressor::has_more`] reports `true`, pumping with an empty input
/// yields the next chunk while the back-reference window stays intact.
#[derive(Debug, Default)]
pub struct Decompressor {
    input: Vec<u8>,
    pos: usize,
    prev_offset: Option<usize>,
    window: Window,
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            input: Vec::new(),
            pos: 0,
            prev_offset: None,
            window: Window::new(),
        }
    }

    /// Appends `input` to the pending compressed bytes and decodes as far as
    /// possible.
    ///
    /// Decoding stops at the end marker, at the end of the accumulated
    /// input (a block truncated by a payload boundary is left for the next
    /// call), or at the flush threshold. In the flush case everything older
    /// than the back-reference window is returned and the remaining input is
    /// kept; otherwise the entire output produced so far is returned.
    pub fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>, LzError> {
        self.input.extend_from_slice(input);

        loop {
            if self.pos >= self.input.len() {
                break;
            }

            if self.window.len() > OPTIMAL_RESULT_BUFFER {
                self.input.drain(..self.pos);
                self.pos = 0;
                return Ok(self.window.drain_excess());
            }

            let block_start = self.pos;
            match self.next_block()? {
                Step::Block => {}
                Step::EndOfStream => break,
                Step::Suspend => {
                    self.pos = block_start;
                    break;
                }
            }
        }

        self.input.drain(..self.pos);
        self.pos = 0;
        Ok(self.window.take_all())
    }

    /// `true` while unconsumed input is pending from an earlier [`Decompressor::feed`].
    pub fn has_more(&self) -> bool {
        !self.input.is_empty()
    }

    fn next_block(&mut self) -> Result<Step, LzError> {
        let b = self.input[self.pos];
        self.pos += 1;

        // The patterns overlap, so the order matters: 0xFn wins over the
        // low-bits-110 test (n may end in 110), and the 110 test must not
        // capture 14-bit-offset headers, which start with 101.
        if b == BOUNDARY_MARKER {
            return Ok(Step::Block);
        }
        if b == END_OF_STREAM {
            return Ok(Step::EndOfStream);
        }
        if b >> 4 == 0xE {
            return Ok(self.literal_block(b));
        }
        if b >> 4 == 0xF || (b & 0x07 == 0b110 && b >> 5 != 0b101) {
            return self.same_offset_block(b);
        }
        self.compressed_block(b)
    }

    /// Literal block: `0xEv` carries `v` verbatim bytes; the long form
    /// `0xE0 n` carries `n + 0x10`.
    fn literal_block(&mut self, b: u8) -> Step {
        let len = if b == 0xE0 {
            let Some(ext) = self.take_byte() else {
                return Step::Suspend;
            };
            usize::from(ext) + 0x10
        } else {
            usize::from(b & 0x0F)
        };

        if self.take_literal_run(len).is_none() {
            return Step::Suspend;
        }
        Step::Block
    }

    /// Back-reference block carrying its own offset. Selects between the
    /// 11-, 14- and 16-bit offset layouts and leaves the decoded offset as
    /// the reference for subsequent same-offset blocks.
    fn compressed_block(&mut self, b: u8) -> Result<Step, LzError> {
        enum Form {
            Offset11,
            Offset14,
            Offset16,
        }

        let (form, literal_len, mut copy_bytes) = if b >> 5 == 0b101 {
            // 101 UL:2 CB_HI:3
            (Form::Offset14, usize::from((b >> 3) & 3), usize::from(b & 7) << 2)
        } else if b & 0x07 == 0b111 {
            // UL:2 CB:3 111
            (Form::Offset16, usize::from((b >> 6) & 3), usize::from((b >> 3) & 7))
        } else {
            // UL:2 CB:3 OFF_HI:3
            (Form::Offset11, usize::from((b >> 6) & 3), usize::from((b >> 3) & 7))
        };

        // The literal bytes sit between the first and second header bytes.
        // They are only staged here; nothing reaches the window until the
        // whole block is known to be complete, so that a block truncated by
        // a payload boundary can be retried from scratch.
        let Some(literal_start) = self.skip_literal_run(literal_len) else {
            return Ok(Step::Suspend);
        };

        let offset = match form {
            Form::Offset11 => {
                let Some(lo) = self.take_byte() else {
                    return Ok(Step::Suspend);
                };
                usize::from(b & 7) << 8 | usize::from(lo)
            }
            Form::Offset14 => {
                // CB_LO:2 OFF_HI:6, then OFF_LO:8
                let Some(b1) = self.take_byte() else {
                    return Ok(Step::Suspend);
                };
                let Some(lo) = self.take_byte() else {
                    return Ok(Step::Suspend);
                };
                copy_bytes |= usize::from(b1 >> 6);
                usize::from(b1 & 0x3F) << 8 | usize::from(lo)
            }
            Form::Offset16 => {
                // Little-endian, unlike the other two layouts.
                let Some(lo) = self.take_byte() else {
                    return Ok(Step::Suspend);
                };
                let Some(hi) = self.take_byte() else {
                    return Ok(Step::Suspend);
                };
                usize::from(lo) | usize::from(hi) << 8
            }
        };

        // The header encodes the copy count as value - 3.
        copy_bytes += 3;
        let Some(extra) = self.copy_chunks() else {
            return Ok(Step::Suspend);
        };
        copy_bytes += extra;

        self.window
            .push_slice(&self.input[literal_start..literal_start + literal_len]);
        self.window.copy_from_tail(offset, copy_bytes)?;
        self.prev_offset = Some(offset);
        Ok(Step::Block)
    }

    /// Back-reference block reusing the previous offset: `0xF3 + CB` with no
    /// literal prefix, or `UL:2 CB:3 110` with one. A prefix-less block is
    /// always encoded through the `0xF3` form, so `UL` must be nonzero here.
    fn same_offset_block(&mut self, b: u8) -> Result<Step, LzError> {
        let offset = self.prev_offset.ok_or(LzError::NoPreviousOffset)?;

        let (literal_start, literal_len, mut copy_bytes) = if b >> 4 == 0xF {
            if !(0xF3..=0xFA).contains(&b) {
                return Err(LzError::UnknownHeader(b));
            }
            (self.pos, 0, usize::from(b - 0xF3))
        } else {
            let literal_len = usize::from((b >> 6) & 3);
            if literal_len == 0 {
                return Err(LzError::EmptyLiteralRun);
            }
            let Some(literal_start) = self.skip_literal_run(literal_len) else {
                return Ok(Step::Suspend);
            };
            (literal_start, literal_len, usize::from((b >> 3) & 7))
        };

        copy_bytes += 3;
        let Some(extra) = self.copy_chunks() else {
            return Ok(Step::Suspend);
        };
        copy_bytes += extra;

        self.window
            .push_slice(&self.input[literal_start..literal_start + literal_len]);
        self.window.copy_from_tail(offset, copy_bytes)?;
        Ok(Step::Block)
    }

    /// Additive copy-count chunks: `0xFv` adds `v`, `0xF0 n` adds `n + 0x10`.
    /// Boundary markers inside the run are skipped. The first byte that is
    /// neither is left unconsumed for block dispatch. `None` means the run
    /// was cut short by the end of the accumulated input.
    fn copy_chunks(&mut self) -> Option<usize> {
        let mut extra = 0;

        loop {
            let b = self.input.get(self.pos).copied()?;
            if b == BOUNDARY_MARKER {
                self.pos += 1;
                continue;
            }
            if b >> 4 != 0xF {
                return Some(extra);
            }
            self.pos += 1;

            if b == 0xF0 {
                let ext = self.take_byte()?;
                extra += usize::from(ext) + 0x10;
            } else {
                extra += usize::from(b & 0x0F);
            }
        }
    }

    fn take_byte(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    /// Pushes `len` verbatim input bytes into the window. Only safe for
    /// blocks with no decoding step after the run.
    fn take_literal_run(&mut self, len: usize) -> Option<()> {
        let start = self.skip_literal_run(len)?;
        self.window.push_slice(&self.input[start..start + len]);
        Some(())
    }

    /// Advances past `len` verbatim input bytes without committing them,
    /// returning where the run starts.
    fn skip_literal_run(&mut self, len: usize) -> Option<usize> {
        if self.input.len() - self.pos < len {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        Some(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decompress_all(input: &[u8]) -> Vec<u8> {
        let mut decompressor = Decompressor::new();
        let mut out = decompressor.feed(input).unwrap();
        while decompressor.has_more() {
            out.extend(decompressor.feed(&[]).unwrap());
        }
        out
    }

    #[test]
    fn literal_block_with_end_marker() {
        assert_eq!(decompress_all(&[0xE3, 0x41, 0x42, 0x43, 0x06]), b"ABC");
    }

    #[test]
    fn long_literal_block_copies_exactly_sixteen_bytes() {
        let mut input = vec![0xE0, 0x00];
        input.extend_from_slice(&[0xAA; 16]);
        input.push(0x06);

        assert_eq!(decompress_all(&input), vec![0xAA; 16]);
    }

    #[test]
    fn short_literal_block_copies_fifteen_bytes() {
        let mut input = vec![0xEF];
        input.extend_from_slice(&[0x11; 15]);
        input.push(0x06);

        assert_eq!(decompress_all(&input), vec![0x11; 15]);
    }

    #[test]
    fn offset_11_back_reference_repeats_a_single_byte() {
        let mut decompressor = Decompressor::new();
        let out = decompressor.feed(&[0xE1, 0x5A, 0x00, 0x01, 0x5A, 0x06]).unwrap();
        assert_eq!(out, [0x5A; 4]);
    }

    #[test]
    fn offset_11_back_reference_wraps_a_two_byte_tail() {
        let mut decompressor = Decompressor::new();
        let out = decompressor
            .feed(&[0xE2, 0x41, 0x42, 0x00, 0x02, 0x42, 0x06])
            .unwrap();
        assert_eq!(out, [0x41, 0x42, 0x41, 0x42, 0x41]);
    }

    #[test]
    fn copy_chunk_extends_the_copy_count() {
        // offset 1, header copy count 3, one `F0 00` chunk adding 16
        let out = decompress_all(&[0xE1, 0x7A, 0x00, 0x01, 0xF0, 0x00, 0x06]);
        assert_eq!(out, vec![0x7A; 20]);
    }

    #[test]
    fn boundary_marker_does_not_terminate_a_chunk_run() {
        let out = decompress_all(&[0xE1, 0x41, 0x00, 0x01, 0x16, 0xF1, 0x06]);
        assert_eq!(out, vec![0x41; 5]);
    }

    #[test]
    fn boundary_marker_between_blocks_is_skipped() {
        assert_eq!(decompress_all(&[0x16, 0xE1, 0x41, 0x16, 0xE1, 0x42, 0x06]), b"AB");
    }

    #[test]
    fn offset_14_header_splits_the_copy_count() {
        // 0xAA = 101 01 010: literal length 1, copy count high bits 0b010 << 2
        let out = decompress_all(&[0xE1, 0x58, 0xAA, 0x59, 0x00, 0x01, 0x06]);

        let mut expected = vec![0x58];
        expected.extend_from_slice(&[0x59; 12]);
        assert_eq!(out, expected);
    }

    #[test]
    fn offset_16_header_reads_a_little_endian_offset() {
        // 0x4F = 01 001 111: literal length 1, copy count 1 + 3
        let out = decompress_all(&[0xE4, 0x44, 0x45, 0x46, 0x47, 0x4F, 0x48, 0x02, 0x00, 0x06]);
        assert_eq!(out, [0x44, 0x45, 0x46, 0x47, 0x48, 0x47, 0x48, 0x47, 0x48]);
    }

    #[test]
    fn same_offset_block_without_literal_prefix() {
        let out = decompress_all(&[0xE1, 0x41, 0x00, 0x01, 0xE1, 0x42, 0xF4, 0x06]);

        let mut expected = vec![0x41; 4];
        expected.extend_from_slice(&[0x42; 5]);
        assert_eq!(out, expected);
    }

    #[test]
    fn same_offset_block_with_literal_prefix() {
        // 0x46 = 01 000 110: literal length 1, copy count 0 + 3
        let out = decompress_all(&[0xE1, 0x41, 0x00, 0x01, 0x46, 0x42, 0x06]);

        let mut expected = vec![0x41; 4];
        expected.extend_from_slice(&[0x42; 4]);
        assert_eq!(out, expected);
    }

    #[test]
    fn end_marker_inside_chunk_space_terminates_after_the_copy() {
        // The 0x06 after the back-reference is not a chunk, so the copy of
        // three bytes still happens before the stream ends.
        let mut decompressor = Decompressor::new();
        let out = decompressor.feed(&[0xE1, 0x33, 0x00, 0x01, 0x06, 0xE1, 0x44]).unwrap();
        assert_eq!(out, [0x33; 4]);
        // Bytes after the end marker stay pending.
        assert!(decompressor.has_more());
    }

    #[test]
    fn same_offset_block_without_history_is_rejected() {
        let mut decompressor = Decompressor::new();
        assert_eq!(decompressor.feed(&[0xF5]), Err(LzError::NoPreviousOffset));
    }

    #[test]
    fn same_offset_block_with_empty_literal_prefix_is_rejected() {
        // 0x0E = 00 001 110: the prefixed form with a zero literal length
        let mut decompressor = Decompressor::new();
        assert_eq!(
            decompressor.feed(&[0xE1, 0x41, 0x00, 0x01, 0x0E]),
            Err(LzError::EmptyLiteralRun)
        );
    }

    #[test]
    fn header_outside_the_same_offset_range_is_rejected() {
        let mut decompressor = Decompressor::new();
        assert_eq!(
            decompressor.feed(&[0xE1, 0x41, 0x00, 0x01, 0xE1, 0x42, 0xFB]),
            Err(LzError::UnknownHeader(0xFB))
        );
    }

    #[test]
    fn back_reference_deeper_than_output_is_rejected() {
        let mut decompressor = Decompressor::new();
        assert_eq!(
            decompressor.feed(&[0x00, 0x05]),
            Err(LzError::InvalidBackReference {
                offset: 5,
                available: 0
            })
        );
    }

    #[test]
    fn truncated_block_suspends_until_more_input_arrives() {
        let mut decompressor = Decompressor::new();

        assert!(decompressor.feed(&[0xE5, 0x41]).unwrap().is_empty());
        assert!(decompressor.has_more());

        let out = decompressor.feed(&[0x42, 0x43, 0x44, 0x45, 0x06]).unwrap();
        assert_eq!(out, [0x41, 0x42, 0x43, 0x44, 0x45]);
        assert!(!decompressor.has_more());
    }

    #[test]
    fn byte_at_a_time_feeding_matches_one_shot_decoding() {
        let input = [
            0xE3, 0x41, 0x42, 0x43, // literal "ABC"
            0x00, 0x03, // offset 3, copy 3
            0x16, // boundary marker
            0x46, 0x58, // same offset, literal "X", copy 3
            0xF5, 0xF1, // chunks extending the copy by 6
            0xE1, 0x59, // literal "Y"
            0x06,
        ];

        let whole = decompress_all(&input);

        let mut decompressor = Decompressor::new();
        let mut split = Vec::new();
        for &byte in &input {
            split.extend(decompressor.feed(&[byte]).unwrap());
        }

        assert_eq!(split, whole);
        assert!(!decompressor.has_more());
    }

    #[test]
    fn oversized_stream_is_flushed_in_window_sized_chunks() {
        // One literal plus a run long enough to cross the flush threshold,
        // then blocks that back-reference the retained window.
        let mut input = vec![0xE1, 0xAA, 0x00, 0x01];
        for _ in 0..400 {
            input.extend_from_slice(&[0xF0, 0xFF]); // each chunk adds 0xFF + 16
        }
        input.extend_from_slice(&[0xE1, 0xBB, 0xF5, 0x06]);

        let run_len = 3 + 400 * (0xFF + 16);
        let mut expected = vec![0xAA; 1 + run_len];
        expected.extend_from_slice(&[0xBB; 6]);

        let mut decompressor = Decompressor::new();
        let first = decompressor.feed(&input).unwrap();

        // The first call keeps the window tail for later back-references.
        assert_eq!(first.len(), 1 + run_len - MAX_WINDOW_SIZE);
        assert!(decompressor.has_more());

        let mut out = first;
        while decompressor.has_more() {
            out.extend(decompressor.feed(&[]).unwrap());
        }

        assert_eq!(out, expected);
    }

    #[test]
    fn pump_with_empty_input_produces_nothing_on_a_fresh_decompressor() {
        let mut decompressor = Decompressor::new();
        assert!(decompressor.feed(&[]).unwrap().is_empty());
        assert!(!decompressor.has_more());
    }
}
