// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Adaptive block/cycle encoder.

use super::bitdepth;
use super::bytesink::ByteSink;
use super::codec_log;
use super::config::CodecOptions;
use super::constant::search::MAX_CANDIDATE_LENGTH;
use super::constant::search::MIN_CANDIDATE_LENGTH;
use super::constant::search::MIN_DELTA_LENGTH;
use super::constant::search::TAIL_THRESHOLD;
use super::constant::BLOCK_SIZE;
use super::constant::HEADER_SIZE;
use super::diff;
use super::error::OutputError;
use super::error::RangeError;
use super::error::Verify;
use super::error::VerifyError;
use super::header::CycleHeader;
use super::pack::Packer;
use super::source::SampleBuffer;

/// Stateful encoder for one compressed stream.
///
/// An `Encoder` is constructed with a fixed set of [`CodecOptions`], drives
/// the adaptive block/cycle state machine over an input [`SampleBuffer`],
/// and emits header+payload pairs to a [`ByteSink`].  Channels are
/// compressed independently and sequentially within each block.
///
/// An instance is single-threaded and must not be shared between streams
/// without calling [`reset`]; for parallel throughput, construct one
/// instance per independent stream.
///
/// [`reset`]: Encoder::reset
///
/// # Examples
///
/// ```
/// # use cyclac::{Decoder, Encoder};
/// # use cyclac::bytesink::MemSink;
/// # use cyclac::config::CodecOptions;
/// # use cyclac::source::SampleBuffer;
/// let source = SampleBuffer::from_mono(vec![0i16; 9000]);
///
/// let mut encoder = Encoder::new(CodecOptions::default()).unwrap();
/// let mut sink = MemSink::new();
/// let mut offsets = vec![];
/// encoder.compress(&source, &mut sink, &mut offsets).unwrap();
/// assert_eq!(offsets.len(), 3);
///
/// let mut decoded = SampleBuffer::new(1, 9000).unwrap();
/// Decoder::new().decompress(sink.as_slice(), &mut decoded).unwrap();
/// assert_eq!(decoded, source);
/// ```
#[derive(Clone, Debug)]
pub struct Encoder {
    options: CodecOptions,

    // per-block running state
    index_in_block: usize,
    template_start: usize,
    template_len: usize,
    template_bit_depth: u8,
    first_cycle_length: Option<usize>,

    // per-stream counters
    block_index: u32,
    num_bytes_written: u32,
    num_bytes_uncompressed: u32,
    num_templates: u32,
    num_deltas: u32,
    num_diffs: u32,

    // reusable scratch buffers
    delta_work: Vec<i16>,
    diff_full: Vec<i16>,
    diff_error: Vec<i16>,
    payload: Vec<u8>,
}

impl Encoder {
    /// Constructs `Encoder` after verifying `options`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError`] if the option combination is invalid.
    pub fn new(options: CodecOptions) -> Result<Self, VerifyError> {
        options.verify().map_err(|e| e.within("options"))?;
        Ok(Self {
            options,
            index_in_block: 0,
            template_start: 0,
            template_len: 0,
            template_bit_depth: 0,
            first_cycle_length: None,
            block_index: 0,
            num_bytes_written: 0,
            num_bytes_uncompressed: 0,
            num_templates: 0,
            num_deltas: 0,
            num_diffs: 0,
            delta_work: Vec::with_capacity(BLOCK_SIZE),
            diff_full: vec![],
            diff_error: vec![],
            payload: vec![],
        })
    }

    /// Resets all running state so the instance can encode an independent
    /// stream.  The configured options are kept.
    pub fn reset(&mut self) {
        self.index_in_block = 0;
        self.template_start = 0;
        self.template_len = 0;
        self.template_bit_depth = 0;
        self.first_cycle_length = None;
        self.block_index = 0;
        self.num_bytes_written = 0;
        self.num_bytes_uncompressed = 0;
        self.num_templates = 0;
        self.num_deltas = 0;
        self.num_diffs = 0;
    }

    /// Returns `bytes_written / bytes_uncompressed` of everything encoded
    /// since the last reset, where the uncompressed size counts 2 bytes per
    /// sample processed.
    pub fn compression_ratio(&self) -> f32 {
        if self.num_bytes_uncompressed == 0 {
            return 0.0;
        }
        self.num_bytes_written as f32 / self.num_bytes_uncompressed as f32
    }

    /// Returns the number of bytes emitted since the last reset.
    pub const fn num_bytes_written(&self) -> u32 {
        self.num_bytes_written
    }

    /// Returns the number of template cycles emitted since the last reset.
    pub const fn num_templates(&self) -> u32 {
        self.num_templates
    }

    /// Returns the number of delta cycles emitted since the last reset.
    pub const fn num_deltas(&self) -> u32 {
        self.num_deltas
    }

    /// Returns the number of diff cycles emitted since the last reset.
    pub const fn num_diffs(&self) -> u32 {
        self.num_diffs
    }

    /// Compresses `source` into `sink`.
    ///
    /// One entry per block is appended to `block_offsets`: the value of the
    /// running byte counter just before the block's first write, enabling
    /// later seeks to that block.  For stereo input both channels of a block
    /// are covered by the single entry (left channel first).
    ///
    /// A buffer whose length is not a multiple of [`BLOCK_SIZE`] ends with a
    /// short block: its real samples followed by a header-only padding entry
    /// declaring the remaining silent samples.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Sink`] as soon as a sink write fails (the
    /// current call aborts and no further writes are attempted), or
    /// [`OutputError::Range`] if an internal invariant is violated.
    pub fn compress<S: ByteSink>(
        &mut self,
        source: &SampleBuffer,
        sink: &mut S,
        block_offsets: &mut Vec<u32>,
    ) -> Result<(), OutputError<S>> {
        let channels = source.channels();
        let total = source.len();

        let mut block_offset = 0usize;
        while total - block_offset >= BLOCK_SIZE {
            block_offsets.push(self.num_bytes_written);
            self.block_index += 1;
            for ch in 0..channels {
                let block =
                    &source.channel_slice(ch)[block_offset..block_offset + BLOCK_SIZE];
                self.encode_block(block, sink)?;
            }
            block_offset += BLOCK_SIZE;
        }

        if total > block_offset {
            block_offsets.push(self.num_bytes_written);
            self.block_index += 1;
            for ch in 0..channels {
                let block = &source.channel_slice(ch)[block_offset..];
                self.encode_last_block(block, sink)?;
            }
        }
        Ok(())
    }

    /// Encodes one full block of one channel.
    fn encode_block<S: ByteSink>(
        &mut self,
        block: &[i16],
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        debug_assert_eq!(block.len(), BLOCK_SIZE);

        self.first_cycle_length = None;
        self.index_in_block = 0;
        self.num_bytes_uncompressed += (BLOCK_SIZE * 2) as u32;

        let max_bit_depth = bitdepth::bit_depth(block);
        codec_log!(
            "block {}: bit depth {max_bit_depth}",
            self.block_index - 1
        );

        // Shortcut: content that is already cheap is stored as one template
        // cycle, skipping the cycle search entirely.
        if max_bit_depth <= self.options.bit_rate_for_whole_block {
            self.encode_template(block, 0, BLOCK_SIZE, sink)?;
            self.index_in_block = BLOCK_SIZE;
            return Ok(());
        }

        while self.index_in_block < BLOCK_SIZE {
            let num_remaining = BLOCK_SIZE - self.index_in_block;

            if num_remaining <= TAIL_THRESHOLD {
                // Too small for the periodicity search to pay off; a tiny
                // cycle flushes the remainder (always a template, see
                // `encode_delta`).
                let start = self.index_in_block;
                self.index_in_block += num_remaining;
                self.encode_delta(block, start, num_remaining, sink)?;
                continue;
            }

            let ideal_length = match self.first_cycle_length {
                Some(len) => len,
                None => {
                    let len = self.options.fixed_block_width.unwrap_or_else(|| {
                        find_cycle_length(&block[self.index_in_block..])
                    });
                    if self.options.reuse_first_cycle_length_for_block {
                        self.first_cycle_length = Some(len);
                    }
                    len
                }
            };
            let cycle_length = ideal_length.min(num_remaining);
            let start = self.index_in_block;
            self.index_in_block += cycle_length;

            if self.options.use_diff_encoding_with_fixed_blocks {
                self.encode_diff_or_template(block, start, cycle_length, sink)?;
                continue;
            }

            self.encode_template(block, start, cycle_length, sink)?;

            while self.options.use_delta_encoding && self.index_in_block < BLOCK_SIZE {
                if !self.try_encode_next_delta(block, sink)? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Encodes the short final block: its real content as one template
    /// cycle, then a header-only padding entry for the missing samples.
    fn encode_last_block<S: ByteSink>(
        &mut self,
        block: &[i16],
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        debug_assert!(!block.is_empty() && block.len() < BLOCK_SIZE);

        self.first_cycle_length = None;
        self.index_in_block = 0;
        self.num_bytes_uncompressed += (block.len() * 2) as u32;

        self.encode_template(block, 0, block.len(), sink)?;
        self.index_in_block = block.len();

        let num_zeros_to_pad = BLOCK_SIZE - block.len();
        codec_log!("padding {num_zeros_to_pad}");
        let header = CycleHeader::cycle(true, 0, num_zeros_to_pad)?;
        self.write_header(&header, sink)
    }

    /// Encodes `block[start..start + len]` as a template cycle and records
    /// it as the current template.
    fn encode_template<S: ByteSink>(
        &mut self,
        block: &[i16],
        start: usize,
        len: usize,
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        if len == 0 {
            return Ok(());
        }
        check_cycle_bounds(block, start, len)?;
        let cycle = &block[start..start + len];

        let bit_depth = bitdepth::bit_depth(cycle);
        let packer = Packer::for_bit_depth(bit_depth);
        self.num_templates += 1;
        codec_log!(
            "  template at {}: depth {bit_depth}, {len} samples",
            start
        );

        let header = CycleHeader::cycle(true, bit_depth, len)?;
        self.write_header(&header, sink)?;
        self.write_packed(packer, cycle, sink)?;

        self.template_start = start;
        self.template_len = len;
        self.template_bit_depth = bit_depth;
        Ok(())
    }

    /// Encodes `block[start..start + len]` as a delta against the current
    /// template.  Cycles shorter than [`MIN_DELTA_LENGTH`] fall back to a
    /// template cycle; the header overhead dominates at that size.
    fn encode_delta<S: ByteSink>(
        &mut self,
        block: &[i16],
        start: usize,
        len: usize,
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        if len < MIN_DELTA_LENGTH {
            return self.encode_template(block, start, len, sink);
        }
        check_cycle_bounds(block, start, len)?;
        if len > self.template_len {
            return Err(RangeError::from_display(
                "len",
                "delta cycle exceeds its template",
                &len,
            )
            .into());
        }
        let cycle = &block[start..start + len];
        let template = &block[self.template_start..self.template_start + len];

        self.delta_work.clear();
        self.delta_work
            .extend(cycle.iter().zip(template).map(|(&c, &t)| c.wrapping_sub(t)));

        // the delta header can't declare depth 0; an exact repeat costs one
        // bit per sample
        let bit_depth = bitdepth::bit_depth(&self.delta_work).max(1);
        let packer = Packer::for_bit_depth(bit_depth);
        self.num_deltas += 1;
        codec_log!("    delta at {start}: depth {bit_depth}, {len} samples");

        let header = CycleHeader::cycle(false, bit_depth, len)?;
        self.write_header(&header, sink)?;
        let delta = std::mem::take(&mut self.delta_work);
        let result = self.write_packed(packer, &delta, sink);
        self.delta_work = delta;
        result
    }

    /// Splits one fixed-width cycle into full/error streams and emits
    /// whichever of diff and template encoding is cheaper.
    fn encode_diff_or_template<S: ByteSink>(
        &mut self,
        block: &[i16],
        start: usize,
        len: usize,
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        check_cycle_bounds(block, start, len)?;
        let cycle = &block[start..start + len];
        let template_bytes =
            Packer::for_bit_depth(bitdepth::bit_depth(cycle)).byte_count(len);

        if !diff::eligible_length(len) {
            // the trailing partial cycle of a block may not be a power of two
            return self.encode_template(block, start, len, sink);
        }

        diff::full_values(cycle, &mut self.diff_full);
        diff::error_values(cycle, &mut self.diff_error);
        let full_bit_depth = bitdepth::bit_depth(&self.diff_full).max(1);
        let error_bit_depth = bitdepth::bit_depth(&self.diff_error).max(1);
        let full_packer = Packer::for_bit_depth(full_bit_depth);
        let error_packer = Packer::for_bit_depth(error_bit_depth);
        let diff_bytes = full_packer.byte_count(self.diff_full.len())
            + error_packer.byte_count(self.diff_error.len());

        if diff_bytes > template_bytes {
            return self.encode_template(block, start, len, sink);
        }

        self.num_diffs += 1;
        codec_log!(
            "  diff at {start}: depth {full_bit_depth} -> {error_bit_depth}, {len} samples"
        );
        let header = CycleHeader::diff(full_bit_depth, error_bit_depth, len)?;
        self.write_header(&header, sink)?;
        let full = std::mem::take(&mut self.diff_full);
        let errors = std::mem::take(&mut self.diff_error);
        let result = self
            .write_packed(full_packer, &full, sink)
            .and_then(|()| self.write_packed(error_packer, &errors, sink));
        self.diff_full = full;
        self.diff_error = errors;
        result?;

        self.template_start = start;
        self.template_len = len;
        self.template_bit_depth = bitdepth::bit_depth(cycle);
        Ok(())
    }

    /// Attempts to extend the current template's coverage with one more
    /// delta cycle.  Returns `false` when the delta loop should stop.
    fn try_encode_next_delta<S: ByteSink>(
        &mut self,
        block: &[i16],
        sink: &mut S,
    ) -> Result<bool, OutputError<S>> {
        let num_remaining = BLOCK_SIZE - self.index_in_block;
        let cycle_length = self.template_len;
        if num_remaining < 2 * cycle_length || self.template_bit_depth == 0 {
            return Ok(false);
        }

        let template = &block[self.template_start..self.template_start + cycle_length];
        let candidate = &block[self.index_in_block..self.index_in_block + cycle_length];
        let delta_depth =
            bitdepth::delta_bit_depth(template, candidate, self.options.remove_dc_offset);
        let bit_reduction = self.template_bit_depth.saturating_sub(delta_depth);

        let factor = f32::from(bit_reduction) / f32::from(self.template_bit_depth);
        if factor <= self.options.delta_cycle_threshold {
            return Ok(false);
        }

        // Refine the boundary: a cycle one sample shorter sometimes tracks
        // the template better when the period is fractional.
        let delta_length = refine_delta_length(
            template,
            &block[self.index_in_block..],
            cycle_length,
            self.options.remove_dc_offset,
        );
        let start = self.index_in_block;
        self.index_in_block += delta_length;
        self.encode_delta(block, start, delta_length, sink)?;
        Ok(true)
    }

    fn write_header<S: ByteSink>(
        &mut self,
        header: &CycleHeader,
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        header.write(sink)?;
        self.num_bytes_written += HEADER_SIZE as u32;
        Ok(())
    }

    fn write_packed<S: ByteSink>(
        &mut self,
        packer: Packer,
        samples: &[i16],
        sink: &mut S,
    ) -> Result<(), OutputError<S>> {
        let num_bytes = packer.byte_count(samples.len());
        if num_bytes == 0 {
            return Ok(());
        }
        packer.pack(samples, &mut self.payload);
        sink.write_bytes(&self.payload)
            .map_err(OutputError::from_sink)?;
        self.num_bytes_written += num_bytes as u32;
        Ok(())
    }
}

fn check_cycle_bounds(block: &[i16], start: usize, len: usize) -> Result<(), RangeError> {
    if start + len > block.len() {
        return Err(RangeError::from_display(
            "len",
            "cycle exceeds the remaining block samples",
            &len,
        ));
    }
    Ok(())
}

/// Returns the best length for the cycle template.
///
/// The search scans bounded candidate lengths and measures how well the
/// window after a candidate can be predicted from the window before it,
/// returning the minimizing length plus one so that subsequent cycles can
/// use the extra sample or not depending on the achieved bit reduction.
///
/// If no candidate reduces the bit range, the whole remainder is returned.
fn find_cycle_length(rest: &[i16]) -> usize {
    let upper = (rest.len() / 2).min(MAX_CANDIDATE_LENGTH);
    let mut best_depth = bitdepth::bit_depth(rest);
    let mut best_length = 0usize;
    for len in MIN_CANDIDATE_LENGTH..=upper {
        let depth = bitdepth::delta_bit_depth(&rest[..len], &rest[len..2 * len], false);
        if depth < best_depth {
            best_depth = depth;
            best_length = len;
        }
    }
    if best_length == 0 {
        rest.len()
    } else {
        best_length + 1
    }
}

/// Picks the exact boundary for the next delta cycle by comparing the two
/// adjacent length candidates against the template; the larger bit-depth
/// reduction wins and ties keep the full length.
fn refine_delta_length(
    template: &[i16],
    rest: &[i16],
    cycle_length: usize,
    remove_dc: bool,
) -> usize {
    if cycle_length < 2 {
        return cycle_length;
    }
    let full = bitdepth::delta_bit_depth(template, &rest[..cycle_length], remove_dc);
    let short = bitdepth::delta_bit_depth(template, &rest[..cycle_length - 1], remove_dc);
    if short < full {
        cycle_length - 1
    } else {
        cycle_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bytesink::MemSink;
    use crate::test_helper;
    use rstest::rstest;

    fn compress_to_vec(options: CodecOptions, source: &SampleBuffer) -> (Vec<u8>, Vec<u32>, Encoder) {
        let mut encoder = Encoder::new(options).expect("invalid options");
        let mut sink = MemSink::new();
        let mut offsets = vec![];
        encoder
            .compress(source, &mut sink, &mut offsets)
            .expect("compression failed");
        (sink.into_inner(), offsets, encoder)
    }

    #[test]
    fn empty_buffer_writes_nothing() {
        let source = SampleBuffer::from_mono(vec![]);
        let (bytes, offsets, encoder) = compress_to_vec(CodecOptions::default(), &source);
        assert!(bytes.is_empty());
        assert!(offsets.is_empty());
        assert_eq!(encoder.compression_ratio(), 0.0);
    }

    #[test]
    fn all_zero_block_is_a_single_shorthand_cycle() {
        let source = SampleBuffer::from_mono(vec![0i16; BLOCK_SIZE]);
        let (bytes, offsets, encoder) = compress_to_vec(CodecOptions::default(), &source);

        // one depth-0 shorthand header, no payload
        assert_eq!(bytes.len(), 3);
        assert_eq!(bytes[0], 0x21);
        assert_eq!(
            i16::from_le_bytes([bytes[1], bytes[2]]) as usize,
            BLOCK_SIZE
        );
        assert_eq!(offsets, vec![0]);
        assert_eq!(encoder.num_bytes_written(), 3);
        assert!((encoder.compression_ratio() - 3.0 / (BLOCK_SIZE * 2) as f32).abs() < 1e-9);
    }

    #[test]
    fn short_tail_block_emits_padding_entry() {
        let mut samples = vec![0i16; BLOCK_SIZE + 3];
        for (t, p) in samples.iter_mut().enumerate() {
            *p = (t % 251) as i16 * 100;
        }
        let source = SampleBuffer::from_mono(samples);
        let (bytes, offsets, _) = compress_to_vec(CodecOptions::default(), &source);
        assert_eq!(offsets.len(), 2);

        // the last 3 bytes must be the padding header: depth-0 shorthand
        // declaring BLOCK_SIZE - 3 silent samples and carrying no payload
        let padding = &bytes[bytes.len() - 3..];
        assert_eq!(padding[0], 0x21);
        assert_eq!(
            i16::from_le_bytes([padding[1], padding[2]]) as usize,
            BLOCK_SIZE - 3
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let samples = test_helper::sine_plus_noise(3 * BLOCK_SIZE + 17, 128, 8000.0, 60.0, 42);
        let source = SampleBuffer::from_mono(samples);
        let (a, offsets_a, _) = compress_to_vec(CodecOptions::default(), &source);
        let (b, offsets_b, _) = compress_to_vec(CodecOptions::default(), &source);
        assert_eq!(a, b);
        assert_eq!(offsets_a, offsets_b);
    }

    #[test]
    fn periodic_content_produces_delta_cycles() {
        let samples = test_helper::sine_signal(4 * BLOCK_SIZE, 128, 12000.0);
        let source = SampleBuffer::from_mono(samples);
        let (_, _, encoder) = compress_to_vec(CodecOptions::default(), &source);
        assert!(encoder.num_deltas() > 0);
        assert!(encoder.num_templates() > 0);
        assert!(encoder.compression_ratio() < 1.0);
    }

    #[test]
    fn delta_threshold_of_one_disables_deltas() {
        let samples = test_helper::sine_signal(2 * BLOCK_SIZE, 128, 12000.0);
        let source = SampleBuffer::from_mono(samples);
        let options = CodecOptions {
            delta_cycle_threshold: 1.0,
            ..CodecOptions::default()
        };
        let (_, _, encoder) = compress_to_vec(options, &source);
        assert_eq!(encoder.num_deltas(), 0);
    }

    #[test]
    fn offset_table_accounts_for_every_byte() {
        let samples = test_helper::sine_plus_noise(5 * BLOCK_SIZE + 100, 200, 9000.0, 300.0, 7);
        let source = SampleBuffer::from_interleaved(
            &samples
                .iter()
                .flat_map(|&v| [v, v.wrapping_mul(3)])
                .collect::<Vec<i16>>(),
            2,
        )
        .expect("construction failed");
        let (bytes, offsets, encoder) = compress_to_vec(CodecOptions::default(), &source);

        assert_eq!(offsets.len(), 6);
        assert_eq!(offsets[0], 0);
        for pair in offsets.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(encoder.num_bytes_written() as usize, bytes.len());
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn diff_mode_round_trips_both_branches(#[case] noisy: bool) {
        // smooth content favors the diff split; noise makes the error
        // stream one bit wider than the plain cycle and forces the template
        // fallback
        let samples = if noisy {
            test_helper::noise_signal(BLOCK_SIZE, 100.0, 3)
        } else {
            test_helper::sine_signal(BLOCK_SIZE, 1024, 16000.0)
        };
        let source = SampleBuffer::from_mono(samples);
        let (bytes, _, encoder) = compress_to_vec(CodecOptions::diff(), &source);

        assert_eq!(encoder.num_diffs() > 0, !noisy, "stream={:?}", &bytes[..3]);
        test_helper::assert_round_trip(CodecOptions::diff(), &source);
    }

    #[test]
    fn fixed_block_width_caps_cycle_lengths() {
        let samples = test_helper::noise_signal(BLOCK_SIZE, 25000.0, 11);
        let source = SampleBuffer::from_mono(samples);
        let options = CodecOptions {
            fixed_block_width: Some(64),
            use_delta_encoding: false,
            ..CodecOptions::default()
        };
        let (_, _, encoder) = compress_to_vec(options, &source);
        assert_eq!(encoder.num_templates(), (BLOCK_SIZE / 64) as u32);
    }

    #[test]
    fn sink_failure_aborts_immediately() {
        struct LimitedWriter(usize);
        impl std::io::Write for LimitedWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if self.0 < buf.len() {
                    return Err(std::io::Error::new(std::io::ErrorKind::Other, "full"));
                }
                self.0 -= buf.len();
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let samples = test_helper::noise_signal(BLOCK_SIZE, 25000.0, 5);
        let source = SampleBuffer::from_mono(samples);
        let mut encoder = Encoder::new(CodecOptions::default()).expect("invalid options");
        let mut sink = crate::bytesink::IoSink::new(LimitedWriter(16));
        let mut offsets = vec![];
        let result = encoder.compress(&source, &mut sink, &mut offsets);
        assert!(matches!(result, Err(OutputError::Sink(_))));
    }

    #[test]
    fn cycle_search_finds_short_periods() {
        let rest = test_helper::sine_signal(2048, 100, 10000.0);
        let found = find_cycle_length(&rest);
        assert!(found % 100 <= 2 || found % 100 >= 98, "found={found}");
    }

    #[test]
    fn cycle_search_falls_back_to_the_remainder() {
        // an all-zero run is already at depth 0; no candidate can reduce it
        let rest = vec![0i16; 96];
        assert_eq!(find_cycle_length(&rest), 96);
    }
}
