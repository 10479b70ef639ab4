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

//! Adaptive block/cycle decoder.

use super::codec_log;
use super::constant::BLOCK_SIZE;
use super::diff;
use super::error::DecodeError;
use super::header;
use super::header::CycleHeader;
use super::pack::Packer;
use super::source::SampleBuffer;

/// Stateful decoder reconstructing sample buffers bit-exactly.
///
/// The decoder replays the encoder's state machine from the self-describing
/// cycle headers: template cycles are unpacked directly and recorded, delta
/// cycles are recovered as `unpacked(delta) + template`, diff cycles are
/// rebuilt from their anchor and error streams, and padding entries expand
/// to silent samples without reading any payload.
///
/// Sequential decoding never needs the block offset table; it exists for
/// direct seeks via [`decode_block`].
///
/// [`decode_block`]: Decoder::decode_block
#[derive(Clone, Debug)]
pub struct Decoder {
    block: Vec<i16>,
    delta: Vec<i16>,
    diff_full: Vec<i16>,
    diff_error: Vec<i16>,
    template_start: usize,
    template_len: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Constructs a `Decoder`.
    ///
    /// Decoding needs no configuration: every header shape is
    /// self-describing, so a stream is reconstructible regardless of the
    /// options it was encoded with.
    pub fn new() -> Self {
        Self {
            block: vec![0i16; BLOCK_SIZE],
            delta: vec![0i16; BLOCK_SIZE],
            diff_full: vec![],
            diff_error: vec![],
            template_start: 0,
            template_len: 0,
        }
    }

    /// Decompresses `input` into `dest`, which must already have the shape
    /// (channels and length) of the originally encoded buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the stream is truncated, contains an
    /// unknown header byte, or disagrees with the destination shape.  No
    /// wrong samples are ever silently produced.
    pub fn decompress(
        &mut self,
        input: &[u8],
        dest: &mut SampleBuffer,
    ) -> Result<(), DecodeError> {
        let consumed = self.decode_blocks(input, dest)?;
        if consumed < input.len() {
            return Err(DecodeError::TrailingData(input.len() - consumed));
        }
        Ok(())
    }

    /// Decodes a single block given a slice that starts at a block boundary
    /// (as recorded in the offset table during compression).
    ///
    /// `dest` receives the block's samples; its length must not exceed
    /// [`BLOCK_SIZE`].  Returns the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] on malformed input or an oversized `dest`.
    pub fn decode_block(
        &mut self,
        input: &[u8],
        dest: &mut SampleBuffer,
    ) -> Result<usize, DecodeError> {
        if dest.len() > BLOCK_SIZE {
            return Err(DecodeError::InvalidDestination(format!(
                "a single block holds at most {BLOCK_SIZE} samples, requested {}",
                dest.len()
            )));
        }
        self.decode_blocks(input, dest)
    }

    /// Decodes ceil(`dest.len()` / `BLOCK_SIZE`) blocks into `dest` and
    /// returns the number of bytes consumed.
    fn decode_blocks(
        &mut self,
        input: &[u8],
        dest: &mut SampleBuffer,
    ) -> Result<usize, DecodeError> {
        let channels = dest.channels();
        let total = dest.len();
        let mut remaining = input;
        let mut offset = 0usize;
        while offset < total {
            let num_todo = (total - offset).min(BLOCK_SIZE);
            for ch in 0..channels {
                remaining = self.decode_channel_block(remaining)?;
                dest.channel_slice_mut(ch)[offset..offset + num_todo]
                    .copy_from_slice(&self.block[..num_todo]);
            }
            offset += num_todo;
        }
        Ok(input.len() - remaining.len())
    }

    /// Reconstructs one channel's worth of one block into `self.block`.
    ///
    /// The cycle sample counts of a block always sum to exactly
    /// `BLOCK_SIZE`; for a short final block the difference is covered by
    /// the padding entry, which only zero-fills.
    fn decode_channel_block<'a>(&mut self, input: &'a [u8]) -> Result<&'a [u8], DecodeError> {
        let mut remaining = input;
        let mut index = 0usize;
        self.template_len = 0;
        self.block.fill(0);

        while index < BLOCK_SIZE {
            let (rest, header) = parse_header(remaining)?;
            remaining = rest;
            let num_samples = header.num_samples();
            if index + num_samples > BLOCK_SIZE {
                return Err(DecodeError::CycleOverrun {
                    declared: num_samples,
                    remaining: BLOCK_SIZE - index,
                });
            }

            match header {
                CycleHeader::Cycle {
                    is_template: true,
                    bit_depth,
                    ..
                } => {
                    codec_log!("  template at {index}: depth {bit_depth}, {num_samples} samples");
                    if bit_depth > 0 {
                        let packer = Packer::for_bit_depth(bit_depth);
                        remaining = self.unpack_payload(
                            packer,
                            remaining,
                            index..index + num_samples,
                        )?;
                    }
                    // a depth-0 run (content or padding) stays zero-filled
                    self.template_start = index;
                    self.template_len = num_samples;
                }
                CycleHeader::Cycle {
                    is_template: false,
                    bit_depth,
                    ..
                } => {
                    codec_log!("    delta at {index}: depth {bit_depth}, {num_samples} samples");
                    if self.template_len == 0 {
                        return Err(DecodeError::MissingTemplate);
                    }
                    if num_samples > self.template_len {
                        return Err(DecodeError::DeltaLongerThanTemplate {
                            delta: num_samples,
                            template: self.template_len,
                        });
                    }
                    let packer = Packer::for_bit_depth(bit_depth);
                    let num_bytes = packer.byte_count(num_samples);
                    if remaining.len() < num_bytes {
                        return Err(DecodeError::Truncated);
                    }
                    packer.unpack(&remaining[..num_bytes], &mut self.delta[..num_samples]);
                    remaining = &remaining[num_bytes..];

                    let (head, tail) = self.block.split_at_mut(index);
                    let template = &head[self.template_start..self.template_start + num_samples];
                    for (p, (&d, &t)) in tail[..num_samples]
                        .iter_mut()
                        .zip(self.delta.iter().zip(template))
                    {
                        *p = d.wrapping_add(t);
                    }
                }
                CycleHeader::Diff {
                    full_bit_depth,
                    error_bit_depth,
                    ..
                } => {
                    codec_log!(
                        "  diff at {index}: depth {full_bit_depth} -> {error_bit_depth}, \
                         {num_samples} samples"
                    );
                    let num_full = diff::num_full_values(num_samples);
                    let num_errors = diff::num_error_values(num_samples);
                    self.diff_full.resize(num_full, 0);
                    self.diff_error.resize(num_errors, 0);

                    remaining = unpack_stream(
                        Packer::for_bit_depth(full_bit_depth),
                        remaining,
                        &mut self.diff_full,
                    )?;
                    remaining = unpack_stream(
                        Packer::for_bit_depth(error_bit_depth),
                        remaining,
                        &mut self.diff_error,
                    )?;
                    diff::reconstruct(
                        &self.diff_full,
                        &self.diff_error,
                        &mut self.block[index..index + num_samples],
                    );
                    self.template_start = index;
                    self.template_len = num_samples;
                }
            }
            index += num_samples;
        }
        Ok(remaining)
    }

    fn unpack_payload<'a>(
        &mut self,
        packer: Packer,
        input: &'a [u8],
        range: std::ops::Range<usize>,
    ) -> Result<&'a [u8], DecodeError> {
        let num_bytes = packer.byte_count(range.len());
        if input.len() < num_bytes {
            return Err(DecodeError::Truncated);
        }
        packer.unpack(&input[..num_bytes], &mut self.block[range]);
        Ok(&input[num_bytes..])
    }
}

fn unpack_stream<'a>(
    packer: Packer,
    input: &'a [u8],
    dest: &mut [i16],
) -> Result<&'a [u8], DecodeError> {
    let num_bytes = packer.byte_count(dest.len());
    if input.len() < num_bytes {
        return Err(DecodeError::Truncated);
    }
    packer.unpack(&input[..num_bytes], dest);
    Ok(&input[num_bytes..])
}

fn parse_header(input: &[u8]) -> Result<(&[u8], CycleHeader), DecodeError> {
    match header::cycle_header::<nom::error::Error<&[u8]>>(input) {
        Ok((rest, parsed)) => Ok((rest, parsed)),
        Err(nom::Err::Incomplete(_)) => Err(DecodeError::Truncated),
        Err(_) => input
            .first()
            .map_or(Err(DecodeError::Truncated), |&b| {
                Err(DecodeError::UnknownHeader(b))
            }),
    }
}
