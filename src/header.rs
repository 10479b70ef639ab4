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

//! Per-cycle header codec.
//!
//! Every cycle starts with a 3-byte header in one of three shapes:
//!
//! - Reserved shorthand: one of three sentinel bytes for template cycles of
//!   depth 0, 1 or 2 (these depths are common and worth a minimal fixed
//!   cost), followed by the 2-byte sample count.  A depth-0 shorthand with
//!   no payload doubles as the padding entry that closes a short final
//!   block.
//! - Generic: one byte carrying the template/delta flag (bit 0) and
//!   `bit_depth - 1` (bits 1-4), followed by the 2-byte little-endian
//!   signed sample count.
//! - Diff: the fixed sentinel byte, then `log2(cycle_len)`, then the full
//!   and error bit depths packed 4 bits each.  Diff cycles always have a
//!   fixed power-of-two length, so no explicit sample count is stored.
//!
//! The generic byte can never collide with the diff sentinel or a shorthand
//! sentinel; this is enforced with a validated check on the encode path,
//! not assumed.

use nom::error::ParseError;
use nom::error_position;
use nom::number::streaming::be_u8;
use nom::number::streaming::le_i16;
use nom::IResult;

use super::bytesink::ByteSink;
use super::constant::header::DIFF_SENTINEL;
use super::constant::header::GENERIC_MAX;
use super::constant::header::MAX_SHORTHAND_DEPTH;
use super::constant::header::RESERVED_BIT;
use super::constant::search::MIN_DIFF_LENGTH;
use super::constant::BLOCK_SIZE;
use super::constant::MAX_BIT_DEPTH;
use super::error::OutputError;
use super::error::RangeError;

/// Decoded form of a per-cycle header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum CycleHeader {
    /// A template or delta cycle with an explicit sample count.
    Cycle {
        is_template: bool,
        bit_depth: u8,
        num_samples: u16,
    },
    /// A diff cycle; the sample count is implied by `log2_num_samples`.
    Diff {
        full_bit_depth: u8,
        error_bit_depth: u8,
        log2_num_samples: u8,
    },
}

impl CycleHeader {
    /// Makes a template/delta header, validating field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if the sample count exceeds a block, the bit
    /// depth is unrepresentable, or a delta is requested at depth 0 (delta
    /// payloads are always at least one bit wide).
    pub fn cycle(
        is_template: bool,
        bit_depth: u8,
        num_samples: usize,
    ) -> Result<Self, RangeError> {
        if num_samples == 0 || num_samples > BLOCK_SIZE {
            return Err(RangeError::from_display(
                "num_samples",
                "must be within a block",
                &num_samples,
            ));
        }
        if bit_depth > MAX_BIT_DEPTH {
            return Err(RangeError::from_display(
                "bit_depth",
                "must be at most 16",
                &bit_depth,
            ));
        }
        if !is_template && bit_depth == 0 {
            return Err(RangeError::from_display(
                "bit_depth",
                "must be at least 1 for delta cycles",
                &bit_depth,
            ));
        }
        Ok(Self::Cycle {
            is_template,
            bit_depth,
            num_samples: num_samples as u16,
        })
    }

    /// Makes a diff header, validating field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if the cycle length is not an eligible power
    /// of two or a stream depth is outside 1..=16.
    pub fn diff(
        full_bit_depth: u8,
        error_bit_depth: u8,
        num_samples: usize,
    ) -> Result<Self, RangeError> {
        if !crate::diff::eligible_length(num_samples) || num_samples > BLOCK_SIZE {
            return Err(RangeError::from_display(
                "num_samples",
                "must be a power of two within 4..=BLOCK_SIZE for diff cycles",
                &num_samples,
            ));
        }
        for (var, depth) in [
            ("full_bit_depth", full_bit_depth),
            ("error_bit_depth", error_bit_depth),
        ] {
            if depth == 0 || depth > MAX_BIT_DEPTH {
                return Err(RangeError::from_display(var, "must be within 1..=16", &depth));
            }
        }
        Ok(Self::Diff {
            full_bit_depth,
            error_bit_depth,
            log2_num_samples: num_samples.trailing_zeros() as u8,
        })
    }

    /// Returns the number of samples this header declares.
    pub const fn num_samples(&self) -> usize {
        match *self {
            Self::Cycle { num_samples, .. } => num_samples as usize,
            Self::Diff {
                log2_num_samples, ..
            } => 1usize << log2_num_samples,
        }
    }

    /// Writes the 3-byte wire form to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Range`] if the computed header byte collides
    /// with the diff sentinel, or [`OutputError::Sink`] on backend failure.
    pub fn write<S: ByteSink>(&self, sink: &mut S) -> Result<(), OutputError<S>> {
        match *self {
            Self::Cycle {
                is_template,
                bit_depth,
                num_samples,
            } => {
                let byte = cycle_header_byte(is_template, bit_depth)?;
                sink.write_u8(byte).map_err(OutputError::from_sink)?;
                sink.write_i16_le(num_samples as i16)
                    .map_err(OutputError::from_sink)
            }
            Self::Diff {
                full_bit_depth,
                error_bit_depth,
                log2_num_samples,
            } => {
                sink.write_u8(DIFF_SENTINEL)
                    .map_err(OutputError::from_sink)?;
                sink.write_u8(log2_num_samples)
                    .map_err(OutputError::from_sink)?;
                let rates = ((full_bit_depth - 1) << 4) | (error_bit_depth - 1);
                sink.write_u8(rates).map_err(OutputError::from_sink)
            }
        }
    }
}

/// Computes the leading byte of a template/delta header.
///
/// Template depths 0..=2 take the reserved shorthand sentinels; everything
/// else takes the generic encoding.
fn cycle_header_byte(is_template: bool, bit_depth: u8) -> Result<u8, RangeError> {
    let byte = if is_template && bit_depth <= MAX_SHORTHAND_DEPTH {
        RESERVED_BIT | (bit_depth << 1) | 1
    } else {
        u8::from(is_template) | ((bit_depth - 1) << 1)
    };
    // The layout makes a collision impossible, but a silent collision would
    // corrupt every following cycle, so it is checked rather than assumed.
    if byte == DIFF_SENTINEL {
        return Err(RangeError::from_display(
            "header",
            "collides with the diff sentinel",
            &byte,
        ));
    }
    Ok(byte)
}

const MIN_DIFF_LOG2: u8 = MIN_DIFF_LENGTH.trailing_zeros() as u8;
const MAX_DIFF_LOG2: u8 = BLOCK_SIZE.trailing_zeros() as u8;

/// Recognizes a [`CycleHeader`] at the head of `input`.
///
/// # Errors
///
/// Same as other nom parsers, this returns [`nom::Err`] if `input` doesn't
/// conform to the format.
pub(crate) fn cycle_header<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], CycleHeader, E>
where
    E: ParseError<&'a [u8]>,
{
    let (remaining_input, byte) = be_u8(input)?;

    if byte == DIFF_SENTINEL {
        let (remaining_input, log2_num_samples) = be_u8(remaining_input)?;
        let (remaining_input, rates) = be_u8(remaining_input)?;
        if !(MIN_DIFF_LOG2..=MAX_DIFF_LOG2).contains(&log2_num_samples) {
            return Err(nom::Err::Error(error_position!(
                input,
                nom::error::ErrorKind::Verify
            )));
        }
        return Ok((
            remaining_input,
            CycleHeader::Diff {
                full_bit_depth: (rates >> 4) + 1,
                error_bit_depth: (rates & 0x0F) + 1,
                log2_num_samples,
            },
        ));
    }

    let header = if byte & RESERVED_BIT != 0 {
        let bit_depth = (byte >> 1) & 0x0F;
        if byte != (RESERVED_BIT | (bit_depth << 1) | 1) || bit_depth > MAX_SHORTHAND_DEPTH {
            return Err(nom::Err::Error(error_position!(
                input,
                nom::error::ErrorKind::Tag
            )));
        }
        (true, bit_depth)
    } else if byte <= GENERIC_MAX {
        let is_template = byte & 1 != 0;
        let bit_depth = ((byte >> 1) & 0x0F) + 1;
        // template depths 0..=2 are always written as shorthand
        if is_template && bit_depth <= MAX_SHORTHAND_DEPTH {
            return Err(nom::Err::Error(error_position!(
                input,
                nom::error::ErrorKind::Tag
            )));
        }
        (is_template, bit_depth)
    } else {
        return Err(nom::Err::Error(error_position!(
            input,
            nom::error::ErrorKind::Tag
        )));
    };

    let (remaining_input, num_samples) = le_i16(remaining_input)?;
    if num_samples < 1 || num_samples as usize > BLOCK_SIZE {
        return Err(nom::Err::Error(error_position!(
            input,
            nom::error::ErrorKind::Verify
        )));
    }
    Ok((
        remaining_input,
        CycleHeader::Cycle {
            is_template: header.0,
            bit_depth: header.1,
            num_samples: num_samples as u16,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bytesink::MemSink;
    use rstest::rstest;

    type NomError<'a> = nom::error::Error<&'a [u8]>;

    fn write_to_bytes(header: &CycleHeader) -> Vec<u8> {
        let mut sink = MemSink::new();
        header.write(&mut sink).expect("header write failed");
        let bytes = sink.into_inner();
        assert_eq!(bytes.len(), crate::constant::HEADER_SIZE);
        bytes
    }

    #[rstest]
    #[case(true, 0, 100)]
    #[case(true, 1, 4096)]
    #[case(true, 2, 1)]
    #[case(true, 3, 17)]
    #[case(true, 16, 500)]
    #[case(false, 1, 64)]
    #[case(false, 9, 63)]
    #[case(false, 16, 2048)]
    fn cycle_headers_round_trip(
        #[case] is_template: bool,
        #[case] bit_depth: u8,
        #[case] num_samples: usize,
    ) {
        let header =
            CycleHeader::cycle(is_template, bit_depth, num_samples).expect("invalid header");
        let bytes = write_to_bytes(&header);
        let (rest, parsed) = cycle_header::<NomError>(&bytes).expect("parse failed");
        assert!(rest.is_empty());
        assert_eq!(parsed, header);
        assert_eq!(parsed.num_samples(), num_samples);
    }

    #[rstest]
    #[case(1, 1, 4)]
    #[case(3, 2, 64)]
    #[case(16, 16, 4096)]
    fn diff_headers_round_trip(#[case] full: u8, #[case] error: u8, #[case] num_samples: usize) {
        let header = CycleHeader::diff(full, error, num_samples).expect("invalid header");
        let bytes = write_to_bytes(&header);
        assert_eq!(bytes[0], DIFF_SENTINEL);
        let (rest, parsed) = cycle_header::<NomError>(&bytes).expect("parse failed");
        assert!(rest.is_empty());
        assert_eq!(parsed, header);
        assert_eq!(parsed.num_samples(), num_samples);
    }

    #[test]
    fn no_header_byte_collides_with_the_diff_sentinel() {
        for depth in 0..=16u8 {
            if depth > 0 {
                assert_ne!(cycle_header_byte(false, depth).unwrap(), DIFF_SENTINEL);
            }
            assert_ne!(cycle_header_byte(true, depth).unwrap(), DIFF_SENTINEL);
        }
    }

    #[test]
    fn shorthand_and_generic_ranges_are_disjoint() {
        let shorthands = [
            cycle_header_byte(true, 0).unwrap(),
            cycle_header_byte(true, 1).unwrap(),
            cycle_header_byte(true, 2).unwrap(),
        ];
        assert_eq!(shorthands, [0x21, 0x23, 0x25]);
        for depth in 3..=16u8 {
            let b = cycle_header_byte(true, depth).unwrap();
            assert!(b <= GENERIC_MAX);
            assert!(!shorthands.contains(&b));
        }
        for depth in 1..=16u8 {
            let b = cycle_header_byte(false, depth).unwrap();
            assert!(b <= GENERIC_MAX);
            assert!(!shorthands.contains(&b));
        }
    }

    #[test]
    fn construction_rejects_out_of_range_fields() {
        assert!(CycleHeader::cycle(true, 3, 0).is_err());
        assert!(CycleHeader::cycle(true, 3, BLOCK_SIZE + 1).is_err());
        assert!(CycleHeader::cycle(true, 17, 8).is_err());
        assert!(CycleHeader::cycle(false, 0, 8).is_err());
        assert!(CycleHeader::diff(1, 1, 24).is_err());
        assert!(CycleHeader::diff(0, 1, 64).is_err());
        assert!(CycleHeader::diff(1, 17, 64).is_err());
    }

    #[rstest]
    #[case(&[0xC1, 0, 0])]
    #[case(&[0x27, 4, 0])]
    #[case(&[0x03, 4, 0])]
    fn unknown_bytes_are_rejected(#[case] bytes: &[u8]) {
        assert!(cycle_header::<NomError>(bytes).is_err());
    }

    #[test]
    fn zero_and_oversized_counts_are_rejected() {
        assert!(cycle_header::<NomError>(&[0x05, 0, 0]).is_err());
        let oversized = (BLOCK_SIZE as i16 + 1).to_le_bytes();
        assert!(cycle_header::<NomError>(&[0x05, oversized[0], oversized[1]]).is_err());
    }

    #[test]
    fn truncation_is_incomplete() {
        assert!(matches!(
            cycle_header::<NomError>(&[0x05, 1]),
            Err(nom::Err::Incomplete(_))
        ));
        assert!(matches!(
            cycle_header::<NomError>(&[DIFF_SENTINEL]),
            Err(nom::Err::Incomplete(_))
        ));
    }
}
