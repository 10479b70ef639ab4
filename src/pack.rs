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

//! Fixed-width sample packers.
//!
//! Each packer converts between unpacked 16-bit samples and a tightly
//! bit-packed byte stream at one fixed bit depth.  Depths 0, 1 and 2 have
//! dedicated minimal-overhead codecs; depths 3..=16 share a generic packer
//! parameterized by the depth.  Packing and unpacking are exact inverses at
//! every depth.
//!
//! Bits are packed LSB-first: the first sample occupies the least
//! significant bits of the first byte.

use super::constant::panic_msg;
use super::constant::MAX_BIT_DEPTH;

/// A fixed-width codec for one bit depth.
///
/// `Packer` is a plain tag; selection is a pure function of the required
/// bit depth and involves no dynamic dispatch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Packer {
    /// All samples are zero; the payload is empty.
    Zero,
    /// One bit per sample, covering {-1, 0}.
    One,
    /// Two bits per sample, covering [-2, 1].
    Two,
    /// Generic packer for depths 3..=16.
    Bits(u8),
}

impl Packer {
    /// Returns the cheapest packer that covers the required bit depth.
    ///
    /// # Panics
    ///
    /// Panics if `bit_depth` exceeds [`MAX_BIT_DEPTH`].  Depths computed by
    /// the bit-depth analyzer or parsed from a 4-bit header field are always
    /// in range.
    pub fn for_bit_depth(bit_depth: u8) -> Self {
        assert!(bit_depth <= MAX_BIT_DEPTH, "{}", panic_msg::DATA_INCONSISTENT);
        match bit_depth {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Two,
            b => Self::Bits(b),
        }
    }

    /// Returns the bit depth this packer encodes at.
    pub const fn bit_depth(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Bits(b) => b,
        }
    }

    /// Returns the exact payload size for `num_samples` samples.
    pub const fn byte_count(self, num_samples: usize) -> usize {
        (num_samples * self.bit_depth() as usize + 7) / 8
    }

    /// Packs `samples` into `dest`, replacing its previous content.
    ///
    /// Every sample must fit the packer's depth; out-of-range bits are
    /// truncated.
    pub fn pack(self, samples: &[i16], dest: &mut Vec<u8>) {
        dest.clear();
        dest.reserve(self.byte_count(samples.len()));
        match self {
            Self::Zero => {}
            Self::One => {
                for chunk in samples.chunks(8) {
                    let mut byte = 0u8;
                    for (i, &v) in chunk.iter().enumerate() {
                        byte |= ((v as u8) & 1) << i;
                    }
                    dest.push(byte);
                }
            }
            Self::Two => {
                for chunk in samples.chunks(4) {
                    let mut byte = 0u8;
                    for (i, &v) in chunk.iter().enumerate() {
                        byte |= ((v as u8) & 0b11) << (2 * i);
                    }
                    dest.push(byte);
                }
            }
            Self::Bits(b) => {
                let bits = usize::from(b);
                let mask = (1u64 << bits) - 1;
                let mut acc = 0u64;
                let mut acc_bits = 0usize;
                for &v in samples {
                    acc |= (u64::from(v as u16) & mask) << acc_bits;
                    acc_bits += bits;
                    while acc_bits >= 8 {
                        dest.push((acc & 0xFF) as u8);
                        acc >>= 8;
                        acc_bits -= 8;
                    }
                }
                if acc_bits > 0 {
                    dest.push((acc & 0xFF) as u8);
                }
            }
        }
    }

    /// Unpacks `dest.len()` samples from `src` into `dest`.
    ///
    /// # Panics
    ///
    /// Panics if `src` is shorter than `byte_count(dest.len())`.  Callers
    /// validate payload sizes against the stream before unpacking.
    pub fn unpack(self, src: &[u8], dest: &mut [i16]) {
        assert!(src.len() >= self.byte_count(dest.len()));
        match self {
            Self::Zero => {
                dest.fill(0);
            }
            Self::One => {
                for (t, p) in dest.iter_mut().enumerate() {
                    let bit = (src[t / 8] >> (t % 8)) & 1;
                    *p = -i16::from(bit);
                }
            }
            Self::Two => {
                for (t, p) in dest.iter_mut().enumerate() {
                    let raw = (src[t / 4] >> (2 * (t % 4))) & 0b11;
                    *p = i16::from((raw << 6) as i8 >> 6);
                }
            }
            Self::Bits(b) => {
                let bits = usize::from(b);
                let mask = (1u64 << bits) - 1;
                let shift = 16 - b as u32;
                let mut acc = 0u64;
                let mut acc_bits = 0usize;
                let mut head = 0usize;
                for p in dest.iter_mut() {
                    while acc_bits < bits {
                        acc |= u64::from(src[head]) << acc_bits;
                        head += 1;
                        acc_bits += 8;
                    }
                    let raw = (acc & mask) as u16;
                    acc >>= bits;
                    acc_bits -= bits;
                    // sign extension from `b` bits
                    *p = ((raw << shift) as i16) >> shift;
                }
            }
        }
    }
}
