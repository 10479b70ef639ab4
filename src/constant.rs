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

//! Configuration constants

// Constants sorted in an alphabetical-order.  Top-level constants first, and
// then sub-modules. Constants that are used only in a specific sub-module or
// its caller should be placed in the corresponding submodule.

/// Number of samples in a compression block.
///
/// Blocks are the unit of the byte-offset bookkeeping: one offset-table entry
/// is emitted per block, so a decoder can seek to any block boundary without
/// decoding the preceding stream.
pub const BLOCK_SIZE: usize = 4096;

/// Number of bytes a cycle header occupies in the stream, for every header
/// shape.
pub const HEADER_SIZE: usize = 3;

/// Maximum bit depth of a cycle payload. Input samples are 16-bit PCM.
pub const MAX_BIT_DEPTH: u8 = 16;

/// Maximum number of channels in a [`SampleBuffer`].
///
/// [`SampleBuffer`]: crate::source::SampleBuffer
pub const MAX_CHANNELS: usize = 2;

// `BLOCK_SIZE` must stay a power of two: diff headers store `log2` of cycle
// lengths, and the offset table assumes uniform block boundaries.
const _: () = assert!(BLOCK_SIZE.is_power_of_two());

/// Constants defining the per-cycle header byte layout.
pub mod header {
    /// Sentinel byte introducing a diff-encoded cycle.
    pub const DIFF_SENTINEL: u8 = 0xE0;

    /// Largest value a generic cycle-header byte can take (bit 0 carries the
    /// template flag, bits 1-4 carry `bit_depth - 1`, bits 5-7 are zero).
    pub const GENERIC_MAX: u8 = 0x1F;

    /// Bit marking the reserved shorthand range.
    ///
    /// Shorthand bytes are `RESERVED_BIT | (depth << 1) | 1` for template
    /// cycles of depth 0, 1 and 2, which keeps them disjoint from both the
    /// generic range and [`DIFF_SENTINEL`].
    pub const RESERVED_BIT: u8 = 0x20;

    /// Largest bit depth a shorthand sentinel can carry.
    pub const MAX_SHORTHAND_DEPTH: u8 = 2;
}

/// Constants bounding the encoder's cycle-search heuristics.
pub mod search {
    /// Remainders of this size or less skip the periodicity search and are
    /// flushed as a single tiny cycle.
    pub const TAIL_THRESHOLD: usize = 4;

    /// Cycles shorter than this are never delta-encoded; the per-cycle
    /// header overhead dominates below this size.
    pub const MIN_DELTA_LENGTH: usize = 8;

    /// Shortest cycle length the periodicity search will consider.
    pub const MIN_CANDIDATE_LENGTH: usize = 16;

    /// Longest cycle length the periodicity search will consider.
    pub const MAX_CANDIDATE_LENGTH: usize = 512;

    /// Shortest cycle length eligible for diff encoding.
    pub const MIN_DIFF_LENGTH: usize = 4;
}

/// Module for internal error messages.
///
/// Use `panic!` and those messages only for unrecoverable internal errors.
/// It's okay to use them in tests, but it's not okay to add another variable
/// only for test functions.
pub(crate) mod panic_msg {
    pub const DATA_INCONSISTENT: &str = "INTERNAL ERROR: Internal variable inconsistency detected.";
    pub const NO_ERROR_EXPECTED: &str =
        "INTERNAL ERROR: Error emitted from the function designed not to return err.";
}
