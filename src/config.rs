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

//! Encoder configuration structs.

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::constant::BLOCK_SIZE;
use super::constant::MAX_BIT_DEPTH;
use super::error::verify_range;
use super::error::verify_true;
use super::error::Verify;
use super::error::VerifyError;

/// Configuration for one encoder/decoder pair, fixed for the lifetime of an
/// instance.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct CodecOptions {
    /// Threshold below which an entire block is encoded as a single template
    /// cycle, skipping the cycle search.
    pub bit_rate_for_whole_block: u8,
    /// If set, forces a constant cycle length instead of searching for one.
    pub fixed_block_width: Option<usize>,
    /// If set, the length found for a block's first cycle is kept for the
    /// rest of the block.
    pub reuse_first_cycle_length_for_block: bool,
    /// Enables delta cycles (differences against the last template cycle).
    pub use_delta_encoding: bool,
    /// Minimum fraction of the template's bit rate that a delta must shave
    /// off to be accepted.
    pub delta_cycle_threshold: f32,
    /// Enables the alternative full/error split for fixed-width cycles.
    pub use_diff_encoding_with_fixed_blocks: bool,
    /// Removes the DC offset of a difference signal before estimating its
    /// bit reduction.  Only the estimate changes; payloads always carry raw
    /// differences.
    pub remove_dc_offset: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            bit_rate_for_whole_block: 4,
            fixed_block_width: None,
            reuse_first_cycle_length_for_block: true,
            use_delta_encoding: true,
            delta_cycle_threshold: 0.2,
            use_diff_encoding_with_fixed_blocks: false,
            remove_dc_offset: true,
        }
    }
}

impl CodecOptions {
    /// Preset that stores each block as a single template cycle.
    ///
    /// Cheapest to encode; compression relies on bit-depth reduction alone.
    pub fn whole_block() -> Self {
        Self {
            bit_rate_for_whole_block: MAX_BIT_DEPTH,
            use_delta_encoding: false,
            ..Self::default()
        }
    }

    /// Preset using the adaptive cycle search with delta encoding.
    pub fn delta() -> Self {
        Self::default()
    }

    /// Preset using fixed-width cycles with the diff (full/error) split.
    pub fn diff() -> Self {
        Self {
            fixed_block_width: Some(64),
            use_delta_encoding: false,
            use_diff_encoding_with_fixed_blocks: true,
            ..Self::default()
        }
    }
}

impl Verify for CodecOptions {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_range!(
            "bit_rate_for_whole_block",
            self.bit_rate_for_whole_block,
            ..=MAX_BIT_DEPTH
        )?;
        verify_true!(
            "delta_cycle_threshold",
            (0.0..=1.0).contains(&self.delta_cycle_threshold),
            "must be within [0.0, 1.0]"
        )?;
        if let Some(width) = self.fixed_block_width {
            verify_range!("fixed_block_width", width, 2..=BLOCK_SIZE)?;
        }
        if self.use_diff_encoding_with_fixed_blocks {
            let width = self.fixed_block_width.ok_or_else(|| {
                VerifyError::new(
                    "fixed_block_width",
                    "must be set when diff encoding is enabled",
                )
            })?;
            verify_true!(
                "fixed_block_width",
                width >= 4 && width.is_power_of_two(),
                "must be a power of two >= 4 when diff encoding is enabled"
            )?;
        }
        Ok(())
    }
}
