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

#![doc = include_str!("../README.md")]
// Note that clippy attributes should be in sync with those declared in
// downstream binaries, if any.
#![warn(clippy::all, clippy::nursery, clippy::pedantic, clippy::cargo)]
// Some of clippy::pedantic rules are actually useful, so use it with a lot of
// ad-hoc exceptions.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_const_for_fn,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate
)]
// Some from restriction lint-group
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::if_then_some_else_none,
    clippy::impl_trait_in_params,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::separated_literal_suffix,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_to_string,
    clippy::try_err,
    clippy::unnecessary_self_imports,
    clippy::wildcard_enum_match_arm
)]

#[cfg(feature = "log")]
macro_rules! codec_log {
    ($($args:tt)*) => {
        log::trace!($($args)*)
    };
}
#[cfg(not(feature = "log"))]
macro_rules! codec_log {
    ($($args:tt)*) => {{}};
}
pub(crate) use codec_log;

pub(crate) mod bitdepth;
pub mod bytesink;
pub mod config;
pub mod constant;
pub(crate) mod decoder;
pub(crate) mod diff;
pub(crate) mod encoder;
pub mod error;
pub(crate) mod header;
pub(crate) mod pack;
pub mod source;

#[cfg(test)]
pub mod test_helper;

// import global entry points
pub use decoder::Decoder;

pub use encoder::Encoder;

#[cfg(test)]
mod test {
    // end-to-end, but transparent test.
    use super::config::CodecOptions;
    use super::constant::BLOCK_SIZE;
    use super::source::SampleBuffer;
    use super::*;
    use rstest::rstest;

    const OPTION_CONFIGS: [&str; 7] = [
        "",
        r"
use_delta_encoding = false
        ",
        r"
fixed_block_width = 123
        ",
        r"
fixed_block_width = 64
use_delta_encoding = false
use_diff_encoding_with_fixed_blocks = true
        ",
        r"
bit_rate_for_whole_block = 16
        ",
        r"
reuse_first_cycle_length_for_block = false
        ",
        r"
delta_cycle_threshold = 0.05
remove_dc_offset = false
        ",
    ];

    fn stereo_test_signal(signal_len: usize) -> SampleBuffer {
        let mut interleaved = vec![];
        let left = test_helper::sine_plus_noise(signal_len, 280, 18000.0, 120.0, 123);
        let right = test_helper::sine_plus_noise(signal_len, 93, 9000.0, 450.0, 456);
        for t in 0..signal_len {
            interleaved.push(left[t]);
            interleaved.push(right[t]);
        }
        SampleBuffer::from_interleaved(&interleaved, 2).expect("construction failed")
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn e2e_with_generated_sinusoids(
        #[values(1, 2)] channels: usize,
        #[values(OPTION_CONFIGS[0],
                 OPTION_CONFIGS[1],
                 OPTION_CONFIGS[2],
                 OPTION_CONFIGS[3],
                 OPTION_CONFIGS[4],
                 OPTION_CONFIGS[5],
                 OPTION_CONFIGS[6])]
        config: &str,
    ) {
        let signal_len = 16123;
        let options: CodecOptions = toml::from_str(config).expect("config parsing error");

        let source = if channels == 2 {
            stereo_test_signal(signal_len)
        } else {
            SampleBuffer::from_mono(test_helper::sine_plus_noise(
                signal_len, 280, 18000.0, 120.0, 123,
            ))
        };

        let (_, offsets) = test_helper::assert_round_trip(options, &source);
        assert_eq!(offsets.len(), signal_len / BLOCK_SIZE + 1);
    }

    #[rstest]
    fn e2e_with_edge_lengths(
        #[values(0, 1, 5, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1, BLOCK_SIZE + 3,
                 2 * BLOCK_SIZE)]
        signal_len: usize,
    ) {
        for options in [
            CodecOptions::default(),
            CodecOptions::whole_block(),
            CodecOptions::diff(),
        ] {
            let source = SampleBuffer::from_mono(test_helper::sine_plus_noise(
                signal_len, 150, 12000.0, 80.0, 7,
            ));
            let (bytes, offsets) = test_helper::assert_round_trip(options, &source);
            if signal_len == 0 {
                assert!(bytes.is_empty());
                assert!(offsets.is_empty());
            } else {
                assert_eq!(offsets.len(), (signal_len + BLOCK_SIZE - 1) / BLOCK_SIZE);
            }
        }
    }

    #[rstest]
    fn e2e_with_extreme_amplitudes(#[values(1, 2)] channels: usize) {
        // full-scale square-ish content exercises the widest packers and the
        // wrapping delta arithmetic
        let signal_len = BLOCK_SIZE + 500;
        let samples: Vec<i16> = (0..signal_len * channels)
            .map(|t| if (t / 70) % 2 == 0 { i16::MAX } else { i16::MIN })
            .collect();
        let source = SampleBuffer::from_interleaved(&samples, channels).expect("bad shape");
        test_helper::assert_round_trip(CodecOptions::default(), &source);
    }

    #[test]
    fn e2e_all_zero_buffer() {
        let source = SampleBuffer::from_mono(vec![0i16; 3 * BLOCK_SIZE]);
        let (bytes, offsets) = test_helper::assert_round_trip(CodecOptions::default(), &source);
        // three depth-0 shorthand headers, nothing else
        assert_eq!(bytes.len(), 9);
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[test]
    fn offset_table_entries_match_per_block_byte_counts() {
        let signal_len = 4 * BLOCK_SIZE + 77;
        let source = stereo_test_signal(signal_len);
        let (bytes, offsets) = test_helper::assert_round_trip(CodecOptions::default(), &source);

        // each entry is the byte position where its block begins, so a
        // decoder can seek to any block
        let mut decoder = Decoder::new();
        for (i, &offset) in offsets.iter().enumerate() {
            let block_len = BLOCK_SIZE.min(signal_len - i * BLOCK_SIZE);
            let mut block = SampleBuffer::new(2, block_len).expect("construction failed");
            let consumed = decoder
                .decode_block(&bytes[offset as usize..], &mut block)
                .expect("seek decode failed");
            let expected_end = offsets.get(i + 1).map_or(bytes.len(), |&o| o as usize);
            assert_eq!(offset as usize + consumed, expected_end, "block {i}");
            for ch in 0..2 {
                assert_eq!(
                    block.channel_slice(ch),
                    &source.channel_slice(ch)[i * BLOCK_SIZE..i * BLOCK_SIZE + block_len]
                );
            }
        }
    }
}
