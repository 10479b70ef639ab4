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

//! Test signal generators and integrity helpers.

#![allow(clippy::missing_panics_doc)]

use rand::Rng;
use rand::SeedableRng;

use super::bytesink::MemSink;
use super::config::CodecOptions;
use super::decoder::Decoder;
use super::encoder::Encoder;
use super::source::SampleBuffer;

fn quantize(x: f32) -> i16 {
    x.round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Generates a pure sinusoid quantized to 16-bit.
pub fn sine_signal(len: usize, period: usize, amplitude: f32) -> Vec<i16> {
    (0..len)
        .map(|t| {
            quantize(amplitude * f32::sin(2.0 * std::f32::consts::PI * t as f32 / period as f32))
        })
        .collect()
}

/// Generates uniform white noise in `[-amplitude, amplitude]`.
pub fn noise_signal(len: usize, amplitude: f32, seed: u64) -> Vec<i16> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| quantize(rng.gen_range(-amplitude..=amplitude)))
        .collect()
}

/// Generates a sinusoid with additive uniform noise.
pub fn sine_plus_noise(
    len: usize,
    period: usize,
    amplitude: f32,
    noise_amplitude: f32,
    seed: u64,
) -> Vec<i16> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len)
        .map(|t| {
            let s = amplitude * f32::sin(2.0 * std::f32::consts::PI * t as f32 / period as f32);
            quantize(s + rng.gen_range(-noise_amplitude..=noise_amplitude))
        })
        .collect()
}

/// Runs an integrity test over the given options and source buffer.
///
/// Compresses `source`, decompresses the resulting stream into a buffer of
/// the same shape, and asserts bit-exact equality.  Returns the compressed
/// bytes and the block offset table for further assertions.
pub fn assert_round_trip(options: CodecOptions, source: &SampleBuffer) -> (Vec<u8>, Vec<u32>) {
    let mut encoder = Encoder::new(options).expect("invalid options");
    let mut sink = MemSink::new();
    let mut offsets = vec![];
    encoder
        .compress(source, &mut sink, &mut offsets)
        .expect("compression failed");

    let mut decoded =
        SampleBuffer::new(source.channels(), source.len()).expect("construction failed");
    Decoder::new()
        .decompress(sink.as_slice(), &mut decoded)
        .expect("decompression failed");

    for ch in 0..source.channels() {
        assert_eq!(
            decoded.channel_slice(ch),
            source.channel_slice(ch),
            "round trip mismatch in channel {ch}"
        );
    }
    (sink.into_inner(), offsets)
}
