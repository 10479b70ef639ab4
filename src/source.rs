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

//! Module for sample buffer handling.

use super::constant::MAX_CHANNELS;
use super::error::RangeError;

/// Reorders interleaved samples into a deinterleaved pattern.
///
/// Samples missing from `interleaved` (when it is shorter than `dest`) are
/// filled with zeros.
pub fn deinterleave(interleaved: &[i16], channels: usize, dest: &mut [i16]) {
    let samples = dest.len() / channels;
    let src_samples = interleaved.len() / channels;
    for t in 0..samples {
        for ch in 0..channels {
            dest[samples * ch + t] = if t < src_samples {
                interleaved[channels * t + ch]
            } else {
                0i16
            }
        }
    }
}

/// Multi-channel buffer of 16-bit PCM samples in the channel-major order.
///
/// This is the only shared resource between a caller and a running encode
/// call, and it is always accessed read-only through borrowed sub-slices;
/// no codec component ever copies or mutates it during encoding.  During
/// decoding the destination `SampleBuffer` is exclusively owned and written
/// by the single decode call in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    channels: usize,
    len: usize,
}

impl SampleBuffer {
    /// Constructs a zero-filled `SampleBuffer`, e.g. as a decode destination.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if `channels` is zero or larger than
    /// [`MAX_CHANNELS`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use cyclac::source::SampleBuffer;
    /// let buf = SampleBuffer::new(2, 4096).unwrap();
    /// assert_eq!(buf.len(), 4096);
    /// assert_eq!(buf.channels(), 2);
    /// ```
    pub fn new(channels: usize, len: usize) -> Result<Self, RangeError> {
        verify_channels(channels)?;
        Ok(Self {
            samples: vec![0i16; len * channels],
            channels,
            len,
        })
    }

    /// Constructs `SampleBuffer` from channel-interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if `channels` is out of range or the length of
    /// `interleaved` is not a multiple of `channels`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cyclac::source::SampleBuffer;
    /// let buf = SampleBuffer::from_interleaved(&[1, -1, 2, -2], 2).unwrap();
    /// assert_eq!(buf.channel_slice(0), &[1, 2]);
    /// assert_eq!(buf.channel_slice(1), &[-1, -2]);
    /// ```
    pub fn from_interleaved(interleaved: &[i16], channels: usize) -> Result<Self, RangeError> {
        verify_channels(channels)?;
        if interleaved.len() % channels != 0 {
            return Err(RangeError::from_display(
                "interleaved.len()",
                "must be a multiple of the channel count",
                &interleaved.len(),
            ));
        }
        let len = interleaved.len() / channels;
        let mut samples = vec![0i16; len * channels];
        deinterleave(interleaved, channels, &mut samples);
        Ok(Self {
            samples,
            channels,
            len,
        })
    }

    /// Constructs a single-channel `SampleBuffer` without copying.
    pub fn from_mono(samples: Vec<i16>) -> Self {
        let len = samples.len();
        Self {
            samples,
            channels: 1,
            len,
        }
    }

    /// Returns the number of samples per channel.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer contains no samples.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of channels.
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Returns samples from the given channel.
    pub fn channel_slice(&self, ch: usize) -> &[i16] {
        &self.samples[ch * self.len..(ch + 1) * self.len]
    }

    /// Returns mutable samples from the given channel.
    pub fn channel_slice_mut(&mut self, ch: usize) -> &mut [i16] {
        &mut self.samples[ch * self.len..(ch + 1) * self.len]
    }

    /// Returns samples reordered into the channel-interleaved pattern.
    pub fn to_interleaved(&self) -> Vec<i16> {
        let mut ret = vec![0i16; self.samples.len()];
        for ch in 0..self.channels {
            for (t, x) in self.channel_slice(ch).iter().enumerate() {
                ret[t * self.channels + ch] = *x;
            }
        }
        ret
    }
}

fn verify_channels(channels: usize) -> Result<(), RangeError> {
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(RangeError::from_display(
            "channels",
            "must be 1 or 2",
            &channels,
        ));
    }
    Ok(())
}
