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

//! Abstract interface for byte-based output.

use std::convert::Infallible;

/// Storage-agnostic interface trait for byte-based output.
///
/// The encoder emits a sequence of cycle headers and bit-packed payloads,
/// all of which are byte-aligned.  Types implementing `ByteSink` transfer
/// those bytes to the backend storage. [`MemSink`] is a standard
/// implementation that collects the stream into a `Vec` of [`u8`]s, and
/// [`IoSink`] adapts any [`std::io::Write`].
pub trait ByteSink: Sized {
    /// Error type that may happen while writing bytes to `ByteSink`.
    type Error: std::error::Error;

    /// Writes all bytes of `buf` to the sink.
    ///
    /// # Errors
    ///
    /// It can emit errors describing backend issues.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Writes a single byte.
    ///
    /// # Errors
    ///
    /// It can emit errors describing backend issues.
    #[inline]
    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.write_bytes(&[val])
    }

    /// Writes `val` in two's complement little-endian format.
    ///
    /// # Errors
    ///
    /// It can emit errors describing backend issues.
    ///
    /// # Examples
    ///
    /// ```
    /// # fn main() -> Result<(), std::convert::Infallible> {
    /// use cyclac::bytesink::{ByteSink, MemSink};
    ///
    /// let mut sink = MemSink::new();
    /// sink.write_i16_le(-2)?;
    /// assert_eq!(sink.as_slice(), &[0xFE, 0xFF]);
    /// # Ok(())}
    /// ```
    #[inline]
    fn write_i16_le(&mut self, val: i16) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_le_bytes())
    }
}

/// `ByteSink` implementation based on a [`Vec`] of [`u8`]s.
///
/// Since this type stores the stream in plain bytes, the internal buffer can
/// directly be handed to, e.g. [`std::io::Write`] via the [`write_all`]
/// method, or wrapped into a container format.
///
/// [`write_all`]: std::io::Write::write_all
#[derive(Clone, Debug, Default)]
pub struct MemSink {
    bytes: Vec<u8>,
}

impl MemSink {
    /// Creates new `MemSink` instance with the default capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cyclac::bytesink::*;
    /// let sink = MemSink::new();
    /// let empty: [u8; 0] = [];
    /// assert_eq!(&empty, sink.as_slice());
    /// ```
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates new `MemSink` instance with the specified capacity (in bytes).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes stored in the buffer.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Checks if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Clears the vector, removing all values.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Returns a reference to the internal bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cyclac::bytesink::*;
    /// let mut sink = MemSink::new();
    /// sink.write_bytes(&[0xAB; 4]);
    /// assert_eq!(sink.as_slice(), &[0xAB; 4]);
    /// ```
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes `MemSink` and returns the internal buffer.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl ByteSink for MemSink {
    type Error = Infallible;

    #[inline]
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.bytes.extend_from_slice(buf);
        Ok(())
    }
}

/// `ByteSink` implementation wrapping a [`std::io::Write`].
///
/// Write failures of the inner writer abort the current encode call and
/// surface as [`OutputError::Sink`].
///
/// [`OutputError::Sink`]: crate::error::OutputError::Sink
#[derive(Debug)]
pub struct IoSink<W: std::io::Write> {
    inner: W,
}

impl<W: std::io::Write> IoSink<W> {
    /// Creates `IoSink` wrapping the given writer.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Consumes `IoSink` and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: std::io::Write> ByteSink for IoSink<W> {
    type Error = std::io::Error;

    #[inline]
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(buf)
    }
}
