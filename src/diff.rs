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

//! Full/error value split for diff-encoded cycles.
//!
//! A diff cycle stores two separately bit-packed streams instead of one:
//! the "full" values are the anchor samples at every 4th index plus the
//! final sample, and the "error" values are the deviations of the remaining
//! samples from integer linear interpolation between their surrounding
//! anchors.  Smooth content yields low-depth error streams while the anchors
//! keep their natural depth.
//!
//! The split only applies to cycle lengths that are powers of two (the
//! header stores `log2` of the length), with a minimum of 4 samples.

use super::constant::search::MIN_DIFF_LENGTH;

/// Returns the number of anchor samples for a cycle of `len` samples.
pub(crate) const fn num_full_values(len: usize) -> usize {
    len / 4 + 1
}

/// Returns the number of interpolated samples for a cycle of `len` samples.
pub(crate) const fn num_error_values(len: usize) -> usize {
    len - num_full_values(len)
}

/// Index of the anchor at slot `k`, for a cycle of `len` samples.
#[inline]
const fn anchor_index(k: usize, len: usize) -> usize {
    if 4 * k < len {
        4 * k
    } else {
        len - 1
    }
}

/// Predicted value at `index` between the anchors at `(ia, a)` and `(ib, b)`.
#[inline]
fn interpolate(a: i16, b: i16, ia: usize, ib: usize, index: usize) -> i16 {
    let span = (ib - ia) as i32;
    let step = (index - ia) as i32;
    (i32::from(a) + (i32::from(b) - i32::from(a)) * step / span) as i16
}

/// Copies the anchor samples of `cycle` into `dest`.
pub(crate) fn full_values(cycle: &[i16], dest: &mut Vec<i16>) {
    debug_assert!(eligible_length(cycle.len()));
    dest.clear();
    for k in 0..num_full_values(cycle.len()) {
        dest.push(cycle[anchor_index(k, cycle.len())]);
    }
}

/// Computes the interpolation errors of the non-anchor samples of `cycle`.
pub(crate) fn error_values(cycle: &[i16], dest: &mut Vec<i16>) {
    debug_assert!(eligible_length(cycle.len()));
    dest.clear();
    let len = cycle.len();
    for k in 0..num_full_values(len) - 1 {
        let ia = anchor_index(k, len);
        let ib = anchor_index(k + 1, len);
        for index in ia + 1..ib {
            let predicted = interpolate(cycle[ia], cycle[ib], ia, ib, index);
            dest.push(cycle[index].wrapping_sub(predicted));
        }
    }
}

/// Rebuilds a cycle from its anchor and error streams.
///
/// Exact inverse of [`full_values`] + [`error_values`]: interpolation runs
/// on the already-restored anchors, so the wrapping-add of each error value
/// reproduces the original sample bit-for-bit.
pub(crate) fn reconstruct(full: &[i16], errors: &[i16], dest: &mut [i16]) {
    let len = dest.len();
    debug_assert!(eligible_length(len));
    debug_assert_eq!(full.len(), num_full_values(len));
    debug_assert_eq!(errors.len(), num_error_values(len));

    let mut head = 0usize;
    for k in 0..full.len() - 1 {
        let ia = anchor_index(k, len);
        let ib = anchor_index(k + 1, len);
        dest[ia] = full[k];
        dest[ib] = full[k + 1];
        for index in ia + 1..ib {
            let predicted = interpolate(full[k], full[k + 1], ia, ib, index);
            dest[index] = predicted.wrapping_add(errors[head]);
            head += 1;
        }
    }
}

/// Checks whether a cycle of `len` samples can be diff-encoded.
pub(crate) const fn eligible_length(len: usize) -> bool {
    len >= MIN_DIFF_LENGTH && len.is_power_of_two()
}
