// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Word-aligned bulk operations over bit arrays stored as `u64` words.
//!
//! These scalar loops are the normative semantics; they are written so the
//! compiler can vectorize them, and any vectorized replacement must produce
//! bit-identical state.

/// Number of set bits across all words.
pub(crate) fn popcount(words: &[u64]) -> u64 {
    words.iter().map(|w| u64::from(w.count_ones())).sum()
}

/// `dst |= src`, word-wise.
pub(crate) fn union_into(dst: &mut [u64], src: &[u64]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d |= *s;
    }
}

/// `dst &= src`, word-wise.
pub(crate) fn intersect_into(dst: &mut [u64], src: &[u64]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d &= *s;
    }
}

/// `dst ^= src`, word-wise.
pub(crate) fn xor_into(dst: &mut [u64], src: &[u64]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// Set bits of the word-wise AND, without materializing it.
pub(crate) fn intersection_popcount(a: &[u64], b: &[u64]) -> u64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| u64::from((x & y).count_ones()))
        .sum()
}

/// One-pass `(popcount(a), popcount(b), popcount(a | b))`.
pub(crate) fn popcount_triple(a: &[u64], b: &[u64]) -> (u64, u64, u64) {
    debug_assert_eq!(a.len(), b.len());
    let mut pa = 0u64;
    let mut pb = 0u64;
    let mut pu = 0u64;
    for (x, y) in a.iter().zip(b) {
        pa += u64::from(x.count_ones());
        pb += u64::from(y.count_ones());
        pu += u64::from((x | y).count_ones());
    }
    (pa, pb, pu)
}

/// Folds the upper half of `words` into the lower half by word-wise OR and
/// truncates to half the length. Requires an even length of at least 2.
pub(crate) fn fold_halve(words: &mut Vec<u64>) {
    debug_assert!(words.len() >= 2 && words.len() % 2 == 0);
    let half = words.len() / 2;
    for i in 0..half {
        words[i] |= words[half + i];
    }
    words.truncate(half);
    words.shrink_to_fit();
}

/// Visits each set bit exactly once, in ascending bit-index order.
///
/// Extracts one bit per iteration via `v & v.wrapping_neg()` and a trailing
/// zero count.
pub(crate) fn for_each_set_bit<F: FnMut(u64)>(words: &[u64], mut func: F) {
    let mut base = 0u64;
    for &word in words {
        let mut v = word;
        while v != 0 {
            let t = v & v.wrapping_neg();
            func(base + u64::from(v.trailing_zeros()));
            v ^= t;
        }
        base += 64;
    }
}
