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

//! Data structures and functions that may be used across all the sketch
//! families.

// private to bitsketch crate
pub(crate) mod bits;

/// Number of `p`-bit sub-indices that fit in one 64-bit hash: `64 / p`.
///
/// Cheap enough to compute on demand; no lookup table is kept.
pub fn hashes_per_word(p: u32) -> u32 {
    debug_assert!(p >= 1 && p <= 64);
    64 / p
}

/// Ceiling of the base-2 logarithm of `x` (`x >= 1`).
pub fn ceil_log2(x: u64) -> u32 {
    debug_assert!(x >= 1);
    if x <= 1 {
        0
    } else {
        64 - (x - 1).leading_zeros()
    }
}

/// The size policy used when a caller requests a bit capacity: the actual
/// backing size is the next power of two at or above the request.
pub fn round_up_bits(requested: u64) -> u64 {
    requested.max(1).next_power_of_two()
}
