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

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use super::filter::ProbeSequence;
use super::BlockedBloomFilter;
use crate::error::Error;
use crate::hash::MixHash;

/// The opt-in multi-writer variant of [`BlockedBloomFilter`].
///
/// Insertion is a relaxed atomic fetch-OR into the word array, so any number
/// of threads may insert through a shared reference. Membership reads load
/// relaxed and tolerate concurrent insertion: OR-ing only adds true
/// positives, so a racing query can at worst report a conservative
/// "definitely absent" for an insert it has not yet observed, never a false
/// negative for a causally completed insert.
///
/// State is bit-identical with the plain filter after the same insert
/// sequence; the two convert losslessly into each other.
///
/// # Examples
///
/// ```
/// use bitsketch::bloom::AtomicBlockedBloomFilter;
///
/// let filter = AtomicBlockedBloomFilter::new(12, 4, 7).unwrap();
/// std::thread::scope(|s| {
///     for t in 0..4u64 {
///         let filter = &filter;
///         s.spawn(move || {
///             for v in (t * 100)..((t + 1) * 100) {
///                 filter.insert(v);
///             }
///         });
///     }
/// });
/// assert!(filter.may_contain(250));
/// ```
pub struct AtomicBlockedBloomFilter {
    lg_bits: u8,
    stride: u8,
    num_hashes: u16,
    mix: MixHash,
    seed_seed: u64,
    mask: u64,
    seeds: Vec<u64>,
    core: Vec<AtomicU64>,
}

impl AtomicBlockedBloomFilter {
    /// Creates an atomic filter with the same shape rules as
    /// [`BlockedBloomFilter::new`].
    pub fn new(lg_bits: u8, num_hashes: u16, seed_seed: u64) -> Result<Self, Error> {
        BlockedBloomFilter::new(lg_bits, num_hashes, seed_seed).map(Self::from)
    }

    /// Inserts a 64-bit value through a shared reference.
    pub fn insert(&self, value: u64) {
        for index in self.probes(value) {
            let bit = 1u64 << (index & 63);
            self.core[(index >> 6) as usize].fetch_or(bit, Ordering::Relaxed);
        }
    }

    /// Tests whether a value is possibly in the set.
    pub fn may_contain(&self, value: u64) -> bool {
        self.probes(value).all(|index| {
            let bit = 1u64 << (index & 63);
            self.core[(index >> 6) as usize].load(Ordering::Relaxed) & bit != 0
        })
    }

    /// Resets all bits to zero.
    ///
    /// Not linearizable against concurrent inserters; callers quiesce
    /// writers first.
    pub fn clear(&self) {
        for word in &self.core {
            word.store(0, Ordering::Relaxed);
        }
    }

    /// Number of set bits.
    pub fn popcount(&self) -> u64 {
        self.core
            .iter()
            .map(|w| u64::from(w.load(Ordering::Relaxed).count_ones()))
            .sum()
    }

    /// Total number of bits in the filter.
    pub fn num_bits(&self) -> u64 {
        (self.core.len() as u64) << 6
    }

    /// Number of probe bits per value.
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Master seed of the probe schedule.
    pub fn seed(&self) -> u64 {
        self.seed_seed
    }

    /// Converts back into the plain single-writer filter.
    pub fn into_filter(self) -> BlockedBloomFilter {
        BlockedBloomFilter {
            lg_bits: self.lg_bits,
            stride: self.stride,
            num_hashes: self.num_hashes,
            mix: self.mix,
            seed_seed: self.seed_seed,
            mask: self.mask,
            seeds: self.seeds,
            core: self.core.into_iter().map(AtomicU64::into_inner).collect(),
        }
    }

    fn probes(&self, value: u64) -> ProbeSequence<'_> {
        ProbeSequence::new(
            &self.seeds,
            self.mix,
            value,
            self.stride,
            self.mask,
            self.num_hashes,
        )
    }
}

impl From<BlockedBloomFilter> for AtomicBlockedBloomFilter {
    fn from(filter: BlockedBloomFilter) -> Self {
        AtomicBlockedBloomFilter {
            lg_bits: filter.lg_bits,
            stride: filter.stride,
            num_hashes: filter.num_hashes,
            mix: filter.mix,
            seed_seed: filter.seed_seed,
            mask: filter.mask,
            seeds: filter.seeds,
            core: filter.core.into_iter().map(AtomicU64::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_matches_plain_filter() {
        let mut plain = BlockedBloomFilter::new(10, 4, 55).unwrap();
        let atomic = AtomicBlockedBloomFilter::new(10, 4, 55).unwrap();
        for v in 0..200u64 {
            plain.insert(v);
            atomic.insert(v);
        }
        assert_eq!(atomic.popcount(), plain.popcount());
        assert_eq!(atomic.into_filter(), plain);
    }

    #[test]
    fn test_conversion_round_trip() {
        let mut plain = BlockedBloomFilter::new(8, 3, 9).unwrap();
        plain.insert(17);
        let restored = plain.clone().into_concurrent().into_filter();
        assert_eq!(restored, plain);
    }

    #[test]
    fn test_concurrent_insertion() {
        let filter = AtomicBlockedBloomFilter::new(14, 4, 3).unwrap();
        std::thread::scope(|s| {
            for t in 0..4u64 {
                let filter = &filter;
                s.spawn(move || {
                    for v in (t * 250)..((t + 1) * 250) {
                        filter.insert(v);
                    }
                });
            }
        });
        for v in 0..1000u64 {
            assert!(filter.may_contain(v));
        }
    }
}
