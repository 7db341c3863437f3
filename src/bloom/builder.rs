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

use super::filter::MAX_LG_BITS;
use super::filter::MAX_NUM_HASHES;
use super::filter::MIN_LG_BITS;
use super::BlockedBloomFilter;
use crate::common;
use crate::error::Error;
use crate::hash::MixHash;
use crate::hash::DEFAULT_UPDATE_SEED;

/// Builder for creating [`BlockedBloomFilter`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): specify target items and false
///   positive rate (recommended)
/// - [`with_log2_bits()`](Self::with_log2_bits): specify the bit count
///   exponent and probe count (manual)
#[derive(Debug, Clone)]
pub struct BlockedBloomFilterBuilder {
    lg_bits: u8,
    num_hashes: u16,
    seed: u64,
    mix: MixHash,
}

impl BlockedBloomFilterBuilder {
    /// Creates a builder with optimal parameters for a target accuracy.
    ///
    /// Picks the smallest power-of-two bit count able to hold `max_items` at
    /// the target false positive probability, then the matching probe count.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is 0 or `fpp` is not in (0.0, 1.0).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsketch::bloom::BlockedBloomFilterBuilder;
    /// let filter = BlockedBloomFilterBuilder::with_accuracy(10_000, 0.01)
    ///     .seed(42)
    ///     .build()
    ///     .unwrap();
    /// assert!(filter.num_bits() >= 95_851);
    /// ```
    pub fn with_accuracy(max_items: u64, fpp: f64) -> Self {
        assert!(max_items > 0, "max_items must be greater than 0");
        assert!(
            fpp > 0.0 && fpp < 1.0,
            "fpp must be between 0.0 and 1.0 (exclusive)"
        );

        let bits = Self::suggest_num_bits(max_items, fpp);
        let lg_bits = (common::ceil_log2(bits) as u8).clamp(MIN_LG_BITS, MAX_LG_BITS);
        let num_hashes = Self::suggest_num_hashes(max_items, 1u64 << lg_bits)
            .min(hash_cap(lg_bits));

        BlockedBloomFilterBuilder {
            lg_bits,
            num_hashes,
            seed: DEFAULT_UPDATE_SEED,
            mix: MixHash::default(),
        }
    }

    /// Creates a builder with a manual shape: `2^lg_bits` bits and
    /// `num_hashes` probes per value. Range checks happen in
    /// [`build`](Self::build).
    pub fn with_log2_bits(lg_bits: u8, num_hashes: u16) -> Self {
        BlockedBloomFilterBuilder {
            lg_bits,
            num_hashes,
            seed: DEFAULT_UPDATE_SEED,
            mix: MixHash::default(),
        }
    }

    /// Sets a custom master seed (default: 9001).
    ///
    /// **Important**: filters with different seeds cannot take part in set
    /// operations together.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the mixing function (default: [`MixHash::Wang`]).
    pub fn mix(mut self, mix: MixHash) -> Self {
        self.mix = mix;
        self
    }

    /// Builds the filter.
    ///
    /// # Errors
    ///
    /// `Configuration` when the shape is out of range, as in
    /// [`BlockedBloomFilter::with_mix`].
    pub fn build(self) -> Result<BlockedBloomFilter, Error> {
        BlockedBloomFilter::with_mix(self.lg_bits, self.num_hashes, self.seed, self.mix)
    }

    /// Suggests the number of bits for `max_items` at the target false
    /// positive probability: `m = -n * ln(p) / ln(2)^2`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsketch::bloom::BlockedBloomFilterBuilder;
    /// let bits = BlockedBloomFilterBuilder::suggest_num_bits(1000, 0.01);
    /// assert!(bits > 9000 && bits < 10000); // ~9585 bits
    /// ```
    pub fn suggest_num_bits(max_items: u64, fpp: f64) -> u64 {
        let n = max_items as f64;
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        (-n * fpp.ln() / ln2_squared).ceil() as u64
    }

    /// Suggests the number of probes for `max_items` in `num_bits` bits:
    /// `nh = (m/n) * ln(2)`, rounded up.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsketch::bloom::BlockedBloomFilterBuilder;
    /// let nh = BlockedBloomFilterBuilder::suggest_num_hashes(1000, 16384);
    /// assert_eq!(nh, 12); // 16384/1000 * ln(2) ≈ 11.4
    /// ```
    pub fn suggest_num_hashes(max_items: u64, num_bits: u64) -> u16 {
        let fractional = std::f64::consts::LN_2 * num_bits as f64 / max_items as f64;
        (fractional.ceil() as u64).clamp(1, u64::from(MAX_NUM_HASHES)) as u16
    }
}

fn hash_cap(lg_bits: u8) -> u16 {
    MAX_NUM_HASHES.min((common::hashes_per_word(u32::from(lg_bits)) * 255) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_accuracy() {
        let filter = BlockedBloomFilterBuilder::with_accuracy(1000, 0.01)
            .build()
            .unwrap();
        assert!(filter.num_bits() >= 9585);
        assert!(filter.num_hashes() >= 7);
    }

    #[test]
    fn test_with_log2_bits() {
        let filter = BlockedBloomFilterBuilder::with_log2_bits(10, 5)
            .seed(123)
            .build()
            .unwrap();
        assert_eq!(filter.num_bits(), 1024);
        assert_eq!(filter.num_hashes(), 5);
        assert_eq!(filter.seed(), 123);
    }

    #[test]
    fn test_accuracy_parameters_always_build() {
        for max_items in [1u64, 10, 1_000, 1_000_000] {
            for fpp in [0.3, 0.01, 1e-6] {
                let built = BlockedBloomFilterBuilder::with_accuracy(max_items, fpp).build();
                assert!(built.is_ok(), "n={max_items} fpp={fpp}");
            }
        }
    }

    #[test]
    fn test_build_rejects_bad_shape() {
        assert!(BlockedBloomFilterBuilder::with_log2_bits(3, 1).build().is_err());
        assert!(BlockedBloomFilterBuilder::with_log2_bits(10, 0).build().is_err());
    }

    #[test]
    #[should_panic(expected = "max_items must be greater than 0")]
    fn test_invalid_max_items() {
        BlockedBloomFilterBuilder::with_accuracy(0, 0.01);
    }

    #[test]
    #[should_panic(expected = "fpp must be between")]
    fn test_invalid_fpp() {
        BlockedBloomFilterBuilder::with_accuracy(100, 1.5);
    }
}
