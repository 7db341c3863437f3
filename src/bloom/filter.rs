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

use std::io::Read;
use std::io::Write;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common;
use crate::common::bits;
use crate::error::Error;
use crate::hash::MixHash;

/// log2 of the word width: bit index -> (word, offset) split.
const WORD_LOG2: u8 = 6;

/// Smallest supported filter: one 64-bit word.
pub(super) const MIN_LG_BITS: u8 = 6;
/// Largest supported filter: 2^46 bits (8 TiB of words).
pub(super) const MAX_LG_BITS: u8 = 46;
/// Global ceiling on probe count. The effective bound for a given `p` is
/// `MAX_NUM_HASHES.min(hashes_per_word(p) * 255)`, computed per shape in
/// `validate_shape`; for `p > 32` a seed yields a single sub-index and the
/// 255-seed schedule caps probes at 255.
pub(super) const MAX_NUM_HASHES: u16 = 510;

/// Seed count representable in the one-byte header field.
const MAX_SERIAL_SEEDS: usize = 255;
/// Hash count representable in the one-byte header field.
const MAX_SERIAL_HASHES: u16 = 255;

/// A blocked Bloom filter over 64-bit keys.
///
/// The filter owns `2^p` bits stored as `2^(p-6)` words (`6 <= p <= 46`).
/// Each inserted value is mixed with a schedule of seeds; every 64-bit mix
/// yields `64 / p` probe positions, so the schedule holds
/// `ceil(num_hashes / (64 / p))` seeds.
///
/// Provides fast membership queries with:
/// - No false negatives (inserted items always return `true`)
/// - Tunable false positive rate
/// - Constant space usage
///
/// Construct directly with [`new`](Self::new) or through
/// [`super::BlockedBloomFilterBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedBloomFilter {
    /// Current log2 of the bit count (`p`).
    pub(super) lg_bits: u8,
    /// Probe stride in bits, fixed when the filter is (re)sized.
    ///
    /// Equal to `lg_bits` at construction; [`halve`](Self::halve) shrinks
    /// `lg_bits` but keeps the stride, so probe positions reduce onto the
    /// folded array and membership stays one-sided.
    pub(super) stride: u8,
    /// Number of probe bits per value (`nh`).
    pub(super) num_hashes: u16,
    /// The 64-bit mixing function all probes go through.
    pub(super) mix: MixHash,
    /// Master seed the probe seed schedule is derived from.
    pub(super) seed_seed: u64,
    /// `2^lg_bits - 1`.
    pub(super) mask: u64,
    /// Probe seed schedule, pairwise distinct.
    pub(super) seeds: Vec<u64>,
    /// Bit array packed into u64 words.
    pub(super) core: Vec<u64>,
}

impl BlockedBloomFilter {
    /// Creates a filter with `2^lg_bits` bits, `num_hashes` probes per value,
    /// and a seed schedule derived from `seed_seed`, using the default
    /// mixing function.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when `lg_bits` is outside `6..=46`,
    /// or when `num_hashes` is 0, exceeds 510, or cannot be served by a
    /// schedule of 255 seeds at `64 / lg_bits` probes each.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsketch::bloom::BlockedBloomFilter;
    /// let filter = BlockedBloomFilter::new(10, 4, 137).unwrap();
    /// assert_eq!(filter.num_bits(), 1024);
    /// assert!(BlockedBloomFilter::new(47, 4, 137).is_err());
    /// ```
    pub fn new(lg_bits: u8, num_hashes: u16, seed_seed: u64) -> Result<Self, Error> {
        Self::with_mix(lg_bits, num_hashes, seed_seed, MixHash::default())
    }

    /// Creates a filter like [`new`](Self::new) with an explicit mixing
    /// function.
    pub fn with_mix(
        lg_bits: u8,
        num_hashes: u16,
        seed_seed: u64,
        mix: MixHash,
    ) -> Result<Self, Error> {
        validate_shape(lg_bits, num_hashes)?;

        let num_bits = 1u64 << lg_bits;
        let mut filter = BlockedBloomFilter {
            lg_bits,
            stride: lg_bits,
            num_hashes,
            mix,
            seed_seed,
            mask: num_bits - 1,
            seeds: Vec::new(),
            core: vec![0u64; (num_bits >> WORD_LOG2) as usize],
        };
        filter.reseed(seed_seed);
        Ok(filter)
    }

    /// Inserts a 64-bit value into the filter.
    ///
    /// After insertion, `may_contain(value)` will always return `true`.
    /// Idempotent: re-inserting sets no new bits.
    pub fn insert(&mut self, value: u64) {
        let Self {
            ref seeds,
            ref mut core,
            mix,
            stride,
            mask,
            num_hashes,
            ..
        } = *self;
        for index in ProbeSequence::new(seeds, mix, value, stride, mask, num_hashes) {
            core[(index >> WORD_LOG2) as usize] |= 1u64 << (index & 63);
        }
    }

    /// Tests whether a value is possibly in the set.
    ///
    /// Returns:
    /// - `true`: the value was **possibly** inserted (or is a false positive)
    /// - `false`: the value was **definitely not** inserted
    ///
    /// Short-circuits on the first unset probe bit.
    pub fn may_contain(&self, value: u64) -> bool {
        self.probes(value).all(|index| self.bit(index))
    }

    /// Tests and inserts a value in a single pass over the probe schedule.
    ///
    /// The returned membership reflects the filter state before any of this
    /// call's writes: if the value was previously "definitely absent", this
    /// returns `false` and the next `may_contain(value)` returns `true`.
    pub fn may_contain_and_insert(&mut self, value: u64) -> bool {
        let Self {
            ref seeds,
            ref mut core,
            mix,
            stride,
            mask,
            num_hashes,
            ..
        } = *self;
        let mut present = true;
        for index in ProbeSequence::new(seeds, mix, value, stride, mask, num_hashes) {
            let word = &mut core[(index >> WORD_LOG2) as usize];
            let bit = 1u64 << (index & 63);
            // A probe bit that was clear before this call reports absence at
            // its first visit, so setting as we go cannot flip the answer.
            present &= *word & bit != 0;
            *word |= bit;
        }
        present
    }

    /// Batched membership: one output bit per input value.
    ///
    /// Returns `ceil(values.len() / 64)` words, initialized to all ones, with
    /// bit `i` cleared when `values[i]` is definitely absent. Bits beyond the
    /// input length remain set. Semantically equivalent to calling
    /// [`may_contain`](Self::may_contain) per value.
    pub fn may_contain_batch(&self, values: &[u64]) -> Vec<u64> {
        let mut out = vec![u64::MAX; values.len().div_ceil(64)];
        for (i, &value) in values.iter().enumerate() {
            if !self.may_contain(value) {
                out[i >> WORD_LOG2] &= !(1u64 << (i & 63));
            }
        }
        out
    }

    /// Merges another filter into this one via bitwise OR (union).
    ///
    /// After merging, this filter recognizes items from either input (plus
    /// any false positives of either).
    ///
    /// # Errors
    ///
    /// `MismatchedParameters` unless both filters share size, probe count,
    /// seed, and mixing function.
    pub fn union_assign(&mut self, other: &BlockedBloomFilter) -> Result<(), Error> {
        self.check_compatible(other)?;
        bits::union_into(&mut self.core, &other.core);
        Ok(())
    }

    /// Intersects this filter with another via bitwise AND.
    ///
    /// The result may keep bits that no common element set (one-sided error
    /// compounds under intersection).
    ///
    /// # Errors
    ///
    /// `MismatchedParameters` unless the filters are compatible.
    pub fn intersect_assign(&mut self, other: &BlockedBloomFilter) -> Result<(), Error> {
        self.check_compatible(other)?;
        bits::intersect_into(&mut self.core, &other.core);
        Ok(())
    }

    /// XORs another filter into this one, word-wise.
    ///
    /// # Errors
    ///
    /// `MismatchedParameters` unless the filters are compatible.
    pub fn xor_assign(&mut self, other: &BlockedBloomFilter) -> Result<(), Error> {
        self.check_compatible(other)?;
        bits::xor_into(&mut self.core, &other.core);
        Ok(())
    }

    /// Returns a fresh filter holding the union of `self` and `other`.
    pub fn union(&self, other: &BlockedBloomFilter) -> Result<BlockedBloomFilter, Error> {
        let mut ret = self.clone();
        ret.union_assign(other)?;
        Ok(ret)
    }

    /// Returns a fresh filter holding the intersection of `self` and `other`.
    pub fn intersect(&self, other: &BlockedBloomFilter) -> Result<BlockedBloomFilter, Error> {
        let mut ret = self.clone();
        ret.intersect_assign(other)?;
        Ok(ret)
    }

    /// Returns a fresh filter holding the word-wise XOR of `self` and
    /// `other`.
    pub fn symmetric_difference(
        &self,
        other: &BlockedBloomFilter,
    ) -> Result<BlockedBloomFilter, Error> {
        let mut ret = self.clone();
        ret.xor_assign(other)?;
        Ok(ret)
    }

    /// Checks whether two filters can take part in set operations.
    ///
    /// Compatible filters share bit count, probe count, master seed, and
    /// mixing function, and therefore identical probe schedules.
    pub fn is_compatible(&self, other: &BlockedBloomFilter) -> bool {
        self.lg_bits == other.lg_bits
            && self.stride == other.stride
            && self.num_hashes == other.num_hashes
            && self.seed_seed == other.seed_seed
            && self.mix == other.mix
    }

    /// Halves the filter in place: folds the upper half of the word array
    /// into the lower half by OR and shrinks, halving the bit count and
    /// decreasing `p` by one.
    ///
    /// Every value inserted before halving still satisfies
    /// [`may_contain`](Self::may_contain) afterwards: the probe stride stays
    /// fixed, so each probe index reduces modulo the smaller domain onto a
    /// bit the fold preserved.
    ///
    /// # Errors
    ///
    /// `Configuration` when the filter is already at its 64-bit minimum.
    pub fn halve(&mut self) -> Result<(), Error> {
        if self.lg_bits == MIN_LG_BITS {
            return Err(Error::configuration("cannot halve a filter below 64 bits"));
        }
        bits::fold_halve(&mut self.core);
        self.lg_bits -= 1;
        self.mask >>= 1;
        Ok(())
    }

    /// Estimates the number of distinct values inserted, from the set-bit
    /// count alone.
    ///
    /// Uses `ln(1 - k*2^-p) / (nh * ln(1 - 2^-p))` with `k` the popcount.
    /// When every bit is set the estimate saturates to a non-finite value;
    /// callers must guard.
    pub fn cardinality_estimate(&self) -> f64 {
        let inv = (-f64::from(self.lg_bits)).exp2();
        let k = self.popcount() as f64;
        (-(k * inv)).ln_1p() / (f64::from(self.num_hashes) * (-inv).ln_1p())
    }

    /// Estimates the current false positive rate as a function of the
    /// set-bit count, without needing the insert count: `(k/m)^nh`, the
    /// probability that every probe of an unseen value lands on a set bit.
    pub fn estimated_fpp(&self) -> f64 {
        (self.popcount() as f64 / self.num_bits() as f64).powi(i32::from(self.num_hashes))
    }

    /// Popcount of the bitwise AND of two compatible filters.
    pub fn intersection_count(&self, other: &BlockedBloomFilter) -> Result<u64, Error> {
        self.check_compatible(other)?;
        Ok(bits::intersection_popcount(&self.core, &other.core))
    }

    /// Raw Jaccard index in bit space: `(|A| + |B| - |A∪B|) / |A∪B|` over
    /// set-bit counts.
    ///
    /// Biased once either filter saturates; prefer
    /// [`jaccard_estimate`](Self::jaccard_estimate) which corrects through
    /// the cardinality estimator. `NaN` when both filters are empty.
    pub fn bit_jaccard(&self, other: &BlockedBloomFilter) -> Result<f64, Error> {
        self.check_compatible(other)?;
        let (pa, pb, pu) = bits::popcount_triple(&self.core, &other.core);
        Ok((pa + pb - pu) as f64 / pu as f64)
    }

    /// Estimated Jaccard index of the underlying sets.
    ///
    /// Derives the cardinalities of `A`, `B`, and `A ∪ B` through the
    /// log-linearized estimator and returns
    /// `(A_hat + B_hat - U_hat) / U_hat`.
    pub fn jaccard_estimate(&self, other: &BlockedBloomFilter) -> Result<f64, Error> {
        self.check_compatible(other)?;
        let (pa, pb, pu) = bits::popcount_triple(&self.core, &other.core);
        let m = self.num_bits() as f64;
        let nh = f64::from(self.num_hashes);
        let est = |k: u64| -(-(k as f64) / m).ln_1p() * m / nh;
        let union_est = est(pu);
        let overlap_est = est(pa) + est(pb) - union_est;
        Ok(overlap_est / union_est)
    }

    /// Resets all bits to zero, retaining capacity and configuration.
    pub fn clear(&mut self) {
        self.core.fill(0);
    }

    /// Releases the backing word array.
    ///
    /// The filter holds no storage afterwards; call
    /// [`resize`](Self::resize) before further use.
    pub fn free(&mut self) {
        self.core = Vec::new();
    }

    /// Rebuilds the seed schedule from a deterministic stream keyed by
    /// `seed_seed`, rejecting duplicate draws until the schedule is full.
    ///
    /// The schedule is a pure function of `(seed_seed, stride, num_hashes)`.
    pub fn reseed(&mut self, seed_seed: u64) {
        self.seed_seed = seed_seed;
        self.seeds.clear();
        let per_word = u64::from(common::hashes_per_word(u32::from(self.stride)));
        let mut rng = ChaCha20Rng::seed_from_u64(seed_seed);
        while (self.seeds.len() as u64) * per_word < u64::from(self.num_hashes) {
            let val = rng.next_u64();
            if !self.seeds.contains(&val) {
                self.seeds.push(val);
            }
        }
    }

    /// Clears the filter and reconfigures it for `new_bits` bits, rounded up
    /// to the next power of two. Reseeds; inserted elements are not carried
    /// over.
    ///
    /// # Errors
    ///
    /// `Configuration` when the rounded size leaves the supported range or
    /// cannot serve the configured probe count.
    pub fn resize(&mut self, new_bits: u64) -> Result<(), Error> {
        let new_bits = common::round_up_bits(new_bits);
        let lg_bits = common::ceil_log2(new_bits) as u8;
        validate_shape(lg_bits, self.num_hashes)?;

        self.lg_bits = lg_bits;
        self.stride = lg_bits;
        self.mask = new_bits - 1;
        self.core = vec![0u64; (new_bits >> WORD_LOG2) as usize];
        self.reseed(self.seed_seed);
        Ok(())
    }

    /// Visits each set bit exactly once, in ascending bit-index order.
    pub fn for_each_set_bit<F: FnMut(u64)>(&self, func: F) {
        bits::for_each_set_bit(&self.core, func);
    }

    /// The ascending indices of all set bits.
    pub fn sparse_indices(&self) -> Vec<u64> {
        let mut ret = Vec::new();
        self.for_each_set_bit(|i| ret.push(i));
        ret
    }

    /// Serializes the filter to its raw (uncompressed) byte layout.
    ///
    /// Layout, little-endian: three header bytes (`p - 6`, `nh`, seed
    /// count), one hash-function byte, `seed_seed`, `mask`, the seeds, the
    /// word array.
    ///
    /// # Errors
    ///
    /// `Capacity` when the seed schedule or the probe count does not fit its
    /// one-byte header field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        if self.seeds.len() > MAX_SERIAL_SEEDS {
            return Err(Error::capacity("serialization allows up to 255 seeds")
                .with_context("seeds", self.seeds.len()));
        }
        if self.num_hashes > MAX_SERIAL_HASHES {
            return Err(
                Error::capacity("serialization allows up to 255 hash probes")
                    .with_context("num_hashes", self.num_hashes),
            );
        }

        let capacity = 4 + 16 + 8 * (self.seeds.len() + self.core.len());
        let mut bytes = SketchBytes::with_capacity(capacity);
        bytes.write_u8(self.lg_bits - MIN_LG_BITS);
        bytes.write_u8(self.num_hashes as u8);
        bytes.write_u8(self.seeds.len() as u8);
        bytes.write_u8(self.mix.tag());
        bytes.write_u64_le(self.seed_seed);
        bytes.write_u64_le(self.mask);
        bytes.write_u64_slice_le(&self.seeds);
        bytes.write_u64_slice_le(&self.core);
        Ok(bytes.into_bytes())
    }

    /// Reconstructs a filter, byte-for-byte, from its raw layout.
    ///
    /// # Errors
    ///
    /// `Io` when the data is truncated, `Configuration` when a header field
    /// is out of range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);

        let lg_field = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("log2 bits"))?;
        let num_hashes = u16::from(
            cursor
                .read_u8()
                .map_err(|_| Error::insufficient_data("num_hashes"))?,
        );
        let num_seeds = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("seed count"))?;
        let tag = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("hash tag"))?;
        let mix = MixHash::from_tag(tag)?;

        let lg_bits = lg_field
            .checked_add(MIN_LG_BITS)
            .filter(|&lg| lg <= MAX_LG_BITS)
            .ok_or_else(|| {
                Error::configuration("serialized filter is too large")
                    .with_context("lg_field", lg_field)
            })?;

        let seed_seed = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("seed_seed"))?;
        let mask = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("mask"))?;

        let mut seeds = vec![0u64; usize::from(num_seeds)];
        cursor
            .read_u64_slice_le(&mut seeds)
            .map_err(|_| Error::insufficient_data("seeds"))?;

        let mut core = vec![0u64; 1usize << (lg_bits - MIN_LG_BITS)];
        cursor
            .read_u64_slice_le(&mut core)
            .map_err(|_| Error::insufficient_data("core words"))?;

        Ok(BlockedBloomFilter {
            lg_bits,
            stride: lg_bits,
            num_hashes,
            mix,
            seed_seed,
            mask,
            seeds,
            core,
        })
    }

    /// Serializes the filter through a gzip-compatible layer into `writer`.
    ///
    /// Returns the uncompressed payload length.
    ///
    /// # Errors
    ///
    /// `Capacity` as in [`to_bytes`](Self::to_bytes), `Io` on write failure.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsketch::bloom::BlockedBloomFilter;
    /// let mut filter = BlockedBloomFilter::new(8, 3, 99).unwrap();
    /// filter.insert(7);
    ///
    /// let mut stream = Vec::new();
    /// filter.write(&mut stream).unwrap();
    /// let restored = BlockedBloomFilter::read(stream.as_slice()).unwrap();
    /// assert_eq!(filter, restored);
    /// ```
    pub fn write<W: Write>(&self, writer: W) -> Result<usize, Error> {
        let payload = self.to_bytes()?;
        let mut encoder = GzEncoder::new(writer, Compression::default());
        encoder.write_all(&payload)?;
        encoder.finish()?;
        Ok(payload.len())
    }

    /// Reads a filter from a gzip-compatible stream produced by
    /// [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// `Io` on read or decompression failure, plus the
    /// [`from_bytes`](Self::from_bytes) failures.
    pub fn read<R: Read>(reader: R) -> Result<Self, Error> {
        let mut decoder = GzDecoder::new(reader);
        let mut payload = Vec::new();
        decoder.read_to_end(&mut payload)?;
        Self::from_bytes(&payload)
    }

    /// Total number of bits in the filter (`m`).
    pub fn num_bits(&self) -> u64 {
        (self.core.len() as u64) << WORD_LOG2
    }

    /// Current log2 of the bit count (`p`).
    pub fn log2_bits(&self) -> u8 {
        self.lg_bits
    }

    /// Number of probe bits per value.
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Master seed of the probe schedule.
    pub fn seed(&self) -> u64 {
        self.seed_seed
    }

    /// The probe seed schedule.
    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// The mixing function the filter was built with.
    pub fn mix(&self) -> MixHash {
        self.mix
    }

    /// The index mask (`m - 1`).
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of set bits.
    pub fn popcount(&self) -> u64 {
        bits::popcount(&self.core)
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.core.iter().all(|&w| w == 0)
    }

    /// Converts this filter into its atomic multi-writer counterpart.
    pub fn into_concurrent(self) -> super::AtomicBlockedBloomFilter {
        self.into()
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

    fn bit(&self, index: u64) -> bool {
        self.core[(index >> WORD_LOG2) as usize] & (1u64 << (index & 63)) != 0
    }

    fn check_compatible(&self, other: &BlockedBloomFilter) -> Result<(), Error> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(
                Error::mismatched_parameters("filters were built with different parameters")
                    .with_context("lg_bits", format!("{} vs {}", self.lg_bits, other.lg_bits))
                    .with_context(
                        "num_hashes",
                        format!("{} vs {}", self.num_hashes, other.num_hashes),
                    )
                    .with_context(
                        "seed",
                        format!("{} vs {}", self.seed_seed, other.seed_seed),
                    ),
            )
        }
    }
}

fn validate_shape(lg_bits: u8, num_hashes: u16) -> Result<(), Error> {
    if lg_bits < MIN_LG_BITS || lg_bits > MAX_LG_BITS {
        return Err(Error::configuration("log2 bit count out of range")
            .with_context("lg_bits", lg_bits)
            .with_context("supported", "6..=46"));
    }
    let per_word = common::hashes_per_word(u32::from(lg_bits));
    let max_hashes = MAX_NUM_HASHES.min((per_word * 255) as u16);
    if num_hashes == 0 || num_hashes > max_hashes {
        return Err(Error::configuration("hash probe count out of range")
            .with_context("num_hashes", num_hashes)
            .with_context("supported", format!("1..={max_hashes}")));
    }
    Ok(())
}

/// The sequence of probe bit indices for one value.
///
/// Walks the seed schedule in order; each seed contributes one 64-bit mix,
/// and each mix contributes `64 / stride` sub-indices of `stride` bits,
/// masked into the current domain. Stops after `num_hashes` indices.
pub(super) struct ProbeSequence<'a> {
    seeds: &'a [u64],
    mix: MixHash,
    value: u64,
    stride: u32,
    mask: u64,
    per_word: u32,
    remaining: u16,
    seed_index: usize,
    current: u64,
    sub: u32,
}

impl<'a> ProbeSequence<'a> {
    pub(super) fn new(
        seeds: &'a [u64],
        mix: MixHash,
        value: u64,
        stride: u8,
        mask: u64,
        num_hashes: u16,
    ) -> Self {
        let stride = u32::from(stride);
        ProbeSequence {
            seeds,
            mix,
            value,
            stride,
            mask,
            per_word: common::hashes_per_word(stride),
            remaining: num_hashes,
            seed_index: 0,
            current: 0,
            sub: 0,
        }
    }
}

impl Iterator for ProbeSequence<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        if self.sub == 0 {
            self.current = self.mix.mix(self.value ^ self.seeds[self.seed_index]);
            self.seed_index += 1;
        }
        let index = (self.current >> (self.sub * self.stride)) & self.mask;
        self.sub += 1;
        if self.sub == self.per_word {
            self.sub = 0;
        }
        self.remaining -= 1;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_insert_and_may_contain() {
        let mut filter = BlockedBloomFilter::new(10, 4, 137).unwrap();

        assert!(filter.is_empty());
        filter.insert(42);
        assert!(filter.may_contain(42));
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_may_contain_and_insert() {
        let mut filter = BlockedBloomFilter::new(10, 4, 137).unwrap();

        assert!(!filter.may_contain_and_insert(42));
        assert!(filter.may_contain_and_insert(42));
        assert!(filter.may_contain(42));
    }

    #[test]
    fn test_probe_schedule_is_deterministic() {
        let a = BlockedBloomFilter::new(12, 6, 7).unwrap();
        let b = BlockedBloomFilter::new(12, 6, 7).unwrap();
        assert_eq!(a.seeds(), b.seeds());

        let pa: Vec<u64> = a.probes(99).collect();
        let pb: Vec<u64> = b.probes(99).collect();
        assert_eq!(pa, pb);
        assert_eq!(pa.len(), 6);
        assert!(pa.iter().all(|&i| i < a.num_bits()));
    }

    #[test]
    fn test_seeds_are_distinct_and_sufficient() {
        // p = 20 packs three sub-indices per seed, so 255 probes need 85.
        let filter = BlockedBloomFilter::new(20, 255, 3).unwrap();
        assert_eq!(filter.seeds().len(), 85);
        let mut sorted = filter.seeds().to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 85);
    }

    #[test]
    fn test_monotone_bits() {
        let mut filter = BlockedBloomFilter::new(10, 4, 1).unwrap();
        let mut last = 0;
        for v in 0..200u64 {
            filter.insert(v);
            let count = filter.popcount();
            assert!(count >= last);
            last = count;
        }
    }

    #[test]
    fn test_clear_retains_shape() {
        let mut filter = BlockedBloomFilter::new(10, 4, 1).unwrap();
        filter.insert(1);
        filter.clear();
        assert!(filter.is_empty());
        assert_eq!(filter.num_bits(), 1024);
        assert!(!filter.may_contain(1));
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(
            BlockedBloomFilter::new(5, 1, 0).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            BlockedBloomFilter::new(47, 1, 0).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            BlockedBloomFilter::new(10, 0, 0).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        // p = 46 allows one probe per seed, capping probes at 255; the
        // check fires before any storage is allocated.
        assert!(BlockedBloomFilter::new(46, 256, 0).is_err());
        // p = 20 packs three probes per seed, capping at the global 510.
        assert!(BlockedBloomFilter::new(20, 511, 0).is_err());
        assert!(BlockedBloomFilter::new(20, 510, 0).is_ok());
    }

    #[test]
    fn test_resize_clears_and_reseeds() {
        let mut filter = BlockedBloomFilter::new(10, 4, 9).unwrap();
        filter.insert(5);
        filter.resize(5000).unwrap();
        assert_eq!(filter.num_bits(), 8192);
        assert_eq!(filter.log2_bits(), 13);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_free_releases_storage() {
        let mut filter = BlockedBloomFilter::new(10, 4, 9).unwrap();
        filter.free();
        assert_eq!(filter.num_bits(), 0);
        filter.resize(1024).unwrap();
        assert_eq!(filter.num_bits(), 1024);
    }

    #[test]
    fn test_sparse_indices_ascending() {
        let mut filter = BlockedBloomFilter::new(8, 2, 4).unwrap();
        filter.insert(10);
        filter.insert(11);
        let indices = filter.sparse_indices();
        assert_eq!(indices.len() as u64, filter.popcount());
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_batch_matches_scalar() {
        let mut filter = BlockedBloomFilter::new(12, 4, 21).unwrap();
        for v in 0..80u64 {
            filter.insert(v);
        }
        let values: Vec<u64> = (0..160).collect();
        let out = filter.may_contain_batch(&values);
        assert_eq!(out.len(), 3);
        for (i, &v) in values.iter().enumerate() {
            let bit = out[i >> 6] & (1u64 << (i & 63)) != 0;
            assert_eq!(bit, filter.may_contain(v), "value {v}");
        }
        // Tail bits beyond the input stay set.
        for i in 160..192 {
            assert!(out[i >> 6] & (1u64 << (i & 63)) != 0);
        }
    }

    #[test]
    fn test_full_filter_saturates() {
        let mut filter = BlockedBloomFilter::new(6, 1, 0).unwrap();
        filter.core.fill(u64::MAX);
        for v in 0..1000u64 {
            assert!(filter.may_contain(v));
        }
        assert!(!filter.cardinality_estimate().is_finite());
        assert_eq!(filter.estimated_fpp(), 1.0);
    }
}
