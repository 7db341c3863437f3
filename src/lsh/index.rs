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

use std::hash::Hasher;

use ahash::AHashMap;
use twox_hash::XxHash64;

use crate::error::Error;
use crate::hash::wyrand;

/// Rows of one band: digest of a register slice -> ids in insertion order.
type Band = Vec<AHashMap<u64, Vec<u32>>>;

/// A sketch register element.
///
/// Registers feed the banded digest in little-endian byte order, so the
/// digest of a contiguous slice is byte-exact with hashing the slice's raw
/// memory on little-endian machines.
pub trait SketchRegister: Copy {
    /// Feeds this register's bytes to the streaming digest.
    fn digest_into<H: Hasher>(self, state: &mut H);
}

macro_rules! impl_sketch_register {
    ($($ty:ty),*) => {
        $(impl SketchRegister for $ty {
            #[inline]
            fn digest_into<H: Hasher>(self, state: &mut H) {
                state.write(&self.to_le_bytes());
            }
        })*
    };
}

impl_sketch_register!(u8, u16, u32, u64);

/// An LSH index over fixed-width sketches.
///
/// Every inserted sketch must carry exactly `m` registers. The index keeps a
/// schedule of band widths, ordered narrowest first; band `i` of width `b_i`
/// hosts `floor(m / b_i)` rows, each mapping a 64-bit slice digest to the ids
/// inserted with that digest. Ids are dense and assigned in insertion order.
///
/// Insertion is monotone and queries are pure; queries may run concurrently
/// with each other but not with insertion.
#[derive(Debug)]
pub struct SketchLshIndex {
    num_registers: usize,
    band_widths: Vec<usize>,
    bands: Vec<Band>,
    total_ids: u32,
}

impl SketchLshIndex {
    /// Creates an index with the powers-of-two band ladder
    /// `1, 2, 4, ... <= m`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bitsketch::lsh::SketchLshIndex;
    /// let index = SketchLshIndex::new(128);
    /// assert_eq!(index.num_bands(), 8); // log2(128) + 1
    /// ```
    pub fn new(num_registers: usize) -> Self {
        debug_assert!(num_registers > 0);
        let mut index = Self::empty(num_registers);
        let mut width = 1;
        while width <= num_registers {
            index.push_band(width, num_registers / width);
            width <<= 1;
        }
        index
    }

    /// Creates a densified index with every band width `1..=m`.
    ///
    /// Trades memory and insertion cost for a finer specificity gradient.
    pub fn new_dense(num_registers: usize) -> Self {
        debug_assert!(num_registers > 0);
        let mut index = Self::empty(num_registers);
        for width in 1..=num_registers {
            index.push_band(width, num_registers / width);
        }
        index
    }

    /// Creates an index with an explicit schedule of band widths, each
    /// hosting the default `floor(m / width)` rows.
    ///
    /// # Errors
    ///
    /// `Configuration` when a width is 0 or exceeds the register count.
    pub fn with_widths(num_registers: usize, widths: &[usize]) -> Result<Self, Error> {
        let mut index = Self::empty(num_registers);
        for &width in widths {
            validate_width(width, num_registers)?;
            index.push_band(width, num_registers / width);
        }
        Ok(index)
    }

    /// Creates an index with explicit band widths and per-band row counts.
    ///
    /// A row count of 0 selects the default `floor(m / width)` for that
    /// band.
    ///
    /// # Errors
    ///
    /// `Configuration` when the arrays differ in length, or when a width is
    /// 0 or exceeds the register count.
    pub fn with_schedule(
        num_registers: usize,
        widths: &[usize],
        rows: &[usize],
    ) -> Result<Self, Error> {
        if widths.len() != rows.len() {
            return Err(
                Error::configuration("band widths and row counts differ in length")
                    .with_context("widths", widths.len())
                    .with_context("rows", rows.len()),
            );
        }
        let mut index = Self::empty(num_registers);
        for (&width, &nrows) in widths.iter().zip(rows) {
            validate_width(width, num_registers)?;
            let nrows = if nrows == 0 {
                num_registers / width
            } else {
                nrows
            };
            index.push_band(width, nrows);
        }
        Ok(index)
    }

    /// Inserts a sketch and returns its assigned id.
    ///
    /// Ids are dense `0..len()` in insertion order. The id is appended to
    /// every `(band, row)` bucket the sketch digests into; inserting the
    /// same sketch twice records two ids.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` unless the sketch has exactly `m` registers.
    pub fn update<R: SketchRegister>(&mut self, sketch: &[R]) -> Result<u32, Error> {
        self.check_registers(sketch)?;
        let id = self.total_ids;
        self.total_ids += 1;
        for band in 0..self.band_widths.len() {
            for row in 0..self.bands[band].len() {
                let digest = self.hash_index(sketch, band, row);
                self.bands[band][row].entry(digest).or_default().push(id);
            }
        }
        Ok(id)
    }

    /// Returns candidate ids for a query sketch, most specific first.
    ///
    /// Walks bands in descending width order. Within a band every row is
    /// looked up; an id is admitted to the output at its first sighting and
    /// only counted on later ones. After each band, the number of newly
    /// admitted ids is recorded; traversal stops after the first band that
    /// brings the distinct count to `max_cand`.
    ///
    /// Returns `(ids in admission order, new ids per band in traversal
    /// order)`. The prefix of the id list holds the matches from the most
    /// specific bands.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` unless the sketch has exactly `m` registers.
    pub fn query_candidates<R: SketchRegister>(
        &self,
        sketch: &[R],
        max_cand: usize,
    ) -> Result<(Vec<u32>, Vec<u32>), Error> {
        self.query_candidates_from(sketch, max_cand, self.band_widths.len())
    }

    /// Like [`query_candidates`](Self::query_candidates), starting from band
    /// `start - 1` instead of the widest band. `start` is clamped to the
    /// band count.
    pub fn query_candidates_from<R: SketchRegister>(
        &self,
        sketch: &[R],
        max_cand: usize,
        start: usize,
    ) -> Result<(Vec<u32>, Vec<u32>), Error> {
        self.check_registers(sketch)?;
        let start = start.min(self.band_widths.len());

        let mut multiplicity: AHashMap<u32, u32> = AHashMap::with_capacity(max_cand);
        let mut passing_ids = Vec::with_capacity(max_cand);
        let mut new_per_band = Vec::with_capacity(start);

        for band in (0..start).rev() {
            let admitted_before = passing_ids.len();
            for row in 0..self.bands[band].len() {
                let digest = self.hash_index(sketch, band, row);
                let Some(bucket) = self.bands[band][row].get(&digest) else {
                    continue;
                };
                for &id in bucket {
                    match multiplicity.get_mut(&id) {
                        Some(count) => *count += 1,
                        None => {
                            multiplicity.insert(id, 1);
                            passing_ids.push(id);
                        }
                    }
                }
            }
            new_per_band.push((passing_ids.len() - admitted_before) as u32);
            if multiplicity.len() >= max_cand {
                break;
            }
        }
        Ok((passing_ids, new_per_band))
    }

    /// Number of registers every sketch must carry (`m`).
    pub fn num_registers(&self) -> usize {
        self.num_registers
    }

    /// Number of bands in the schedule.
    pub fn num_bands(&self) -> usize {
        self.band_widths.len()
    }

    /// The band widths, narrowest first.
    pub fn band_widths(&self) -> &[usize] {
        &self.band_widths
    }

    /// Number of sketches inserted.
    pub fn len(&self) -> usize {
        self.total_ids as usize
    }

    /// Whether no sketch has been inserted.
    pub fn is_empty(&self) -> bool {
        self.total_ids == 0
    }

    /// The digest of one `(band, row)` slot for a sketch.
    ///
    /// Pure: identical inputs produce identical digests across runs. Wide
    /// rows (`width >= 4` with the slice in range) digest the contiguous
    /// register slice; short or out-of-range rows seed the digest with
    /// `(band << 32) | row` and sample `width` registers at deterministic
    /// pseudo-random positions instead.
    fn hash_index<R: SketchRegister>(&self, item: &[R], band: usize, row: usize) -> u64 {
        let width = self.band_widths[band];
        if width >= 4 && (row + 1) * width <= self.num_registers {
            let mut state = XxHash64::with_seed(0);
            for &register in &item[width * row..width * (row + 1)] {
                register.digest_into(&mut state);
            }
            state.finish()
        } else {
            let mut seed = ((band as u64) << 32) | row as u64;
            let mut state = XxHash64::with_seed(seed);
            for _ in 0..width {
                let position = (wyrand(&mut seed) % self.num_registers as u64) as usize;
                item[position].digest_into(&mut state);
            }
            state.finish()
        }
    }

    fn empty(num_registers: usize) -> Self {
        SketchLshIndex {
            num_registers,
            band_widths: Vec::new(),
            bands: Vec::new(),
            total_ids: 0,
        }
    }

    fn push_band(&mut self, width: usize, nrows: usize) {
        self.band_widths.push(width);
        self.bands.push(vec![AHashMap::new(); nrows]);
    }

    fn check_registers<R: SketchRegister>(&self, sketch: &[R]) -> Result<(), Error> {
        if sketch.len() != self.num_registers {
            return Err(Error::size_mismatch(self.num_registers, sketch.len()));
        }
        Ok(())
    }
}

fn validate_width(width: usize, num_registers: usize) -> Result<(), Error> {
    if width == 0 || width > num_registers {
        return Err(Error::configuration("band width out of range")
            .with_context("width", width)
            .with_context("registers", num_registers));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_power_of_two_ladder() {
        let index = SketchLshIndex::new(128);
        assert_eq!(index.band_widths(), &[1, 2, 4, 8, 16, 32, 64, 128]);
        // Rows tile the registers per band.
        for (band, &width) in index.band_widths().iter().enumerate() {
            assert_eq!(index.bands[band].len(), 128 / width);
        }
    }

    #[test]
    fn test_dense_schedule() {
        let index = SketchLshIndex::new_dense(8);
        assert_eq!(index.band_widths(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_explicit_schedules() {
        let index = SketchLshIndex::with_widths(16, &[2, 8]).unwrap();
        assert_eq!(index.num_bands(), 2);
        assert_eq!(index.bands[1].len(), 2);

        let index = SketchLshIndex::with_schedule(16, &[2, 8], &[3, 0]).unwrap();
        assert_eq!(index.bands[0].len(), 3);
        assert_eq!(index.bands[1].len(), 2);

        let err = SketchLshIndex::with_widths(16, &[32]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = SketchLshIndex::with_schedule(16, &[2, 8], &[1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_hash_index_is_pure() {
        let index = SketchLshIndex::new(16);
        let sketch: Vec<u32> = (0..16).collect();
        for band in 0..index.num_bands() {
            for row in 0..index.bands[band].len() {
                assert_eq!(
                    index.hash_index(&sketch, band, row),
                    index.hash_index(&sketch, band, row)
                );
            }
        }
    }

    #[test]
    fn test_update_assigns_dense_ids() {
        let mut index = SketchLshIndex::new(8);
        let sketch: Vec<u64> = (0..8).collect();
        assert_eq!(index.update(&sketch).unwrap(), 0);
        assert_eq!(index.update(&sketch).unwrap(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_query_finds_inserted_sketch() {
        let mut index = SketchLshIndex::new(16);
        let sketch: Vec<u16> = (0..16).collect();
        let id = index.update(&sketch).unwrap();
        let (ids, _) = index.query_candidates(&sketch, 1).unwrap();
        assert!(ids.contains(&id));
    }

    #[test]
    fn test_size_mismatch() {
        let mut index = SketchLshIndex::new(16);
        let short: Vec<u16> = (0..15).collect();
        assert_eq!(
            index.update(&short).unwrap_err().kind(),
            ErrorKind::SizeMismatch
        );
        assert_eq!(
            index.query_candidates(&short, 4).unwrap_err().kind(),
            ErrorKind::SizeMismatch
        );
    }

    #[test]
    fn test_counts_follow_traversal_order() {
        let mut index = SketchLshIndex::new(8);
        let a: Vec<u8> = (0..8).collect();
        let b: Vec<u8> = (8..16).collect();
        index.update(&a).unwrap();
        index.update(&b).unwrap();

        let (ids, per_band) = index.query_candidates(&a, 10).unwrap();
        assert_eq!(per_band.len(), index.num_bands());
        assert_eq!(per_band.iter().sum::<u32>() as usize, ids.len());
        // The widest band already matches the inserted sketch itself.
        assert_eq!(per_band[0], 1);
    }
}
