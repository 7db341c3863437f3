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

use crate::error::Error;

/// A 64-bit integer mixing function.
///
/// Each variant maps a `u64` to a `u64` deterministically, with enough output
/// entropy that every window of the result is approximately uniform for
/// uniform inputs. The set is closed so that a single byte identifies the
/// function in serialized sketches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixHash {
    /// Thomas Wang's 64-bit invertible mix.
    #[default]
    Wang,
    /// The MurmurHash3 64-bit finalizer (`fmix64`).
    Murmur,
}

impl MixHash {
    /// Mixes a single 64-bit value.
    #[inline]
    pub fn mix(self, x: u64) -> u64 {
        match self {
            MixHash::Wang => wang64(x),
            MixHash::Murmur => fmix64(x),
        }
    }

    /// The one-byte identifier stored in serialized sketches.
    pub(crate) fn tag(self) -> u8 {
        match self {
            MixHash::Wang => 0,
            MixHash::Murmur => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self, Error> {
        match tag {
            0 => Ok(MixHash::Wang),
            1 => Ok(MixHash::Murmur),
            _ => Err(Error::configuration("unknown hash function tag")
                .with_context("tag", tag)),
        }
    }
}

#[inline]
fn wang64(mut key: u64) -> u64 {
    key = (!key).wrapping_add(key << 21);
    key ^= key >> 24;
    key = key.wrapping_add(key << 3).wrapping_add(key << 8);
    key ^= key >> 14;
    key = key.wrapping_add(key << 2).wrapping_add(key << 4);
    key ^= key >> 28;
    key.wrapping_add(key << 31)
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^ (k >> 33)
}

/// Stateless 64-bit stream mixer.
///
/// Advances `seed` and returns the next value of the stream; the sequence is
/// a pure function of the starting seed.
#[inline]
pub(crate) fn wyrand(seed: &mut u64) -> u64 {
    *seed = seed.wrapping_add(0x60bee2bee120fc15);
    wymum(*seed ^ 0xe7037ed1a0b428db, *seed)
}

#[inline]
fn wymum(x: u64, y: u64) -> u64 {
    let l = (x as u128).wrapping_mul(y as u128);
    (l ^ (l >> 64)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_deterministic() {
        for mix in [MixHash::Wang, MixHash::Murmur] {
            assert_eq!(mix.mix(0xdeadbeef), mix.mix(0xdeadbeef));
        }
    }

    #[test]
    fn test_mix_avalanche_sanity() {
        // Adjacent inputs should land far apart in the output space.
        for mix in [MixHash::Wang, MixHash::Murmur] {
            for i in 0u64..64 {
                let a = mix.mix(i);
                let b = mix.mix(i + 1);
                assert_ne!(a, b);
                let flipped = (a ^ b).count_ones();
                assert!(flipped >= 8, "only {flipped} bits changed for {mix:?}");
            }
        }
    }

    #[test]
    fn test_fmix64_zero_fixed_point() {
        assert_eq!(MixHash::Murmur.mix(0), 0);
        assert_ne!(MixHash::Wang.mix(0), 0);
    }

    #[test]
    fn test_tag_round_trip() {
        for mix in [MixHash::Wang, MixHash::Murmur] {
            assert_eq!(MixHash::from_tag(mix.tag()).unwrap(), mix);
        }
        assert!(MixHash::from_tag(0xff).is_err());
    }

    #[test]
    fn test_wyrand_stream_deterministic() {
        let mut a = 42u64;
        let mut b = 42u64;
        for _ in 0..16 {
            assert_eq!(wyrand(&mut a), wyrand(&mut b));
        }
        assert_eq!(a, b);

        let mut c = 43u64;
        assert_ne!(wyrand(&mut a), wyrand(&mut c));
    }
}
