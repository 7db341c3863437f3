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

use bitsketch::bloom::BlockedBloomFilter;
use bitsketch::bloom::BlockedBloomFilterBuilder;
use bitsketch::error::ErrorKind;
use bitsketch::hash::MixHash;

#[test]
fn test_raw_round_trip() {
    let mut filter = BlockedBloomFilter::new(10, 4, 137).unwrap();
    for v in 0..200u64 {
        filter.insert(v);
    }

    let bytes = filter.to_bytes().unwrap();
    let restored = BlockedBloomFilter::from_bytes(&bytes).unwrap();

    assert_eq!(restored, filter);
    assert_eq!(restored.log2_bits(), filter.log2_bits());
    assert_eq!(restored.num_hashes(), filter.num_hashes());
    assert_eq!(restored.seed(), filter.seed());
    assert_eq!(restored.seeds(), filter.seeds());
    assert_eq!(restored.mask(), filter.mask());
    for v in 0..200u64 {
        assert!(restored.may_contain(v));
    }
}

#[test]
fn test_header_prefix() {
    // p = 20 gives three sub-hashes per word, so 7 probes need 3 seeds.
    let filter = BlockedBloomFilter::new(20, 7, 555).unwrap();
    assert_eq!(filter.seeds().len(), 3);

    let bytes = filter.to_bytes().unwrap();
    assert_eq!(&bytes[..3], &[14, 7, 3], "p - 6, nh, seed count");
    assert_eq!(bytes[3], 0, "default hash family tag");
    assert_eq!(
        u64::from_le_bytes(bytes[4..12].try_into().unwrap()),
        555,
        "seed_seed follows the hash state"
    );
    assert_eq!(
        u64::from_le_bytes(bytes[12..20].try_into().unwrap()),
        (1u64 << 20) - 1,
        "mask follows seed_seed"
    );
    let expected_len = 4 + 8 + 8 + 8 * 3 + 8 * (1 << 14);
    assert_eq!(bytes.len(), expected_len);
}

#[test]
fn test_gzip_stream_round_trip() {
    let mut filter = BlockedBloomFilterBuilder::with_log2_bits(12, 5)
        .seed(99)
        .mix(MixHash::Murmur)
        .build()
        .unwrap();
    for v in 0..300u64 {
        filter.insert(v * 3);
    }

    let mut stream = Vec::new();
    let payload_len = filter.write(&mut stream).unwrap();
    assert_eq!(payload_len, filter.to_bytes().unwrap().len());
    // Gzip magic.
    assert_eq!(&stream[..2], &[0x1f, 0x8b]);

    let restored = BlockedBloomFilter::read(stream.as_slice()).unwrap();
    assert_eq!(restored, filter);
    assert_eq!(restored.mix(), MixHash::Murmur);
}

#[test]
fn test_hash_family_tag_round_trips() {
    let filter = BlockedBloomFilter::with_mix(8, 2, 5, MixHash::Murmur).unwrap();
    let bytes = filter.to_bytes().unwrap();
    assert_eq!(bytes[3], 1);
    let restored = BlockedBloomFilter::from_bytes(&bytes).unwrap();
    assert_eq!(restored.mix(), MixHash::Murmur);
}

#[test]
fn test_too_many_hashes_for_header() {
    // Valid in memory (p = 20 admits up to 765 probes), too wide to write.
    let filter = BlockedBloomFilter::new(20, 300, 1).unwrap();
    assert_eq!(
        filter.to_bytes().unwrap_err().kind(),
        ErrorKind::Capacity
    );
}

#[test]
fn test_truncated_stream() {
    let filter = BlockedBloomFilter::new(10, 4, 1).unwrap();
    let bytes = filter.to_bytes().unwrap();

    assert_eq!(
        BlockedBloomFilter::from_bytes(&bytes[..2])
            .unwrap_err()
            .kind(),
        ErrorKind::Io
    );
    assert_eq!(
        BlockedBloomFilter::from_bytes(&bytes[..bytes.len() - 1])
            .unwrap_err()
            .kind(),
        ErrorKind::Io
    );
}

#[test]
fn test_corrupt_hash_tag() {
    let filter = BlockedBloomFilter::new(10, 4, 1).unwrap();
    let mut bytes = filter.to_bytes().unwrap();
    bytes[3] = 0x7f;
    assert_eq!(
        BlockedBloomFilter::from_bytes(&bytes).unwrap_err().kind(),
        ErrorKind::Configuration
    );
}

#[test]
fn test_garbage_gzip_stream() {
    let garbage = [0u8, 1, 2, 3, 4, 5, 6, 7];
    assert_eq!(
        BlockedBloomFilter::read(garbage.as_slice())
            .unwrap_err()
            .kind(),
        ErrorKind::Io
    );
}
