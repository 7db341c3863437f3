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

//! Blocked Bloom filter for probabilistic set membership testing.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to
//! test whether an element is a member of a set. False positive matches are
//! possible, but false negatives are not: a query returns either "possibly in
//! set" or "definitely not in set".
//!
//! The filter here is *blocked*: its bits live in 64-bit words, and each
//! 64-bit hash of the inserted value supplies several probe positions at
//! once. The point of entry is a 64-bit integer; callers hash other types
//! into a `u64` themselves.
//!
//! # Usage
//!
//! ```rust
//! use bitsketch::bloom::BlockedBloomFilter;
//!
//! // 2^10 bits, 4 probes per value.
//! let mut filter = BlockedBloomFilter::new(10, 4, 137).unwrap();
//!
//! for v in 0..100u64 {
//!     filter.insert(v);
//! }
//!
//! assert!(filter.may_contain(42));
//! println!("estimated cardinality: {:.1}", filter.cardinality_estimate());
//! println!("estimated FPP: {:.4}", filter.estimated_fpp());
//! ```
//!
//! # Set operations
//!
//! Filters built with identical parameters support union, intersection, and
//! symmetric difference, plus cardinality-corrected Jaccard estimation:
//!
//! ```rust
//! # use bitsketch::bloom::BlockedBloomFilter;
//! let mut a = BlockedBloomFilter::new(12, 4, 1).unwrap();
//! let mut b = BlockedBloomFilter::new(12, 4, 1).unwrap();
//! for v in 0..500u64 {
//!     a.insert(v);
//!     b.insert(v + 250);
//! }
//! a.union_assign(&b).unwrap();
//! assert!(a.may_contain(700));
//! ```
//!
//! # Concurrent insertion
//!
//! Plain insertion performs non-atomic read-modify-write on the word array
//! and must not race. [`AtomicBlockedBloomFilter`] is the opt-in multi-writer
//! variant: insertion is a relaxed atomic fetch-OR, and membership reads
//! tolerate concurrent insertion (they may conservatively miss an insert that
//! has not yet landed, never the reverse).

mod builder;
mod concurrent;
mod filter;

pub use self::builder::BlockedBloomFilterBuilder;
pub use self::concurrent::AtomicBlockedBloomFilter;
pub use self::filter::BlockedBloomFilter;
