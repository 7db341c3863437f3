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

//! # bitsketch
//!
//! Probabilistic sketching primitives for approximate set membership,
//! cardinality, and similarity estimation:
//!
//! - [`bloom`] — a blocked Bloom filter with bitwise set algebra,
//!   cardinality and Jaccard estimators, halving, and a gzip-framed
//!   serialization format.
//! - [`lsh`] — a locality-sensitive index over fixed-width sketches using
//!   banded hashing at multiple band widths, queried from the most
//!   specific band to the most sensitive one.
//!
//! The supporting modules hold the shared infrastructure: the 64-bit hash
//! family ([`hash`]), word-level bit-array operations ([`common`]), the
//! byte codec ([`codec`]), and the crate-wide error type ([`error`]).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod bloom;
pub mod codec;
pub mod common;
pub mod error;
pub mod hash;
pub mod lsh;
