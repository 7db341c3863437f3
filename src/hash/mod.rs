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

//! The 64-bit hash family used by the sketches.
//!
//! [`MixHash`] is a closed set of integer-to-integer mixing functions; every
//! sketch operation that needs a hash goes through one of its variants, so
//! two sketches agree on bit placement exactly when they were built with the
//! same variant and seed.

mod mix;

pub use self::mix::MixHash;
pub(crate) use self::mix::wyrand;

/// Default seed for sketch updates.
///
/// Choosing a seed is somewhat arbitrary; 9001 is a prime that has been used
/// for this purpose since early experimental testing. In order to perform set
/// operations on two sketches it is critical that the hash function and seed
/// are identical for both, otherwise the assumed 1:1 relationship between the
/// original key and its probe positions would be violated.
pub(crate) const DEFAULT_UPDATE_SEED: u64 = 9001;
