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

//! Locality-sensitive index over fixed-width sketches.
//!
//! [`SketchLshIndex`] maintains banded hash tables over sketches of a fixed
//! register count `m`: each band of width `b` digests `floor(m / b)` register
//! slices ("rows") per sketch, and two sketches collide on a row exactly when
//! the digest of that slice is equal. Wide bands are specific (near-exact
//! matches), narrow bands are sensitive (distant matches still collide
//! somewhere).
//!
//! Queries walk bands from the most specific to the most sensitive, so the
//! prefix of the returned candidates holds the closest matches:
//!
//! ```rust
//! use bitsketch::lsh::SketchLshIndex;
//!
//! let mut index = SketchLshIndex::new(8);
//! let near: Vec<u16> = (0..8).collect();
//! let far: Vec<u16> = (100..108).collect();
//! let id_near = index.update(&near).unwrap();
//! index.update(&far).unwrap();
//!
//! let (ids, per_band) = index.query_candidates(&near, 10).unwrap();
//! assert_eq!(ids[0], id_near);
//! assert_eq!(per_band.len(), index.num_bands());
//! ```

mod index;

pub use self::index::SketchLshIndex;
pub use self::index::SketchRegister;
