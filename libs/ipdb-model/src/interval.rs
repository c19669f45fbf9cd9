// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Half-open address intervals.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::addr::{IpAddrValue, IpVersion};

/// Interval construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// `start >= end`; empty and inverted intervals are rejected.
    #[error("interval is empty or inverted: start {start} >= end {end}")]
    Empty {
        /// Requested inclusive lower bound.
        start: IpAddrValue,
        /// Requested exclusive upper bound.
        end: IpAddrValue,
    },
    /// Bounds belong to different address versions.
    #[error("interval bounds mix {0} and {1}")]
    VersionMismatch(IpVersion, IpVersion),
}

/// A half-open interval `[start, end)` of addresses of one version.
///
/// `start` is inclusive and `end` is exclusive: the interval covers
/// every address `a` with `start <= a < end`. Two intervals that merely
/// touch at a boundary therefore do not overlap. The derived ordering
/// sorts by `start` first, which is the listing order of the store.
///
/// The accessors are named `start`/`end` rather than `min`/`max`; the
/// latter would be shadowed by [Ord::min]/[Ord::max] on this `Copy`
/// type, since by-value trait receivers win method resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: IpAddrValue,
    end: IpAddrValue,
}

impl Interval {
    /// Creates an interval, rejecting mixed versions and `start >= end`.
    pub fn new(start: IpAddrValue, end: IpAddrValue) -> Result<Self, IntervalError> {
        if start.version() != end.version() {
            return Err(IntervalError::VersionMismatch(
                start.version(),
                end.version(),
            ));
        }
        if start >= end {
            return Err(IntervalError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    pub const fn start(&self) -> IpAddrValue {
        self.start
    }

    /// Exclusive upper bound.
    pub const fn end(&self) -> IpAddrValue {
        self.end
    }

    /// The version both bounds belong to.
    pub const fn version(&self) -> IpVersion {
        self.start.version()
    }

    /// Number of addresses covered by the interval.
    pub const fn len(&self) -> u128 {
        self.end.to_bits() - self.start.to_bits()
    }

    /// Whether the two intervals share at least one address.
    ///
    /// Equivalent to `start_a <= start_b && end_a > start_b` or the
    /// mirrored condition; since `end` is exclusive, adjacent intervals
    /// do not overlap. Intervals of different versions never overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.version() == other.version() && self.start < other.end && other.start < self.end
    }

    /// Whether the interval contains the address: `start <= addr < end`.
    pub fn contains(&self, addr: IpAddrValue) -> bool {
        self.version() == addr.version() && self.start <= addr && addr < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
