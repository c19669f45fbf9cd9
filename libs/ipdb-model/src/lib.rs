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
//! # IP DB model
//!
//! Address values and half-open address intervals.
//!
//! An [addr::IpAddrValue] is a fixed-width unsigned integer (32 bits for
//! IPv4, 128 bits for IPv6) with canonical textual and big-endian byte
//! forms. An [interval::Interval] is a half-open pair `[start, end)` of
//! such values and carries the overlap and containment predicates that
//! the reservation engine is built on.

pub mod addr;
pub mod interval;
