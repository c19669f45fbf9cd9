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
//! # IP DB
//!
//! Manage named address spaces and carve out non-overlapping reservations
//! within them.
//!
//! A [registry::SpaceRegistry] handles CRUD of [store::Space] records. The
//! [engine::IpAllocationEngine] reserves and releases [store::Range]
//! intervals within a space and answers containment and overlap queries,
//! keeping the core invariant that no two ranges of one space overlap.
//! Both take an explicit [store::Store] handle; [store::MemoryStore] is
//! the in-process implementation.

pub mod engine;
pub mod registry;
pub mod store;
