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

//! Integration tests for ip-db.
//!
//! This crate exercises the registry and the engine together against
//! one shared store, including the end-to-end reservation scenarios and
//! the concurrency property of `reserve`.

use ipdb::{
    engine::IpAllocationEngine,
    registry::SpaceRegistry,
    store::{MemoryStore, NewSpace, Space},
};
use ipdb_model::{
    addr::{IpAddrValue, IpVersion},
    interval::Interval,
};

/// Registry and engine sharing one in-memory store.
pub struct IpDbTestEnv {
    /// Space CRUD.
    pub registry: SpaceRegistry<MemoryStore>,
    /// Range reservation and queries.
    pub engine: IpAllocationEngine<MemoryStore>,
}

impl IpDbTestEnv {
    /// Creates an environment over a fresh store.
    pub fn new() -> Self {
        let store = MemoryStore::new();
        Self {
            registry: SpaceRegistry::new(store.clone()),
            engine: IpAllocationEngine::new(store),
        }
    }

    /// Creates a space with the given name and version.
    pub fn space(&self, name: &str, version: IpVersion) -> Space {
        self.registry
            .create(NewSpace {
                name: name.to_string(),
                description: None,
                version,
                bounds: None,
            })
            .expect("space creation should succeed")
    }
}

impl Default for IpDbTestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a textual IPv4 address.
pub fn v4(text: &str) -> IpAddrValue {
    IpAddrValue::parse(text, IpVersion::V4).expect("valid IPv4 test address")
}

/// Builds an interval from two textual IPv4 addresses.
pub fn v4_interval(start: &str, end: &str) -> Interval {
    Interval::new(v4(start), v4(end)).expect("valid IPv4 test interval")
}

/// Builds an interval from raw IPv4 bits.
pub fn v4_interval_bits(start: u128, end: u128) -> Interval {
    Interval::new(
        IpAddrValue::from_bits(IpVersion::V4, start).expect("test value fits"),
        IpAddrValue::from_bits(IpVersion::V4, end).expect("test value fits"),
    )
    .expect("valid test interval")
}
