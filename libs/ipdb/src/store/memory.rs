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
//! In-memory [Store] implementation.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use ipdb_model::{addr::IpAddrValue, interval::Interval};

use crate::store::{
    DeleteSpaceOutcome, InsertSpaceOutcome, NewRange, NewSpace, Page, Range, RangeId,
    ReserveOutcome, Space, SpaceId, SpaceUpdate, Store, StoreError, UpdateSpaceOutcome,
};

/// In-memory store; a cheap-to-clone handle over shared tables.
///
/// Every mutating operation runs entirely under the write lock, which
/// serializes the overlap check and the insert of [Store::reserve_range]
/// against all other mutations of the store. Reads take the read lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    spaces: BTreeMap<SpaceId, Space>,
    ranges: BTreeMap<RangeId, Range>,
    next_space_id: SpaceId,
    next_range_id: RangeId,
}

impl Tables {
    fn space_name_taken(&self, name: &str, exclude: Option<SpaceId>) -> bool {
        self.spaces
            .values()
            .any(|space| space.name == name && Some(space.id) != exclude)
    }

    fn range_name_taken(&self, space_id: SpaceId, name: &str) -> bool {
        self.ranges
            .values()
            .any(|range| range.space_id == space_id && range.name == name)
    }

    fn space_has_ranges(&self, space_id: SpaceId) -> bool {
        self.ranges.values().any(|range| range.space_id == space_id)
    }

    fn ranges_in(&self, space_id: SpaceId) -> impl Iterator<Item = &Range> {
        self.ranges
            .values()
            .filter(move |range| range.space_id == space_id)
    }
}

fn sorted_by_start(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort_by_key(|range| range.interval.start());
    ranges
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(format!("poisoned lock: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(format!("poisoned lock: {e}")))
    }
}

impl Store for MemoryStore {
    fn insert_space(&self, space: NewSpace) -> Result<InsertSpaceOutcome, StoreError> {
        let mut tables = self.write()?;
        if tables.space_name_taken(&space.name, None) {
            return Ok(InsertSpaceOutcome::NameTaken);
        }
        tables.next_space_id += 1;
        let record = Space {
            id: tables.next_space_id,
            name: space.name,
            description: space.description,
            version: space.version,
            bounds: space.bounds,
        };
        tables.spaces.insert(record.id, record.clone());
        Ok(InsertSpaceOutcome::Created(record))
    }

    fn update_space(
        &self,
        id: SpaceId,
        update: SpaceUpdate,
    ) -> Result<UpdateSpaceOutcome, StoreError> {
        let mut tables = self.write()?;
        let Some(mut record) = tables.spaces.get(&id).cloned() else {
            return Ok(UpdateSpaceOutcome::NotFound);
        };
        if let Some(name) = &update.name {
            if tables.space_name_taken(name, Some(id)) {
                return Ok(UpdateSpaceOutcome::NameTaken);
            }
        }
        if let Some(version) = update.version {
            if version != record.version && tables.space_has_ranges(id) {
                return Ok(UpdateSpaceOutcome::VersionChangeBlocked);
            }
            record.version = version;
        }
        // The bounds that would be in effect after the update must match
        // the version that would be in effect. Checking here, under the
        // same lock that applies the update, keeps two concurrent updates
        // from interleaving into an inconsistent record.
        if let Some(bounds) = update.bounds.or(record.bounds) {
            if bounds.version() != record.version {
                return Ok(UpdateSpaceOutcome::BoundsVersionMismatch {
                    space: record.version,
                    bounds: bounds.version(),
                });
            }
        }
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(description) = update.description {
            record.description = Some(description);
        }
        if let Some(bounds) = update.bounds {
            record.bounds = Some(bounds);
        }
        tables.spaces.insert(id, record.clone());
        Ok(UpdateSpaceOutcome::Updated(record))
    }

    fn space(&self, id: SpaceId) -> Result<Option<Space>, StoreError> {
        Ok(self.read()?.spaces.get(&id).cloned())
    }

    fn list_spaces(&self, page: Page) -> Result<Vec<Space>, StoreError> {
        Ok(self
            .read()?
            .spaces
            .values()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    fn delete_space(&self, id: SpaceId) -> Result<DeleteSpaceOutcome, StoreError> {
        let mut tables = self.write()?;
        if !tables.spaces.contains_key(&id) {
            return Ok(DeleteSpaceOutcome::NotFound);
        }
        if tables.space_has_ranges(id) {
            return Ok(DeleteSpaceOutcome::HasRanges);
        }
        let record = tables.spaces.remove(&id).expect("checked above");
        Ok(DeleteSpaceOutcome::Deleted(record))
    }

    fn reserve_range(&self, range: NewRange) -> Result<ReserveOutcome, StoreError> {
        let mut tables = self.write()?;
        let Some(space) = tables.spaces.get(&range.space_id) else {
            return Ok(ReserveOutcome::SpaceNotFound);
        };
        if range.interval.version() != space.version {
            return Ok(ReserveOutcome::VersionMismatch {
                space: space.version,
                interval: range.interval.version(),
            });
        }
        if tables.range_name_taken(range.space_id, &range.name) {
            return Ok(ReserveOutcome::NameTaken);
        }
        let conflicts: Vec<Range> = tables
            .ranges_in(range.space_id)
            .filter(|existing| existing.interval.overlaps(&range.interval))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            return Ok(ReserveOutcome::Conflict(sorted_by_start(conflicts)));
        }
        tables.next_range_id += 1;
        let record = Range {
            id: tables.next_range_id,
            space_id: range.space_id,
            name: range.name,
            description: range.description,
            interval: range.interval,
        };
        tables.ranges.insert(record.id, record.clone());
        Ok(ReserveOutcome::Reserved(record))
    }

    fn delete_range(&self, id: RangeId) -> Result<Option<Range>, StoreError> {
        Ok(self.write()?.ranges.remove(&id))
    }

    fn ranges_overlapping(
        &self,
        space_id: SpaceId,
        interval: Interval,
    ) -> Result<Vec<Range>, StoreError> {
        let tables = self.read()?;
        let matches: Vec<Range> = tables
            .ranges_in(space_id)
            .filter(|range| range.interval.overlaps(&interval))
            .cloned()
            .collect();
        Ok(sorted_by_start(matches))
    }

    fn range_containing(
        &self,
        space_id: SpaceId,
        addr: IpAddrValue,
    ) -> Result<Option<Range>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .ranges_in(space_id)
            .find(|range| range.interval.contains(addr))
            .cloned())
    }

    fn list_ranges(&self, space_id: SpaceId, page: Page) -> Result<Vec<Range>, StoreError> {
        let tables = self.read()?;
        let all = sorted_by_start(tables.ranges_in(space_id).cloned().collect());
        Ok(all
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }
}
