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
//! The reservation engine.

use ipdb_model::{
    addr::{IpAddrValue, IpVersion},
    interval::Interval,
};
use thiserror::Error;

use crate::store::{
    NewRange, Page, Range, RangeId, ReserveOutcome, Space, SpaceId, Store, StoreError,
};

/// Reservation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReserveError {
    /// The target space does not exist.
    #[error("space {0} not found")]
    SpaceNotFound(SpaceId),
    /// The interval version does not match the space version.
    #[error("interval version {interval} does not match space version {space}")]
    VersionMismatch {
        /// Version of the space.
        space: IpVersion,
        /// Version of the requested interval.
        interval: IpVersion,
    },
    /// Another range in the space already uses the name.
    #[error("range name `{0}` already taken in this space")]
    NameTaken(String),
    /// The interval overlaps already reserved ranges. The conflicting
    /// ranges are logged, not carried here.
    #[error("requested interval overlaps already reserved ranges")]
    Conflict,
    /// The store could not complete the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Release errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReleaseError {
    /// No range with the given id exists (it may already be released).
    #[error("range {0} not found")]
    NotFound(RangeId),
    /// The store could not complete the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors of the engine's read-only queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The target space does not exist.
    #[error("space {0} not found")]
    SpaceNotFound(SpaceId),
    /// The queried value's version does not match the space version.
    #[error("query version {query} does not match space version {space}")]
    VersionMismatch {
        /// Version of the space.
        space: IpVersion,
        /// Version of the queried interval or address.
        query: IpVersion,
    },
    /// The store could not complete the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Conflict-checked allocation of address ranges within spaces.
///
/// The engine holds an explicit store handle; there is no process-wide
/// default store. All operations are synchronous calls into the store
/// and may block on store I/O. Concurrent callers share one store, and
/// the store's isolation makes the overlap check and insert of
/// [IpAllocationEngine::reserve] a single atomic unit: at most one of
/// several concurrent reservations of overlapping intervals wins.
#[derive(Debug, Clone)]
pub struct IpAllocationEngine<S> {
    store: S,
}

impl<S: Store> IpAllocationEngine<S> {
    /// Creates an engine on top of the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reserves `interval` in the space under `name`.
    ///
    /// Validates that the space exists and that the interval version
    /// matches the space version, then performs the conflict search and
    /// the insert as one atomic store operation. On conflict the
    /// overlapping ranges are logged at debug level and
    /// [ReserveError::Conflict] is returned without them.
    pub fn reserve(
        &self,
        space_id: SpaceId,
        name: impl Into<String>,
        description: Option<String>,
        interval: Interval,
    ) -> Result<Range, ReserveError> {
        let name = name.into();
        let space = self
            .store
            .space(space_id)?
            .ok_or(ReserveError::SpaceNotFound(space_id))?;
        if interval.version() != space.version {
            return Err(ReserveError::VersionMismatch {
                space: space.version,
                interval: interval.version(),
            });
        }

        let outcome = self.store.reserve_range(NewRange {
            space_id,
            name: name.clone(),
            description,
            interval,
        })?;
        match outcome {
            ReserveOutcome::Reserved(range) => {
                tracing::debug!(
                    space = space_id,
                    range = range.id,
                    "reserved `{}` {}",
                    range.name,
                    range.interval
                );
                Ok(range)
            }
            ReserveOutcome::Conflict(conflicts) => {
                for conflict in &conflicts {
                    tracing::debug!(
                        space = space_id,
                        conflicting = conflict.id,
                        "requested {} overlaps `{}` {}",
                        interval,
                        conflict.name,
                        conflict.interval
                    );
                }
                Err(ReserveError::Conflict)
            }
            // The space was deleted or changed between the lookup above
            // and the store transaction.
            ReserveOutcome::SpaceNotFound => Err(ReserveError::SpaceNotFound(space_id)),
            ReserveOutcome::NameTaken => Err(ReserveError::NameTaken(name)),
            ReserveOutcome::VersionMismatch { space, interval } => {
                Err(ReserveError::VersionMismatch { space, interval })
            }
        }
    }

    /// Releases a range by id, returning its prior snapshot.
    ///
    /// Releasing a range that no longer exists reports
    /// [ReleaseError::NotFound] so callers can tell "already released"
    /// from a successful release.
    pub fn release(&self, id: RangeId) -> Result<Range, ReleaseError> {
        match self.store.delete_range(id)? {
            Some(range) => {
                tracing::debug!(space = range.space_id, range = range.id, "released `{}`", range.name);
                Ok(range)
            }
            None => Err(ReleaseError::NotFound(id)),
        }
    }

    /// Whether no reserved range of the space overlaps the interval.
    ///
    /// Read-only; a concurrent [IpAllocationEngine::reserve] may race
    /// with this answer. Callers needing a guarantee must reserve.
    pub fn interval_is_free(
        &self,
        space_id: SpaceId,
        interval: Interval,
    ) -> Result<bool, QueryError> {
        Ok(self.find_overlapping(space_id, interval)?.is_empty())
    }

    /// Whether no reserved range of the space contains the address.
    pub fn addr_is_free(&self, space_id: SpaceId, addr: IpAddrValue) -> Result<bool, QueryError> {
        Ok(self.range_containing(space_id, addr)?.is_none())
    }

    /// All ranges of the space overlapping the interval, sorted by interval start.
    pub fn find_overlapping(
        &self,
        space_id: SpaceId,
        interval: Interval,
    ) -> Result<Vec<Range>, QueryError> {
        let space = self.checked_space(space_id)?;
        if interval.version() != space.version {
            return Err(QueryError::VersionMismatch {
                space: space.version,
                query: interval.version(),
            });
        }
        Ok(self.store.ranges_overlapping(space_id, interval)?)
    }

    /// The unique range of the space containing the address, if any.
    pub fn range_containing(
        &self,
        space_id: SpaceId,
        addr: IpAddrValue,
    ) -> Result<Option<Range>, QueryError> {
        let space = self.checked_space(space_id)?;
        if addr.version() != space.version {
            return Err(QueryError::VersionMismatch {
                space: space.version,
                query: addr.version(),
            });
        }
        Ok(self.store.range_containing(space_id, addr)?)
    }

    /// Ranges of the space sorted by interval start, paginated.
    pub fn list(&self, space_id: SpaceId, page: Page) -> Result<Vec<Range>, QueryError> {
        self.checked_space(space_id)?;
        Ok(self.store.list_ranges(space_id, page)?)
    }

    fn checked_space(&self, space_id: SpaceId) -> Result<Space, QueryError> {
        self.store
            .space(space_id)?
            .ok_or(QueryError::SpaceNotFound(space_id))
    }
}

#[cfg(test)]
mod tests {
    use ipdb_model::addr::IpVersion;
    use test_log::test;

    use crate::store::{InsertSpaceOutcome, MemoryStore, NewSpace};

    use super::*;

    fn v4(text: &str) -> IpAddrValue {
        IpAddrValue::parse(text, IpVersion::V4).expect("valid test address")
    }

    fn v4_interval(start: &str, end: &str) -> Interval {
        Interval::new(v4(start), v4(end)).expect("valid test interval")
    }

    fn engine_with_space(version: IpVersion) -> (IpAllocationEngine<MemoryStore>, SpaceId) {
        let store = MemoryStore::new();
        let outcome = store
            .insert_space(NewSpace {
                name: "space".to_string(),
                description: None,
                version,
                bounds: None,
            })
            .expect("store is available");
        let InsertSpaceOutcome::Created(space) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        (IpAllocationEngine::new(store), space.id)
    }

    #[test]
    fn test_reserve_adjacent_succeeds_overlap_conflicts() {
        let (engine, space) = engine_with_space(IpVersion::V4);

        let a = engine
            .reserve(space, "a", None, v4_interval("10.0.0.0", "10.0.0.4"))
            .expect("first reservation in an empty space");
        assert_eq!(a.name, "a");

        // Touching boundary: the end bound is exclusive.
        engine
            .reserve(space, "b", None, v4_interval("10.0.0.4", "10.0.0.8"))
            .expect("adjacent interval does not overlap");

        let err = engine
            .reserve(space, "c", None, v4_interval("10.0.0.2", "10.0.0.6"))
            .expect_err("overlapping interval must conflict");
        assert_eq!(err, ReserveError::Conflict);
    }

    #[test]
    fn test_reserve_unknown_space() {
        let store = MemoryStore::new();
        let engine = IpAllocationEngine::new(store);
        assert_eq!(
            engine.reserve(7, "a", None, v4_interval("10.0.0.0", "10.0.0.4")),
            Err(ReserveError::SpaceNotFound(7))
        );
    }

    #[test]
    fn test_reserve_version_mismatch() {
        let (engine, space) = engine_with_space(IpVersion::V6);
        assert_eq!(
            engine.reserve(space, "a", None, v4_interval("10.0.0.0", "10.0.0.4")),
            Err(ReserveError::VersionMismatch {
                space: IpVersion::V6,
                interval: IpVersion::V4,
            })
        );
    }

    #[test]
    fn test_reserve_duplicate_name() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        engine
            .reserve(space, "a", None, v4_interval("10.0.0.0", "10.0.0.4"))
            .expect("first reservation");
        assert_eq!(
            engine.reserve(space, "a", None, v4_interval("10.0.1.0", "10.0.1.4")),
            Err(ReserveError::NameTaken("a".to_string()))
        );
    }

    #[test]
    fn test_release_is_not_idempotent_silently() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        let range = engine
            .reserve(space, "a", None, v4_interval("10.0.0.0", "10.0.0.4"))
            .expect("reservation");

        let released = engine.release(range.id).expect("first release");
        assert_eq!(released, range);
        assert_eq!(engine.release(range.id), Err(ReleaseError::NotFound(range.id)));
    }

    #[test]
    fn test_released_interval_can_be_reserved_again() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        let interval = v4_interval("10.0.0.0", "10.0.0.4");
        let range = engine.reserve(space, "a", None, interval).expect("reservation");
        engine.release(range.id).expect("release");
        engine
            .reserve(space, "a2", None, interval)
            .expect("released interval is free again");
    }

    #[test]
    fn test_is_free_queries() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        engine
            .reserve(space, "b", None, v4_interval("10.0.0.4", "10.0.0.8"))
            .expect("reservation");

        assert!(!engine.addr_is_free(space, v4("10.0.0.5")).unwrap());
        assert!(engine.addr_is_free(space, v4("10.0.0.10")).unwrap());
        // the end bound is exclusive, so the upper bound itself is free.
        assert!(engine.addr_is_free(space, v4("10.0.0.8")).unwrap());

        assert!(!engine
            .interval_is_free(space, v4_interval("10.0.0.0", "10.0.0.5"))
            .unwrap());
        assert!(engine
            .interval_is_free(space, v4_interval("10.0.0.0", "10.0.0.4"))
            .unwrap());
    }

    #[test]
    fn test_query_version_mismatch() {
        let (engine, space) = engine_with_space(IpVersion::V6);
        assert_eq!(
            engine.addr_is_free(space, v4("10.0.0.1")),
            Err(QueryError::VersionMismatch {
                space: IpVersion::V6,
                query: IpVersion::V4,
            })
        );
        assert_eq!(
            engine.interval_is_free(space, v4_interval("10.0.0.0", "10.0.0.4")),
            Err(QueryError::VersionMismatch {
                space: IpVersion::V6,
                query: IpVersion::V4,
            })
        );
    }

    #[test]
    fn test_find_overlapping_sorted_by_start() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        for (name, start, end) in [
            ("high", "10.0.0.8", "10.0.0.12"),
            ("low", "10.0.0.0", "10.0.0.4"),
        ] {
            engine
                .reserve(space, name, None, v4_interval(start, end))
                .expect("reservation");
        }

        let overlapping = engine
            .find_overlapping(space, v4_interval("10.0.0.0", "10.0.0.16"))
            .unwrap();
        let names: Vec<&str> = overlapping.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["low", "high"]);
    }

    #[test]
    fn test_range_containing() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        let range = engine
            .reserve(space, "a", None, v4_interval("10.0.0.4", "10.0.0.8"))
            .expect("reservation");

        assert_eq!(
            engine.range_containing(space, v4("10.0.0.4")).unwrap(),
            Some(range)
        );
        assert_eq!(engine.range_containing(space, v4("10.0.0.8")).unwrap(), None);
    }

    #[test]
    fn test_list_pagination() {
        let (engine, space) = engine_with_space(IpVersion::V4);
        for (name, start, end) in [
            ("a", "10.0.0.0", "10.0.0.4"),
            ("b", "10.0.0.4", "10.0.0.8"),
            ("c", "10.0.0.8", "10.0.0.12"),
        ] {
            engine
                .reserve(space, name, None, v4_interval(start, end))
                .expect("reservation");
        }

        let all = engine.list(space, Page::all()).unwrap();
        assert_eq!(all.len(), 3);
        let page = engine.list(space, Page::new(2, 2)).unwrap();
        let names: Vec<&str> = page.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c"]);

        assert_eq!(engine.list(99, Page::all()), Err(QueryError::SpaceNotFound(99)));
    }
}
