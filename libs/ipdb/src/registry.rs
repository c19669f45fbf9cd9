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
//! CRUD over address-space definitions.

use ipdb_model::addr::IpVersion;
use thiserror::Error;

use crate::store::{
    DeleteSpaceOutcome, InsertSpaceOutcome, NewSpace, Page, Space, SpaceId, SpaceUpdate, Store,
    StoreError, UpdateSpaceOutcome,
};

/// Space creation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateSpaceError {
    /// Another space already uses the name.
    #[error("space name `{0}` already taken")]
    NameTaken(String),
    /// The bounding interval version does not match the space version.
    #[error("bounds version {bounds} does not match space version {space}")]
    BoundsVersionMismatch {
        /// Version of the space.
        space: IpVersion,
        /// Version of the requested bounds.
        bounds: IpVersion,
    },
    /// The store could not complete the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Space update errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateSpaceError {
    /// No space with the given id exists.
    #[error("space {0} not found")]
    NotFound(SpaceId),
    /// Another space already uses the requested name.
    #[error("space name `{0}` already taken")]
    NameTaken(String),
    /// A version change was requested while the space has ranges, which
    /// would invalidate them.
    #[error("cannot change the version of a space that has ranges")]
    VersionChangeBlocked,
    /// The bounding interval version does not match the space version.
    #[error("bounds version {bounds} does not match space version {space}")]
    BoundsVersionMismatch {
        /// Version the space would have after the update.
        space: IpVersion,
        /// Version of the bounds after the update.
        bounds: IpVersion,
    },
    /// The store could not complete the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Space deletion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteSpaceError {
    /// No space with the given id exists.
    #[error("space {0} not found")]
    NotFound(SpaceId),
    /// Ranges still reference the space; release them first.
    #[error("space {0} still has reserved ranges")]
    HasRanges(SpaceId),
    /// The store could not complete the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD over [Space] records, with an explicit store handle.
#[derive(Debug, Clone)]
pub struct SpaceRegistry<S> {
    store: S,
}

impl<S: Store> SpaceRegistry<S> {
    /// Creates a registry on top of the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a space with a store-assigned id.
    pub fn create(&self, space: NewSpace) -> Result<Space, CreateSpaceError> {
        if let Some(bounds) = &space.bounds {
            if bounds.version() != space.version {
                return Err(CreateSpaceError::BoundsVersionMismatch {
                    space: space.version,
                    bounds: bounds.version(),
                });
            }
        }
        let name = space.name.clone();
        match self.store.insert_space(space)? {
            InsertSpaceOutcome::Created(space) => {
                tracing::debug!(space = space.id, "created space `{}`", space.name);
                Ok(space)
            }
            InsertSpaceOutcome::NameTaken => Err(CreateSpaceError::NameTaken(name)),
        }
    }

    /// Applies a partial update; `None` fields stay unchanged.
    ///
    /// A version change is refused while the space has ranges, because
    /// it would invalidate their intervals. All consistency checks run
    /// inside [Store::update_space] so that they hold against concurrent
    /// updates of the same space.
    pub fn update(&self, id: SpaceId, update: SpaceUpdate) -> Result<Space, UpdateSpaceError> {
        let name = update.name.clone();
        match self.store.update_space(id, update)? {
            UpdateSpaceOutcome::Updated(space) => Ok(space),
            UpdateSpaceOutcome::NotFound => Err(UpdateSpaceError::NotFound(id)),
            UpdateSpaceOutcome::NameTaken => Err(UpdateSpaceError::NameTaken(
                name.unwrap_or_default(),
            )),
            UpdateSpaceOutcome::VersionChangeBlocked => Err(UpdateSpaceError::VersionChangeBlocked),
            UpdateSpaceOutcome::BoundsVersionMismatch { space, bounds } => {
                Err(UpdateSpaceError::BoundsVersionMismatch { space, bounds })
            }
        }
    }

    /// Looks up a space by id.
    pub fn find(&self, id: SpaceId) -> Result<Option<Space>, StoreError> {
        self.store.space(id)
    }

    /// Lists spaces ordered by id, paginated.
    pub fn list(&self, page: Page) -> Result<Vec<Space>, StoreError> {
        self.store.list_spaces(page)
    }

    /// Deletes a space, returning its prior snapshot.
    ///
    /// Deletion never cascades: while ranges reference the space the
    /// store refuses and [DeleteSpaceError::HasRanges] is returned.
    pub fn delete(&self, id: SpaceId) -> Result<Space, DeleteSpaceError> {
        match self.store.delete_space(id)? {
            DeleteSpaceOutcome::Deleted(space) => {
                tracing::debug!(space = space.id, "deleted space `{}`", space.name);
                Ok(space)
            }
            DeleteSpaceOutcome::NotFound => Err(DeleteSpaceError::NotFound(id)),
            DeleteSpaceOutcome::HasRanges => Err(DeleteSpaceError::HasRanges(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use ipdb_model::{addr::IpAddrValue, interval::Interval};
    use test_log::test;

    use crate::{engine::IpAllocationEngine, store::MemoryStore};

    use super::*;

    fn registry() -> SpaceRegistry<MemoryStore> {
        SpaceRegistry::new(MemoryStore::new())
    }

    fn new_space(name: &str, version: IpVersion) -> NewSpace {
        NewSpace {
            name: name.to_string(),
            description: None,
            version,
            bounds: None,
        }
    }

    fn v4_interval(start: &str, end: &str) -> Interval {
        Interval::new(
            IpAddrValue::parse(start, IpVersion::V4).expect("valid test address"),
            IpAddrValue::parse(end, IpVersion::V4).expect("valid test address"),
        )
        .expect("valid test interval")
    }

    #[test]
    fn test_create_find_delete() {
        let registry = registry();
        let space = registry
            .create(new_space("space", IpVersion::V4))
            .expect("creation");
        assert_eq!(space.name, "space");

        let found = registry.find(space.id).unwrap();
        assert_eq!(found.as_ref(), Some(&space));

        let deleted = registry.delete(space.id).expect("deletion");
        assert_eq!(deleted, space);
        assert_eq!(registry.delete(space.id), Err(DeleteSpaceError::NotFound(space.id)));
        assert!(registry.find(space.id).unwrap().is_none());
    }

    #[test]
    fn test_create_duplicate_name() {
        let registry = registry();
        registry
            .create(new_space("space", IpVersion::V4))
            .expect("creation");
        assert_eq!(
            registry.create(new_space("space", IpVersion::V6)),
            Err(CreateSpaceError::NameTaken("space".to_string()))
        );
    }

    #[test]
    fn test_create_with_bounds() {
        let registry = registry();
        let bounds = v4_interval("10.0.0.0", "10.255.255.255");
        let space = registry
            .create(NewSpace {
                name: "space".to_string(),
                description: Some("ten-net".to_string()),
                version: IpVersion::V4,
                bounds: Some(bounds),
            })
            .expect("creation");
        assert_eq!(space.bounds, Some(bounds));

        assert_eq!(
            registry.create(NewSpace {
                name: "v6-space".to_string(),
                description: None,
                version: IpVersion::V6,
                bounds: Some(bounds),
            }),
            Err(CreateSpaceError::BoundsVersionMismatch {
                space: IpVersion::V6,
                bounds: IpVersion::V4,
            })
        );
    }

    #[test]
    fn test_update() {
        let registry = registry();
        let space = registry
            .create(new_space("space", IpVersion::V4))
            .expect("creation");

        let updated = registry
            .update(
                space.id,
                SpaceUpdate {
                    name: Some("renamed".to_string()),
                    description: Some("text".to_string()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.description.as_deref(), Some("text"));
        assert_eq!(updated.version, IpVersion::V4);

        assert_eq!(
            registry.update(999, SpaceUpdate::default()),
            Err(UpdateSpaceError::NotFound(999))
        );
    }

    #[test]
    fn test_update_bounds_must_match_version() {
        let registry = registry();
        let space = registry
            .create(new_space("space", IpVersion::V6))
            .expect("creation");

        assert_eq!(
            registry.update(
                space.id,
                SpaceUpdate {
                    bounds: Some(v4_interval("10.0.0.0", "10.255.255.255")),
                    ..Default::default()
                }
            ),
            Err(UpdateSpaceError::BoundsVersionMismatch {
                space: IpVersion::V6,
                bounds: IpVersion::V4,
            })
        );

        // Version and matching bounds can change in one update.
        let updated = registry
            .update(
                space.id,
                SpaceUpdate {
                    version: Some(IpVersion::V4),
                    bounds: Some(v4_interval("10.0.0.0", "10.255.255.255")),
                    ..Default::default()
                },
            )
            .expect("combined update");
        assert_eq!(updated.version, IpVersion::V4);

        // With v4 bounds now stored, the version alone cannot move.
        assert_eq!(
            registry.update(
                space.id,
                SpaceUpdate {
                    version: Some(IpVersion::V6),
                    ..Default::default()
                }
            ),
            Err(UpdateSpaceError::BoundsVersionMismatch {
                space: IpVersion::V6,
                bounds: IpVersion::V4,
            })
        );
    }

    #[test]
    fn test_update_version_blocked_by_ranges() {
        let store = MemoryStore::new();
        let registry = SpaceRegistry::new(store.clone());
        let engine = IpAllocationEngine::new(store);

        let space = registry
            .create(new_space("space", IpVersion::V4))
            .expect("creation");
        // Without ranges, the version may change.
        registry
            .update(
                space.id,
                SpaceUpdate {
                    version: Some(IpVersion::V6),
                    ..Default::default()
                },
            )
            .expect("version change on an empty space");
        registry
            .update(
                space.id,
                SpaceUpdate {
                    version: Some(IpVersion::V4),
                    ..Default::default()
                },
            )
            .expect("version change back");

        engine
            .reserve(space.id, "a", None, v4_interval("10.0.0.0", "10.0.0.4"))
            .expect("reservation");
        assert_eq!(
            registry.update(
                space.id,
                SpaceUpdate {
                    version: Some(IpVersion::V6),
                    ..Default::default()
                }
            ),
            Err(UpdateSpaceError::VersionChangeBlocked)
        );
    }

    #[test]
    fn test_delete_blocked_by_ranges() {
        let store = MemoryStore::new();
        let registry = SpaceRegistry::new(store.clone());
        let engine = IpAllocationEngine::new(store);

        let space = registry
            .create(new_space("space", IpVersion::V4))
            .expect("creation");
        let range = engine
            .reserve(space.id, "a", None, v4_interval("10.0.0.0", "10.0.0.4"))
            .expect("reservation");

        assert_eq!(
            registry.delete(space.id),
            Err(DeleteSpaceError::HasRanges(space.id))
        );
        engine.release(range.id).expect("release");
        registry.delete(space.id).expect("deletion after release");
    }

    #[test]
    fn test_list_pagination() {
        let registry = registry();
        for name in ["a", "b", "c"] {
            registry
                .create(new_space(name, IpVersion::V4))
                .expect("creation");
        }

        let all = registry.list(Page::all()).unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let page = registry.list(Page::new(1, 1)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "b");
    }
}
