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
//! Transactional store abstraction for spaces and ranges.

use ipdb_model::{
    addr::{IpAddrValue, IpVersion},
    interval::Interval,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;
pub use memory::MemoryStore;

/// Server-assigned identifier of a space.
pub type SpaceId = u64;

/// Server-assigned identifier of a range.
pub type RangeId = u64;

/// A page of results: skip `offset` records, return at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of records to skip.
    pub offset: usize,
    /// Maximum number of records to return.
    pub limit: usize,
}

impl Page {
    /// Creates a page request.
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// A page covering everything.
    pub const fn all() -> Self {
        Self::new(0, usize::MAX)
    }
}

/// A named, versioned address universe that ranges are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Store-assigned identifier, immutable after creation.
    pub id: SpaceId,
    /// Globally unique name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Version of every address value and interval in this space.
    pub version: IpVersion,
    /// Documentation-only default bounds, not enforced against ranges.
    pub bounds: Option<Interval>,
}

/// A reserved half-open interval within a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Store-assigned identifier.
    pub id: RangeId,
    /// The space this range belongs to.
    pub space_id: SpaceId,
    /// Name, unique within the space.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// The reserved interval, of the space's version.
    pub interval: Interval,
}

/// Attributes for creating a space; the id is store-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpace {
    /// Globally unique name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Version of every address value and interval in this space.
    pub version: IpVersion,
    /// Documentation-only default bounds.
    pub bounds: Option<Interval>,
}

/// Attributes for creating a range; the id is store-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRange {
    /// The space to reserve in.
    pub space_id: SpaceId,
    /// Name, unique within the space.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// The interval to reserve.
    pub interval: Interval,
}

/// Partial update of a space; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New version; refused while the space has ranges.
    pub version: Option<IpVersion>,
    /// New documentation bounds.
    pub bounds: Option<Interval>,
}

/// Store-level failures: the backend could not complete the request.
///
/// Distinct from the domain outcomes below, so that callers can tell
/// "your request was invalid or conflicting" from "the store failed".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend cannot serve requests (poisoned lock, lost connection).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of inserting a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertSpaceOutcome {
    /// The space was created.
    Created(Space),
    /// Another space already uses the name.
    NameTaken,
}

/// Outcome of updating a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSpaceOutcome {
    /// The space was updated.
    Updated(Space),
    /// No space with the given id exists.
    NotFound,
    /// Another space already uses the requested name.
    NameTaken,
    /// A version change was requested while the space has ranges.
    VersionChangeBlocked,
    /// The update would leave the space bounds at a different version
    /// than the space itself.
    BoundsVersionMismatch {
        /// Version the space would have after the update.
        space: IpVersion,
        /// Version of the bounds that would remain in effect.
        bounds: IpVersion,
    },
}

/// Outcome of deleting a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteSpaceOutcome {
    /// The space was deleted; carries the prior record.
    Deleted(Space),
    /// No space with the given id exists.
    NotFound,
    /// Ranges still reference the space; nothing was deleted.
    HasRanges,
}

/// Outcome of the atomic check-and-insert of a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// No overlap was found and the range was inserted.
    Reserved(Range),
    /// Overlapping ranges exist, sorted by interval start; nothing was inserted.
    Conflict(Vec<Range>),
    /// The target space does not exist.
    SpaceNotFound,
    /// Another range in the space already uses the name.
    NameTaken,
    /// The interval version does not match the space version.
    VersionMismatch {
        /// Version of the space.
        space: IpVersion,
        /// Version of the requested interval.
        interval: IpVersion,
    },
}

/// Durable tables for spaces and ranges, keyed by generated ids.
///
/// The contract the reservation engine relies on:
///
/// - [Store::reserve_range] evaluates the overlap search, the space and
///   version checks, the name-uniqueness check, and the insert as one
///   isolated unit. No concurrent `reserve_range` call on the same
///   space may observe a state between the check and the insert.
/// - [Store::update_space] evaluates all its consistency checks, the
///   version-change block and the bounds-version match included, in the
///   same isolated unit that applies the update.
/// - [Store::delete_space] refuses deletion while ranges reference the
///   space (referential integrity).
/// - Range listings are sorted by interval start ascending.
///
/// Reads carry no isolation guarantee beyond normal consistency; they
/// may observe state concurrently modified by in-flight reservations.
pub trait Store: Send + Sync {
    /// Inserts a new space with a generated id.
    fn insert_space(&self, space: NewSpace) -> Result<InsertSpaceOutcome, StoreError>;

    /// Applies a partial update to a space.
    fn update_space(&self, id: SpaceId, update: SpaceUpdate)
    -> Result<UpdateSpaceOutcome, StoreError>;

    /// Looks up a space by id.
    fn space(&self, id: SpaceId) -> Result<Option<Space>, StoreError>;

    /// Lists spaces ordered by id.
    fn list_spaces(&self, page: Page) -> Result<Vec<Space>, StoreError>;

    /// Deletes a space, refusing while ranges reference it.
    fn delete_space(&self, id: SpaceId) -> Result<DeleteSpaceOutcome, StoreError>;

    /// Atomically checks for overlaps and inserts the range.
    fn reserve_range(&self, range: NewRange) -> Result<ReserveOutcome, StoreError>;

    /// Deletes a range by id, returning the prior snapshot.
    fn delete_range(&self, id: RangeId) -> Result<Option<Range>, StoreError>;

    /// All ranges of the space overlapping the interval, sorted by interval start.
    fn ranges_overlapping(
        &self,
        space_id: SpaceId,
        interval: Interval,
    ) -> Result<Vec<Range>, StoreError>;

    /// The range of the space containing the address, if any.
    fn range_containing(
        &self,
        space_id: SpaceId,
        addr: IpAddrValue,
    ) -> Result<Option<Range>, StoreError>;

    /// Ranges of the space sorted by interval start, paginated.
    fn list_ranges(&self, space_id: SpaceId, page: Page) -> Result<Vec<Range>, StoreError>;
}
