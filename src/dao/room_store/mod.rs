#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::RoomEntity;
use crate::dao::storage::StorageResult;

/// Opaque per-room version token used for optimistic concurrency.
///
/// Backends choose their own representation (an integer counter for the
/// in-memory store, a CouchDB `_rev` string); callers only ever hand it back
/// unchanged on save.
pub type RoomVersion = String;

/// A loaded room document together with the version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedRoom {
    /// The persisted room document.
    pub room: RoomEntity,
    /// Version token to present on the next save.
    pub version: RoomVersion,
}

/// Abstraction over the persistence layer for room documents.
///
/// The store guarantees an atomic compare-and-swap per room: `save_room` with
/// a stale `expected` version fails with [`StorageError::Conflict`], and
/// `expected = None` means "create only" and conflicts when the code is
/// already taken (which is how creation collision-checks room codes).
///
/// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
pub trait RoomStore: Send + Sync {
    /// Fetch a room document and its current version by code.
    fn load_room(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<VersionedRoom>>>;
    /// Compare-and-swap write; returns the new version on success.
    fn save_room(
        &self,
        room: RoomEntity,
        expected: Option<RoomVersion>,
    ) -> BoxFuture<'static, StorageResult<RoomVersion>>;
    /// Delete a room document; returns whether it existed.
    fn delete_room(&self, code: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
