//! In-process room store used as the default backend and as the test double.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    models::RoomEntity,
    room_store::{RoomStore, RoomVersion, VersionedRoom},
    storage::{StorageError, StorageResult},
};

/// Keyed in-memory document store with integer versions.
///
/// Versions start at 1 and bump on every successful save, so a stale token is
/// always detectable. Clone shares the underlying map.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    rooms: Arc<DashMap<String, (u64, RoomEntity)>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_version(code: &str, version: &str) -> StorageResult<u64> {
        version
            .parse::<u64>()
            .map_err(|_| StorageError::conflict(code))
    }
}

impl RoomStore for MemoryRoomStore {
    fn load_room(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<VersionedRoom>>> {
        let rooms = self.rooms.clone();
        let code = code.to_owned();
        Box::pin(async move {
            Ok(rooms.get(&code).map(|entry| {
                let (version, room) = entry.value();
                VersionedRoom {
                    room: room.clone(),
                    version: version.to_string(),
                }
            }))
        })
    }

    fn save_room(
        &self,
        room: RoomEntity,
        expected: Option<RoomVersion>,
    ) -> BoxFuture<'static, StorageResult<RoomVersion>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let code = room.code.clone();
            // The entry handle holds the shard lock, making the
            // check-and-write below atomic per room.
            match rooms.entry(code.clone()) {
                dashmap::Entry::Vacant(slot) => {
                    if expected.is_some() {
                        return Err(StorageError::conflict(code));
                    }
                    slot.insert((1, room));
                    Ok("1".to_string())
                }
                dashmap::Entry::Occupied(mut slot) => {
                    let Some(expected) = expected else {
                        // Create-only save against an existing code.
                        return Err(StorageError::conflict(code));
                    };
                    let expected = Self::parse_version(&code, &expected)?;
                    let current = slot.get().0;
                    if current != expected {
                        return Err(StorageError::conflict(code));
                    }
                    let next = current + 1;
                    slot.insert((next, room));
                    Ok(next.to_string())
                }
            }
        })
    }

    fn delete_room(&self, code: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let rooms = self.rooms.clone();
        let code = code.to_owned();
        Box::pin(async move { Ok(rooms.remove(&code).is_some()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::state::room::Room;

    fn entity(code: &str) -> RoomEntity {
        Room::new(code.into(), "host".into(), "Hana".into(), UNIX_EPOCH).into()
    }

    #[tokio::test]
    async fn create_then_load_round_trips() {
        let store = MemoryRoomStore::new();
        let version = store.save_room(entity("ABC123"), None).await.unwrap();
        assert_eq!(version, "1");

        let loaded = store.load_room("ABC123").await.unwrap().unwrap();
        assert_eq!(loaded.room.code, "ABC123");
        assert_eq!(loaded.version, "1");
        assert!(store.load_room("ZZZZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_conflicts_on_taken_code() {
        let store = MemoryRoomStore::new();
        store.save_room(entity("ABC123"), None).await.unwrap();

        let err = store.save_room(entity("ABC123"), None).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryRoomStore::new();
        store.save_room(entity("ABC123"), None).await.unwrap();

        // Two writers load the same version; only the first save wins.
        let v1 = store.load_room("ABC123").await.unwrap().unwrap().version;
        let next = store
            .save_room(entity("ABC123"), Some(v1.clone()))
            .await
            .unwrap();
        assert_eq!(next, "2");

        let err = store
            .save_room(entity("ABC123"), Some(v1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { code } if code == "ABC123"));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryRoomStore::new();
        store.save_room(entity("ABC123"), None).await.unwrap();
        assert!(store.delete_room("ABC123").await.unwrap());
        assert!(!store.delete_room("ABC123").await.unwrap());
    }
}
