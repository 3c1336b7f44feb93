use serde::{Deserialize, Serialize};

use crate::dao::models::RoomEntity;

/// Key prefix namespacing room documents inside the shared database.
pub const ROOM_PREFIX: &str = "room::";

/// CouchDB representation of a room: the entity body flattened next to the
/// document envelope fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRoomDocument {
    /// Document id, `room::{code}`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision; absent on first write.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// The persisted room document.
    #[serde(flatten)]
    pub room: RoomEntity,
}

impl CouchRoomDocument {
    /// Wrap an entity for writing at the given revision.
    pub fn from_entity(room: RoomEntity, rev: Option<String>) -> Self {
        Self {
            id: room_doc_id(&room.code),
            rev,
            room,
        }
    }
}

/// Document id for a room code.
pub fn room_doc_id(code: &str) -> String {
    format!("{ROOM_PREFIX}{code}")
}
