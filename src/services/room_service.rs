//! Room lifecycle and participant registry, plus the read-modify-write
//! plumbing every other mutation service goes through.

use std::time::SystemTime;

use rand::Rng;
use tracing::{debug, info};

use crate::{
    dao::{models::RoomEntity, storage::StorageError},
    dto::room::{
        CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse,
        LeaveRoomResponse, RoomSnapshot, ToggleReadyResponse,
    },
    error::ServiceError,
    state::{
        SharedState,
        room::{LeaveOutcome, Room, RoomError},
    },
};

/// Alphabet used for generated room codes.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// How many collision retries a room creation gets before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Canonical form of a caller-supplied room code, or `RoomNotFound` when the
/// input cannot be a code at all.
pub fn canonical_code(code: &str) -> Result<String, RoomError> {
    let code = code.trim().to_ascii_uppercase();
    if crate::dto::validation::validate_room_code(&code).is_err() {
        return Err(RoomError::RoomNotFound);
    }
    Ok(code)
}

fn generate_room_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}

/// Run a room mutation as one serialized read-modify-write cycle.
///
/// The per-room lock serializes local writers; a concurrent writer elsewhere
/// surfaces as [`ServiceError::VersionConflict`] from the save, in which case
/// nothing was applied and the caller should re-read. Mutations against a
/// deactivated room fail with `RoomNotFound`. An expired-but-running timer is
/// normalized before the operation runs so every mutation observes expiry.
pub(crate) async fn mutate_room<F, T>(
    state: &SharedState,
    code: &str,
    op: F,
) -> Result<(T, Room), ServiceError>
where
    F: FnOnce(&mut Room, SystemTime) -> Result<T, RoomError>,
{
    let store = state.require_room_store().await?;
    let code = canonical_code(code)?;
    let lock = state.room_lock(&code);
    let _guard = lock.lock().await;

    let Some(versioned) = store.load_room(&code).await? else {
        return Err(RoomError::RoomNotFound.into());
    };
    let mut room: Room = versioned.room.into();
    if !room.is_active {
        return Err(RoomError::RoomNotFound.into());
    }

    let now = SystemTime::now();
    room.study_timer.normalize(now);
    let value = op(&mut room, now)?;
    room.updated_at = now;

    store
        .save_room(RoomEntity::from(room.clone()), Some(versioned.version))
        .await?;
    Ok((value, room))
}

/// Load a room without mutating it. Deactivated rooms are still readable so
/// polling clients observe the closure.
pub(crate) async fn load_room(state: &SharedState, code: &str) -> Result<Room, ServiceError> {
    let store = state.require_room_store().await?;
    let code = canonical_code(code)?;
    let Some(versioned) = store.load_room(&code).await? else {
        return Err(RoomError::RoomNotFound.into());
    };
    Ok(versioned.room.into())
}

fn snapshot_of(state: &SharedState, room: &Room) -> RoomSnapshot {
    RoomSnapshot::from_room_at(room, SystemTime::now(), state.config().poll_interval_secs)
}

/// Create a room with a fresh collision-checked code and the caller as host.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let code_length = state.config().room_code_length;

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_room_code(code_length);
        let room = Room::new(
            code.clone(),
            request.user_id.clone(),
            request.username.clone(),
            SystemTime::now(),
        );

        match store.save_room(RoomEntity::from(room.clone()), None).await {
            Ok(_) => {
                info!(room = %code, host = %request.user_id, "room created");
                return Ok(CreateRoomResponse {
                    success: true,
                    room: snapshot_of(state, &room),
                });
            }
            Err(StorageError::Conflict { .. }) => {
                debug!(room = %code, "room code collision, retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Internal(
        "could not allocate a unique room code".into(),
    ))
}

/// Register the caller in the room; re-joining is a no-op success.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let capacity = state.config().room_capacity;
    let (newly_joined, room) = mutate_room(state, code, |room, now| {
        room.join(&request.user_id, &request.username, capacity, now)
    })
    .await?;

    if newly_joined {
        info!(room = %room.code, user = %request.user_id, "participant joined");
    }

    Ok(JoinRoomResponse {
        success: true,
        newly_joined,
        room: snapshot_of(state, &room),
    })
}

/// Remove the caller from the room; host departure closes the room.
pub async fn leave_room(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<LeaveRoomResponse, ServiceError> {
    let (outcome, room) =
        mutate_room(state, code, |room, _now| room.leave(user_id)).await?;

    let room_deactivated = outcome == LeaveOutcome::RoomDeactivated;
    if room_deactivated {
        info!(room = %room.code, "host left, room deactivated");
    }

    Ok(LeaveRoomResponse {
        success: true,
        room_deactivated,
    })
}

/// Flip the caller's ready flag.
pub async fn toggle_ready(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<ToggleReadyResponse, ServiceError> {
    let (ready, _room) =
        mutate_room(state, code, |room, _now| room.toggle_ready(user_id)).await?;
    Ok(ToggleReadyResponse {
        success: true,
        ready,
    })
}

/// Destroy a room; host-only.
pub async fn delete_room(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let code = canonical_code(code)?;
    let lock = state.room_lock(&code);
    let _guard = lock.lock().await;

    let Some(versioned) = store.load_room(&code).await? else {
        return Err(RoomError::RoomNotFound.into());
    };
    let room: Room = versioned.room.into();
    room.require_host(user_id)?;

    store.delete_room(&code).await?;
    drop(_guard);
    state.forget_room_lock(&code);
    info!(room = %code, "room deleted");
    Ok(())
}

/// Full room snapshot with the timer recomputed at read time.
pub async fn room_snapshot(
    state: &SharedState,
    code: &str,
) -> Result<RoomSnapshot, ServiceError> {
    let room = load_room(state, code).await?;
    Ok(snapshot_of(state, &room))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        state
    }

    fn create_request(user_id: &str, username: &str) -> CreateRoomRequest {
        CreateRoomRequest {
            user_id: user_id.into(),
            username: username.into(),
        }
    }

    #[tokio::test]
    async fn create_join_and_snapshot() {
        let state = test_state().await;
        let created = create_room(&state, create_request("host", "Hana"))
            .await
            .unwrap();
        let code = created.room.code.clone();
        assert_eq!(code.len(), 6);
        assert!(created.room.participants[0].is_host);

        let joined = join_room(
            &state,
            &code,
            JoinRoomRequest {
                user_id: "p1".into(),
                username: "Priya".into(),
            },
        )
        .await
        .unwrap();
        assert!(joined.newly_joined);

        // Case-insensitive code lookup, idempotent re-join.
        let rejoined = join_room(
            &state,
            &code.to_lowercase(),
            JoinRoomRequest {
                user_id: "p1".into(),
                username: "Priya".into(),
            },
        )
        .await
        .unwrap();
        assert!(!rejoined.newly_joined);
        assert_eq!(rejoined.room.participants.len(), 2);

        let snapshot = room_snapshot(&state, &code).await.unwrap();
        assert_eq!(snapshot.participants.len(), 2);
        assert!(snapshot.is_active);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let state = test_state().await;
        let err = room_snapshot(&state, "ZZZZZZ").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Room(RoomError::RoomNotFound)
        ));

        // Malformed codes never reach the store.
        let err = room_snapshot(&state, "not-a-code").await.unwrap_err();
        assert!(matches!(err, ServiceError::Room(RoomError::RoomNotFound)));
    }

    #[tokio::test]
    async fn host_departure_closes_room_but_keeps_snapshot_readable() {
        let state = test_state().await;
        let created = create_room(&state, create_request("host", "Hana"))
            .await
            .unwrap();
        let code = created.room.code.clone();
        join_room(
            &state,
            &code,
            JoinRoomRequest {
                user_id: "p1".into(),
                username: "Priya".into(),
            },
        )
        .await
        .unwrap();

        let left = leave_room(&state, &code, "host").await.unwrap();
        assert!(left.room_deactivated);

        // Reads still work so pollers observe the closure.
        let snapshot = room_snapshot(&state, &code).await.unwrap();
        assert!(!snapshot.is_active);

        // Mutations are rejected as if the room were gone.
        let err = toggle_ready(&state, &code, "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Room(RoomError::RoomNotFound)));
    }

    #[tokio::test]
    async fn delete_room_is_host_only() {
        let state = test_state().await;
        let created = create_room(&state, create_request("host", "Hana"))
            .await
            .unwrap();
        let code = created.room.code.clone();
        join_room(
            &state,
            &code,
            JoinRoomRequest {
                user_id: "p1".into(),
                username: "Priya".into(),
            },
        )
        .await
        .unwrap();

        let err = delete_room(&state, &code, "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Room(RoomError::NotAuthorized)));

        delete_room(&state, &code, "host").await.unwrap();
        assert!(matches!(
            room_snapshot(&state, &code).await.unwrap_err(),
            ServiceError::Room(RoomError::RoomNotFound)
        ));
    }

    #[tokio::test]
    async fn degraded_mode_rejects_operations() {
        let state = AppState::new(AppConfig::default());
        let err = create_room(&state, create_request("host", "Hana"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
