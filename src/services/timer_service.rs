//! Host-driven control of the shared study countdown.

use std::time::SystemTime;

use tracing::info;

use crate::{
    dto::room::{StartSessionRequest, TimerControlRequest, TimerControlResponse, TimerSnapshot},
    error::ServiceError,
    services::room_service::mutate_room,
    state::{SharedState, room::Room},
};

fn timer_response(room: &Room) -> TimerControlResponse {
    let observed = room.study_timer.observe(SystemTime::now());
    TimerControlResponse {
        success: true,
        study_timer: TimerSnapshot {
            is_running: observed.is_running,
            duration_secs: observed.duration_secs,
            time_remaining_secs: observed.time_remaining_secs,
            started_at: observed.started_at.map(crate::dto::format_system_time),
        },
    }
}

/// Start the shared study session with ready gating.
pub async fn start_session(
    state: &SharedState,
    code: &str,
    request: StartSessionRequest,
) -> Result<TimerControlResponse, ServiceError> {
    let min_participants = state.config().min_session_participants;
    let ((), room) = mutate_room(state, code, |room, now| {
        room.start_session(&request.user_id, request.duration_secs, min_participants, now)
    })
    .await?;

    info!(
        room = %room.code,
        duration_secs = request.duration_secs,
        "study session started"
    );
    Ok(timer_response(&room))
}

/// Apply a start/pause/resume/reset command to the shared timer.
pub async fn control_timer(
    state: &SharedState,
    code: &str,
    request: TimerControlRequest,
) -> Result<TimerControlResponse, ServiceError> {
    let min_participants = state.config().min_session_participants;
    let action = request.action.into();
    let ((), room) = mutate_room(state, code, |room, now| {
        room.control_timer(
            &request.user_id,
            action,
            request.duration_secs,
            min_participants,
            now,
        )
    })
    .await?;

    info!(room = %room.code, action = ?action, "timer control applied");
    Ok(timer_response(&room))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::room::{CreateRoomRequest, JoinRoomRequest, TimerActionDto},
        services::room_service,
        state::{AppState, room::RoomError},
    };

    async fn room_ready_to_start(state: &SharedState) -> String {
        let created = room_service::create_room(
            state,
            CreateRoomRequest {
                user_id: "host".into(),
                username: "Hana".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code;
        room_service::join_room(
            state,
            &code,
            JoinRoomRequest {
                user_id: "p1".into(),
                username: "Priya".into(),
            },
        )
        .await
        .unwrap();
        room_service::toggle_ready(state, &code, "p1").await.unwrap();
        code
    }

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn session_start_then_pause() {
        let state = test_state().await;
        let code = room_ready_to_start(&state).await;

        let started = start_session(
            &state,
            &code,
            StartSessionRequest {
                user_id: "host".into(),
                duration_secs: 1500,
            },
        )
        .await
        .unwrap();
        assert!(started.study_timer.is_running);
        assert_eq!(started.study_timer.duration_secs, 1500);

        let paused = control_timer(
            &state,
            &code,
            TimerControlRequest {
                user_id: "host".into(),
                action: TimerActionDto::Pause,
                duration_secs: None,
            },
        )
        .await
        .unwrap();
        assert!(!paused.study_timer.is_running);
        assert!(paused.study_timer.started_at.is_none());
    }

    #[tokio::test]
    async fn session_start_gating_at_service_level() {
        let state = test_state().await;
        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                user_id: "host".into(),
                username: "Hana".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code;

        let err = start_session(
            &state,
            &code,
            StartSessionRequest {
                user_id: "host".into(),
                duration_secs: 1500,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Room(RoomError::InsufficientParticipants { required: 2 })
        ));
    }

    #[tokio::test]
    async fn timer_control_is_host_only() {
        let state = test_state().await;
        let code = room_ready_to_start(&state).await;

        let err = control_timer(
            &state,
            &code,
            TimerControlRequest {
                user_id: "p1".into(),
                action: TimerActionDto::Reset,
                duration_secs: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Room(RoomError::NotAuthorized)
        ));
    }
}
