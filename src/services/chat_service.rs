//! Append-only chat log scoped to a room.

use crate::{
    dto::{
        format_system_time,
        room::{ChatMessageRequest, ChatMessageSummary, ChatResponse},
    },
    error::ServiceError,
    services::room_service::mutate_room,
    state::SharedState,
};

/// Append a chat message with a server-side timestamp.
pub async fn send_message(
    state: &SharedState,
    code: &str,
    request: ChatMessageRequest,
) -> Result<ChatResponse, ServiceError> {
    let max_len = state.config().max_chat_message_len;
    if request.message.chars().count() > max_len {
        return Err(ServiceError::InvalidInput(format!(
            "chat message exceeds {max_len} characters"
        )));
    }

    let (sent_at, room) = mutate_room(state, code, |room, now| {
        room.push_chat(&request.user_id, request.message.clone(), now)?;
        Ok(now)
    })
    .await?;

    let username = room
        .chat_messages
        .last()
        .map(|m| m.username.clone())
        .unwrap_or_default();

    Ok(ChatResponse {
        success: true,
        sent: ChatMessageSummary {
            user_id: request.user_id,
            username,
            message: request.message,
            sent_at: format_system_time(sent_at),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::room::CreateRoomRequest,
        services::room_service,
        state::AppState,
    };

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                user_id: "host".into(),
                username: "Hana".into(),
            },
        )
        .await
        .unwrap();

        let err = send_message(
            &state,
            &created.room.code,
            ChatMessageRequest {
                user_id: "host".into(),
                message: "x".repeat(501),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let sent = send_message(
            &state,
            &created.room.code,
            ChatMessageRequest {
                user_id: "host".into(),
                message: "hello".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(sent.sent.message, "hello");
        assert_eq!(sent.sent.username, "Hana");
    }
}
