//! Shared-file registry and host-driven document broadcast.

use tracing::info;

use crate::{
    dto::room::{
        DocumentResponse, DocumentSnapshot, ReviewerContentDto, SetDocumentRequest,
        SetReviewerRequest, ShareFileRequest, SharedFileSummary, SharedFilesResponse,
    },
    error::ServiceError,
    services::room_service::mutate_room,
    state::{
        SharedState,
        room::{Room, SharedBy, SharedFile},
    },
};

fn files_response(room: &Room) -> SharedFilesResponse {
    SharedFilesResponse {
        success: true,
        shared_files: room
            .shared_files
            .values()
            .map(|file| SharedFileSummary {
                file_id: file.file_id.clone(),
                file_name: file.file_name.clone(),
                file_type: file.file_type.clone(),
                subject: file.subject.clone(),
                file_content: file.file_content.clone(),
                shared_by_user_id: file.shared_by.user_id.clone(),
                shared_by_username: file.shared_by.username.clone(),
            })
            .collect(),
    }
}

fn document_response(room: &Room) -> DocumentResponse {
    DocumentResponse {
        success: true,
        current_document: room.current_document.as_ref().map(|doc| DocumentSnapshot {
            file_id: doc.file_id.clone(),
            view_mode: doc.view_mode.into(),
            reviewer_content: doc.reviewer_content.as_ref().map(|content| {
                ReviewerContentDto {
                    text: content.text.clone(),
                    key_points: content.key_points.clone(),
                }
            }),
        }),
    }
}

/// Share a file into the room; re-sharing an id replaces the entry.
pub async fn share_file(
    state: &SharedState,
    code: &str,
    request: ShareFileRequest,
) -> Result<SharedFilesResponse, ServiceError> {
    let ((), room) = mutate_room(state, code, |room, _now| {
        let sharer = room.require_participant(&request.user_id)?;
        let file = SharedFile {
            file_id: request.file_id.clone(),
            file_name: request.file_name.clone(),
            file_type: request.file_type.clone(),
            subject: request.subject.clone(),
            file_content: request.file_content.clone(),
            shared_by: SharedBy {
                user_id: sharer.user_id.clone(),
                username: sharer.username.clone(),
            },
        };
        room.share_file(&request.user_id, file)
    })
    .await?;

    info!(room = %room.code, file = %request.file_id, "file shared");
    Ok(files_response(&room))
}

/// Remove a shared file; host or original sharer only.
pub async fn remove_shared_file(
    state: &SharedState,
    code: &str,
    user_id: &str,
    file_id: &str,
) -> Result<SharedFilesResponse, ServiceError> {
    let ((), room) = mutate_room(state, code, |room, _now| {
        room.remove_shared_file(user_id, file_id)
    })
    .await?;
    Ok(files_response(&room))
}

/// Broadcast one of the shared files to all participants; host-only.
pub async fn set_document(
    state: &SharedState,
    code: &str,
    request: SetDocumentRequest,
) -> Result<DocumentResponse, ServiceError> {
    let ((), room) = mutate_room(state, code, |room, _now| {
        room.set_document(&request.user_id, &request.file_id, request.view_mode.into())
    })
    .await?;

    info!(room = %room.code, file = %request.file_id, "document broadcast set");
    Ok(document_response(&room))
}

/// Attach generated reviewer content to the broadcast; last write wins.
pub async fn set_reviewer_content(
    state: &SharedState,
    code: &str,
    request: SetReviewerRequest,
) -> Result<DocumentResponse, ServiceError> {
    let ((), room) = mutate_room(state, code, |room, _now| {
        room.set_reviewer_content(&request.user_id, request.text.clone(), request.key_points.clone())
    })
    .await?;
    Ok(document_response(&room))
}

/// Stop broadcasting; host-only.
pub async fn clear_document(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<DocumentResponse, ServiceError> {
    let ((), room) = mutate_room(state, code, |room, _now| room.clear_document(user_id)).await?;
    Ok(document_response(&room))
}
