use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        common::{ActionResponse, CallerQuery, CallerRequest},
        room::{
            ChatMessageRequest, ChatResponse, CreateRoomRequest, CreateRoomResponse,
            DocumentResponse, JoinRoomRequest, JoinRoomResponse, LeaveRoomResponse, RoomSnapshot,
            SetDocumentRequest, SetReviewerRequest, ShareFileRequest, SharedFilesResponse,
            StartSessionRequest, TimerControlRequest, TimerControlResponse, ToggleReadyResponse,
        },
    },
    error::AppError,
    services::{chat_service, document_service, room_service, timer_service},
    state::SharedState,
};

/// Room lifecycle, registry, timer, document, and chat endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room).delete(delete_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/leave", post(leave_room))
        .route("/rooms/{code}/ready", post(toggle_ready))
        .route("/rooms/{code}/session/start", post(start_session))
        .route("/rooms/{code}/timer", post(control_timer))
        .route("/rooms/{code}/files", post(share_file))
        .route("/rooms/{code}/files/{file_id}", delete(remove_shared_file))
        .route(
            "/rooms/{code}/document",
            post(set_document).delete(clear_document),
        )
        .route("/rooms/{code}/document/reviewer", post(set_reviewer))
        .route("/rooms/{code}/chat", post(send_chat_message))
}

/// Create a room and seed the caller as its host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    responses((status = 200, description = "Room created", body = CreateRoomResponse))
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    Ok(Json(room_service::create_room(&state, payload).await?))
}

/// Fetch the full room snapshot; the sole source of truth for clients.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    responses(
        (status = 200, description = "Current room snapshot", body = RoomSnapshot),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    Ok(Json(room_service::room_snapshot(&state, &code).await?))
}

/// Destroy a room; host-only.
#[utoipa::path(
    delete,
    path = "/rooms/{code}",
    tag = "room",
    params(
        ("code" = String, Path, description = "Room share code"),
        ("user_id" = String, Query, description = "Caller identity; must be the host")
    ),
    responses((status = 200, description = "Room deleted", body = ActionResponse))
)]
pub async fn delete_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> Result<Json<ActionResponse>, AppError> {
    room_service::delete_room(&state, &code, &caller.user_id).await?;
    Ok(Json(ActionResponse::ok("room deleted")))
}

/// Join a room; re-joining is a no-op success.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = JoinRoomRequest,
    responses((status = 200, description = "Joined", body = JoinRoomResponse))
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRoomRequest>>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    Ok(Json(room_service::join_room(&state, &code, payload).await?))
}

/// Leave a room; host departure closes it.
#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = CallerRequest,
    responses((status = 200, description = "Left", body = LeaveRoomResponse))
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<CallerRequest>>,
) -> Result<Json<LeaveRoomResponse>, AppError> {
    Ok(Json(
        room_service::leave_room(&state, &code, &payload.user_id).await?,
    ))
}

/// Toggle the caller's ready flag; rejected for the host.
#[utoipa::path(
    post,
    path = "/rooms/{code}/ready",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = CallerRequest,
    responses((status = 200, description = "Ready flag toggled", body = ToggleReadyResponse))
)]
pub async fn toggle_ready(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<CallerRequest>>,
) -> Result<Json<ToggleReadyResponse>, AppError> {
    Ok(Json(
        room_service::toggle_ready(&state, &code, &payload.user_id).await?,
    ))
}

/// Start the shared study session; host-only, ready-gated.
#[utoipa::path(
    post,
    path = "/rooms/{code}/session/start",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = StartSessionRequest,
    responses((status = 200, description = "Session started", body = TimerControlResponse))
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<StartSessionRequest>>,
) -> Result<Json<TimerControlResponse>, AppError> {
    Ok(Json(
        timer_service::start_session(&state, &code, payload).await?,
    ))
}

/// Drive the shared timer; host-only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/timer",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = TimerControlRequest,
    responses((status = 200, description = "Timer updated", body = TimerControlResponse))
)]
pub async fn control_timer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<TimerControlRequest>>,
) -> Result<Json<TimerControlResponse>, AppError> {
    Ok(Json(
        timer_service::control_timer(&state, &code, payload).await?,
    ))
}

/// Share a file into the room.
#[utoipa::path(
    post,
    path = "/rooms/{code}/files",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = ShareFileRequest,
    responses((status = 200, description = "File shared", body = SharedFilesResponse))
)]
pub async fn share_file(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<ShareFileRequest>>,
) -> Result<Json<SharedFilesResponse>, AppError> {
    Ok(Json(
        document_service::share_file(&state, &code, payload).await?,
    ))
}

/// Remove a shared file; host or original sharer only.
#[utoipa::path(
    delete,
    path = "/rooms/{code}/files/{file_id}",
    tag = "room",
    params(
        ("code" = String, Path, description = "Room share code"),
        ("file_id" = String, Path, description = "File to remove"),
        ("user_id" = String, Query, description = "Caller identity")
    ),
    responses((status = 200, description = "File removed", body = SharedFilesResponse))
)]
pub async fn remove_shared_file(
    State(state): State<SharedState>,
    Path((code, file_id)): Path<(String, String)>,
    Query(caller): Query<CallerQuery>,
) -> Result<Json<SharedFilesResponse>, AppError> {
    Ok(Json(
        document_service::remove_shared_file(&state, &code, &caller.user_id, &file_id).await?,
    ))
}

/// Broadcast one of the shared files; host-only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/document",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = SetDocumentRequest,
    responses((status = 200, description = "Document broadcast", body = DocumentResponse))
)]
pub async fn set_document(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SetDocumentRequest>>,
) -> Result<Json<DocumentResponse>, AppError> {
    Ok(Json(
        document_service::set_document(&state, &code, payload).await?,
    ))
}

/// Attach generated reviewer content to the broadcast; host-only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/document/reviewer",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = SetReviewerRequest,
    responses((status = 200, description = "Reviewer content stored", body = DocumentResponse))
)]
pub async fn set_reviewer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SetReviewerRequest>>,
) -> Result<Json<DocumentResponse>, AppError> {
    Ok(Json(
        document_service::set_reviewer_content(&state, &code, payload).await?,
    ))
}

/// Stop broadcasting; host-only.
#[utoipa::path(
    delete,
    path = "/rooms/{code}/document",
    tag = "room",
    params(
        ("code" = String, Path, description = "Room share code"),
        ("user_id" = String, Query, description = "Caller identity; must be the host")
    ),
    responses((status = 200, description = "Broadcast cleared", body = DocumentResponse))
)]
pub async fn clear_document(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> Result<Json<DocumentResponse>, AppError> {
    Ok(Json(
        document_service::clear_document(&state, &code, &caller.user_id).await?,
    ))
}

/// Append a chat message.
#[utoipa::path(
    post,
    path = "/rooms/{code}/chat",
    tag = "room",
    params(("code" = String, Path, description = "Room share code")),
    request_body = ChatMessageRequest,
    responses((status = 200, description = "Message stored", body = ChatResponse))
)]
pub async fn send_chat_message(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<ChatMessageRequest>>,
) -> Result<Json<ChatResponse>, AppError> {
    Ok(Json(
        chat_service::send_message(&state, &code, payload).await?,
    ))
}
