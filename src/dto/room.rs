use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::format_system_time,
    state::{
        room::{
            ChatMessage, CurrentDocument, Participant, ReviewerContent, Room, SharedFile, ViewMode,
        },
        timer::{StudyTimer, TimerAction},
    },
};

/// Payload used to create a brand-new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Identity of the creating participant; becomes the room host.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Display name of the host.
    #[validate(custom(function = crate::dto::validation::validate_username))]
    pub username: String,
}

/// Payload for joining an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Identity of the joining participant.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Display name of the joining participant.
    #[validate(custom(function = crate::dto::validation::validate_username))]
    pub username: String,
}

/// Host request to start the shared study session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartSessionRequest {
    /// Identity of the caller; must be the host.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Countdown duration in seconds.
    #[validate(range(min = 1, max = 86_400))]
    pub duration_secs: u64,
}

/// Timer command accepted from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimerActionDto {
    /// Begin a fresh countdown (requires `duration_secs`).
    Start,
    /// Freeze the countdown.
    Pause,
    /// Continue a paused countdown.
    Resume,
    /// Restore the full duration and stop.
    Reset,
}

impl From<TimerActionDto> for TimerAction {
    fn from(value: TimerActionDto) -> Self {
        match value {
            TimerActionDto::Start => TimerAction::Start,
            TimerActionDto::Pause => TimerAction::Pause,
            TimerActionDto::Resume => TimerAction::Resume,
            TimerActionDto::Reset => TimerAction::Reset,
        }
    }
}

/// Host request to drive the shared timer.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TimerControlRequest {
    /// Identity of the caller; must be the host.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Command to apply.
    pub action: TimerActionDto,
    /// Fresh duration for `start`; ignored otherwise.
    #[serde(default)]
    #[validate(range(min = 1, max = 86_400))]
    pub duration_secs: Option<u64>,
}

/// Payload sharing a file into the room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ShareFileRequest {
    /// Identity of the sharing participant.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Identifier assigned by the file collaborator.
    #[validate(length(min = 1, max = 128))]
    pub file_id: String,
    /// Original file name.
    #[validate(length(min = 1, max = 256))]
    pub file_name: String,
    /// MIME-ish type tag.
    pub file_type: String,
    /// Subject the file belongs to.
    pub subject: String,
    /// Raw text content.
    pub file_content: String,
}

/// Rendering mode for the broadcast document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewModeDto {
    /// Plain shared text.
    Raw,
    /// AI-reviewed derivative.
    Reviewer,
}

impl From<ViewModeDto> for ViewMode {
    fn from(value: ViewModeDto) -> Self {
        match value {
            ViewModeDto::Raw => ViewMode::Raw,
            ViewModeDto::Reviewer => ViewMode::Reviewer,
        }
    }
}

impl From<ViewMode> for ViewModeDto {
    fn from(value: ViewMode) -> Self {
        match value {
            ViewMode::Raw => ViewModeDto::Raw,
            ViewMode::Reviewer => ViewModeDto::Reviewer,
        }
    }
}

/// Host request to broadcast one of the shared files.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetDocumentRequest {
    /// Identity of the caller; must be the host.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// File to broadcast; must already be shared.
    pub file_id: String,
    /// Requested rendering mode.
    pub view_mode: ViewModeDto,
}

/// Host request attaching generated reviewer content to the broadcast.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetReviewerRequest {
    /// Identity of the caller; must be the host.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Reviewed text body.
    pub text: String,
    /// Key points extracted from the text.
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Payload for posting a chat message.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChatMessageRequest {
    /// Identity of the sender.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Message body; the configured length cap is enforced server-side.
    #[validate(length(min = 1))]
    pub message: String,
}

/// Public projection of a participant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantSummary {
    /// Identity of the participant.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Ready flag; the host always reads as ready.
    pub ready: bool,
    /// Whether this entry is the room host.
    pub is_host: bool,
    /// RFC3339 join timestamp.
    pub joined_at: String,
}

/// Read-time projection of the shared countdown.
///
/// `time_remaining_secs` is the authoritative server-computed value at the
/// moment the snapshot was taken; clients must re-anchor on it every poll and
/// never accumulate local ticks beyond cosmetic smoothing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimerSnapshot {
    /// Whether the countdown is ticking.
    pub is_running: bool,
    /// Configured duration in seconds.
    pub duration_secs: u64,
    /// Server-computed remaining seconds at snapshot time.
    pub time_remaining_secs: u64,
    /// RFC3339 anchor of the last start/resume, when running.
    pub started_at: Option<String>,
}

/// Reviewer derivative attached to the broadcast document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReviewerContentDto {
    /// Reviewed text body.
    pub text: String,
    /// Key points extracted from the text.
    pub key_points: Vec<String>,
}

/// Projection of the broadcast document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DocumentSnapshot {
    /// File the broadcast points at.
    pub file_id: String,
    /// Rendering mode requested by the host.
    pub view_mode: ViewModeDto,
    /// Reviewer derivative; `None` in reviewer mode means generation is still
    /// in progress.
    pub reviewer_content: Option<ReviewerContentDto>,
}

/// Projection of a shared file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedFileSummary {
    /// Identifier assigned by the file collaborator.
    pub file_id: String,
    /// Original file name.
    pub file_name: String,
    /// MIME-ish type tag.
    pub file_type: String,
    /// Subject the file belongs to.
    pub subject: String,
    /// Raw text content.
    pub file_content: String,
    /// Identity of the sharer.
    pub shared_by_user_id: String,
    /// Display name of the sharer.
    pub shared_by_username: String,
}

/// Projection of one chat entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageSummary {
    /// Identity of the sender.
    pub user_id: String,
    /// Display name of the sender.
    pub username: String,
    /// Message body.
    pub message: String,
    /// RFC3339 receive timestamp.
    pub sent_at: String,
}

/// Full serialized room state returned by every read.
///
/// This is the sole source of truth for clients: derived state (countdown
/// display, answered flags, visible document) must be rebuilt from it on
/// every poll cycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomSnapshot {
    /// Six-character share code.
    pub code: String,
    /// Identity of the host.
    pub host_id: String,
    /// False once the room was closed (host departure or deletion pending).
    pub is_active: bool,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// RFC3339 timestamp of the last mutation.
    pub updated_at: String,
    /// Participants in join order.
    pub participants: Vec<ParticipantSummary>,
    /// Read-time countdown projection.
    pub study_timer: TimerSnapshot,
    /// Broadcast document, if any.
    pub current_document: Option<DocumentSnapshot>,
    /// Shared files in share order.
    pub shared_files: Vec<SharedFileSummary>,
    /// Append-only chat log.
    pub chat_messages: Vec<ChatMessageSummary>,
    /// Embedded quiz state, if a quiz ever started.
    pub quiz: Option<crate::dto::quiz::QuizSnapshot>,
    /// Poll interval hint for conforming clients, in seconds.
    pub poll_interval_secs: u64,
}

impl RoomSnapshot {
    /// Project a room aggregate at `now`, recomputing the timer.
    pub fn from_room_at(room: &Room, now: SystemTime, poll_interval_secs: u64) -> Self {
        Self {
            code: room.code.clone(),
            host_id: room.host_id.clone(),
            is_active: room.is_active,
            created_at: format_system_time(room.created_at),
            updated_at: format_system_time(room.updated_at),
            participants: room
                .participants
                .values()
                .map(|p| participant_summary(p, &room.host_id))
                .collect(),
            study_timer: timer_snapshot(&room.study_timer.observe(now)),
            current_document: room.current_document.as_ref().map(document_snapshot),
            shared_files: room.shared_files.values().map(file_summary).collect(),
            chat_messages: room.chat_messages.iter().map(chat_summary).collect(),
            quiz: room.quiz.as_ref().map(Into::into),
            poll_interval_secs,
        }
    }
}

fn participant_summary(participant: &Participant, host_id: &str) -> ParticipantSummary {
    let is_host = participant.user_id == host_id;
    ParticipantSummary {
        user_id: participant.user_id.clone(),
        username: participant.username.clone(),
        // The host entry is implicitly always ready.
        ready: participant.ready || is_host,
        is_host,
        joined_at: format_system_time(participant.joined_at),
    }
}

fn timer_snapshot(timer: &StudyTimer) -> TimerSnapshot {
    TimerSnapshot {
        is_running: timer.is_running,
        duration_secs: timer.duration_secs,
        time_remaining_secs: timer.time_remaining_secs,
        started_at: timer.started_at.map(format_system_time),
    }
}

fn document_snapshot(document: &CurrentDocument) -> DocumentSnapshot {
    DocumentSnapshot {
        file_id: document.file_id.clone(),
        view_mode: document.view_mode.into(),
        reviewer_content: document
            .reviewer_content
            .as_ref()
            .map(|content: &ReviewerContent| ReviewerContentDto {
                text: content.text.clone(),
                key_points: content.key_points.clone(),
            }),
    }
}

fn file_summary(file: &SharedFile) -> SharedFileSummary {
    SharedFileSummary {
        file_id: file.file_id.clone(),
        file_name: file.file_name.clone(),
        file_type: file.file_type.clone(),
        subject: file.subject.clone(),
        file_content: file.file_content.clone(),
        shared_by_user_id: file.shared_by.user_id.clone(),
        shared_by_username: file.shared_by.username.clone(),
    }
}

fn chat_summary(message: &ChatMessage) -> ChatMessageSummary {
    ChatMessageSummary {
        user_id: message.user_id.clone(),
        username: message.username.clone(),
        message: message.message.clone(),
        sent_at: format_system_time(message.sent_at),
    }
}

/// Response returned when a room is created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// Always true on success.
    pub success: bool,
    /// Snapshot of the freshly created room.
    pub room: RoomSnapshot,
}

/// Response returned by a join call.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    /// Always true on success (re-joins included).
    pub success: bool,
    /// False when the caller was already a participant.
    pub newly_joined: bool,
    /// Post-join snapshot.
    pub room: RoomSnapshot,
}

/// Response returned by a leave call.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveRoomResponse {
    /// Always true on success.
    pub success: bool,
    /// True when the host left and the room was closed.
    pub room_deactivated: bool,
}

/// Response returned by a ready toggle.
#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleReadyResponse {
    /// Always true on success.
    pub success: bool,
    /// New value of the caller's ready flag.
    pub ready: bool,
}

/// Response for session start and timer control calls.
#[derive(Debug, Serialize, ToSchema)]
pub struct TimerControlResponse {
    /// Always true on success.
    pub success: bool,
    /// Updated countdown projection.
    pub study_timer: TimerSnapshot,
}

/// Response listing the shared files after a share/remove mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SharedFilesResponse {
    /// Always true on success.
    pub success: bool,
    /// Updated shared-files list in share order.
    pub shared_files: Vec<SharedFileSummary>,
}

/// Response carrying the updated broadcast document.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    /// Always true on success.
    pub success: bool,
    /// Updated broadcast pointer; `None` after a clear.
    pub current_document: Option<DocumentSnapshot>,
}

/// Response after posting a chat message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    /// Always true on success.
    pub success: bool,
    /// The stored message with its server-side timestamp.
    pub sent: ChatMessageSummary,
}
