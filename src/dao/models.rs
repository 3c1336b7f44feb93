use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::{TimestampSeconds, serde_as};
use uuid::Uuid;

use crate::state::{
    quiz::{AnswerRecord, ParticipantScore, Quiz, QuizQuestion, QuizStatus},
    room::{
        ChatMessage, CurrentDocument, Participant, ReviewerContent, Room, SharedBy, SharedFile,
        ViewMode,
    },
    timer::StudyTimer,
};

/// Participant record as persisted inside the room document.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Caller-supplied identity, unique within the room.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Ready flag; meaningless for the host.
    pub ready: bool,
    /// When the participant first joined.
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub joined_at: SystemTime,
}

/// Persisted form of the shared countdown.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyTimerEntity {
    /// Whether the countdown was ticking at the last write.
    pub is_running: bool,
    /// Duration configured at the last start, in seconds.
    pub duration_secs: u64,
    /// Wall-clock anchor of the last start/resume.
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    pub started_at: Option<SystemTime>,
    /// Remaining seconds at the instant of the last start/resume/pause.
    pub time_remaining_secs: u64,
}

/// Reviewer derivative stored with the broadcast document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewerContentEntity {
    /// Reviewed text body.
    pub text: String,
    /// Key points extracted from the text.
    pub key_points: Vec<String>,
}

/// Persisted broadcast pointer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentDocumentEntity {
    /// File the broadcast points at.
    pub file_id: String,
    /// Rendering mode requested by the host.
    pub view_mode: ViewMode,
    /// Reviewer derivative, if generated.
    pub reviewer_content: Option<ReviewerContentEntity>,
}

/// Attribution stored with each shared file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedByEntity {
    /// Identity of the sharer.
    pub user_id: String,
    /// Display name of the sharer.
    pub username: String,
}

/// Shared file record, content included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedFileEntity {
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
    /// Who shared it.
    pub shared_by: SharedByEntity,
}

/// One chat log entry.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageEntity {
    /// Identity of the sender.
    pub user_id: String,
    /// Display name of the sender.
    pub username: String,
    /// Message body.
    pub message: String,
    /// Server-side receive timestamp.
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub sent_at: SystemTime,
}

/// Persisted quiz question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestionEntity {
    /// Prompt shown to participants.
    pub question: String,
    /// Answer options, indexed from zero.
    pub options: Vec<String>,
    /// Index into `options` identifying the correct answer.
    pub correct_answer: usize,
    /// Optional explanation revealed alongside results.
    pub explanation: Option<String>,
}

/// Persisted answer record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerRecordEntity {
    /// Question the answer was submitted for.
    pub question_index: usize,
    /// Option the participant selected.
    pub selected_answer: usize,
    /// Time the participant took, in milliseconds.
    pub time_taken_ms: u64,
    /// Whether the selection matched the correct answer.
    pub is_correct: bool,
}

/// Persisted per-participant quiz tally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantScoreEntity {
    /// Identity of the answering participant.
    pub user_id: String,
    /// Display name captured at first answer.
    pub username: String,
    /// Cumulative score.
    pub score: u32,
    /// Answers in submission order.
    pub answers: Vec<AnswerRecordEntity>,
}

/// Persisted quiz sub-aggregate.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Stable identifier for this quiz run.
    pub id: Uuid,
    /// Subject the questions were generated from.
    pub subject: String,
    /// Kind of test, caller-defined.
    pub test_type: String,
    /// Whether the quiz currently accepts answers or advancement.
    pub is_active: bool,
    /// Lifecycle status.
    pub status: QuizStatus,
    /// Frozen question sequence.
    pub questions: Vec<QuizQuestionEntity>,
    /// Index of the question currently accepting answers.
    pub current_question_index: usize,
    /// Tallies for participants who answered at least once.
    pub participant_answers: Vec<ParticipantScoreEntity>,
    /// When the host started the quiz.
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub started_at: SystemTime,
}

/// Aggregate room document persisted by the storage layer, keyed by code.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Six-character share code; the storage key.
    pub code: String,
    /// Identity of the creator.
    pub host_id: String,
    /// False once the host left or the room was closed.
    pub is_active: bool,
    /// Creation timestamp.
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub updated_at: SystemTime,
    /// Participants in join order.
    pub participants: Vec<ParticipantEntity>,
    /// Shared countdown state.
    pub study_timer: StudyTimerEntity,
    /// Broadcast pointer, if any.
    pub current_document: Option<CurrentDocumentEntity>,
    /// Shared files in share order.
    pub shared_files: Vec<SharedFileEntity>,
    /// Append-only chat log.
    pub chat_messages: Vec<ChatMessageEntity>,
    /// Embedded quiz, if one ever started.
    pub quiz: Option<QuizEntity>,
}

impl From<Participant> for ParticipantEntity {
    fn from(value: Participant) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            ready: value.ready,
            joined_at: value.joined_at,
        }
    }
}

impl From<ParticipantEntity> for Participant {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            ready: value.ready,
            joined_at: value.joined_at,
        }
    }
}

impl From<StudyTimer> for StudyTimerEntity {
    fn from(value: StudyTimer) -> Self {
        Self {
            is_running: value.is_running,
            duration_secs: value.duration_secs,
            started_at: value.started_at,
            time_remaining_secs: value.time_remaining_secs,
        }
    }
}

impl From<StudyTimerEntity> for StudyTimer {
    fn from(value: StudyTimerEntity) -> Self {
        Self {
            is_running: value.is_running,
            duration_secs: value.duration_secs,
            started_at: value.started_at,
            time_remaining_secs: value.time_remaining_secs,
        }
    }
}

impl From<ReviewerContent> for ReviewerContentEntity {
    fn from(value: ReviewerContent) -> Self {
        Self {
            text: value.text,
            key_points: value.key_points,
        }
    }
}

impl From<ReviewerContentEntity> for ReviewerContent {
    fn from(value: ReviewerContentEntity) -> Self {
        Self {
            text: value.text,
            key_points: value.key_points,
        }
    }
}

impl From<CurrentDocument> for CurrentDocumentEntity {
    fn from(value: CurrentDocument) -> Self {
        Self {
            file_id: value.file_id,
            view_mode: value.view_mode,
            reviewer_content: value.reviewer_content.map(Into::into),
        }
    }
}

impl From<CurrentDocumentEntity> for CurrentDocument {
    fn from(value: CurrentDocumentEntity) -> Self {
        Self {
            file_id: value.file_id,
            view_mode: value.view_mode,
            reviewer_content: value.reviewer_content.map(Into::into),
        }
    }
}

impl From<SharedBy> for SharedByEntity {
    fn from(value: SharedBy) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

impl From<SharedByEntity> for SharedBy {
    fn from(value: SharedByEntity) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

impl From<SharedFile> for SharedFileEntity {
    fn from(value: SharedFile) -> Self {
        Self {
            file_id: value.file_id,
            file_name: value.file_name,
            file_type: value.file_type,
            subject: value.subject,
            file_content: value.file_content,
            shared_by: value.shared_by.into(),
        }
    }
}

impl From<SharedFileEntity> for SharedFile {
    fn from(value: SharedFileEntity) -> Self {
        Self {
            file_id: value.file_id,
            file_name: value.file_name,
            file_type: value.file_type,
            subject: value.subject,
            file_content: value.file_content,
            shared_by: value.shared_by.into(),
        }
    }
}

impl From<ChatMessage> for ChatMessageEntity {
    fn from(value: ChatMessage) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            message: value.message,
            sent_at: value.sent_at,
        }
    }
}

impl From<ChatMessageEntity> for ChatMessage {
    fn from(value: ChatMessageEntity) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            message: value.message,
            sent_at: value.sent_at,
        }
    }
}

impl From<QuizQuestion> for QuizQuestionEntity {
    fn from(value: QuizQuestion) -> Self {
        Self {
            question: value.question,
            options: value.options,
            correct_answer: value.correct_answer,
            explanation: value.explanation,
        }
    }
}

impl From<QuizQuestionEntity> for QuizQuestion {
    fn from(value: QuizQuestionEntity) -> Self {
        Self {
            question: value.question,
            options: value.options,
            correct_answer: value.correct_answer,
            explanation: value.explanation,
        }
    }
}

impl From<AnswerRecord> for AnswerRecordEntity {
    fn from(value: AnswerRecord) -> Self {
        Self {
            question_index: value.question_index,
            selected_answer: value.selected_answer,
            time_taken_ms: value.time_taken_ms,
            is_correct: value.is_correct,
        }
    }
}

impl From<AnswerRecordEntity> for AnswerRecord {
    fn from(value: AnswerRecordEntity) -> Self {
        Self {
            question_index: value.question_index,
            selected_answer: value.selected_answer,
            time_taken_ms: value.time_taken_ms,
            is_correct: value.is_correct,
        }
    }
}

impl From<ParticipantScore> for ParticipantScoreEntity {
    fn from(value: ParticipantScore) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ParticipantScoreEntity> for ParticipantScore {
    fn from(value: ParticipantScoreEntity) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Quiz> for QuizEntity {
    fn from(value: Quiz) -> Self {
        Self {
            id: value.id,
            subject: value.subject,
            test_type: value.test_type,
            is_active: value.is_active,
            status: value.status,
            questions: value.questions.into_iter().map(Into::into).collect(),
            current_question_index: value.current_question_index,
            participant_answers: value
                .participant_answers
                .into_iter()
                .map(Into::into)
                .collect(),
            started_at: value.started_at,
        }
    }
}

impl From<QuizEntity> for Quiz {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id,
            subject: value.subject,
            test_type: value.test_type,
            is_active: value.is_active,
            status: value.status,
            questions: value.questions.into_iter().map(Into::into).collect(),
            current_question_index: value.current_question_index,
            participant_answers: value
                .participant_answers
                .into_iter()
                .map(Into::into)
                .collect(),
            started_at: value.started_at,
        }
    }
}

impl From<Room> for RoomEntity {
    fn from(value: Room) -> Self {
        Self {
            code: value.code,
            host_id: value.host_id,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
            participants: value
                .participants
                .into_values()
                .map(Into::into)
                .collect(),
            study_timer: value.study_timer.into(),
            current_document: value.current_document.map(Into::into),
            shared_files: value.shared_files.into_values().map(Into::into).collect(),
            chat_messages: value.chat_messages.into_iter().map(Into::into).collect(),
            quiz: value.quiz.map(Into::into),
        }
    }
}

impl From<RoomEntity> for Room {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            host_id: value.host_id,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
            participants: value
                .participants
                .into_iter()
                .map(|p| (p.user_id.clone(), p.into()))
                .collect(),
            study_timer: value.study_timer.into(),
            current_document: value.current_document.map(Into::into),
            shared_files: value
                .shared_files
                .into_iter()
                .map(|f| (f.file_id.clone(), f.into()))
                .collect(),
            chat_messages: value.chat_messages.into_iter().map(Into::into).collect(),
            quiz: value.quiz.map(Into::into),
        }
    }
}
